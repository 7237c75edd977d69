//! Backend entry-point: loads settings, connects the stores and serves the
//! REST API.

mod server;

use actix_session::storage::RedisSessionStore;
use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use forum_backend::inbound::http::health::HealthState;
use forum_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use forum_backend::outbound::cache::connect_redis;
use forum_backend::outbound::persistence::{DbPool, PoolConfig};
use ortho_config::OrthoConfig;

use server::{ServerConfig, ServerSettings, ServerStores, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let redis_url = settings.redis_url()?;
    let pool_config =
        PoolConfig::new(settings.database_url()?).with_max_size(settings.db_pool_size());
    info!(database = %pool_config.redacted_url(), "connecting to PostgreSQL");
    let db_pool = DbPool::new(pool_config)
        .await
        .map_err(|err| eyre!("failed to build database pool: {}", err.into_message()))?;
    let redis_pool = connect_redis(redis_url, settings.redis_pool_size())
        .await
        .wrap_err("failed to connect to Redis")?;
    let session_store = RedisSessionStore::new(redis_url)
        .await
        .map_err(|err| eyre!("failed to connect session store: {err}"))?;

    let config = ServerConfig::new(
        session,
        settings.bind_addr()?,
        ServerStores {
            session_store,
            db_pool,
            redis_pool,
        },
        settings.reset_link_base()?,
    )
    .with_session_ttl(settings.session_ttl());
    info!(addr = %config.bind_addr(), "starting HTTP server");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome.wrap_err("HTTP server failed")
}
