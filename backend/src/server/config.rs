//! Server settings loaded via OrthoConfig, and the assembled server
//! configuration.

use std::net::SocketAddr;
use std::time::Duration;

use actix_session::storage::RedisSessionStore;
use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use forum_backend::inbound::http::session_config::SessionSettings;
use forum_backend::outbound::cache::RedisPool;
use forum_backend::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_POOL_SIZE: u32 = 10;
const DEFAULT_REDIS_POOL_SIZE: u32 = 8;
const DEFAULT_RESET_LINK_BASE: &str = "http://localhost:3000";
const DEFAULT_SESSION_TTL_DAYS: u32 = 365 * 10;

/// Errors raised while interpreting [`ServerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A required setting was not provided.
    #[error("missing required setting: FORUM_{name}")]
    Missing {
        /// Setting name without the prefix.
        name: &'static str,
    },
    /// A setting could not be parsed.
    #[error("invalid value for FORUM_{name}: {message}")]
    Invalid {
        /// Setting name without the prefix.
        name: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Process settings read from `FORUM_*` variables, CLI flags and config files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FORUM")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Redis connection URL for sessions and reset tokens.
    pub redis_url: Option<String>,
    /// Maximum PostgreSQL connections.
    pub db_pool_size: Option<u32>,
    /// Maximum Redis connections for the reset-token store.
    pub redis_pool_size: Option<u32>,
    /// Front-end origin that serves `/change-password/{token}`.
    pub reset_link_base: Option<String>,
    /// Session lifetime in days.
    pub session_ttl_days: Option<u32>,
}

impl ServerSettings {
    /// Socket address to bind, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
                name: "BIND_ADDR",
                message: err.to_string(),
            })
    }

    /// PostgreSQL URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .ok_or(SettingsError::Missing {
                name: "DATABASE_URL",
            })
    }

    /// Redis URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn redis_url(&self) -> Result<&str, SettingsError> {
        self.redis_url
            .as_deref()
            .ok_or(SettingsError::Missing { name: "REDIS_URL" })
    }

    /// PostgreSQL pool size, defaulting to 10.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    /// Redis pool size, defaulting to 8.
    pub fn redis_pool_size(&self) -> u32 {
        self.redis_pool_size.unwrap_or(DEFAULT_REDIS_POOL_SIZE)
    }

    /// Base URL for password reset links.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when the URL does not parse.
    pub fn reset_link_base(&self) -> Result<Url, SettingsError> {
        Url::parse(
            self.reset_link_base
                .as_deref()
                .unwrap_or(DEFAULT_RESET_LINK_BASE),
        )
        .map_err(|err| SettingsError::Invalid {
            name: "RESET_LINK_BASE",
            message: err.to_string(),
        })
    }

    /// Session lifetime, defaulting to ten years.
    pub fn session_ttl(&self) -> Duration {
        let days = self.session_ttl_days.unwrap_or(DEFAULT_SESSION_TTL_DAYS);
        Duration::from_secs(u64::from(days) * 24 * 60 * 60)
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) session_ttl: Duration,
    pub(crate) session_store: RedisSessionStore,
    pub(crate) db_pool: DbPool,
    pub(crate) redis_pool: RedisPool,
    pub(crate) reset_link_base: Url,
}

/// Backing stores the server needs.
pub struct ServerStores {
    /// Redis-backed HTTP session storage.
    pub session_store: RedisSessionStore,
    /// PostgreSQL pool.
    pub db_pool: DbPool,
    /// Redis pool for reset tokens.
    pub redis_pool: RedisPool,
}

impl ServerConfig {
    /// Construct a server configuration from cookie settings and stores.
    #[must_use]
    pub fn new(
        session: SessionSettings,
        bind_addr: SocketAddr,
        stores: ServerStores,
        reset_link_base: Url,
    ) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        let ServerStores {
            session_store,
            db_pool,
            redis_pool,
        } = stores;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            session_ttl: Duration::from_secs(u64::from(DEFAULT_SESSION_TTL_DAYS) * 24 * 60 * 60),
            session_store,
            db_pool,
            redis_pool,
            reset_link_base,
        }
    }

    /// Override the session lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 7] = [
        "FORUM_BIND_ADDR",
        "FORUM_DATABASE_URL",
        "FORUM_REDIS_URL",
        "FORUM_DB_POOL_SIZE",
        "FORUM_REDIS_POOL_SIZE",
        "FORUM_RESET_LINK_BASE",
        "FORUM_SESSION_TTL_DAYS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("forum-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("default addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.db_pool_size(), 10);
        assert_eq!(settings.redis_pool_size(), 8);
        assert_eq!(
            settings.session_ttl(),
            Duration::from_secs(3650 * 24 * 60 * 60)
        );
        assert!(matches!(
            settings.database_url(),
            Err(SettingsError::Missing {
                name: "DATABASE_URL"
            })
        ));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("FORUM_BIND_ADDR", Some("127.0.0.1:4000".to_owned())),
            (
                "FORUM_DATABASE_URL",
                Some("postgres://forum@localhost/forum".to_owned()),
            ),
            ("FORUM_REDIS_URL", Some("redis://127.0.0.1:6379".to_owned())),
            ("FORUM_DB_POOL_SIZE", Some("4".to_owned())),
            ("FORUM_REDIS_POOL_SIZE", None),
            (
                "FORUM_RESET_LINK_BASE",
                Some("https://forum.example.com".to_owned()),
            ),
            ("FORUM_SESSION_TTL_DAYS", Some("1".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("addr").to_string(),
            "127.0.0.1:4000"
        );
        assert_eq!(
            settings.database_url().expect("db url"),
            "postgres://forum@localhost/forum"
        );
        assert_eq!(
            settings.redis_url().expect("redis url"),
            "redis://127.0.0.1:6379"
        );
        assert_eq!(settings.db_pool_size(), 4);
        assert_eq!(
            settings.reset_link_base().expect("base").as_str(),
            "https://forum.example.com/"
        );
        assert_eq!(settings.session_ttl(), Duration::from_secs(24 * 60 * 60));
    }

    #[rstest]
    fn malformed_bind_addr_is_reported() {
        let _guard = lock_env([("FORUM_BIND_ADDR", Some("localhost".to_owned()))]);

        let err = load_from_empty_args()
            .bind_addr()
            .expect_err("hostname is not a socket address");

        assert!(err.to_string().contains("FORUM_BIND_ADDR"));
    }
}
