//! Wire outbound adapters into the domain services behind [`HttpState`].

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use forum_backend::domain::{
    AccountService, AccountServicePorts, FeedPaginator, PostService, VoteAggregator,
};
use forum_backend::inbound::http::state::HttpState;
use forum_backend::outbound::cache::RedisResetTokenStore;
use forum_backend::outbound::crypto::Argon2PasswordHasher;
use forum_backend::outbound::notify::TracingResetNotifier;
use forum_backend::outbound::persistence::{DieselPostRepository, DieselUserRepository};

use super::ServerConfig;

/// Build the handler state from the configured stores.
///
/// Post reads, writes and votes share one repository so the vote
/// transaction and the feed see the same pool.
pub(crate) fn build_http_state(config: &ServerConfig) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let posts_repo = Arc::new(DieselPostRepository::new(config.db_pool.clone()));

    let accounts = Arc::new(AccountService::new(
        AccountServicePorts {
            users: Arc::new(DieselUserRepository::new(config.db_pool.clone())),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            reset_tokens: Arc::new(RedisResetTokenStore::new(config.redis_pool.clone())),
            notifier: Arc::new(TracingResetNotifier::new(config.reset_link_base.clone())),
        },
        Arc::clone(&clock),
    ));

    HttpState {
        accounts: accounts.clone(),
        account_query: accounts,
        posts: Arc::new(PostService::new(Arc::clone(&posts_repo), clock)),
        feed: Arc::new(FeedPaginator::new(Arc::clone(&posts_repo))),
        votes: Arc::new(VoteAggregator::new(posts_repo)),
    }
}
