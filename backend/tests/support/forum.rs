//! In-memory forum wired through the real services and HTTP handlers.
//!
//! Uses cookie sessions signed with a key fixed per harness, so cookies
//! issued by one app instance are accepted by the next.

use std::sync::Arc;
use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{TimeZone, Utc};
use mockable::Clock;

use forum_backend::Trace;
use forum_backend::domain::ports::{
    PasswordHasher, PasswordResetNotifier, ResetTokenStore, UserRepository,
};
use forum_backend::domain::{
    AccountService, AccountServicePorts, FeedPaginator, PostService, VoteAggregator,
};
use forum_backend::inbound::http::api_scope;
use forum_backend::inbound::http::error::{
    json_error_handler, path_error_handler, query_error_handler,
};
use forum_backend::inbound::http::session_config::SESSION_COOKIE_NAME;
use forum_backend::inbound::http::state::HttpState;
use forum_backend::test_support::{
    InMemoryForumStore, InMemoryResetTokenStore, MutableClock, PlainTextHasher, RecordingNotifier,
};

/// Adapters and state behind one test forum.
pub struct ForumHarness {
    pub store: Arc<InMemoryForumStore>,
    pub clock: Arc<MutableClock>,
    pub notifier: Arc<RecordingNotifier>,
    state: HttpState,
    key: Key,
}

impl ForumHarness {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 4, 1, 9, 0, 0)
            .single()
            .expect("start time");
        let clock = Arc::new(MutableClock::new(start));
        let store = Arc::new(InMemoryForumStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let users: Arc<dyn UserRepository> = store.clone();
        let hasher: Arc<dyn PasswordHasher> = Arc::new(PlainTextHasher);
        let reset_tokens: Arc<dyn ResetTokenStore> =
            Arc::new(InMemoryResetTokenStore::new(shared_clock.clone()));
        let reset_notifier: Arc<dyn PasswordResetNotifier> = notifier.clone();
        let accounts = Arc::new(AccountService::new(
            AccountServicePorts {
                users,
                hasher,
                reset_tokens,
                notifier: reset_notifier,
            },
            shared_clock.clone(),
        ));
        let posts_repo: Arc<InMemoryForumStore> = store.clone();

        let state = HttpState {
            accounts: accounts.clone(),
            account_query: accounts,
            posts: Arc::new(PostService::new(posts_repo.clone(), shared_clock)),
            feed: Arc::new(FeedPaginator::new(posts_repo.clone())),
            votes: Arc::new(VoteAggregator::new(posts_repo)),
        };

        Self {
            store,
            clock,
            notifier,
            state,
            key: Key::generate(),
        }
    }

    /// Move time forward so the next post sorts after the previous one.
    pub fn tick(&self) {
        self.clock.advance(Duration::from_secs(1));
    }

    /// Fresh app instance sharing this harness's state and session key.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_secure(false)
            .build();

        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .wrap(Trace)
            .service(api_scope().wrap(session))
    }
}

/// The session cookie set on `res`, if any.
pub fn session_cookie(res: &ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}
