//! Session access for HTTP handlers.
//!
//! Handlers never touch `actix_session` directly: they extract a
//! [`SessionContext`], turn it into a [`RequestContext`] for the domain, and
//! persist or purge the logged-in user after account operations.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, RequestContext, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Wrapper exposing the session operations the forum needs.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap an Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Log `user_id` in, rotating the session id first.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.as_ref())
            .map_err(|err| Error::internal(format!("failed to persist session: {err}")))
    }

    /// The logged-in user, if any. Tampered ids read as anonymous.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|err| Error::internal(format!("failed to read session: {err}")))?;
        Ok(raw.and_then(|value| match UserId::new(&value) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(error = %err, "discarding invalid user id in session");
                None
            }
        }))
    }

    /// Domain request context for this session.
    pub fn request_context(&self) -> Result<RequestContext, Error> {
        Ok(self
            .user_id()?
            .map_or_else(RequestContext::anonymous, RequestContext::authenticated))
    }

    /// Drop the session state and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
