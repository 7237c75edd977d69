//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod accounts_dto;
pub mod error;
pub mod health;
pub mod posts;
pub mod posts_dto;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;

use actix_web::{Scope, web};

pub use error::ApiResult;

/// Every REST endpoint under `/api/v1`.
///
/// Callers wrap the scope in session middleware and register
/// [`state::HttpState`] as app data.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .service(accounts::register)
        .service(accounts::login)
        .service(accounts::logout)
        .service(accounts::me)
        .service(accounts::forgot_password)
        .service(accounts::change_password)
        .service(posts::list_posts)
        .service(posts::create_post)
        .service(posts::get_post)
        .service(posts::update_post)
        .service(posts::delete_post)
        .service(posts::vote)
}
