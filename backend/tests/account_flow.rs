//! End-to-end account flows over in-memory adapters.
//!
//! Covers registration, session cookies, logout and the forgot/change
//! password round trip through the real services and handlers.

#[allow(dead_code, reason = "Shared harness exposes helpers other suites use")]
#[path = "support/forum.rs"]
mod forum;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use forum::{ForumHarness, session_cookie};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn harness() -> ForumHarness {
    ForumHarness::new()
}

async fn post_json<S>(app: &S, uri: &str, body: Value, cookie: Option<Cookie<'static>>) -> ServiceResponse
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut request = actix_test::TestRequest::post().uri(uri).set_json(body);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie);
    }
    actix_test::call_service(app, request.to_request()).await
}

async fn me<S>(app: &S, cookie: Cookie<'static>) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    actix_test::read_body_json(res).await
}

#[rstest]
#[actix_web::test]
async fn registration_signs_in_until_logout(harness: ForumHarness) {
    let app = actix_test::init_service(harness.app()).await;

    let res = post_json(
        &app,
        "/api/v1/register",
        json!({ "username": "lovelace", "email": "ada@example.com", "password": "engine" }),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res).expect("registration sets a session");
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["user"]["username"], "lovelace");

    let current = me(&app, cookie.clone()).await;
    assert_eq!(current["email"], "ada@example.com");

    let res = post_json(&app, "/api/v1/logout", json!({}), Some(cookie)).await;
    let cleared = session_cookie(&res).expect("logout clears the cookie");
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body, Value::Bool(true));
    assert_eq!(me(&app, cleared).await, Value::Null);
}

#[rstest]
#[case(json!({ "username": "ada", "email": "ada@example.com", "password": "engine" }), "username")]
#[case(json!({ "username": "ada@home", "email": "ada@example.com", "password": "engine" }), "username")]
#[case(json!({ "username": "lovelace", "email": "ada.example.com", "password": "engine" }), "email")]
#[case(json!({ "username": "lovelace", "email": "ada@example.com", "password": "eng" }), "password")]
#[actix_web::test]
async fn invalid_registrations_return_one_field_error(
    harness: ForumHarness,
    #[case] body: Value,
    #[case] field: &str,
) {
    let app = actix_test::init_service(harness.app()).await;

    let res = post_json(&app, "/api/v1/register", body, None).await;

    assert!(session_cookie(&res).is_none());
    let body: Value = actix_test::read_body_json(res).await;
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn duplicate_username_is_a_field_error(harness: ForumHarness) {
    let app = actix_test::init_service(harness.app()).await;
    let first = json!({ "username": "lovelace", "email": "ada@example.com", "password": "engine" });
    let second = json!({ "username": "lovelace", "email": "other@example.com", "password": "engine" });

    post_json(&app, "/api/v1/register", first, None).await;
    let res = post_json(&app, "/api/v1/register", second, None).await;

    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({ "errors": [{ "field": "username", "message": "username is already taken" }] })
    );
}

#[rstest]
#[case("lovelace")]
#[case("ada@example.com")]
#[actix_web::test]
async fn login_accepts_username_or_email(harness: ForumHarness, #[case] identifier: &str) {
    let app = actix_test::init_service(harness.app()).await;
    post_json(
        &app,
        "/api/v1/register",
        json!({ "username": "lovelace", "email": "ada@example.com", "password": "engine" }),
        None,
    )
    .await;

    let res = post_json(
        &app,
        "/api/v1/login",
        json!({ "usernameOrEmail": identifier, "password": "engine" }),
        None,
    )
    .await;

    assert!(session_cookie(&res).is_some());
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["user"]["username"], "lovelace");
}

#[rstest]
#[actix_web::test]
async fn unknown_login_names_the_field(harness: ForumHarness) {
    let app = actix_test::init_service(harness.app()).await;

    let res = post_json(
        &app,
        "/api/v1/login",
        json!({ "usernameOrEmail": "nobody", "password": "engine" }),
        None,
    )
    .await;

    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body,
        json!({ "errors": [{ "field": "usernameOrEmail", "message": "User does not exist" }] })
    );
}

#[rstest]
#[actix_web::test]
async fn password_reset_round_trip(harness: ForumHarness) {
    let app = actix_test::init_service(harness.app()).await;
    post_json(
        &app,
        "/api/v1/register",
        json!({ "username": "lovelace", "email": "ada@example.com", "password": "engine" }),
        None,
    )
    .await;

    let res = post_json(
        &app,
        "/api/v1/forgot-password",
        json!({ "email": "ada@example.com" }),
        None,
    )
    .await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body, Value::Bool(true));
    let sent = harness.notifier.sent();
    let (recipient, token) = sent.first().expect("reset link sent");
    assert_eq!(recipient.as_ref(), "ada@example.com");

    let res = post_json(
        &app,
        "/api/v1/change-password",
        json!({ "token": token, "newPassword": "analytical" }),
        None,
    )
    .await;
    assert!(session_cookie(&res).is_some());
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["user"]["username"], "lovelace");

    let reused = post_json(
        &app,
        "/api/v1/change-password",
        json!({ "token": token, "newPassword": "difference" }),
        None,
    )
    .await;
    let body: Value = actix_test::read_body_json(reused).await;
    assert_eq!(body["errors"][0]["field"], "token");

    let old = post_json(
        &app,
        "/api/v1/login",
        json!({ "usernameOrEmail": "lovelace", "password": "engine" }),
        None,
    )
    .await;
    let body: Value = actix_test::read_body_json(old).await;
    assert_eq!(body["errors"][0]["field"], "password");
}

#[rstest]
#[actix_web::test]
async fn forgot_password_for_unknown_email_sends_nothing(harness: ForumHarness) {
    let app = actix_test::init_service(harness.app()).await;

    let res = post_json(
        &app,
        "/api/v1/forgot-password",
        json!({ "email": "ghost@example.com" }),
        None,
    )
    .await;

    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body, Value::Bool(true));
    assert!(harness.notifier.sent().is_empty());
}
