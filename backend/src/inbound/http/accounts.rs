//! Account API handlers.
//!
//! ```text
//! POST /api/v1/register        {"username":"lovelace","email":"ada@example.com","password":"engine"}
//! POST /api/v1/login           {"usernameOrEmail":"lovelace","password":"engine"}
//! POST /api/v1/logout
//! GET  /api/v1/me
//! POST /api/v1/forgot-password {"email":"ada@example.com"}
//! POST /api/v1/change-password {"token":"...","newPassword":"analytical"}
//! ```
//!
//! Validation failures answer `200` with `{"errors":[...]}` so clients can
//! render them next to form fields. Successful register, login and
//! change-password calls sign the user in.

use actix_web::{get, post, web};

use crate::domain::{AccountOutcome, LoginCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::accounts_dto::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest, UserDto,
    UserResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn sign_in_on_success(
    session: &SessionContext,
    outcome: &AccountOutcome,
) -> ApiResult<web::Json<UserResponse>> {
    if let AccountOutcome::Authenticated(user) = outcome {
        session.persist_user(user.id())?;
    }
    Ok(web::Json(UserResponse::from(outcome)))
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User or field errors", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie on success"))),
        (status = 400, description = "Malformed body", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let outcome = state.accounts.register(&payload.into_inner().into()).await?;
    sign_in_on_success(&session, &outcome)
}

/// Verify credentials and sign the user in.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User or field errors", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie on success"))),
        (status = 400, description = "Malformed body", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let LoginRequest {
        username_or_email,
        password,
    } = payload.into_inner();
    let credentials = LoginCredentials::from_parts(&username_or_email, &password);
    let outcome = state.accounts.login(&credentials).await?;
    sign_in_on_success(&session, &outcome)
}

/// End the session. Always `true`.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared", body = bool)),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> web::Json<bool> {
    session.purge();
    web::Json(true)
}

/// The signed-in user, or `null`.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user or null", body = Option<UserDto>),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "me"
)]
#[get("/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Option<UserDto>>> {
    let ctx = session.request_context()?;
    let user = state.account_query.me(&ctx).await?;
    Ok(web::Json(user.as_ref().map(UserDto::own)))
}

/// Send a reset link when the email is registered. Always `true`.
#[utoipa::path(
    post,
    path = "/api/v1/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = bool),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "forgotPassword",
    security([])
)]
#[post("/forgot-password")]
pub async fn forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<web::Json<bool>> {
    let sent = state.accounts.forgot_password(&payload.email).await?;
    Ok(web::Json(sent))
}

/// Redeem a reset token, set a new password and sign the user in.
#[utoipa::path(
    post,
    path = "/api/v1/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "User or field errors", body = UserResponse),
        (status = 400, description = "Malformed body", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "changePassword",
    security([])
)]
#[post("/change-password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let outcome = state
        .accounts
        .change_password(&payload.token, &payload.new_password)
        .await?;
    sign_in_on_success(&session, &outcome)
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
