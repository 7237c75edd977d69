//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint, the DTO schemas and a session
//! cookie security scheme. Swagger UI serves it in debug builds.

use crate::inbound::http::accounts_dto::{
    ChangePasswordRequest, FieldErrorDto, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    UserDto, UserResponse,
};
use crate::inbound::http::posts_dto::{
    CreatePostRequest, FeedEntryDto, PaginatedPostsDto, PostDto, UpdatePostRequest, VoteRequest,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Session cookie issued by register, login and change-password.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Forum backend API",
        description = "Posts, votes and cookie-session accounts."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::me,
        crate::inbound::http::accounts::forgot_password,
        crate::inbound::http::accounts::change_password,
        crate::inbound::http::posts::list_posts,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::update_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::posts::vote,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserDto,
        FieldErrorDto,
        UserResponse,
        RegisterRequest,
        LoginRequest,
        ForgotPasswordRequest,
        ChangePasswordRequest,
        PostDto,
        FeedEntryDto,
        PaginatedPostsDto,
        CreatePostRequest,
        UpdatePostRequest,
        VoteRequest,
    )),
    tags(
        (name = "accounts", description = "Registration, sessions and password reset"),
        (name = "posts", description = "Posts, the feed and voting"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn schema_fields(name: &str) -> Vec<String> {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        match schemas.get(name).expect("schema registered") {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            other => panic!("expected object schema for {name}, got {other:?}"),
        }
    }

    #[rstest]
    #[case(ERROR_SCHEMA_NAME, "code")]
    #[case(ERROR_SCHEMA_NAME, "traceId")]
    #[case("UserDto", "email")]
    #[case("PaginatedPostsDto", "hasMore")]
    #[case("PaginatedPostsDto", "nextCursor")]
    #[case("VoteRequest", "value")]
    fn schemas_use_wire_field_names(#[case] schema: &str, #[case] field: &str) {
        assert!(schema_fields(schema).iter().any(|name| name == field));
    }

    #[rstest]
    #[case("/api/v1/posts")]
    #[case("/api/v1/posts/{id}")]
    #[case("/api/v1/posts/{id}/vote")]
    #[case("/api/v1/login")]
    #[case("/api/v1/change-password")]
    #[case("/health/ready")]
    fn every_route_is_documented(#[case] path: &str) {
        assert!(ApiDoc::openapi().paths.paths.contains_key(path));
    }

    #[rstest]
    fn session_cookie_scheme_names_the_cookie() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).expect("serialise document");
        assert_eq!(
            json["components"]["securitySchemes"]["SessionCookie"]["name"],
            SESSION_COOKIE_NAME
        );
    }
}
