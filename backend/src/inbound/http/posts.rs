//! Post and vote API handlers.
//!
//! ```text
//! GET    /api/v1/posts?limit=10&cursor=1714000000123
//! GET    /api/v1/posts/{id}
//! POST   /api/v1/posts             {"title":"Hello","text":"First!"}
//! PATCH  /api/v1/posts/{id}        {"title":"Hello again"}
//! DELETE /api/v1/posts/{id}
//! POST   /api/v1/posts/{id}/vote   {"value":-1}
//! ```
//!
//! Reads are open to anonymous callers; writes need a session.

use actix_web::{HttpResponse, delete, get, patch, post, web};

use crate::domain::PostId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::posts_dto::{
    CreatePostRequest, DEFAULT_FEED_LIMIT, FeedEntryDto, FeedParams, PaginatedPostsDto, PostDto,
    UpdatePostRequest, VoteRequest,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_cursor, parse_post_id};

const ID_FIELD: FieldName = FieldName::new("id");

fn post_id(path: web::Path<String>) -> ApiResult<PostId> {
    parse_post_id(&path.into_inner(), ID_FIELD)
}

/// List posts newest first.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(FeedParams),
    responses(
        (status = 200, description = "One page of the feed", body = PaginatedPostsDto),
        (status = 400, description = "Malformed cursor", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "listPosts",
    security([])
)]
#[get("/posts")]
pub async fn list_posts(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<FeedParams>,
) -> ApiResult<web::Json<PaginatedPostsDto>> {
    let ctx = session.request_context()?;
    let cursor = parse_cursor(params.cursor.as_deref(), FieldName::new("cursor"))?;
    let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT);
    let page = state.feed.list_posts(&ctx, limit, cursor).await?;
    Ok(web::Json(PaginatedPostsDto::for_viewer(&page, ctx.viewer())))
}

/// Fetch one post, or `null`.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post or null", body = Option<FeedEntryDto>),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "getPost",
    security([])
)]
#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Option<FeedEntryDto>>> {
    let ctx = session.request_context()?;
    let id = post_id(path)?;
    let entry = state.feed.get_post(&ctx, &id).await?;
    Ok(web::Json(
        entry.map(|entry| FeedEntryDto::for_viewer(&entry, ctx.viewer())),
    ))
}

/// Create a post owned by the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = PostDto),
        (status = 400, description = "Blank title or text", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "createPost"
)]
#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let ctx = session.request_context()?;
    let post = state
        .posts
        .create(&ctx, &payload.title, &payload.text)
        .await?;
    Ok(HttpResponse::Created().json(PostDto::from(&post)))
}

/// Retitle a post. `null` when it does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post or null", body = Option<PostDto>),
        (status = 400, description = "Blank title", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "updatePost"
)]
#[patch("/posts/{id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdatePostRequest>,
) -> ApiResult<web::Json<Option<PostDto>>> {
    let ctx = session.request_context()?;
    let id = post_id(path)?;
    let post = state
        .posts
        .update(&ctx, &id, payload.into_inner().title)
        .await?;
    Ok(web::Json(post.as_ref().map(PostDto::from)))
}

/// Delete a post and its votes.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Whether a post was removed", body = bool),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "deletePost"
)]
#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<bool>> {
    let ctx = session.request_context()?;
    let id = post_id(path)?;
    let removed = state.posts.delete(&ctx, &id).await?;
    Ok(web::Json(removed))
}

/// Cast, keep or flip the signed-in user's vote.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/vote",
    params(("id" = String, Path, description = "Post identifier")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "`false` when the vote already stood", body = bool),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown post", body = ErrorSchema),
        (status = 409, description = "Concurrent votes kept colliding", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "vote"
)]
#[post("/posts/{id}/vote")]
pub async fn vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<VoteRequest>,
) -> ApiResult<web::Json<bool>> {
    let ctx = session.request_context()?;
    let id = post_id(path)?;
    let changed = state.votes.cast_vote(&ctx, &id, payload.value).await?;
    Ok(web::Json(changed))
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
