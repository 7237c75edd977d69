//! Post authoring service: create, retitle and delete.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{PostCommand, PostRepository, PostRepositoryError};
use crate::domain::{
    Error, Post, PostDraft, PostId, PostValidationError, RequestContext, UserId, can_modify,
    truncate_to_millis, validate_title,
};

pub(crate) fn map_post_repository_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
        PostRepositoryError::PostNotFound { post_id } => {
            Error::not_found(format!("post {post_id} not found"))
        }
    }
}

fn map_validation_error(error: &PostValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "code": "empty_field",
    }))
}

/// Post service implementing [`PostCommand`].
#[derive(Clone)]
pub struct PostService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> PostService<R> {
    /// Create a new service over the given repository.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R> PostService<R>
where
    R: PostRepository,
{
    /// Load a post the caller may modify, or `None` when it does not exist.
    async fn owned_post(&self, user_id: &UserId, id: &PostId) -> Result<Option<Post>, Error> {
        let Some(post) = self
            .repo
            .find_by_id(id)
            .await
            .map_err(map_post_repository_error)?
        else {
            return Ok(None);
        };
        if !can_modify(user_id, &post.creator_id) {
            return Err(Error::forbidden("not authorized to modify this post"));
        }
        Ok(Some(post))
    }
}

#[async_trait]
impl<R> PostCommand for PostService<R>
where
    R: PostRepository,
{
    async fn create(&self, ctx: &RequestContext, title: &str, text: &str) -> Result<Post, Error> {
        let creator_id = ctx.require_user()?.clone();
        let draft = PostDraft::new(title, text).map_err(|err| map_validation_error(&err))?;
        let now = truncate_to_millis(self.clock.utc());
        let post = Post {
            id: PostId::random(),
            title: draft.title().to_owned(),
            text: draft.text().to_owned(),
            points: 0,
            creator_id,
            created_at: now,
            updated_at: now,
        };
        self.repo
            .insert(&post)
            .await
            .map_err(map_post_repository_error)?;
        info!(post_id = %post.id, creator_id = %post.creator_id, "post created");
        Ok(post)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &PostId,
        title: Option<String>,
    ) -> Result<Option<Post>, Error> {
        let user_id = ctx.require_user()?;
        let Some(existing) = self.owned_post(user_id, id).await? else {
            return Ok(None);
        };
        let Some(title) = title else {
            return Ok(Some(existing));
        };
        validate_title(&title).map_err(|err| map_validation_error(&err))?;
        let updated = self
            .repo
            .update_title(id, &title, self.clock.utc())
            .await
            .map_err(map_post_repository_error)?;
        if updated.is_some() {
            info!(post_id = %id, "post retitled");
        }
        Ok(updated)
    }

    async fn delete(&self, ctx: &RequestContext, id: &PostId) -> Result<bool, Error> {
        let user_id = ctx.require_user()?;
        if self.owned_post(user_id, id).await?.is_none() {
            return Ok(false);
        }
        let removed = self
            .repo
            .delete(id)
            .await
            .map_err(map_post_repository_error)?;
        if removed {
            info!(post_id = %id, "post deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "post_service_tests.rs"]
mod tests;
