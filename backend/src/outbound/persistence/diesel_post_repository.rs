//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Vote writes run in a transaction that touches the `upvotes` row and the
//! post's `points` column together. The row write is guarded: a first vote
//! inserts with `ON CONFLICT DO NOTHING` and a flip updates only while the row
//! still holds the old value. Zero affected rows means another writer got
//! there first and is reported as [`VoteWrite::Conflicted`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{FeedQuery, PostRepository, PostRepositoryError};
use crate::domain::{FeedEntry, Post, PostId, User, UserId, VoteChange, VoteValue, VoteWrite};

use super::diesel_helpers::{DbFailure, classify_diesel_error};
use super::models::{NewPostRow, NewUpvoteRow, PostRow, UserRow, vote_from_row};
use super::pool::{DbPool, PoolError};
use super::schema::{posts, upvotes, users};

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    PostRepositoryError::connection(error.into_message())
}

fn map_failure(failure: DbFailure, post_id: Option<&Uuid>) -> PostRepositoryError {
    match (failure, post_id) {
        (DbFailure::ForeignKeyViolation { constraint }, Some(id))
            if constraint
                .as_deref()
                .is_none_or(|name| name.to_lowercase().contains("post_id")) =>
        {
            PostRepositoryError::post_not_found(id.to_string())
        }
        (DbFailure::ForeignKeyViolation { .. }, _) => {
            PostRepositoryError::query("foreign key violation")
        }
        (DbFailure::UniqueViolation { .. }, _) => PostRepositoryError::query("duplicate record"),
        (DbFailure::Connection(message), _) => PostRepositoryError::connection(message),
        (DbFailure::Query(message), _) => PostRepositoryError::query(message),
    }
}

fn map_diesel_error(error: diesel::result::Error, operation: &'static str) -> PostRepositoryError {
    map_failure(classify_diesel_error(error, operation), None)
}

fn to_entry(
    post: PostRow,
    creator: UserRow,
    vote_status: Option<VoteValue>,
) -> Result<FeedEntry, PostRepositoryError> {
    let creator: User = creator.into_user().map_err(PostRepositoryError::query)?;
    Ok(FeedEntry {
        post: post.into(),
        creator,
        vote_status,
    })
}

/// Failure inside the vote transaction.
#[derive(Debug)]
enum VoteTxError {
    Diesel(diesel::result::Error),
    PostMissing,
}

impl From<diesel::result::Error> for VoteTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

async fn write_vote_row(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    post_id: Uuid,
    change: VoteChange,
) -> Result<usize, diesel::result::Error> {
    match change {
        VoteChange::Cast { value } => {
            diesel::insert_into(upvotes::table)
                .values(&NewUpvoteRow {
                    user_id,
                    post_id,
                    value: value.as_i32(),
                })
                .on_conflict((upvotes::user_id, upvotes::post_id))
                .do_nothing()
                .execute(conn)
                .await
        }
        VoteChange::Flip { from, to } => {
            diesel::update(
                upvotes::table
                    .filter(upvotes::user_id.eq(user_id))
                    .filter(upvotes::post_id.eq(post_id))
                    .filter(upvotes::value.eq(from.as_i32())),
            )
            .set(upvotes::value.eq(to.as_i32()))
            .execute(conn)
            .await
        }
    }
}

async fn load_vote(
    conn: &mut AsyncPgConnection,
    user_id: &Uuid,
    post_id: &Uuid,
) -> Result<Option<VoteValue>, PostRepositoryError> {
    let stored: Option<i32> = upvotes::table
        .find((user_id, post_id))
        .select(upvotes::value)
        .first(conn)
        .await
        .optional()
        .map_err(|err| map_diesel_error(err, "load vote"))?;
    stored
        .map(vote_from_row)
        .transpose()
        .map_err(PostRepositoryError::query)
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(posts::table)
            .values(&NewPostRow::from(post))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "insert post"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PostRow> = posts::table
            .find(id.as_uuid())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "load post"))?;
        Ok(row.map(Post::from))
    }

    async fn find_entry(
        &self,
        id: &PostId,
        viewer: Option<UserId>,
    ) -> Result<Option<FeedEntry>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(PostRow, UserRow)> = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(id.as_uuid()))
            .select((PostRow::as_select(), UserRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "load post entry"))?;

        let Some((post, creator)) = row else {
            return Ok(None);
        };
        let vote_status = match viewer {
            Some(viewer) => load_vote(&mut conn, viewer.as_uuid(), id.as_uuid()).await?,
            None => None,
        };
        to_entry(post, creator, vote_status).map(Some)
    }

    async fn update_title(
        &self,
        id: &PostId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PostRow> = diesel::update(posts::table.find(id.as_uuid()))
            .set((posts::title.eq(title), posts::updated_at.eq(updated_at)))
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, "update post title"))?;
        Ok(row.map(Post::from))
    }

    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_id = *id.as_uuid();
        let removed = conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::delete(upvotes::table.filter(upvotes::post_id.eq(post_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(posts::table.find(post_id))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(err, "delete post"))?;
        Ok(removed > 0)
    }

    async fn find_vote(
        &self,
        user_id: &UserId,
        post_id: &PostId,
    ) -> Result<Option<VoteValue>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_vote(&mut conn, user_id.as_uuid(), post_id.as_uuid()).await
    }

    async fn apply_vote(
        &self,
        user_id: &UserId,
        post_id: &PostId,
        change: VoteChange,
    ) -> Result<VoteWrite, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let voter = *user_id.as_uuid();
        let target = *post_id.as_uuid();
        let delta = change.points_delta();

        let outcome = conn
            .transaction::<VoteWrite, VoteTxError, _>(|conn| {
                async move {
                    if write_vote_row(conn, voter, target, change).await? == 0 {
                        return Ok(VoteWrite::Conflicted);
                    }
                    let touched = diesel::update(posts::table.find(target))
                        .set(posts::points.eq(posts::points + delta))
                        .execute(conn)
                        .await?;
                    if touched == 0 {
                        return Err(VoteTxError::PostMissing);
                    }
                    Ok(VoteWrite::Applied)
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(write) => {
                debug!(post_id = %target, ?write, delta, "vote transaction finished");
                Ok(write)
            }
            Err(VoteTxError::PostMissing) => {
                Err(PostRepositoryError::post_not_found(target.to_string()))
            }
            Err(VoteTxError::Diesel(err)) => Err(map_failure(
                classify_diesel_error(err, "apply vote"),
                Some(&target),
            )),
        }
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, PostRepositoryError> {
        let fetch = i64::try_from(query.fetch)
            .map_err(|_| PostRepositoryError::query("feed window too large"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut statement = posts::table
            .inner_join(users::table)
            .select((PostRow::as_select(), UserRow::as_select()))
            .order(posts::created_at.desc())
            .limit(fetch)
            .into_boxed();
        if let Some(before) = query.before {
            statement = statement.filter(posts::created_at.lt(before));
        }
        let rows: Vec<(PostRow, UserRow)> = statement
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, "load feed"))?;

        let mut votes: HashMap<Uuid, VoteValue> = HashMap::new();
        if let Some(viewer) = query.viewer.as_ref().filter(|_| !rows.is_empty()) {
            let ids: Vec<Uuid> = rows.iter().map(|(post, _)| post.id).collect();
            let stored: Vec<(Uuid, i32)> = upvotes::table
                .filter(upvotes::user_id.eq(viewer.as_uuid()))
                .filter(upvotes::post_id.eq_any(ids))
                .select((upvotes::post_id, upvotes::value))
                .load(&mut conn)
                .await
                .map_err(|err| map_diesel_error(err, "load feed votes"))?;
            for (post_id, value) in stored {
                votes.insert(
                    post_id,
                    vote_from_row(value).map_err(PostRepositoryError::query)?,
                );
            }
        }

        rows.into_iter()
            .map(|(post, creator)| {
                let vote_status = votes.get(&post.id).copied();
                to_entry(post, creator, vote_status)
            })
            .collect()
    }
}
