//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{EmailAddress, Post, PostId, User, UserId, Username, VoteValue};

use super::schema::{posts, upvotes, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Rebuild the domain user, rejecting rows that break current rules.
    pub fn into_user(self) -> Result<User, String> {
        let username = Username::new(self.username)
            .map_err(|err| format!("stored user {} has invalid username: {err}", self.id))?;
        let email = EmailAddress::new(self.email)
            .map_err(|err| format!("stored user {} has invalid email: {err}", self.id))?;
        Ok(User::new(
            UserId::from_uuid(self.id),
            username,
            email,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub points: i32,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: PostId::from_uuid(row.id),
            title: row.title,
            text: row.text,
            points: row.points,
            creator_id: UserId::from_uuid(row.creator_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Insertable struct for creating post records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub text: &'a str,
    pub points: i32,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Post> for NewPostRow<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            id: *post.id.as_uuid(),
            title: post.title.as_str(),
            text: post.text.as_str(),
            points: post.points,
            creator_id: *post.creator_id.as_uuid(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Insertable struct for first votes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = upvotes)]
pub(crate) struct NewUpvoteRow {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub value: i32,
}

/// Decode a stored vote value.
pub(crate) fn vote_from_row(value: i32) -> Result<VoteValue, String> {
    VoteValue::from_stored(value).ok_or_else(|| format!("stored vote has invalid value {value}"))
}
