//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when the migrations change.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique public handle.
        username -> Varchar,
        /// Unique contact address.
        email -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Forum posts.
    posts (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Post title.
        title -> Varchar,
        /// Post body.
        text -> Text,
        /// Running sum of `upvotes.value` for this post.
        points -> Int4,
        /// Author, references `users.id`.
        creator_id -> Uuid,
        /// Creation timestamp; feed ordering key.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One vote per user per post.
    upvotes (user_id, post_id) {
        /// Voter, references `users.id`.
        user_id -> Uuid,
        /// Target post, references `posts.id` with cascading delete.
        post_id -> Uuid,
        /// Either 1 or -1.
        value -> Int4,
    }
}

diesel::joinable!(posts -> users (creator_id));
diesel::joinable!(upvotes -> posts (post_id));
diesel::joinable!(upvotes -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(posts, upvotes, users);
