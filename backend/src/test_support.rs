//! In-memory adapters and helpers shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature so the
//! `tests/` suites can drive real services without PostgreSQL or Redis.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    FeedQuery, NotifierError, PasswordHasher, PasswordHasherError, PasswordResetNotifier,
    PostRepository, PostRepositoryError, ResetTokenStore, ResetTokenStoreError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    AccountLookup, EmailAddress, FeedEntry, NewAccount, PasswordHash, PlainPassword, Post, PostId,
    ResetToken, User, UserAccount, UserId, Username, VoteChange, VoteValue, VoteWrite,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let delta = TimeDelta::from_std(delta).unwrap_or(TimeDelta::MAX);
        let mut now = lock(&self.0);
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

#[derive(Default)]
struct ForumState {
    users: HashMap<UserId, UserAccount>,
    posts: HashMap<PostId, Post>,
    votes: HashMap<(UserId, PostId), VoteValue>,
}

impl ForumState {
    fn entry(&self, post: &Post, viewer: Option<&UserId>) -> Option<FeedEntry> {
        let creator = self.users.get(&post.creator_id)?.user.clone();
        let vote_status =
            viewer.and_then(|viewer| self.votes.get(&(viewer.clone(), post.id)).copied());
        Some(FeedEntry {
            post: post.clone(),
            creator,
            vote_status,
        })
    }
}

/// Users, posts and votes behind one lock.
///
/// Every port call takes the lock once, so vote writes and point updates are
/// atomic with respect to each other just as they are inside a database
/// transaction.
#[derive(Default)]
pub struct InMemoryForumStore {
    state: Mutex<ForumState>,
}

impl InMemoryForumStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing uniqueness checks.
    pub fn seed_user(&self, username: &str, password_hash: &str) -> User {
        let now = Utc::now();
        let user = User::new(
            UserId::random(),
            Username::new(username).unwrap_or_else(|err| panic!("seed username: {err}")),
            EmailAddress::new(format!("{username}@example.com"))
                .unwrap_or_else(|err| panic!("seed email: {err}")),
            now,
            now,
        );
        lock(&self.state).users.insert(
            user.id().clone(),
            UserAccount {
                user: user.clone(),
                password_hash: PasswordHash::new(password_hash),
            },
        );
        user
    }

    /// Insert a post directly with the given creation time.
    pub fn seed_post(&self, creator: &User, title: &str, created_at: DateTime<Utc>) -> Post {
        let post = Post {
            id: PostId::random(),
            title: title.to_owned(),
            text: format!("{title} body"),
            points: 0,
            creator_id: creator.id().clone(),
            created_at,
            updated_at: created_at,
        };
        lock(&self.state).posts.insert(post.id, post.clone());
        post
    }

    /// Current points of a post.
    pub fn points(&self, id: &PostId) -> Option<i32> {
        lock(&self.state).posts.get(id).map(|post| post.points)
    }

    /// Sum of recorded vote values for a post.
    pub fn vote_sum(&self, id: &PostId) -> i32 {
        lock(&self.state)
            .votes
            .iter()
            .filter(|((_, post_id), _)| post_id == id)
            .map(|(_, value)| value.as_i32())
            .sum()
    }

    /// Number of vote rows for a post.
    pub fn vote_count(&self, id: &PostId) -> usize {
        lock(&self.state)
            .votes
            .keys()
            .filter(|(_, post_id)| post_id == id)
            .count()
    }

    /// Stored password digest for a user.
    pub fn password_hash(&self, id: &UserId) -> Option<PasswordHash> {
        lock(&self.state)
            .users
            .get(id)
            .map(|account| account.password_hash.clone())
    }

    /// Remove a user, leaving their posts in place.
    pub fn remove_user(&self, id: &UserId) {
        lock(&self.state).users.remove(id);
    }

    /// Number of stored posts.
    pub fn post_count(&self) -> usize {
        lock(&self.state).posts.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryForumStore {
    async fn create(&self, account: &NewAccount) -> Result<User, UserPersistenceError> {
        let mut state = lock(&self.state);
        let clash = |pick: fn(&User) -> &str| {
            state
                .users
                .values()
                .any(|existing| pick(&existing.user) == pick(&account.user))
        };
        if clash(|user| user.username().as_ref()) {
            return Err(UserPersistenceError::duplicate_username());
        }
        if clash(|user| user.email().as_ref()) {
            return Err(UserPersistenceError::duplicate_email());
        }
        state.users.insert(
            account.user.id().clone(),
            UserAccount {
                user: account.user.clone(),
                password_hash: account.password_hash.clone(),
            },
        );
        Ok(account.user.clone())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.state)
            .users
            .get(id)
            .map(|account| account.user.clone()))
    }

    async fn find_by_lookup(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = lock(&self.state);
        let found = state.users.values().find(|account| match lookup {
            AccountLookup::Email(email) => account.user.email().as_ref() == email,
            AccountLookup::Username(name) => account.user.username().as_ref() == name,
        });
        Ok(found.cloned())
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
        _updated_at: DateTime<Utc>,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = lock(&self.state);
        let Some(account) = state.users.get_mut(id) else {
            return Ok(false);
        };
        account.password_hash = hash.clone();
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for InMemoryForumStore {
    async fn insert(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut state = lock(&self.state);
        if !state.users.contains_key(&post.creator_id) {
            return Err(PostRepositoryError::query("creator does not exist"));
        }
        state.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        Ok(lock(&self.state).posts.get(id).cloned())
    }

    async fn find_entry(
        &self,
        id: &PostId,
        viewer: Option<UserId>,
    ) -> Result<Option<FeedEntry>, PostRepositoryError> {
        let state = lock(&self.state);
        Ok(state
            .posts
            .get(id)
            .and_then(|post| state.entry(post, viewer.as_ref())))
    }

    async fn update_title(
        &self,
        id: &PostId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut state = lock(&self.state);
        Ok(state.posts.get_mut(id).map(|post| {
            title.clone_into(&mut post.title);
            post.updated_at = updated_at;
            post.clone()
        }))
    }

    async fn delete(&self, id: &PostId) -> Result<bool, PostRepositoryError> {
        let mut state = lock(&self.state);
        state.votes.retain(|(_, post_id), _| post_id != id);
        Ok(state.posts.remove(id).is_some())
    }

    async fn find_vote(
        &self,
        user_id: &UserId,
        post_id: &PostId,
    ) -> Result<Option<VoteValue>, PostRepositoryError> {
        Ok(lock(&self.state)
            .votes
            .get(&(user_id.clone(), *post_id))
            .copied())
    }

    async fn apply_vote(
        &self,
        user_id: &UserId,
        post_id: &PostId,
        change: VoteChange,
    ) -> Result<VoteWrite, PostRepositoryError> {
        let mut state = lock(&self.state);
        if !state.posts.contains_key(post_id) {
            return Err(PostRepositoryError::post_not_found(post_id.to_string()));
        }
        let key = (user_id.clone(), *post_id);
        let current = state.votes.get(&key).copied();
        let guard_holds = match change {
            VoteChange::Cast { .. } => current.is_none(),
            VoteChange::Flip { from, .. } => current == Some(from),
        };
        if !guard_holds {
            return Ok(VoteWrite::Conflicted);
        }
        state.votes.insert(key, change.target());
        if let Some(post) = state.posts.get_mut(post_id) {
            post.points += change.points_delta();
        }
        Ok(VoteWrite::Applied)
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedEntry>, PostRepositoryError> {
        let state = lock(&self.state);
        let mut posts: Vec<&Post> = state
            .posts
            .values()
            .filter(|post| query.before.is_none_or(|before| post.created_at < before))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts
            .into_iter()
            .filter_map(|post| state.entry(post, query.viewer.as_ref()))
            .take(query.fetch)
            .collect())
    }
}

/// Reset token store with clock-driven expiry.
pub struct InMemoryResetTokenStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (UserId, DateTime<Utc>)>>,
}

impl InMemoryResetTokenStore {
    /// Empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stored keys, which are token digests.
    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }
}

#[async_trait]
impl ResetTokenStore for InMemoryResetTokenStore {
    async fn save(
        &self,
        token: &ResetToken,
        user_id: &UserId,
        ttl: Duration,
    ) -> Result<(), ResetTokenStoreError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|err| ResetTokenStoreError::backend(err.to_string()))?;
        let expires_at = self.clock.utc() + ttl;
        lock(&self.entries).insert(token.digest(), (user_id.clone(), expires_at));
        Ok(())
    }

    async fn consume(&self, token: &ResetToken) -> Result<Option<UserId>, ResetTokenStoreError> {
        let now = self.clock.utc();
        Ok(lock(&self.entries)
            .remove(&token.digest())
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(user_id, _)| user_id))
    }
}

/// Notifier that records every reset link it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(EmailAddress, String)>>,
}

impl RecordingNotifier {
    /// Recorded `(recipient, token)` pairs.
    pub fn sent(&self) -> Vec<(EmailAddress, String)> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl PasswordResetNotifier for RecordingNotifier {
    async fn send_reset_link(
        &self,
        email: &EmailAddress,
        token: &ResetToken,
    ) -> Result<(), NotifierError> {
        lock(&self.sent).push((email.clone(), token.expose().to_owned()));
        Ok(())
    }
}

/// Fast, reversible hasher for tests. Never use outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextHasher;

impl PlainTextHasher {
    /// Digest this hasher produces for `password`.
    pub fn digest_of(password: &str) -> String {
        format!("plain${password}")
    }
}

#[async_trait]
impl PasswordHasher for PlainTextHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordHash, PasswordHasherError> {
        Ok(PasswordHash::new(Self::digest_of(password.expose())))
    }

    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hash.as_ref() == Self::digest_of(password.expose()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use key_file::TempKeyFile;

#[cfg(any(test, feature = "test-support"))]
mod key_file {
    //! Session key files for configuration tests.

    use std::io::Write;
    use std::path::Path;

    use tempfile::NamedTempFile;

    /// Temporary session key file removed on drop.
    pub struct TempKeyFile {
        file: NamedTempFile,
    }

    impl TempKeyFile {
        /// Create a key file holding `len` bytes of filler.
        ///
        /// # Errors
        ///
        /// Returns an IO error if the file cannot be created or written.
        pub fn new(len: usize) -> std::io::Result<Self> {
            let mut file = NamedTempFile::new()?;
            file.write_all(&vec![b'k'; len])?;
            file.flush()?;
            Ok(Self { file })
        }

        /// Path of the key file.
        pub fn path(&self) -> &Path {
            self.file.path()
        }

        /// Path rendered for environment variables.
        pub fn path_str(&self) -> String {
            self.file.path().to_string_lossy().into_owned()
        }
    }
}
