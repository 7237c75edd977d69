//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see driving ports, so
//! they can be exercised against fixtures or in-memory adapters.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, AccountQuery, FixtureAccountCommand, FixtureAccountQuery, FixturePostCommand,
    FixturePostQuery, FixtureVoteCommand, PostCommand, PostQuery, VoteCommand,
};

/// Driving ports used by the HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration, login and password reset.
    pub accounts: Arc<dyn AccountCommand>,
    /// Session user lookup.
    pub account_query: Arc<dyn AccountQuery>,
    /// Post creation, retitling and deletion.
    pub posts: Arc<dyn PostCommand>,
    /// Feed and single-post reads.
    pub feed: Arc<dyn PostQuery>,
    /// Vote casting.
    pub votes: Arc<dyn VoteCommand>,
}

impl HttpState {
    /// State backed entirely by fixture ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use forum_backend::domain::ports::FixtureVoteCommand;
    /// use forum_backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::fixtures().with_votes(Arc::new(FixtureVoteCommand));
    /// let _votes = state.votes.clone();
    /// ```
    pub fn fixtures() -> Self {
        Self {
            accounts: Arc::new(FixtureAccountCommand),
            account_query: Arc::new(FixtureAccountQuery),
            posts: Arc::new(FixturePostCommand),
            feed: Arc::new(FixturePostQuery),
            votes: Arc::new(FixtureVoteCommand),
        }
    }

    /// Replace the account command port.
    pub fn with_accounts(mut self, accounts: Arc<dyn AccountCommand>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Replace the account query port.
    pub fn with_account_query(mut self, account_query: Arc<dyn AccountQuery>) -> Self {
        self.account_query = account_query;
        self
    }

    /// Replace the post command port.
    pub fn with_posts(mut self, posts: Arc<dyn PostCommand>) -> Self {
        self.posts = posts;
        self
    }

    /// Replace the feed port.
    pub fn with_feed(mut self, feed: Arc<dyn PostQuery>) -> Self {
        self.feed = feed;
        self
    }

    /// Replace the vote port.
    pub fn with_votes(mut self, votes: Arc<dyn VoteCommand>) -> Self {
        self.votes = votes;
        self
    }
}
