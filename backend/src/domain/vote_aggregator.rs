//! Vote aggregation: records a user's vote and keeps post points in step.
//!
//! The decision (cast, flip or no-op) is made from a fresh read of the
//! user's vote. The repository applies it with a guarded write, so a
//! concurrent writer turns into [`VoteWrite::Conflicted`] and the decision is
//! made again from the new state. Points are therefore never adjusted twice
//! for the same transition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::post_service::map_post_repository_error;
use crate::domain::ports::{PostRepository, VoteCommand};
use crate::domain::{Error, PostId, RequestContext, VoteChange, VoteValue, VoteWrite};

/// Number of read-decide-write rounds before giving up on a contended vote.
pub const MAX_VOTE_ATTEMPTS: usize = 3;

/// Pick the vote mutation for a requested value given the stored one.
///
/// Returns `None` when the stored vote already has the requested sign.
///
/// # Examples
/// ```
/// use forum_backend::domain::{VoteChange, VoteValue, plan_vote};
///
/// assert_eq!(plan_vote(Some(VoteValue::Up), VoteValue::Up), None);
/// assert_eq!(
///     plan_vote(None, VoteValue::Down),
///     Some(VoteChange::Cast { value: VoteValue::Down })
/// );
/// ```
pub fn plan_vote(existing: Option<VoteValue>, requested: VoteValue) -> Option<VoteChange> {
    match existing {
        None => Some(VoteChange::Cast { value: requested }),
        Some(current) if current == requested => None,
        Some(current) => Some(VoteChange::Flip {
            from: current,
            to: requested,
        }),
    }
}

/// Vote service implementing [`VoteCommand`].
#[derive(Clone)]
pub struct VoteAggregator<R> {
    repo: Arc<R>,
}

impl<R> VoteAggregator<R> {
    /// Create a new aggregator over the given repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> VoteCommand for VoteAggregator<R>
where
    R: PostRepository,
{
    async fn cast_vote(
        &self,
        ctx: &RequestContext,
        post_id: &PostId,
        raw: i32,
    ) -> Result<bool, Error> {
        let user_id = ctx.require_user()?;
        let requested = VoteValue::from_raw(raw);

        for attempt in 1..=MAX_VOTE_ATTEMPTS {
            let existing = self
                .repo
                .find_vote(user_id, post_id)
                .await
                .map_err(map_post_repository_error)?;
            let Some(change) = plan_vote(existing, requested) else {
                debug!(%post_id, %user_id, "vote unchanged");
                return Ok(false);
            };

            match self
                .repo
                .apply_vote(user_id, post_id, change)
                .await
                .map_err(map_post_repository_error)?
            {
                VoteWrite::Applied => {
                    info!(
                        %post_id,
                        %user_id,
                        delta = change.points_delta(),
                        "vote applied"
                    );
                    return Ok(true);
                }
                VoteWrite::Conflicted => {
                    debug!(%post_id, %user_id, attempt, "vote write raced; re-reading");
                }
            }
        }

        warn!(%post_id, %user_id, "vote abandoned after repeated conflicts");
        Err(Error::conflict("vote was modified concurrently; please retry"))
    }
}

#[cfg(test)]
#[path = "vote_aggregator_tests.rs"]
mod tests;
