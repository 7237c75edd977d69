//! Tests for the vote aggregator.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockPostRepository, PostRepositoryError};
use crate::domain::{ErrorCode, Post, User, UserId};
use crate::test_support::InMemoryForumStore;

struct World {
    store: Arc<InMemoryForumStore>,
    aggregator: VoteAggregator<InMemoryForumStore>,
    author: User,
    post: Post,
}

#[fixture]
fn world() -> World {
    let store = Arc::new(InMemoryForumStore::new());
    let author = store.seed_user("author1", "x");
    let post = store.seed_post(&author, "hello", Utc::now());
    World {
        aggregator: VoteAggregator::new(Arc::clone(&store)),
        store,
        author,
        post,
    }
}

fn as_user(user: &User) -> RequestContext {
    RequestContext::authenticated(user.id().clone())
}

impl World {
    fn assert_points_match_votes(&self) {
        assert_eq!(
            self.store.points(&self.post.id),
            Some(self.store.vote_sum(&self.post.id))
        );
    }
}

#[rstest]
#[case(1, 1)]
#[case(-1, -1)]
#[case(0, 1)]
#[case(42, 1)]
#[tokio::test]
async fn first_vote_adjusts_points_by_value(
    world: World,
    #[case] raw: i32,
    #[case] expected_points: i32,
) {
    let applied = world
        .aggregator
        .cast_vote(&as_user(&world.author), &world.post.id, raw)
        .await
        .expect("vote succeeds");

    assert!(applied);
    assert_eq!(world.store.points(&world.post.id), Some(expected_points));
    assert_eq!(world.store.vote_count(&world.post.id), 1);
}

#[rstest]
#[tokio::test]
async fn repeating_a_vote_is_a_no_op(world: World) {
    let ctx = as_user(&world.author);
    assert!(
        world
            .aggregator
            .cast_vote(&ctx, &world.post.id, 1)
            .await
            .expect("first vote")
    );

    let repeated = world
        .aggregator
        .cast_vote(&ctx, &world.post.id, 1)
        .await
        .expect("second vote");

    assert!(!repeated);
    assert_eq!(world.store.points(&world.post.id), Some(1));
    assert_eq!(world.store.vote_count(&world.post.id), 1);
}

#[rstest]
#[tokio::test]
async fn flipping_a_vote_moves_points_by_two(world: World) {
    let ctx = as_user(&world.author);
    world
        .aggregator
        .cast_vote(&ctx, &world.post.id, 1)
        .await
        .expect("upvote");

    let flipped = world
        .aggregator
        .cast_vote(&ctx, &world.post.id, -1)
        .await
        .expect("downvote");

    assert!(flipped);
    assert_eq!(world.store.points(&world.post.id), Some(-1));
    assert_eq!(world.store.vote_count(&world.post.id), 1);
    let stored = world
        .store
        .find_vote(world.author.id(), &world.post.id)
        .await
        .expect("vote lookup");
    assert_eq!(stored, Some(VoteValue::Down));
}

#[rstest]
#[tokio::test]
async fn mixed_sequences_keep_points_equal_to_vote_sum(world: World) {
    let voters: Vec<User> = (0..4)
        .map(|n| world.store.seed_user(&format!("voter-{n}"), "x"))
        .collect();
    let sequence = [(0, 1), (1, -1), (0, -1), (2, 1), (1, -1), (3, 5), (2, -1), (0, 1)];

    for (voter, raw) in sequence {
        let ctx = as_user(voters.get(voter).expect("voter exists"));
        world
            .aggregator
            .cast_vote(&ctx, &world.post.id, raw)
            .await
            .expect("vote");
        world.assert_points_match_votes();
    }

    assert_eq!(world.store.points(&world.post.id), Some(0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_votes_preserve_points_invariant(world: World) {
    let voters: Vec<User> = (0..8)
        .map(|n| world.store.seed_user(&format!("racer-{n}"), "x"))
        .collect();

    let aggregator = Arc::new(VoteAggregator::new(Arc::clone(&world.store)));
    let mut tasks = Vec::new();
    for voter in &voters {
        for raw in [1, -1, 1] {
            let aggregator = Arc::clone(&aggregator);
            let ctx = as_user(voter);
            let post_id = world.post.id;
            tasks.push(tokio::spawn(async move {
                aggregator.cast_vote(&ctx, &post_id, raw).await
            }));
        }
    }

    for result in join_all(tasks).await {
        result.expect("task joins").expect("vote succeeds");
    }

    world.assert_points_match_votes();
    assert_eq!(world.store.vote_count(&world.post.id), voters.len());
}

#[rstest]
#[tokio::test]
async fn anonymous_votes_are_rejected_without_side_effects(world: World) {
    let err = world
        .aggregator
        .cast_vote(&RequestContext::anonymous(), &world.post.id, 1)
        .await
        .expect_err("anonymous");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(world.store.points(&world.post.id), Some(0));
    assert_eq!(world.store.vote_count(&world.post.id), 0);
}

#[rstest]
#[tokio::test]
async fn voting_on_missing_post_is_not_found(world: World) {
    let err = world
        .aggregator
        .cast_vote(&as_user(&world.author), &PostId::random(), 1)
        .await
        .expect_err("missing post");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn conflicted_write_is_re_decided_from_fresh_state() {
    let mut repo = MockPostRepository::new();
    let mut reads = vec![None, Some(VoteValue::Up)].into_iter();
    repo.expect_find_vote()
        .times(2)
        .returning(move |_, _| Ok(reads.next().flatten()));
    repo.expect_apply_vote()
        .withf(|_, _, change| *change == VoteChange::Cast { value: VoteValue::Up })
        .times(1)
        .returning(|_, _, _| Ok(VoteWrite::Conflicted));

    let aggregator = VoteAggregator::new(Arc::new(repo));
    let applied = aggregator
        .cast_vote(
            &RequestContext::authenticated(UserId::random()),
            &PostId::random(),
            1,
        )
        .await
        .expect("second read settles the vote");

    assert!(!applied, "racing writer already cast the same vote");
}

#[tokio::test]
async fn persistent_conflicts_surface_as_conflict() {
    let mut repo = MockPostRepository::new();
    repo.expect_find_vote()
        .times(MAX_VOTE_ATTEMPTS)
        .returning(|_, _| Ok(None));
    repo.expect_apply_vote()
        .times(MAX_VOTE_ATTEMPTS)
        .returning(|_, _, _| Ok(VoteWrite::Conflicted));

    let aggregator = VoteAggregator::new(Arc::new(repo));
    let err = aggregator
        .cast_vote(
            &RequestContext::authenticated(UserId::random()),
            &PostId::random(),
            1,
        )
        .await
        .expect_err("never settles");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(PostRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(PostRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[tokio::test]
async fn repository_failures_are_mapped(
    #[case] failure: PostRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockPostRepository::new();
    repo.expect_find_vote()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let aggregator = VoteAggregator::new(Arc::new(repo));
    let err = aggregator
        .cast_vote(
            &RequestContext::authenticated(UserId::random()),
            &PostId::random(),
            -1,
        )
        .await
        .expect_err("repository failed");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[case(None, VoteValue::Up, Some(VoteChange::Cast { value: VoteValue::Up }))]
#[case(Some(VoteValue::Down), VoteValue::Down, None)]
#[case(
    Some(VoteValue::Down),
    VoteValue::Up,
    Some(VoteChange::Flip { from: VoteValue::Down, to: VoteValue::Up })
)]
fn plan_covers_every_transition(
    #[case] existing: Option<VoteValue>,
    #[case] requested: VoteValue,
    #[case] expected: Option<VoteChange>,
) {
    assert_eq!(plan_vote(existing, requested), expected);
}
