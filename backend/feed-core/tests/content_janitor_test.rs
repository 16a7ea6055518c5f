//! Integration Tests: Content Janitor
//!
//! Mirrors the fixture teardown a test harness runs after seeding the feed:
//! sweep recent posts carrying a marker, removing their comment threads.

mod common;

use common::as_user;
use feed_core::models::UserId;
use feed_core::{CommentProvider, PostProvider, UserProvider};
use feed_store::{MemoryStore, SharedStore};
use std::sync::Arc;

const FAKE_MARKER: &str = "[fixture]";

#[tokio::test]
async fn test_sweep_removes_fixtures_and_their_threads() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let alice = as_user(store.clone(), "alice").await;
    let bob = as_user(store.clone(), "bob").await;

    let real = alice.posts.add_post("a real post").await.unwrap();
    let real_reply = bob.comments.add_comment("real reply", &real.id).await.unwrap();

    let mut fixtures = Vec::new();
    for i in 0..3 {
        let post = alice
            .posts
            .add_post(&format!("{} post {}", FAKE_MARKER, i))
            .await
            .unwrap();
        bob.comments
            .add_comment(&format!("{} reply", FAKE_MARKER), &post.id)
            .await
            .unwrap();
        fixtures.push(post);
    }

    let reports = alice
        .janitor()
        .purge_matching(50, |post| post.text.contains(FAKE_MARKER))
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.post_removed && r.comments_removed == 1));

    assert_eq!(alice.posts.get_posts(50).await.unwrap(), vec![real.clone()]);
    for post in &fixtures {
        assert!(bob.comments.get_comments_on_post(&post.id).await.unwrap().is_empty());
    }
    assert_eq!(
        bob.comments.get_comments_on_post(&real.id).await.unwrap(),
        vec![real_reply]
    );

    let alice_record = bob.users.get_user(&UserId::new("alice")).await.unwrap();
    assert_eq!(alice_record.post_count, 1);
    let bob_record = bob.users.get_logged_in_user().await.unwrap();
    assert_eq!(bob_record.comment_count, 1);
}

#[tokio::test]
async fn test_sweep_only_scans_recent_posts() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let client = as_user(store, "alice").await;

    let oldest = client
        .posts
        .add_post(&format!("{} oldest", FAKE_MARKER))
        .await
        .unwrap();
    for i in 0..3 {
        client
            .posts
            .add_post(&format!("{} {}", FAKE_MARKER, i))
            .await
            .unwrap();
    }

    let reports = client
        .janitor()
        .purge_matching(3, |post| post.text.contains(FAKE_MARKER))
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(client.posts.get_posts(10).await.unwrap(), vec![oldest]);
}

#[tokio::test]
async fn test_purge_is_idempotent() {
    let client = as_user(Arc::new(MemoryStore::new()), "alice").await;
    let post = client.posts.add_post("doomed").await.unwrap();
    client.comments.add_comment("one", &post.id).await.unwrap();

    let janitor = client.janitor();
    let first = janitor.purge_post(&post.id).await.unwrap();
    let second = janitor.purge_post(&post.id).await.unwrap();

    assert_eq!((first.comments_removed, first.post_removed), (1, true));
    assert_eq!((second.comments_removed, second.post_removed), (0, false));
}
