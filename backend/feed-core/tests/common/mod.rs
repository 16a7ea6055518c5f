#![allow(dead_code)]

pub mod scripted_store;

use feed_core::config::ContentConfig;
use feed_core::models::UserId;
use feed_core::{FeedClient, SessionContext};
use feed_store::{MemoryStore, SharedStore};
use std::sync::Arc;

/// Client over a fresh in-memory store, acting as `user`, with `user`
/// already registered.
pub async fn memory_client(user: &str) -> FeedClient {
    client_over(Arc::new(MemoryStore::new()), user, &ContentConfig::default()).await
}

pub async fn client_over(store: SharedStore, user: &str, content: &ContentConfig) -> FeedClient {
    let client = FeedClient::new(store, SessionContext::authenticated(user), content);
    client
        .users
        .register_user(&UserId::new(user), user)
        .await
        .expect("register session user");
    client
}

/// A second client over the same store, acting as a different user
pub async fn as_user(store: SharedStore, user: &str) -> FeedClient {
    client_over(store, user, &ContentConfig::default()).await
}

pub fn texts<T, F: Fn(&T) -> &str>(items: &[T], text: F) -> Vec<String> {
    items.iter().map(|item| text(item).to_string()).collect()
}
