//! Content Janitor
//!
//! `delete_post` leaves a post's comments in place. The janitor is the
//! caller-driven step that removes a post together with its comment thread,
//! and sweeps recent posts matching a predicate (e.g. test fixtures).
//!
//! Comments are removed before the post so an interrupted purge never
//! leaves comments pointing at a missing post. Re-running a purge finishes
//! the job.

use crate::error::{FeedError, FeedResult};
use crate::models::{Post, PostId};
use crate::providers::{CommentProvider, PostProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of purging one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub post_id: PostId,
    pub comments_removed: usize,
    /// False when the post was already gone
    pub post_removed: bool,
}

pub struct ContentJanitor {
    posts: Arc<dyn PostProvider>,
    comments: Arc<dyn CommentProvider>,
}

impl ContentJanitor {
    pub fn new(posts: Arc<dyn PostProvider>, comments: Arc<dyn CommentProvider>) -> Self {
        Self { posts, comments }
    }

    /// Delete every comment on `post_id`, then the post itself
    pub async fn purge_post(&self, post_id: &PostId) -> FeedResult<PurgeReport> {
        let thread = self.comments.get_comments_on_post(post_id).await?;
        for comment in &thread {
            self.comments.delete_comment(&comment.id).await?;
        }

        let post_removed = match self.posts.get_post(post_id).await {
            Ok(_) => {
                self.posts.delete_post(post_id).await?;
                true
            }
            Err(FeedError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };

        tracing::info!(
            post_id = %post_id,
            comments_removed = thread.len(),
            post_removed,
            "Post purged"
        );

        Ok(PurgeReport {
            post_id: post_id.clone(),
            comments_removed: thread.len(),
            post_removed,
        })
    }

    /// Purge each of the `scan_limit` most recent posts accepted by `predicate`
    pub async fn purge_matching<P>(&self, scan_limit: usize, predicate: P) -> FeedResult<Vec<PurgeReport>>
    where
        P: Fn(&Post) -> bool + Send + Sync,
    {
        let started = Instant::now();
        let candidates = self.posts.get_posts(scan_limit).await?;

        let mut reports = Vec::new();
        for post in candidates.iter().filter(|post| predicate(post)) {
            reports.push(self.purge_post(&post.id).await?);
        }

        tracing::info!(
            scanned = candidates.len(),
            purged = reports.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Content sweep completed"
        );

        Ok(reports)
    }
}
