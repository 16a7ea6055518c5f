/// Provider interfaces exposed to callers (UI layer, CLI, tests)
///
/// Each provider covers one entity type. The store-backed implementations
/// live in [`crate::services`]; any other backing store only needs to
/// implement these traits.
use crate::error::FeedResult;
use crate::models::{Comment, CommentId, Post, PostId, User, UserId};
use async_trait::async_trait;

/// Posts: CRUD, feeds and downvotes
#[async_trait]
pub trait PostProvider: Send + Sync {
    /// The `n` most recently created posts, newest first. Returns fewer when
    /// fewer exist.
    async fn get_posts(&self, n: usize) -> FeedResult<Vec<Post>>;

    /// A single post; `NotFound` when absent
    async fn get_post(&self, id: &PostId) -> FeedResult<Post>;

    /// Every post authored by `user_id`, newest first
    async fn get_posts_by_user(&self, user_id: &UserId) -> FeedResult<Vec<Post>>;

    /// Create a post authored by the logged-in user
    async fn add_post(&self, text: &str) -> FeedResult<Post>;

    /// Atomically decrement the post's downvote counter by one
    async fn downvote_post(&self, id: &PostId) -> FeedResult<Post>;

    /// Remove a post. Deleting an absent post succeeds. Comments on the post
    /// are left in place (see `ContentJanitor::purge_post`).
    async fn delete_post(&self, id: &PostId) -> FeedResult<()>;
}

/// Comments: CRUD and per-post / per-user threads
#[async_trait]
pub trait CommentProvider: Send + Sync {
    /// Create a comment on `post_id` authored by the logged-in user.
    /// The post's existence is not checked.
    async fn add_comment(&self, text: &str, post_id: &PostId) -> FeedResult<Comment>;

    /// A single comment; `NotFound` when absent
    async fn get_comment(&self, id: &CommentId) -> FeedResult<Comment>;

    /// Every comment on `post_id`, in creation order (oldest first)
    async fn get_comments_on_post(&self, post_id: &PostId) -> FeedResult<Vec<Comment>>;

    /// Every comment authored by `user_id`, in creation order (oldest first)
    async fn get_comments_by_user(&self, user_id: &UserId) -> FeedResult<Vec<Comment>>;

    /// Remove a comment. Deleting an absent comment succeeds.
    async fn delete_comment(&self, id: &CommentId) -> FeedResult<()>;
}

/// Users: session lookup and profile reads
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// The user behind the current session; `NotAuthenticated` without one
    async fn get_logged_in_user(&self) -> FeedResult<User>;

    /// A user by id; `NotFound` when absent
    async fn get_user(&self, id: &UserId) -> FeedResult<User>;
}
