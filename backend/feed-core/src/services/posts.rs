/// Post service - feeds, post creation, downvotes and deletion
use super::validation::validate_text;
use super::{adjust_user_counter, compensate};
use crate::config::ContentConfig;
use crate::error::{FeedError, FeedResult};
use crate::models::{
    collections::POSTS,
    fields::{AUTHOR_ID, DOWNVOTES, POST_COUNT, TOTAL_VOTES},
    NewPost, Post, PostId, UserId,
};
use crate::providers::{PostProvider, UserProvider};
use async_trait::async_trait;
use chrono::Utc;
use feed_store::{encode_fields, Document, SharedStore, StoreError};
use resilience::{with_retry_if, RetryConfig};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PostService {
    store: SharedStore,
    users: Arc<dyn UserProvider>,
    max_text_chars: usize,
    downvote_retry: RetryConfig,
}

impl PostService {
    pub fn new(store: SharedStore, users: Arc<dyn UserProvider>, content: &ContentConfig) -> Self {
        Self {
            store,
            users,
            max_text_chars: content.max_text_chars,
            downvote_retry: content.downvote_retry(),
        }
    }

    fn newest_first(docs: Vec<Document>) -> FeedResult<Vec<Post>> {
        docs.iter()
            .rev()
            .map(|doc| doc.decode().map_err(FeedError::from))
            .collect()
    }

    async fn restore_post_count(&self, author_id: &UserId) {
        compensate(
            "restore post count",
            adjust_user_counter(self.store.as_ref(), author_id, POST_COUNT, 1),
        )
        .await;
    }
}

#[async_trait]
impl PostProvider for PostService {
    async fn get_posts(&self, n: usize) -> FeedResult<Vec<Post>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let docs = self.store.list_ordered_by_insertion(POSTS, Some(n)).await?;
        debug!(requested = n, returned = docs.len(), "Fetched feed");
        Self::newest_first(docs)
    }

    async fn get_post(&self, id: &PostId) -> FeedResult<Post> {
        let doc = self.store.read(POSTS, id.as_str()).await?;
        Ok(doc.decode()?)
    }

    async fn get_posts_by_user(&self, user_id: &UserId) -> FeedResult<Vec<Post>> {
        let docs = self
            .store
            .list_where_equals(POSTS, AUTHOR_ID, &Value::String(user_id.to_string()))
            .await?;
        debug!(user_id = %user_id, count = docs.len(), "Fetched posts by user");
        Self::newest_first(docs)
    }

    async fn add_post(&self, text: &str) -> FeedResult<Post> {
        validate_text(text, self.max_text_chars)?;
        let author = self.users.get_logged_in_user().await?;

        let fields = encode_fields(&NewPost {
            text,
            author_id: &author.id,
            downvotes: 0,
            created_at: Utc::now(),
        })?;
        let doc = self.store.create_with_generated_id(POSTS, fields).await?;

        if let Err(e) = adjust_user_counter(self.store.as_ref(), &author.id, POST_COUNT, 1).await {
            warn!(post_id = %doc.id, error = %e, "Author counter update failed, removing post");
            compensate("remove new post", self.store.delete(POSTS, &doc.id)).await;
            return Err(e.into());
        }

        info!(post_id = %doc.id, author_id = %author.id, "Post created");
        Ok(doc.decode()?)
    }

    async fn downvote_post(&self, id: &PostId) -> FeedResult<Post> {
        let store = self.store.as_ref();
        let doc = with_retry_if(self.downvote_retry.clone(), StoreError::is_conflict, move || {
            store.atomic_adjust_counter(POSTS, id.as_str(), DOWNVOTES, -1)
        })
        .await
        .map_err(|e| FeedError::from(e.into_inner()))?;

        let post: Post = doc.decode()?;

        match adjust_user_counter(store, &post.author_id, TOTAL_VOTES, 1).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                warn!(post_id = %id, author_id = %post.author_id, "Post author has no user record");
            }
            Err(e) => {
                warn!(post_id = %id, error = %e, "Author counter update failed, reverting downvote");
                compensate(
                    "revert downvote",
                    store.atomic_adjust_counter(POSTS, id.as_str(), DOWNVOTES, 1),
                )
                .await;
                return Err(e.into());
            }
        }

        info!(post_id = %id, downvotes = post.downvotes, "Post downvoted");
        Ok(post)
    }

    async fn delete_post(&self, id: &PostId) -> FeedResult<()> {
        let doc = match self.store.read(POSTS, id.as_str()).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                debug!(post_id = %id, "Post already absent");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let author_id = doc.decode::<Post>()?.author_id;

        let decremented =
            match adjust_user_counter(self.store.as_ref(), &author_id, POST_COUNT, -1).await {
                Ok(_) => true,
                Err(e) if e.is_not_found() => false,
                Err(e) => return Err(e.into()),
            };

        match self.store.delete(POSTS, id.as_str()).await {
            Ok(true) => {
                info!(post_id = %id, "Post deleted");
                Ok(())
            }
            Ok(false) => {
                // Removed concurrently; the other deleter owns the counter update
                if decremented {
                    self.restore_post_count(&author_id).await;
                }
                debug!(post_id = %id, "Post removed concurrently");
                Ok(())
            }
            Err(e) => {
                warn!(post_id = %id, error = %e, "Post delete failed");
                if decremented {
                    self.restore_post_count(&author_id).await;
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::UserService;
    use crate::session::SessionContext;
    use feed_store::MemoryStore;

    async fn setup(session: SessionContext) -> (PostService, Arc<UserService>) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let users = Arc::new(UserService::new(store.clone(), session));
        users
            .register_user(&UserId::new("author"), "Author")
            .await
            .unwrap();
        let posts = PostService::new(store, users.clone(), &ContentConfig::default());
        (posts, users)
    }

    #[tokio::test]
    async fn test_add_post_requires_session() {
        let (posts, _) = setup(SessionContext::anonymous()).await;
        let err = posts.add_post("hello").await.unwrap_err();
        assert!(matches!(err, FeedError::NotAuthenticated));
        assert!(posts.get_posts(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_post_validates_before_session() {
        let (posts, _) = setup(SessionContext::anonymous()).await;
        let err = posts.add_post("   ").await.unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_post_bumps_author_count() {
        let (posts, users) = setup(SessionContext::authenticated("author")).await;

        let post = posts.add_post("first").await.unwrap();
        assert_eq!(post.downvotes, 0);
        assert_eq!(post.author_id, UserId::new("author"));

        let author = users.get_logged_in_user().await.unwrap();
        assert_eq!(author.post_count, 1);
    }

    #[tokio::test]
    async fn test_downvote_credits_author() {
        let (posts, users) = setup(SessionContext::authenticated("author")).await;
        let post = posts.add_post("controversial").await.unwrap();

        let voted = posts.downvote_post(&post.id).await.unwrap();
        assert_eq!(voted.downvotes, post.downvotes - 1);

        let author = users.get_logged_in_user().await.unwrap();
        assert_eq!(author.total_votes, 1);
    }

    #[tokio::test]
    async fn test_downvote_missing_post() {
        let (posts, _) = setup(SessionContext::authenticated("author")).await;
        let err = posts.downvote_post(&PostId::new("missing")).await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_restores_author_count() {
        let (posts, users) = setup(SessionContext::authenticated("author")).await;
        let post = posts.add_post("short-lived").await.unwrap();

        posts.delete_post(&post.id).await.unwrap();
        posts.delete_post(&post.id).await.unwrap();

        let author = users.get_logged_in_user().await.unwrap();
        assert_eq!(author.post_count, 0);
        assert!(matches!(
            posts.get_post(&post.id).await,
            Err(FeedError::NotFound(_))
        ));
    }
}
