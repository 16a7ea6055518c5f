/// Comment service - comment creation, threads and deletion
use super::validation::validate_text;
use super::{adjust_user_counter, compensate};
use crate::config::ContentConfig;
use crate::error::{FeedError, FeedResult};
use crate::models::{
    collections::COMMENTS,
    fields::{AUTHOR_ID, COMMENT_COUNT, POST_ID},
    Comment, CommentId, NewComment, PostId, UserId,
};
use crate::providers::{CommentProvider, UserProvider};
use async_trait::async_trait;
use chrono::Utc;
use feed_store::{encode_fields, Document, SharedStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CommentService {
    store: SharedStore,
    users: Arc<dyn UserProvider>,
    max_text_chars: usize,
}

impl CommentService {
    pub fn new(store: SharedStore, users: Arc<dyn UserProvider>, content: &ContentConfig) -> Self {
        Self {
            store,
            users,
            max_text_chars: content.max_text_chars,
        }
    }

    async fn list_by(&self, field: &str, value: &str) -> FeedResult<Vec<Comment>> {
        let docs = self
            .store
            .list_where_equals(COMMENTS, field, &Value::String(value.to_string()))
            .await?;
        debug!(field, value, count = docs.len(), "Fetched comments");
        decode_all(&docs)
    }
}

fn decode_all(docs: &[Document]) -> FeedResult<Vec<Comment>> {
    docs.iter()
        .map(|doc| doc.decode().map_err(FeedError::from))
        .collect()
}

#[async_trait]
impl CommentProvider for CommentService {
    async fn add_comment(&self, text: &str, post_id: &PostId) -> FeedResult<Comment> {
        validate_text(text, self.max_text_chars)?;
        let author = self.users.get_logged_in_user().await?;

        let fields = encode_fields(&NewComment {
            text,
            author_id: &author.id,
            post_id,
            created_at: Utc::now(),
        })?;
        let doc = self.store.create_with_generated_id(COMMENTS, fields).await?;

        if let Err(e) = adjust_user_counter(self.store.as_ref(), &author.id, COMMENT_COUNT, 1).await
        {
            warn!(comment_id = %doc.id, error = %e, "Author counter update failed, removing comment");
            compensate("remove new comment", self.store.delete(COMMENTS, &doc.id)).await;
            return Err(e.into());
        }

        info!(comment_id = %doc.id, post_id = %post_id, author_id = %author.id, "Comment created");
        Ok(doc.decode()?)
    }

    async fn get_comment(&self, id: &CommentId) -> FeedResult<Comment> {
        let doc = self.store.read(COMMENTS, id.as_str()).await?;
        Ok(doc.decode()?)
    }

    async fn get_comments_on_post(&self, post_id: &PostId) -> FeedResult<Vec<Comment>> {
        self.list_by(POST_ID, post_id.as_str()).await
    }

    async fn get_comments_by_user(&self, user_id: &UserId) -> FeedResult<Vec<Comment>> {
        self.list_by(AUTHOR_ID, user_id.as_str()).await
    }

    async fn delete_comment(&self, id: &CommentId) -> FeedResult<()> {
        let doc = match self.store.read(COMMENTS, id.as_str()).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                debug!(comment_id = %id, "Comment already absent");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let author_id = doc.decode::<Comment>()?.author_id;

        let decremented = match adjust_user_counter(
            self.store.as_ref(),
            &author_id,
            COMMENT_COUNT,
            -1,
        )
        .await
        {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e.into()),
        };

        let result = self.store.delete(COMMENTS, id.as_str()).await;
        if decremented && !matches!(result, Ok(true)) {
            compensate(
                "restore comment count",
                adjust_user_counter(self.store.as_ref(), &author_id, COMMENT_COUNT, 1),
            )
            .await;
        }

        match result {
            Ok(removed) => {
                info!(comment_id = %id, removed, "Comment deleted");
                Ok(())
            }
            Err(e) => {
                warn!(comment_id = %id, error = %e, "Comment delete failed");
                Err(e.into())
            }
        }
    }
}
