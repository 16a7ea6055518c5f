/// Wiring: open the configured store and build the providers over it
use crate::config::{Config, ContentConfig, StoreBackend, StoreConfig};
use crate::jobs::ContentJanitor;
use crate::models::{collections, fields};
use crate::services::{CommentService, PostService, UserService};
use crate::session::SessionContext;
use feed_store::{MemoryStore, RedisStore, SharedStore, StoreResult};
use std::sync::Arc;
use tracing::info;

/// Open the backing store selected by configuration.
///
/// The Redis store gets secondary indexes for every equality query the
/// providers run.
pub async fn open_store(config: &StoreConfig) -> StoreResult<SharedStore> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url)
                .await?
                .with_timeout(config.timeout())
                .with_index(collections::POSTS, fields::AUTHOR_ID)
                .with_index(collections::COMMENTS, fields::POST_ID)
                .with_index(collections::COMMENTS, fields::AUTHOR_ID);
            info!(timeout_ms = config.timeout_ms, "Connected to Redis store");
            Ok(Arc::new(store))
        }
    }
}

/// The three providers over one store and one session
#[derive(Clone)]
pub struct FeedClient {
    pub users: Arc<UserService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
}

impl FeedClient {
    pub fn new(store: SharedStore, session: SessionContext, content: &ContentConfig) -> Self {
        let users = Arc::new(UserService::new(store.clone(), session));
        let posts = Arc::new(PostService::new(store.clone(), users.clone(), content));
        let comments = Arc::new(CommentService::new(store, users.clone(), content));

        Self {
            users,
            posts,
            comments,
        }
    }

    /// Open the configured store and build a client for the configured session user
    pub async fn from_config(config: &Config) -> StoreResult<Self> {
        let store = open_store(&config.store).await?;
        let session = match &config.session_user {
            Some(user) => SessionContext::authenticated(user.as_str()),
            None => SessionContext::anonymous(),
        };
        Ok(Self::new(store, session, &config.content))
    }

    pub fn janitor(&self) -> ContentJanitor {
        ContentJanitor::new(self.posts.clone(), self.comments.clone())
    }
}
