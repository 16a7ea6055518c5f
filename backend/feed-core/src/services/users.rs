/// User service - session lookup, profile reads and registration
use crate::error::{FeedError, FeedResult};
use crate::models::{collections::USERS, NewUser, User, UserId};
use crate::providers::UserProvider;
use crate::session::SessionContext;
use async_trait::async_trait;
use chrono::Utc;
use feed_store::{encode_fields, SharedStore, StoreError};
use tracing::{debug, info};

pub struct UserService {
    store: SharedStore,
    session: SessionContext,
}

impl UserService {
    pub fn new(store: SharedStore, session: SessionContext) -> Self {
        Self { store, session }
    }

    /// Create the record an auth system creates on first sign-in.
    /// An existing user is returned unchanged.
    pub async fn register_user(&self, id: &UserId, name: &str) -> FeedResult<User> {
        if name.trim().is_empty() {
            return Err(FeedError::validation("display name must not be empty"));
        }

        match self.store.read(USERS, id.as_str()).await {
            Ok(doc) => {
                debug!(user_id = %id, "User already registered");
                return Ok(doc.decode()?);
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let fields = encode_fields(&NewUser {
            name,
            user_since: Utc::now(),
            post_count: 0,
            comment_count: 0,
            total_votes: 0,
        })?;
        let doc = self.store.put(USERS, id.as_str(), fields).await?;

        info!(user_id = %id, "User registered");
        Ok(doc.decode()?)
    }
}

#[async_trait]
impl UserProvider for UserService {
    async fn get_logged_in_user(&self) -> FeedResult<User> {
        let user_id = self.session.user_id().ok_or(FeedError::NotAuthenticated)?;
        self.get_user(user_id).await
    }

    async fn get_user(&self, id: &UserId) -> FeedResult<User> {
        match self.store.read(USERS, id.as_str()).await {
            Ok(doc) => Ok(doc.decode()?),
            Err(StoreError::NotFound { .. }) => {
                Err(FeedError::not_found(format!("user {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
