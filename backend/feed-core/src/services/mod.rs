/// Store-backed implementations of the provider traits
pub mod comments;
pub mod posts;
pub mod users;
pub mod validation;

pub use comments::CommentService;
pub use posts::PostService;
pub use users::UserService;

use crate::models::{collections::USERS, UserId};
use feed_store::{Document, DocumentStore, StoreResult};
use std::future::Future;
use tracing::error;

/// Adjust one of a user's aggregate counters
pub(crate) async fn adjust_user_counter(
    store: &dyn DocumentStore,
    user_id: &UserId,
    field: &str,
    delta: i64,
) -> StoreResult<Document> {
    store
        .atomic_adjust_counter(USERS, user_id.as_str(), field, delta)
        .await
}

/// Run an undo step after a failed write. A failing undo is logged and
/// otherwise ignored; the caller already reports the original error.
pub(crate) async fn compensate<T, F>(action: &str, undo: F)
where
    F: Future<Output = StoreResult<T>>,
{
    if let Err(e) = undo.await {
        error!(error = %e, action, "Compensation failed");
    }
}
