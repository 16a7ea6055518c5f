/// Feed Core Library
///
/// Provider layer for the Bitter feed: posts, comments, users and downvotes
/// over a pluggable document store.
///
/// # Modules
///
/// - `providers`: Provider traits exposed to callers
/// - `services`: Store-backed provider implementations
/// - `jobs`: Post and comment-thread cleanup
/// - `models`: Users, posts, comments and their ids
/// - `session`: Authenticated-session context
/// - `client`: Store selection and provider wiring
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `logging`: Tracing subscriber setup
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod session;

pub use client::{open_store, FeedClient};
pub use config::Config;
pub use error::{FeedError, FeedResult};
pub use providers::{CommentProvider, PostProvider, UserProvider};
pub use session::SessionContext;
