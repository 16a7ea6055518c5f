/// Data models for the feed
///
/// - User: account record with aggregate counters
/// - Post: short text post with a downvote counter
/// - Comment: text reply attached to a post
///
/// Ids are opaque strings: users get theirs from the auth system, posts and
/// comments from the store at creation time.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Auth-assigned user identifier
    UserId
);
string_id!(
    /// Store-assigned post identifier
    PostId
);
string_id!(
    /// Store-assigned comment identifier
    CommentId
);

/// Store collections
pub mod collections {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
    pub const COMMENTS: &str = "comments";
}

/// Field names used in queries and counter updates
pub mod fields {
    pub const AUTHOR_ID: &str = "author_id";
    pub const POST_ID: &str = "post_id";
    pub const DOWNVOTES: &str = "downvotes";
    pub const POST_COUNT: &str = "post_count";
    pub const COMMENT_COUNT: &str = "comment_count";
    pub const TOTAL_VOTES: &str = "total_votes";
}

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub user_since: DateTime<Utc>,
    #[serde(default)]
    pub post_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    /// Downvotes received across the user's posts
    #[serde(default)]
    pub total_votes: i64,
}

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    pub author_id: UserId,
    /// Decremented by each downvote, starting from zero
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
}

/// Comment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

/// Record written when a post is created; the store assigns the id
#[derive(Debug, Serialize)]
pub(crate) struct NewPost<'a> {
    pub text: &'a str,
    pub author_id: &'a UserId,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
}

/// Record written when a comment is created; the store assigns the id
#[derive(Debug, Serialize)]
pub(crate) struct NewComment<'a> {
    pub text: &'a str,
    pub author_id: &'a UserId,
    pub post_id: &'a PostId,
    pub created_at: DateTime<Utc>,
}

/// Record written when a user is registered
#[derive(Debug, Serialize)]
pub(crate) struct NewUser<'a> {
    pub name: &'a str,
    pub user_since: DateTime<Utc>,
    pub post_count: i64,
    pub comment_count: i64,
    pub total_votes: i64,
}
