use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feed_core::config::{Config, ConfigOverrides, StoreBackend};
use feed_core::models::{CommentId, PostId, UserId};
use feed_core::{CommentProvider, FeedClient, PostProvider, UserProvider};
use serde::Serialize;
use tracing::warn;

/// feedctl - drive the Bitter feed from the command line
#[derive(Parser)]
#[command(name = "feedctl")]
#[command(version)]
#[command(about = "Post, comment and downvote against a feed store")]
pub struct Cli {
    /// Act as this user (overrides FEED_SESSION_USER)
    #[arg(long = "as", value_name = "USER_ID", global = true)]
    pub as_user: Option<String>,

    /// Backing store (overrides FEED_STORE_BACKEND)
    #[arg(long, value_name = "memory|redis", global = true)]
    pub backend: Option<StoreBackend>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend,
            session_user: self.as_user.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a user record (no-op when it exists)
    Register { id: String, name: String },
    /// Show the session user
    Whoami,
    /// Show a user
    User { id: String },
    /// Create a post as the session user
    Post { text: String },
    /// Most recent posts, newest first
    Feed {
        /// Number of posts (defaults to FEED_DEFAULT_PAGE_SIZE)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Posts by one user, newest first
    PostsBy { user_id: String },
    /// Show a post
    Show { post_id: String },
    /// Downvote a post
    Downvote { post_id: String },
    /// Delete a post, leaving its comments
    Delete { post_id: String },
    /// Delete a post together with its comments
    Purge { post_id: String },
    /// Comment on a post as the session user
    Comment { post_id: String, text: String },
    /// Show a comment
    CommentShow { comment_id: String },
    /// Comments on a post, oldest first
    Comments { post_id: String },
    /// Comments by one user, oldest first
    CommentsBy { user_id: String },
    /// Delete a comment
    Uncomment { comment_id: String },
}

/// Open the configured store and build a client for the session user.
///
/// The memory backend starts empty on every run, so the session user is
/// registered up front.
pub async fn open_client(config: &Config) -> Result<FeedClient> {
    let client = FeedClient::from_config(config)
        .await
        .context("Failed to open feed store")?;

    if config.store.backend == StoreBackend::Memory {
        warn!("Memory backend selected; nothing written survives this run");
        if let Some(user) = &config.session_user {
            client
                .users
                .register_user(&UserId::new(user.as_str()), user)
                .await
                .with_context(|| format!("Failed to register session user {}", user))?;
        }
    }

    Ok(client)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", out);
    Ok(())
}

pub async fn run(command: Command, client: &FeedClient, default_page_size: usize) -> Result<()> {
    match command {
        Command::Register { id, name } => {
            print_json(&client.users.register_user(&UserId::new(id), &name).await?)
        }
        Command::Whoami => print_json(&client.users.get_logged_in_user().await?),
        Command::User { id } => print_json(&client.users.get_user(&UserId::new(id)).await?),
        Command::Post { text } => print_json(&client.posts.add_post(&text).await?),
        Command::Feed { count } => {
            let n = count.unwrap_or(default_page_size);
            print_json(&client.posts.get_posts(n).await?)
        }
        Command::PostsBy { user_id } => {
            print_json(&client.posts.get_posts_by_user(&UserId::new(user_id)).await?)
        }
        Command::Show { post_id } => print_json(&client.posts.get_post(&PostId::new(post_id)).await?),
        Command::Downvote { post_id } => {
            print_json(&client.posts.downvote_post(&PostId::new(post_id)).await?)
        }
        Command::Delete { post_id } => {
            client.posts.delete_post(&PostId::new(post_id.as_str())).await?;
            print_json(&serde_json::json!({ "deleted": post_id }))
        }
        Command::Purge { post_id } => {
            print_json(&client.janitor().purge_post(&PostId::new(post_id)).await?)
        }
        Command::Comment { post_id, text } => {
            print_json(&client.comments.add_comment(&text, &PostId::new(post_id)).await?)
        }
        Command::CommentShow { comment_id } => {
            print_json(&client.comments.get_comment(&CommentId::new(comment_id)).await?)
        }
        Command::Comments { post_id } => {
            print_json(&client.comments.get_comments_on_post(&PostId::new(post_id)).await?)
        }
        Command::CommentsBy { user_id } => {
            print_json(&client.comments.get_comments_by_user(&UserId::new(user_id)).await?)
        }
        Command::Uncomment { comment_id } => {
            client
                .comments
                .delete_comment(&CommentId::new(comment_id.as_str()))
                .await?;
            print_json(&serde_json::json!({ "deleted": comment_id }))
        }
    }
}
