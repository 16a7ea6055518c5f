/// Text validation shared by posts and comments
use crate::error::{FeedError, FeedResult};

/// Reject empty or whitespace-only text and text longer than `max_chars`
pub fn validate_text(text: &str, max_chars: usize) -> FeedResult<()> {
    if text.trim().is_empty() {
        return Err(FeedError::validation("text must not be empty"));
    }

    let chars = text.chars().count();
    if chars > max_chars {
        return Err(FeedError::validation(format!(
            "text is {} characters, limit is {}",
            chars, max_chars
        )));
    }

    Ok(())
}
