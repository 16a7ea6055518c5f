pub mod content_janitor;

pub use content_janitor::{ContentJanitor, PurgeReport};
