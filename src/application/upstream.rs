//! Port describing the remote posts search API.

use async_trait::async_trait;
use tagfeed_api_types::Post;
use thiserror::Error;

use crate::domain::types::{Direction, SortField};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request for tag `{tag}` failed: {message}")]
    Transport { tag: String, message: String },
    #[error("upstream request for tag `{tag}` timed out")]
    Timeout { tag: String },
    #[error("upstream returned status {status} for tag `{tag}`")]
    Status { tag: String, status: u16 },
    #[error("upstream body for tag `{tag}` could not be decoded: {message}")]
    Decode { tag: String, message: String },
}

impl UpstreamError {
    pub fn transport(tag: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            tag: tag.to_string(),
            message: message.into(),
        }
    }

    pub fn timeout(tag: &str) -> Self {
        Self::Timeout {
            tag: tag.to_string(),
        }
    }

    pub fn status(tag: &str, status: u16) -> Self {
        Self::Status {
            tag: tag.to_string(),
            status,
        }
    }

    pub fn decode(tag: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            tag: tag.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait PostsSource: Send + Sync {
    /// Fetch every post carrying `tag`. Any non-success status is an error.
    async fn fetch_posts(
        &self,
        tag: &str,
        sort_by: SortField,
        direction: Direction,
    ) -> Result<Vec<Post>, UpstreamError>;

    /// Issue the fixed liveness probe and return the upstream status code.
    async fn probe(&self) -> Result<u16, UpstreamError>;
}
