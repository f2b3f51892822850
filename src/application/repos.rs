//! Source traits describing where listing content comes from.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::snippets::Snippet;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content source unreachable: {0}")]
    Transport(String),
    #[error("content source responded with status {status}")]
    Status { status: u16 },
    #[error("content source reported errors: {}", .0.join("; "))]
    Graphql(Vec<String>),
    #[error("content source returned an invalid payload: {message}")]
    InvalidPayload { message: String },
    #[error("failed to read content store: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}

/// Upstream provider of the snippets shown on a listing page.
///
/// Implementations return snippets in display order and make no promises
/// about pagination or filtering.
#[async_trait]
pub trait SnippetSource: Send + Sync {
    async fn fetch_snippets(&self) -> Result<Vec<Snippet>, SourceError>;
}
