use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    application::repos::{SnippetSource, SourceError},
    domain::snippets::{Snippet, SnippetId},
};

/// Posts bundled with the deployment as a TOML file of `[[posts]]` tables.
///
/// The file is re-read on every fetch so edits show up on the next cache miss.
#[derive(Clone, Debug)]
pub struct StaticPostSource {
    path: PathBuf,
}

impl StaticPostSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
struct PostsFile {
    #[serde(default)]
    posts: Vec<PostRecord>,
}

#[derive(Deserialize)]
struct PostRecord {
    id: SnippetId,
    #[serde(default)]
    title: String,
    language: String,
    code: String,
    #[serde(with = "time::serde::rfc3339")]
    posted_at: OffsetDateTime,
}

impl From<PostRecord> for Snippet {
    fn from(record: PostRecord) -> Self {
        Snippet {
            id: record.id,
            title: record.title,
            language: record.language,
            code: record.code,
            posted_at: record.posted_at,
        }
    }
}

#[async_trait]
impl SnippetSource for StaticPostSource {
    async fn fetch_snippets(&self) -> Result<Vec<Snippet>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        parse_posts(&raw)
    }
}

fn parse_posts(raw: &str) -> Result<Vec<Snippet>, SourceError> {
    let file: PostsFile = toml::from_str(raw)
        .map_err(|err| SourceError::invalid_payload(format!("invalid posts file: {err}")))?;
    Ok(file.posts.into_iter().map(Snippet::from).collect())
}
