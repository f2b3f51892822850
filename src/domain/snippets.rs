//! Snippet entities and the closed set of grammars the listing can highlight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use super::error::DomainError;

/// Stable identifier of a snippet within one rendering batch.
///
/// The value is embedded verbatim into the CSS area name `item<id>`, so only
/// ASCII alphanumerics, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSnippetId", into = "String")]
pub struct SnippetId(String);

impl SnippetId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::validation("snippet id must not be empty"));
        }
        if let Some(invalid) = value
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(DomainError::validation(format!(
                "snippet id `{value}` contains `{invalid}`, which cannot appear in a CSS identifier"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SnippetId> for String {
    fn from(id: SnippetId) -> Self {
        id.0
    }
}

/// Upstream ids are GraphQL `ID`s, which some servers emit as integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnippetId {
    Text(String),
    Number(u64),
}

impl TryFrom<RawSnippetId> for SnippetId {
    type Error = DomainError;

    fn try_from(raw: RawSnippetId) -> Result<Self, Self::Error> {
        match raw {
            RawSnippetId::Text(value) => SnippetId::new(value),
            RawSnippetId::Number(value) => SnippetId::new(value.to_string()),
        }
    }
}

/// One displayable code snippet as delivered by a content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: SnippetId,
    #[serde(default)]
    pub title: String,
    pub language: String,
    pub code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub posted_at: OffsetDateTime,
}

/// Feed a listing is assembled for. Each feed owns a separate cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Snippets fetched from the GraphQL API.
    Snippets,
    /// Posts read from the bundled content store.
    Posts,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Snippets, ContentKind::Posts];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Snippets => "snippets",
            ContentKind::Posts => "posts",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "snippets" => Ok(ContentKind::Snippets),
            "posts" => Ok(ContentKind::Posts),
            other => Err(DomainError::validation(format!(
                "unknown content kind `{other}` (expected `snippets` or `posts`)"
            ))),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language `{0}`")]
pub struct UnsupportedLanguage(pub String);

/// Grammars available to the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Rust,
    Python,
    Go,
    Html,
    Css,
    Json,
    Shell,
    Sql,
    PlainText,
}

impl Language {
    pub const ALL: [Language; 11] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Rust,
        Language::Python,
        Language::Go,
        Language::Html,
        Language::Css,
        Language::Json,
        Language::Shell,
        Language::Sql,
        Language::PlainText,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Rust => "rust",
            Language::Python => "python",
            Language::Go => "go",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Shell => "shell",
            Language::Sql => "sql",
            Language::PlainText => "text",
        }
    }

    /// Token used to look the grammar up in a syntect `SyntaxSet`.
    pub fn syntax_token(self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Rust => "rs",
            Language::Python => "py",
            Language::Go => "go",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Shell => "sh",
            Language::Sql => "sql",
            Language::PlainText => "txt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let language = match value.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" | "jsx" | "mjs" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "rust" | "rs" => Language::Rust,
            "python" | "py" => Language::Python,
            "go" | "golang" => Language::Go,
            "html" | "htm" => Language::Html,
            "css" => Language::Css,
            "json" => Language::Json,
            "shell" | "sh" | "bash" | "zsh" => Language::Shell,
            "sql" => Language::Sql,
            "text" | "plaintext" | "plain" | "txt" => Language::PlainText,
            _ => return Err(UnsupportedLanguage(value.to_string())),
        };
        Ok(language)
    }
}
