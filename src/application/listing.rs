//! Cache-aside assembly of listing pages.
//!
//! A listing is the list of highlighted snippets of one feed plus the grid
//! stylesheet that positions them. [`ListingService::load`] serves it from the
//! key-value cache when both halves are present and readable, and otherwise
//! rebuilds it from the content source and writes it back.

use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};
use tracing::{debug, warn};

use crate::application::render::{
    GridStyleConfig, GridStylesheet, Highlighter, area_name, plain_code_html,
};
use crate::application::repos::{SnippetSource, SourceError};
use crate::cache::{CacheKey, KvStore};
use crate::domain::snippets::{ContentKind, Language, Snippet, SnippetId};

pub const DEFAULT_MAX_CODE_LINES: usize = 20;
pub const DEFAULT_HIGHLIGHT_CONCURRENCY: usize = 8;

const SOURCE: &str = "application::listing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingConfig {
    /// Leading lines of each snippet kept for the card preview.
    pub max_code_lines: NonZeroUsize,
    /// Upper bound on snippets highlighted at the same time.
    pub highlight_concurrency: NonZeroUsize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_code_lines: NonZeroUsize::new(DEFAULT_MAX_CODE_LINES).unwrap_or(NonZeroUsize::MIN),
            highlight_concurrency: NonZeroUsize::new(DEFAULT_HIGHLIGHT_CONCURRENCY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// A snippet prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    pub id: SnippetId,
    pub title: String,
    pub language: String,
    /// Source text truncated to the preview window.
    pub code: String,
    pub code_html: String,
    /// `false` when `code_html` is the escaped plain-text fallback.
    pub highlighted: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub posted_at: OffsetDateTime,
    /// `posted_at` formatted for cards, e.g. `Oct 6, 2026`.
    pub posted_on: String,
}

impl ListingItem {
    pub fn area_name(&self) -> String {
        area_name(&self.id)
    }
}

/// Everything the presentation layer needs to render one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingArtifact {
    pub items: Vec<ListingItem>,
    pub stylesheet: String,
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Upstream(#[from] SourceError),
    #[error("content source returned snippet id `{0}` more than once")]
    DuplicateId(SnippetId),
}

#[derive(Clone)]
pub struct ListingService {
    kind: ContentKind,
    source: Arc<dyn SnippetSource>,
    highlighter: Arc<dyn Highlighter>,
    stylesheet: GridStylesheet,
    config: ListingConfig,
    cache: Option<Arc<dyn KvStore>>,
}

impl ListingService {
    pub fn new(
        kind: ContentKind,
        source: Arc<dyn SnippetSource>,
        highlighter: Arc<dyn Highlighter>,
        stylesheet: GridStylesheet,
        config: ListingConfig,
    ) -> Self {
        Self {
            kind,
            source,
            highlighter,
            stylesheet,
            config,
            cache: None,
        }
    }

    pub fn with_cache_opt(mut self, cache: Option<Arc<dyn KvStore>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn layout(&self) -> &GridStyleConfig {
        self.stylesheet.config()
    }

    /// Return the listing, from the cache when possible.
    ///
    /// Only a content-source failure is surfaced. Unreadable cache entries
    /// count as misses and failed cache writes are logged and ignored.
    pub async fn load(&self) -> Result<ListingArtifact, ListingError> {
        let kind = self.kind.as_str();

        if let Some(cache) = self.cache.as_deref() {
            if let Some(artifact) = self.read_cached(cache).await {
                counter!("codebases_listing_cache_hit_total", "kind" => kind).increment(1);
                debug!(
                    target = "codebases::listing",
                    kind,
                    items = artifact.items.len(),
                    "served listing from cache"
                );
                return Ok(artifact);
            }
            counter!("codebases_listing_cache_miss_total", "kind" => kind).increment(1);
        }

        let started = Instant::now();
        let artifact = self.assemble().await?;
        histogram!("codebases_listing_assemble_ms", "kind" => kind)
            .record(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            target = "codebases::listing",
            kind,
            items = artifact.items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "assembled listing from source"
        );

        if let Some(cache) = self.cache.as_deref() {
            self.write_back(cache, &artifact).await;
        }

        Ok(artifact)
    }

    /// Build the listing from the content source, bypassing the cache.
    pub async fn assemble(&self) -> Result<ListingArtifact, ListingError> {
        let snippets = self.source.fetch_snippets().await?;
        ensure_unique_ids(&snippets)?;

        let items = self.prepare_items(snippets).await;
        let stylesheet = self.stylesheet.assemble(items.iter().map(|item| &item.id));

        Ok(ListingArtifact { items, stylesheet })
    }

    async fn prepare_items(&self, snippets: Vec<Snippet>) -> Vec<ListingItem> {
        let max_lines = self.config.max_code_lines;

        // `buffered` yields results in input order regardless of completion order.
        stream::iter(snippets)
            .map(|snippet| prepare_item(self.kind, Arc::clone(&self.highlighter), snippet, max_lines))
            .buffered(self.config.highlight_concurrency.get())
            .collect()
            .await
    }

    async fn read_cached(&self, cache: &dyn KvStore) -> Option<ListingArtifact> {
        let items_key = CacheKey::items(self.kind).to_string();
        let stylesheet_key = CacheKey::stylesheet(self.kind).to_string();

        let items_raw = self.read_entry(cache, &items_key).await?;
        let stylesheet_raw = self.read_entry(cache, &stylesheet_key).await?;

        let items: Vec<ListingItem> = self.decode_entry(&items_key, &items_raw)?;
        let stylesheet: String = self.decode_entry(&stylesheet_key, &stylesheet_raw)?;

        Some(ListingArtifact { items, stylesheet })
    }

    async fn read_entry(&self, cache: &dyn KvStore, key: &str) -> Option<String> {
        match cache.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target = "codebases::listing",
                    source = SOURCE,
                    key,
                    error = %err,
                    "cache read failed; rebuilding listing"
                );
                None
            }
        }
    }

    fn decode_entry<T>(&self, key: &str, raw: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                counter!("codebases_listing_cache_corrupt_total", "kind" => self.kind.as_str())
                    .increment(1);
                warn!(
                    target = "codebases::listing",
                    source = SOURCE,
                    key,
                    error = %err,
                    "discarding unreadable cache entry"
                );
                None
            }
        }
    }

    async fn write_back(&self, cache: &dyn KvStore, artifact: &ListingArtifact) {
        let entries = [
            (
                CacheKey::items(self.kind),
                serde_json::to_string(&artifact.items),
            ),
            (
                CacheKey::stylesheet(self.kind),
                serde_json::to_string(&artifact.stylesheet),
            ),
        ];

        for (key, encoded) in entries {
            let key = key.to_string();
            let result = match encoded {
                Ok(value) => cache.put(&key, value).await.map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };

            if let Err(reason) = result {
                counter!(
                    "codebases_listing_cache_write_failed_total",
                    "kind" => self.kind.as_str()
                )
                .increment(1);
                warn!(
                    target = "codebases::listing",
                    source = SOURCE,
                    key,
                    error = %reason,
                    "failed to store listing in cache"
                );
            }
        }
    }
}

async fn prepare_item(
    kind: ContentKind,
    highlighter: Arc<dyn Highlighter>,
    snippet: Snippet,
    max_lines: NonZeroUsize,
) -> ListingItem {
    let code = truncate_lines(&snippet.code, max_lines);

    let highlighted = match snippet.language.parse::<Language>() {
        Ok(language) => {
            let source = code.clone();
            match tokio::task::spawn_blocking(move || highlighter.highlight(&source, language))
                .await
            {
                Ok(Ok(html)) => Ok(html),
                Ok(Err(err)) => Err(err.to_string()),
                Err(err) => Err(format!("highlight task failed: {err}")),
            }
        }
        Err(err) => Err(err.to_string()),
    };

    let (code_html, highlighted) = match highlighted {
        Ok(html) => (html, true),
        Err(reason) => (fallback_html(kind, &snippet.id, &code, &reason), false),
    };

    let posted_on = format_posted_on(snippet.posted_at);
    ListingItem {
        id: snippet.id,
        title: snippet.title,
        language: snippet.language,
        code,
        code_html,
        highlighted,
        posted_at: snippet.posted_at,
        posted_on,
    }
}

fn fallback_html(kind: ContentKind, id: &SnippetId, code: &str, reason: &dyn fmt::Display) -> String {
    counter!("codebases_listing_highlight_fallback_total", "kind" => kind.as_str()).increment(1);
    warn!(
        target = "codebases::listing",
        source = SOURCE,
        kind = kind.as_str(),
        snippet_id = %id,
        reason = %reason,
        "rendering snippet without highlighting"
    );
    plain_code_html(code)
}

/// Keep the first `max_lines` lines of `code`.
pub fn truncate_lines(code: &str, max_lines: NonZeroUsize) -> String {
    code.split('\n')
        .take(max_lines.get())
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_unique_ids(snippets: &[Snippet]) -> Result<(), ListingError> {
    let mut seen = HashSet::with_capacity(snippets.len());
    for snippet in snippets {
        if !seen.insert(&snippet.id) {
            return Err(ListingError::DuplicateId(snippet.id.clone()));
        }
    }
    Ok(())
}

fn format_posted_on(posted_at: OffsetDateTime) -> String {
    let format = format_description!("[month repr:short] [day padding:none], [year]");
    posted_at
        .format(format)
        .unwrap_or_else(|_| posted_at.date().to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn truncation_keeps_leading_lines() {
        let code = (1..=30).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let max = NonZeroUsize::new(20).expect("non-zero");

        let truncated = truncate_lines(&code, max);
        assert_eq!(truncated.split('\n').count(), 20);
        assert!(truncated.starts_with("line 1\n"));
        assert!(truncated.ends_with("line 20"));
    }

    #[test]
    fn truncation_leaves_short_code_untouched() {
        let max = NonZeroUsize::new(20).expect("non-zero");
        assert_eq!(truncate_lines("a\nb\n", max), "a\nb\n");
        assert_eq!(truncate_lines("", max), "");
    }

    #[test]
    fn posted_on_uses_short_month_format() {
        assert_eq!(format_posted_on(datetime!(2026-10-06 08:30 UTC)), "Oct 6, 2026");
        assert_eq!(format_posted_on(datetime!(2024-01-21 23:59 UTC)), "Jan 21, 2024");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let snippet = |id: &str| Snippet {
            id: SnippetId::new(id).expect("valid id"),
            title: String::new(),
            language: "rust".to_string(),
            code: String::new(),
            posted_at: datetime!(2024-01-01 0:00 UTC),
        };

        assert!(ensure_unique_ids(&[snippet("1"), snippet("2")]).is_ok());
        assert!(matches!(
            ensure_unique_ids(&[snippet("1"), snippet("2"), snippet("1")]),
            Err(ListingError::DuplicateId(id)) if id.as_str() == "1"
        ));
    }
}
