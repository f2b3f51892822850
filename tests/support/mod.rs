//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use codebases::{
    application::{
        listing::{ListingConfig, ListingService},
        render::{GridStylesheet, HighlightError, Highlighter},
        repos::{SnippetSource, SourceError},
    },
    cache::{CacheStoreError, KvStore},
    domain::snippets::{ContentKind, Language, Snippet, SnippetId},
};
use time::{Duration as TimeDuration, macros::datetime};

pub fn snippet(id: &str, language: &str, code: &str) -> Snippet {
    let offset: i64 = id.bytes().map(i64::from).sum();
    Snippet {
        id: SnippetId::new(id).expect("valid id"),
        title: format!("Snippet {id}"),
        language: language.to_string(),
        code: code.to_string(),
        posted_at: datetime!(2024-05-01 12:00 UTC) + TimeDuration::days(offset % 28),
    }
}

pub fn snippets(ids: &[&str]) -> Vec<Snippet> {
    ids.iter()
        .map(|id| snippet(id, "rust", &format!("fn item_{id}() {{}}")))
        .collect()
}

/// Source returning a fixed batch, counting how often it is asked.
pub struct FakeSource {
    snippets: Vec<Snippet>,
    failing: bool,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(snippets: Vec<Snippet>) -> Arc<Self> {
        Arc::new(Self {
            snippets,
            failing: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            snippets: Vec::new(),
            failing: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnippetSource for FakeSource {
    async fn fetch_snippets(&self) -> Result<Vec<Snippet>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(SourceError::Status { status: 503 });
        }
        Ok(self.snippets.clone())
    }
}

/// Highlighter producing predictable markup.
///
/// With `stagger` set, earlier calls sleep longer so completions arrive out
/// of input order.
pub struct FakeHighlighter {
    calls: AtomicUsize,
    stagger: bool,
    failing_language: Option<Language>,
}

impl FakeHighlighter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            stagger: false,
            failing_language: None,
        })
    }

    pub fn staggered() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            stagger: true,
            failing_language: None,
        })
    }

    pub fn failing_for(language: Language) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            stagger: false,
            failing_language: Some(language),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Highlighter for FakeHighlighter {
    fn highlight(&self, code: &str, language: Language) -> Result<String, HighlightError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stagger {
            let delay = 40u64.saturating_sub(call as u64 * 10);
            std::thread::sleep(Duration::from_millis(delay));
        }
        if self.failing_language == Some(language) {
            return Err(HighlightError::Highlighting {
                language,
                message: "grammar exploded".to_string(),
            });
        }
        Ok(format!("<pre data-language=\"{language}\">{code}</pre>"))
    }
}

/// Map-backed store recording every call, with switchable failures.
#[derive(Default)]
pub struct RecordingStore {
    entries: Mutex<HashMap<String, String>>,
    gets: Mutex<Vec<String>>,
    puts: Mutex<Vec<String>>,
    fail_gets: bool,
    fail_puts: bool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_puts() -> Arc<Self> {
        Arc::new(Self {
            fail_puts: true,
            ..Self::default()
        })
    }

    pub fn failing_gets() -> Arc<Self> {
        Arc::new(Self {
            fail_gets: true,
            ..Self::default()
        })
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("entries lock")
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("entries lock").get(key).cloned()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().expect("gets lock").clone()
    }

    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().expect("puts lock").clone()
    }
}

#[async_trait]
impl KvStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        self.gets.lock().expect("gets lock").push(key.to_string());
        if self.fail_gets {
            return Err(CacheStoreError::unavailable("store offline"));
        }
        Ok(self.value(key))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), CacheStoreError> {
        self.puts.lock().expect("puts lock").push(key.to_string());
        if self.fail_puts {
            return Err(CacheStoreError::unavailable("store read-only"));
        }
        self.entries
            .lock()
            .expect("entries lock")
            .insert(key.to_string(), value);
        Ok(())
    }
}

pub fn listing_config(max_code_lines: usize, highlight_concurrency: usize) -> ListingConfig {
    ListingConfig {
        max_code_lines: NonZeroUsize::new(max_code_lines).expect("non-zero"),
        highlight_concurrency: NonZeroUsize::new(highlight_concurrency).expect("non-zero"),
    }
}

pub fn service(
    kind: ContentKind,
    source: Arc<FakeSource>,
    highlighter: Arc<FakeHighlighter>,
    store: Option<Arc<RecordingStore>>,
) -> ListingService {
    service_with_config(kind, source, highlighter, store, ListingConfig::default())
}

pub fn service_with_config(
    kind: ContentKind,
    source: Arc<FakeSource>,
    highlighter: Arc<FakeHighlighter>,
    store: Option<Arc<RecordingStore>>,
    config: ListingConfig,
) -> ListingService {
    ListingService::new(
        kind,
        source,
        highlighter,
        GridStylesheet::default(),
        config,
    )
    .with_cache_opt(store.map(|store| store as Arc<dyn KvStore>))
}

/// Service backed by any store, for tests that exercise a real backend.
pub fn service_with_store(
    kind: ContentKind,
    source: Arc<FakeSource>,
    store: Arc<dyn KvStore>,
) -> ListingService {
    ListingService::new(
        kind,
        source,
        FakeHighlighter::new(),
        GridStylesheet::default(),
        ListingConfig::default(),
    )
    .with_cache_opt(Some(store))
}
