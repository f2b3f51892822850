//! Cache key definitions.
//!
//! Every feed stores its assembled listing as two entries under its own
//! namespace: the serialized items and the serialized stylesheet.

use std::fmt;

use crate::domain::snippets::ContentKind;

/// Part of a listing artifact stored under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactSlot {
    Items,
    Stylesheet,
}

impl ArtifactSlot {
    pub const ALL: [ArtifactSlot; 2] = [ArtifactSlot::Items, ArtifactSlot::Stylesheet];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactSlot::Items => "items",
            ArtifactSlot::Stylesheet => "stylesheet",
        }
    }
}

/// Key of one listing artifact entry, rendered as `<namespace>:<slot>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ContentKind,
    pub slot: ArtifactSlot,
}

impl CacheKey {
    pub fn items(kind: ContentKind) -> Self {
        Self {
            kind,
            slot: ArtifactSlot::Items,
        }
    }

    pub fn stylesheet(kind: ContentKind) -> Self {
        Self {
            kind,
            slot: ArtifactSlot::Stylesheet,
        }
    }
}

/// Number of distinct keys the listing pipeline writes across all feeds.
pub const LISTING_KEY_COUNT: usize = ContentKind::ALL.len() * ArtifactSlot::ALL.len();

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.slot.as_str())
    }
}
