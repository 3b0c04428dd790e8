//! The scene store the tagger reads from and writes to.
//!
//! Duplicate detection, tag bookkeeping and persistence all live behind
//! [`SceneStore`]; the resolution engine never talks to it directly.

mod memory;
mod models;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::marker::AuditMarker;
use crate::types::{DuplicateGroup, Record, TagId};

pub use memory::MemoryStore;
pub use models::{DuplicateIndex, Library, StoredTag};

/// How close two perceptual hashes must be for scenes to be grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhashDistance {
    Exact,
    High,
    Medium,
}

impl PhashDistance {
    /// Maximum hamming distance between matching hashes
    pub fn value(&self) -> u32 {
        match self {
            Self::Exact => 0,
            Self::High => 4,
            Self::Medium => 8,
        }
    }
}

impl FromStr for PhashDistance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "high" => Ok(Self::High),
            "medium" | "mid" => Ok(Self::Medium),
            other => Err(Error::Configuration(format!(
                "unknown phash distance '{}', expected exact, high or medium",
                other
            ))),
        }
    }
}

/// Whether a tag patch adds or removes tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagPatchMode {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatch {
    pub mode: TagPatchMode,
    pub ids: Vec<TagId>,
}

/// Batched mutation applied to every listed scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub ids: Vec<i64>,
    pub title: Option<String>,
    pub tags: Option<TagPatch>,
}

impl RecordUpdate {
    pub fn new(ids: Vec<i64>) -> Self {
        Self {
            ids,
            title: None,
            tags: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tags(mut self, mode: TagPatchMode, ids: Vec<TagId>) -> Self {
        self.tags = Some(TagPatch { mode, ids });
        self
    }
}

/// External collaborator holding scenes and tags.
///
/// Failures are returned as-is; callers decide whether to continue.
pub trait SceneStore {
    /// Groups of scenes whose perceptual hashes are within `distance`
    fn find_duplicate_groups(&self, distance: PhashDistance) -> Result<Vec<DuplicateGroup>>;

    /// Number of scenes, library-wide, carrying the tag
    fn count_records_with_tag(&self, tag_id: TagId) -> Result<usize>;

    fn find_tag(&self, name: &str) -> Result<Option<TagId>>;

    fn find_or_create_tag(&mut self, name: &str) -> Result<TagId>;

    /// Nest a tag under a parent and exclude it from auto-tagging
    fn set_tag_parent(&mut self, tag_id: TagId, parent_id: TagId) -> Result<()>;

    fn delete_tag(&mut self, tag_id: TagId) -> Result<()>;

    fn find_records_with_tag(&self, tag_id: TagId) -> Result<Vec<Record>>;

    /// Scenes whose title starts with an audit marker
    fn find_records_with_marker(&self, marker: &AuditMarker) -> Result<Vec<Record>>;

    fn update_records(&mut self, update: &RecordUpdate) -> Result<()>;
}
