use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Record, TagId};

/// Representation of a tag in a library snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTag {
    pub id: TagId,

    pub name: String,

    /// Tags this tag is nested under
    #[serde(default)]
    pub parent_ids: Vec<TagId>,

    /// Whether automatic tagging should skip this tag
    #[serde(default)]
    pub ignore_auto_tag: bool,
}

/// Precomputed duplicate groups, one list per distance level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateIndex {
    #[serde(default)]
    pub exact: Vec<Vec<i64>>,

    #[serde(default)]
    pub high: Vec<Vec<i64>>,

    #[serde(default)]
    pub medium: Vec<Vec<i64>>,
}

/// A library snapshot: scenes, tags and the duplicate index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub tags: Vec<StoredTag>,

    #[serde(default)]
    pub scenes: Vec<Record>,

    #[serde(default)]
    pub duplicates: DuplicateIndex,
}

impl Library {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let library = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(library)
    }

    /// Write the snapshot back as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn scene(&self, id: i64) -> Option<&Record> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&StoredTag> {
        self.tags.iter().find(|t| t.name == name)
    }
}
