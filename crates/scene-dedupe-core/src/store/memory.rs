use std::path::Path;

use log::debug;

use super::models::{Library, StoredTag};
use super::{PhashDistance, RecordUpdate, SceneStore, TagPatchMode};
use crate::error::{Error, Result};
use crate::marker::AuditMarker;
use crate::types::{DuplicateGroup, Record, Tag, TagId};

/// Scene store backed by an in-memory library snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    library: Library,
}

impl MemoryStore {
    pub fn new(library: Library) -> Self {
        Self { library }
    }

    /// Load the snapshot the store operates on
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(Library::from_file(path)?))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.library.save_to_file(path)
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    fn next_tag_id(&self) -> TagId {
        self.library.tags.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn stored_tag(&self, tag_id: TagId) -> Result<&StoredTag> {
        self.library
            .tags
            .iter()
            .find(|t| t.id == tag_id)
            .ok_or_else(|| Error::Store(format!("unknown tag id {}", tag_id)))
    }

    fn scene_mut(&mut self, id: i64) -> Result<&mut Record> {
        self.library
            .scenes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::Store(format!("unknown scene id {}", id)))
    }
}

impl SceneStore for MemoryStore {
    fn find_duplicate_groups(&self, distance: PhashDistance) -> Result<Vec<DuplicateGroup>> {
        let index = &self.library.duplicates;
        let groups = match distance {
            PhashDistance::Exact => &index.exact,
            PhashDistance::High => &index.high,
            PhashDistance::Medium => &index.medium,
        };

        groups
            .iter()
            .map(|ids| {
                ids.iter()
                    .map(|id| {
                        self.library.scene(*id).cloned().ok_or_else(|| {
                            Error::Store(format!("duplicate index references unknown scene {}", id))
                        })
                    })
                    .collect::<Result<DuplicateGroup>>()
            })
            .collect()
    }

    fn count_records_with_tag(&self, tag_id: TagId) -> Result<usize> {
        Ok(self
            .library
            .scenes
            .iter()
            .filter(|s| s.has_tag(tag_id))
            .count())
    }

    fn find_tag(&self, name: &str) -> Result<Option<TagId>> {
        Ok(self.library.tag_by_name(name).map(|t| t.id))
    }

    fn find_or_create_tag(&mut self, name: &str) -> Result<TagId> {
        if let Some(tag) = self.library.tag_by_name(name) {
            return Ok(tag.id);
        }

        let id = self.next_tag_id();
        debug!("Creating tag {} '{}'", id, name);
        self.library.tags.push(StoredTag {
            id,
            name: name.to_string(),
            parent_ids: Vec::new(),
            ignore_auto_tag: false,
        });
        Ok(id)
    }

    fn set_tag_parent(&mut self, tag_id: TagId, parent_id: TagId) -> Result<()> {
        self.stored_tag(parent_id)?;
        let tag = self
            .library
            .tags
            .iter_mut()
            .find(|t| t.id == tag_id)
            .ok_or_else(|| Error::Store(format!("unknown tag id {}", tag_id)))?;

        tag.parent_ids = vec![parent_id];
        tag.ignore_auto_tag = true;
        Ok(())
    }

    fn delete_tag(&mut self, tag_id: TagId) -> Result<()> {
        self.stored_tag(tag_id)?;
        self.library.tags.retain(|t| t.id != tag_id);
        for tag in &mut self.library.tags {
            tag.parent_ids.retain(|id| *id != tag_id);
        }
        for scene in &mut self.library.scenes {
            scene.tags.retain(|t| t.id != tag_id);
        }
        Ok(())
    }

    fn find_records_with_tag(&self, tag_id: TagId) -> Result<Vec<Record>> {
        Ok(self
            .library
            .scenes
            .iter()
            .filter(|s| s.has_tag(tag_id))
            .cloned()
            .collect())
    }

    fn find_records_with_marker(&self, marker: &AuditMarker) -> Result<Vec<Record>> {
        Ok(self
            .library
            .scenes
            .iter()
            .filter(|s| marker.is_marked(s.title()))
            .cloned()
            .collect())
    }

    fn update_records(&mut self, update: &RecordUpdate) -> Result<()> {
        let patch_tags = match &update.tags {
            Some(patch) => patch
                .ids
                .iter()
                .map(|id| {
                    self.stored_tag(*id).map(|t| Tag {
                        id: t.id,
                        name: t.name.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        for id in &update.ids {
            let scene = self.scene_mut(*id)?;
            if let Some(title) = &update.title {
                scene.title = Some(title.clone());
            }
            if let Some(patch) = &update.tags {
                match patch.mode {
                    TagPatchMode::Add => {
                        for tag in &patch_tags {
                            if !scene.has_tag(tag.id) {
                                scene.tags.push(tag.clone());
                            }
                        }
                    }
                    TagPatchMode::Remove => {
                        scene.tags.retain(|t| !patch.ids.contains(&t.id));
                    }
                }
            }
        }
        Ok(())
    }
}
