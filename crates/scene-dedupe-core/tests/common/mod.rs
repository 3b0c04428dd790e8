#![allow(dead_code)]

use serde_json::{json, Value};

use scene_dedupe_core::store::{Library, RecordUpdate};
use scene_dedupe_core::{
    AuditMarker, DuplicateGroup, Error, MemoryStore, PhashDistance, Record, Result, SceneStore,
    TagId,
};

/// JSON for a scene with a single 1080p mp4 file
pub fn scene_json(id: i64, title: &str) -> Value {
    json!({
        "id": id.to_string(),
        "title": title,
        "tags": [],
        "files": [{
            "path": format!("/library/scene-{}.mp4", id),
            "size": "1000",
            "mod_time": "2023-05-01T12:00:00.250+00:00",
            "height": 1080,
            "width": 1920,
            "video_codec": "h264",
            "bit_rate": 5000
        }]
    })
}

/// Same as `scene_json` with some file fields replaced
pub fn scene_with(id: i64, file_fields: Value) -> Value {
    let mut scene = scene_json(id, &format!("Scene {}", id));
    if let (Some(file), Some(overrides)) = (
        scene["files"][0].as_object_mut(),
        file_fields.as_object(),
    ) {
        for (key, value) in overrides {
            file.insert(key.clone(), value.clone());
        }
    }
    scene
}

pub fn record(value: Value) -> Record {
    serde_json::from_value(value).expect("valid scene json")
}

/// Attach a tag to a scene JSON value
pub fn with_tag(mut scene: Value, tag_id: TagId, name: &str) -> Value {
    if let Some(tags) = scene["tags"].as_array_mut() {
        tags.push(json!({"id": tag_id.to_string(), "name": name}));
    }
    scene
}

pub fn library(tags: Value, scenes: Vec<Value>, exact: Vec<Vec<i64>>) -> Library {
    serde_json::from_value(json!({
        "tags": tags,
        "scenes": scenes,
        "duplicates": {"exact": exact}
    }))
    .expect("valid library json")
}

/// Store wrapper that counts updates and can be told to fail them
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub updates: Vec<RecordUpdate>,
    pub fail_updates_after: Option<usize>,
}

impl RecordingStore {
    pub fn new(library: Library) -> Self {
        Self {
            inner: MemoryStore::new(library),
            updates: Vec::new(),
            fail_updates_after: None,
        }
    }
}

impl SceneStore for RecordingStore {
    fn find_duplicate_groups(&self, distance: PhashDistance) -> Result<Vec<DuplicateGroup>> {
        self.inner.find_duplicate_groups(distance)
    }

    fn count_records_with_tag(&self, tag_id: TagId) -> Result<usize> {
        self.inner.count_records_with_tag(tag_id)
    }

    fn find_tag(&self, name: &str) -> Result<Option<TagId>> {
        self.inner.find_tag(name)
    }

    fn find_or_create_tag(&mut self, name: &str) -> Result<TagId> {
        self.inner.find_or_create_tag(name)
    }

    fn set_tag_parent(&mut self, tag_id: TagId, parent_id: TagId) -> Result<()> {
        self.inner.set_tag_parent(tag_id, parent_id)
    }

    fn delete_tag(&mut self, tag_id: TagId) -> Result<()> {
        self.inner.delete_tag(tag_id)
    }

    fn find_records_with_tag(&self, tag_id: TagId) -> Result<Vec<Record>> {
        self.inner.find_records_with_tag(tag_id)
    }

    fn find_records_with_marker(&self, marker: &AuditMarker) -> Result<Vec<Record>> {
        self.inner.find_records_with_marker(marker)
    }

    fn update_records(&mut self, update: &RecordUpdate) -> Result<()> {
        if let Some(limit) = self.fail_updates_after {
            if self.updates.len() >= limit {
                return Err(Error::Store("update rejected".to_string()));
            }
        }
        self.updates.push(update.clone());
        self.inner.update_records(update)
    }
}
