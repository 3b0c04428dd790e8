//! Turns resolution results into store mutations, and undoes them.

use log::info;

use crate::error::Result;
use crate::logging::log_mutation;
use crate::marker::AuditMarker;
use crate::store::{RecordUpdate, SceneStore, TagPatchMode};
use crate::types::{NormalizedRecord, Resolution, Role, TagId};

/// Tag ids applied to keepers and to the scenes marked for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTags {
    pub keep: TagId,
    pub remove: TagId,
}

/// What a cleanup pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Scenes whose title marker was stripped
    pub titles: usize,
    /// Scenes the keep tag was removed from
    pub keep_tags: usize,
    /// Scenes the remove tag was removed from
    pub remove_tags: usize,
}

impl CleanupSummary {
    pub fn is_empty(&self) -> bool {
        self.titles == 0 && self.keep_tags == 0 && self.remove_tags == 0
    }
}

/// Sends title and tag updates to the scene store
pub struct ActionDispatcher<'a, S: SceneStore> {
    store: &'a mut S,
    marker: &'a AuditMarker,
    dry_run: bool,
}

impl<'a, S: SceneStore> ActionDispatcher<'a, S> {
    pub fn new(store: &'a mut S, marker: &'a AuditMarker, dry_run: bool) -> Self {
        Self {
            store,
            marker,
            dry_run,
        }
    }

    /// Mark the keeper and every loser of a resolved group.
    ///
    /// One update per scene; the updates are independent, so a failure part
    /// way through leaves the earlier scenes tagged.
    pub fn tag_group(
        &mut self,
        resolution: &Resolution,
        group: &[NormalizedRecord],
        tags: ActionTags,
    ) -> Result<()> {
        for scene in group {
            let (role, tag) = if scene.id == resolution.winner {
                (Role::Keep, tags.keep)
            } else {
                (Role::Remove, tags.remove)
            };

            let update = RecordUpdate::new(vec![scene.id])
                .with_title(self.marker.apply(&scene.title, resolution.winner, role))
                .with_tags(TagPatchMode::Add, vec![tag]);
            self.send(&update)?;
        }
        Ok(())
    }

    /// Strip every audit marker and detach the keep and remove tags.
    ///
    /// Tags that do not exist in the store are passed as `None` and skipped.
    pub fn clean_titles(
        &mut self,
        keep_tag: Option<TagId>,
        remove_tag: Option<TagId>,
    ) -> Result<CleanupSummary> {
        let mut summary = CleanupSummary::default();

        let marked = self.store.find_records_with_marker(self.marker)?;
        info!("Cleaning Titles/Tags of {} Scenes", marked.len());
        for scene in &marked {
            info!(
                "Removing Dupe Title String from: [{}] {}",
                scene.id,
                scene.title()
            );
            let update =
                RecordUpdate::new(vec![scene.id]).with_title(self.marker.strip(scene.title()));
            self.send(&update)?;
            summary.titles += 1;
        }

        if let Some(tag) = keep_tag {
            summary.keep_tags = self.untag_all(tag)?;
        }
        if let Some(tag) = remove_tag {
            summary.remove_tags = self.untag_all(tag)?;
        }

        Ok(summary)
    }

    fn untag_all(&mut self, tag: TagId) -> Result<usize> {
        let ids: Vec<i64> = self
            .store
            .find_records_with_tag(tag)?
            .iter()
            .map(|s| s.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let count = ids.len();
        self.send(&RecordUpdate::new(ids).with_tags(TagPatchMode::Remove, vec![tag]))?;
        Ok(count)
    }

    fn send(&mut self, update: &RecordUpdate) -> Result<()> {
        log_mutation(update, self.dry_run);
        if self.dry_run {
            return Ok(());
        }
        self.store.update_records(update)
    }
}
