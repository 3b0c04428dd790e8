use log::debug;

use crate::types::{Record, TagId};

/// Smallest group worth resolving
pub const MIN_GROUP_SIZE: usize = 2;

/// Drops scenes that must not take part in resolution.
///
/// `review_only` is decided once per run from the whole library, not per group.
#[derive(Debug, Clone, Copy)]
pub struct GroupFilter {
    ignore_tag: TagId,
    review_tag: TagId,
    review_only: bool,
}

impl GroupFilter {
    pub fn new(ignore_tag: TagId, review_tag: TagId, review_only: bool) -> Self {
        Self {
            ignore_tag,
            review_tag,
            review_only,
        }
    }

    /// Whether only scenes carrying the review tag are considered
    pub fn review_only(&self) -> bool {
        self.review_only
    }

    pub fn filter(&self, group: &[Record]) -> Vec<Record> {
        group
            .iter()
            .filter(|scene| self.accepts(scene))
            .cloned()
            .collect()
    }

    fn accepts(&self, scene: &Record) -> bool {
        if scene.has_tag(self.ignore_tag) {
            debug!(
                "Ignore {} {}: marked with the ignore tag",
                scene.id,
                scene.title()
            );
            return false;
        }
        !self.review_only || scene.has_tag(self.review_tag)
    }
}

/// Whether a filtered group still has enough scenes to resolve
pub fn is_resolvable(group: &[Record]) -> bool {
    group.len() >= MIN_GROUP_SIZE
}
