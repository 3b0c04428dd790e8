//! Core functionality for resolving duplicate scenes.
//!
//! This library provides the building blocks of a duplicate tagging run:
//! - Property extraction from raw scene records
//! - Rule-by-rule comparison and keeper selection
//! - Group filtering by ignore and review tags
//! - Title and tag mutations, and their cleanup

// -- External Dependencies --

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use action::{ActionDispatcher, ActionTags, CleanupSummary};
pub use compare::{Comparator, Comparison};
pub use config::*;
pub use error::{Error, Result};
pub use extract::PropertyExtractor;
pub use filter::GroupFilter;
pub use marker::AuditMarker;
pub use resolve::Resolver;
pub use store::{MemoryStore, PhashDistance, SceneStore};
pub use types::*;

// -- Public Modules --
pub mod action;
pub mod compare;
pub mod config;
pub mod extract;
pub mod filter;
pub mod logging;
pub mod marker;
pub mod resolve;
pub mod store;
pub mod types;

/// Counts reported at the end of a tagging run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Duplicate groups returned by the store
    pub groups: usize,
    /// Groups whose keeper was tagged
    pub resolved: usize,
    /// Groups left with fewer than two scenes after filtering
    pub skipped: usize,
    /// Groups with a scene that could not be normalized
    pub failed: usize,
}

/// Normalize a duplicate group and pick its keeper.
///
/// Stateless entry point; `DupeTagger` keeps one resolver for a whole run
/// instead so unlisted values are only reported once.
pub fn resolve_group(group: &[Record], config: &Config) -> Result<Resolution> {
    config.validate()?;
    let marker = AuditMarker::new(&config.tags.prefix)?;
    let extractor = PropertyExtractor::new(&marker, &config.priority.property);
    let normalized = group
        .iter()
        .map(|record| extractor.normalize(record))
        .collect::<Result<Vec<_>>>()?;
    Resolver::new(&config.priority).resolve_group(&normalized)
}

/// Main entry point for tagging duplicate scenes in a store
pub struct DupeTagger<S: SceneStore> {
    config: Config,
    marker: AuditMarker,
    store: S,
}

impl<S: SceneStore> DupeTagger<S> {
    /// Create a tagger; the configuration is validated once here
    pub fn new(config: Config, store: S) -> Result<Self> {
        config.validate()?;
        let marker = AuditMarker::new(&config.tags.prefix)?;
        Ok(Self {
            config,
            marker,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Create the parent tag and nest every actionable tag under it
    pub fn create_tags(&mut self) -> Result<()> {
        let parent = self.store.find_or_create_tag(&self.config.tags.parent)?;
        for name in self.config.tags.actionable_tags() {
            let id = self.store.find_or_create_tag(name)?;
            info!("Tag {} '{}'", id, name);
            if id != parent {
                self.store.set_tag_parent(id, parent)?;
            }
        }
        Ok(())
    }

    /// Delete every actionable tag that exists; returns how many were deleted
    pub fn remove_tags(&mut self) -> Result<usize> {
        let mut removed = 0;
        for name in self.config.tags.actionable_tags() {
            if let Some(id) = self.store.find_tag(name)? {
                info!("Deleting tag {} '{}'", id, name);
                self.store.delete_tag(id)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Strip audit markers and detach the keep and remove tags
    pub fn clean_titles(&mut self) -> Result<CleanupSummary> {
        let keep = self.store.find_tag(&self.config.tags.keep)?;
        let remove = self.store.find_tag(&self.config.tags.remove)?;
        ActionDispatcher::new(&mut self.store, &self.marker, self.config.dry_run)
            .clean_titles(keep, remove)
    }

    /// Resolve every duplicate group at `distance` and tag the results.
    ///
    /// Groups are processed in store order. A group with a scene that fails
    /// normalization is skipped; store failures end the run.
    pub fn tag_duplicates(&mut self, distance: PhashDistance) -> Result<RunSummary> {
        let groups = self.store.find_duplicate_groups(distance)?;
        info!(
            "Finding duplicates at {:?} (phash distance {})",
            distance,
            distance.value()
        );

        let tags = &self.config.tags;
        let ignore = self.store.find_or_create_tag(&tags.ignore)?;
        let check = self.store.find_or_create_tag(&tags.check)?;
        let review_only = self.store.count_records_with_tag(check)? > 0;
        let action_tags = ActionTags {
            keep: self.store.find_or_create_tag(&tags.keep)?,
            remove: self.store.find_or_create_tag(&tags.remove)?,
        };

        let mut summary = RunSummary {
            groups: groups.len(),
            ..RunSummary::default()
        };
        info!("There is {} sets of duplicates found.", groups.len());

        let filter = GroupFilter::new(ignore, check, review_only);
        if filter.review_only() {
            info!("Only scenes tagged '{}' are considered", tags.check);
        }
        let extractor = PropertyExtractor::new(&self.marker, &self.config.priority.property);
        let resolver = Resolver::new(&self.config.priority);
        let progress = progress_bar(groups.len(), self.config.show_progress);

        for group in &groups {
            progress.inc(1);

            let filtered = filter.filter(group);
            if !filter::is_resolvable(&filtered) {
                summary.skipped += 1;
                continue;
            }

            let normalized = match filtered
                .iter()
                .map(|record| extractor.normalize(record))
                .collect::<Result<Vec<_>>>()
            {
                Ok(normalized) => normalized,
                Err(e) => {
                    let ids: Vec<i64> = filtered.iter().map(|r| r.id).collect();
                    warn!("Skipping duplicate group {:?}: {}", ids, e);
                    summary.failed += 1;
                    continue;
                }
            };

            let resolution = resolver.resolve_group(&normalized)?;
            ActionDispatcher::new(&mut self.store, &self.marker, self.config.dry_run)
                .tag_group(&resolution, &normalized, action_tags)?;
            summary.resolved += 1;
        }

        progress.finish_with_message(format!(
            "{} resolved, {} skipped, {} failed",
            summary.resolved, summary.skipped, summary.failed
        ));
        Ok(summary)
    }
}

fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
    {
        progress.set_style(style.progress_chars("##-"));
    }
    progress.set_message("Resolving duplicate groups...");
    progress
}
