//! Picks the keeper of a duplicate group by folding pairwise comparisons.

use log::{info, warn};

use crate::compare::{Comparator, Comparison};
use crate::config::{Priority, PriorityRule};
use crate::error::{Error, Result};
use crate::types::{NormalizedRecord, Resolution};

/// Resolves duplicate groups against one immutable priority configuration
pub struct Resolver<'a> {
    rules: &'a [PriorityRule],
    comparator: Comparator<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(priority: &'a Priority) -> Self {
        Self {
            rules: &priority.property,
            comparator: Comparator::new(priority),
        }
    }

    /// Compare a challenger with the current keeper, rule by rule.
    ///
    /// The first rule that separates the two decides. When every rule ties
    /// the challenger loses and the reason says so.
    pub fn compare_scenes<'r>(
        &self,
        challenger: &'r NormalizedRecord,
        keeper: &'r NormalizedRecord,
    ) -> Comparison<'r> {
        if challenger.id == keeper.id {
            warn!("Scene {} appears twice in the same group", challenger.id);
            return Comparison {
                winner: None,
                reason: Some(format!("Matching IDs {}=={}", challenger.id, keeper.id)),
            };
        }

        for rule in self.rules {
            let outcome = self.comparator.compare(challenger, keeper, rule);
            if !outcome.is_tie() {
                return outcome;
            }
        }

        Comparison {
            winner: None,
            reason: Some(format!("{} worse than {}", challenger.id, keeper.id)),
        }
    }

    /// Choose exactly one keeper from `records`.
    ///
    /// A single left-to-right pass: each record is compared only against the
    /// keeper so far, never against records already rejected.
    pub fn resolve_group(&self, records: &[NormalizedRecord]) -> Result<Resolution> {
        let (first, rest) = match records.split_first() {
            Some(split) if records.len() >= 2 => split,
            _ => return Err(Error::GroupTooSmall(records.len())),
        };

        let mut keeper = first;
        let mut reasons = Vec::with_capacity(rest.len());
        for challenger in rest {
            let outcome = self.compare_scenes(challenger, keeper);
            if let Some(better) = outcome.winner {
                keeper = better;
            }
            if let Some(reason) = outcome.reason {
                reasons.push(reason);
            }
        }

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        info!("{} best of:{:?} {:?}", keeper.id, ids, reasons);

        Ok(Resolution {
            winner: keeper.id,
            losers: ids.into_iter().filter(|id| *id != keeper.id).collect(),
            reasons,
        })
    }
}
