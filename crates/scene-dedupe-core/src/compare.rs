//! Pairwise comparison of two scenes under a single priority rule.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;

use log::{debug, warn};

use crate::config::{Priority, PriorityRule, SortOrder, ValueKind};
use crate::types::{NormalizedRecord, PropertyValue};

/// Rank given to values that do not appear in a preference list
pub const UNLISTED_RANK: usize = usize::MAX;

/// Result of comparing two scenes under one rule.
///
/// `winner` is `None` when the rule does not separate the two scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison<'r> {
    pub winner: Option<&'r NormalizedRecord>,
    pub reason: Option<String>,
}

impl<'r> Comparison<'r> {
    pub fn tie() -> Self {
        Self {
            winner: None,
            reason: None,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.winner.is_none()
    }
}

/// Compares scenes according to the configured priority lists.
pub struct Comparator<'a> {
    priority: &'a Priority,
    /// (property, value) pairs already reported as missing from a list
    reported: RefCell<HashSet<(String, String)>>,
}

impl<'a> Comparator<'a> {
    pub fn new(priority: &'a Priority) -> Self {
        Self {
            priority,
            reported: RefCell::new(HashSet::new()),
        }
    }

    /// Decide whether `a` or `b` is preferred under `rule`
    pub fn compare<'r>(
        &self,
        a: &'r NormalizedRecord,
        b: &'r NormalizedRecord,
        rule: &PriorityRule,
    ) -> Comparison<'r> {
        let (a_value, b_value) = match (a.property(&rule.name), b.property(&rule.name)) {
            (Some(a_value), Some(b_value)) => (a_value, b_value),
            _ => {
                debug!(
                    "Property '{}' missing on {} or {}, skipping rule",
                    rule.name, a.id, b.id
                );
                return Comparison::tie();
            }
        };

        if a_value == b_value {
            return Comparison::tie();
        }

        if let Some(kind) = rule.data_type {
            if !is_kind(a_value, kind) || !is_kind(b_value, kind) {
                return Comparison::tie();
            }
        }

        let ordering = match rule.sort {
            SortOrder::Max => natural_order(a_value, b_value),
            SortOrder::Min => natural_order(a_value, b_value).map(Ordering::reverse),
            SortOrder::List => {
                let a_rank = self.rank(&rule.name, a_value);
                let b_rank = self.rank(&rule.name, b_value);
                // Lower index is better
                Some(b_rank.cmp(&a_rank))
            }
        };

        let (best, best_value, worst, worst_value) = match ordering {
            Some(Ordering::Greater) => (a, a_value, b, b_value),
            Some(Ordering::Less) => (b, b_value, a, a_value),
            Some(Ordering::Equal) | None => return Comparison::tie(),
        };

        Comparison {
            winner: Some(best),
            reason: Some(format!(
                "Preferred {} {} over {} | {} better than {}",
                rule.name, best_value, worst_value, best.id, worst.id
            )),
        }
    }

    /// Position of `value` in the preference list for `property`
    pub fn rank(&self, property: &str, value: &PropertyValue) -> usize {
        let list = self.priority.preference_list(property).unwrap_or_default();
        let value = value.to_string();

        let position = match property {
            "path" => list.iter().position(|prefix| value.starts_with(prefix.as_str())),
            "extension" | "ext" => list
                .iter()
                .position(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(&value)),
            _ => list.iter().position(|entry| *entry == value),
        };

        match position {
            Some(index) => index,
            None => {
                self.report_unlisted(property, value);
                UNLISTED_RANK
            }
        }
    }

    fn report_unlisted(&self, property: &str, value: String) {
        let key = (property.to_string(), value);
        if !self.reported.borrow().contains(&key) {
            warn!("could not find {} '{}'", key.0, key.1);
            self.reported.borrow_mut().insert(key);
        }
    }
}

/// Ordering of integers and timestamps; anything else is incomparable
fn natural_order(a: &PropertyValue, b: &PropertyValue) -> Option<Ordering> {
    match (a, b) {
        (PropertyValue::Int(a), PropertyValue::Int(b)) => Some(a.cmp(b)),
        (PropertyValue::Timestamp(a), PropertyValue::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn is_kind(value: &PropertyValue, kind: ValueKind) -> bool {
    matches!(
        (value, kind),
        (PropertyValue::Int(_), ValueKind::Int)
            | (PropertyValue::Text(_), ValueKind::Text)
            | (PropertyValue::Timestamp(_), ValueKind::Timestamp)
    )
}
