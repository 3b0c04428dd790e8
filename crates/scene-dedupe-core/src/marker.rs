//! Audit marker written in front of scene titles.
//!
//! A resolved scene gets a title such as `[Dupe: 42K] Scene Name`, where `42`
//! is the id of the keeper and `K`/`R` is the role of the scene itself.

use regex::Regex;

use crate::error::{Error, Result};
use crate::types::Role;

#[derive(Debug, Clone)]
pub struct AuditMarker {
    prefix: String,
    pattern: Regex,
}

impl AuditMarker {
    pub fn new(prefix: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"^\[{}: \d+[KR]\]\s+", regex::escape(prefix)))
            .map_err(|e| Error::Configuration(format!("Invalid marker prefix '{}': {}", prefix, e)))?;

        Ok(Self {
            prefix: prefix.to_string(),
            pattern,
        })
    }

    /// Whether the title starts with a marker for this prefix
    pub fn is_marked(&self, title: &str) -> bool {
        self.pattern.is_match(title)
    }

    /// Title with a leading marker removed, if there was one
    pub fn strip<'a>(&self, title: &'a str) -> &'a str {
        match self.pattern.find(title) {
            Some(m) => &title[m.end()..],
            None => title,
        }
    }

    /// Title carrying a fresh marker; any previous marker is replaced
    pub fn apply(&self, title: &str, winner_id: i64, role: Role) -> String {
        format!(
            "[{}: {}{}] {}",
            self.prefix,
            winner_id,
            role.marker(),
            self.strip(title)
        )
    }
}
