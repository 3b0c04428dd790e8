use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for a duplicate tagging run.
///
/// Loaded once at start-up and never mutated afterwards; every component
/// receives it (or a part of it) by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag names and the title marker prefix
    pub tags: TagNames,

    /// Tie-break rules for choosing the scene to keep
    pub priority: Priority,

    /// Whether to log mutations instead of sending them to the store
    pub dry_run: bool,

    /// Whether to draw a progress bar while groups are processed
    pub show_progress: bool,

    /// Log level
    pub log_level: LogLevel,
}

/// Display names of the tags managed by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagNames {
    /// Prefix used inside the audit marker, e.g. `[Dupe: 42K]`
    #[serde(rename = "Prefix")]
    pub prefix: String,

    /// Parent tag all actionable tags are grouped under
    #[serde(rename = "Parent")]
    pub parent: String,

    #[serde(rename = "Keep")]
    pub keep: String,

    #[serde(rename = "Remove")]
    pub remove: String,

    #[serde(rename = "Ignore")]
    pub ignore: String,

    #[serde(rename = "Check")]
    pub check: String,
}

impl TagNames {
    /// The tags created under the parent tag, in creation order.
    pub fn actionable_tags(&self) -> [&str; 4] {
        [&self.keep, &self.remove, &self.ignore, &self.check]
    }
}

/// How a property is ordered when two scenes are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Larger value wins
    Max,

    /// Smaller value wins
    Min,

    /// Earlier position in the configured preference list wins
    List,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "list" => Ok(Self::List),
            other => Err(Error::Configuration(format!(
                "unknown sort order '{}', expected max, min or list",
                other
            ))),
        }
    }
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::List => "list",
        }
    }
}

/// Optional restriction on the kind of value a rule compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Text,
    Timestamp,
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(Self::Int),
            "text" => Ok(Self::Text),
            "timestamp" => Ok(Self::Timestamp),
            other => Err(Error::Configuration(format!(
                "unknown value type '{}', expected int, text or timestamp",
                other
            ))),
        }
    }
}

impl ValueKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
        }
    }
}

const TYPE_KEY: &str = "type";

/// One ordered tie-break criterion.
///
/// Serialized as a single-entry map `{"<property>": "<max|min|list>"}`,
/// optionally with a `"type"` key restricting the compared values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct PriorityRule {
    pub name: String,
    pub sort: SortOrder,
    pub data_type: Option<ValueKind>,
}

impl PriorityRule {
    pub fn new(name: impl Into<String>, sort: SortOrder) -> Self {
        Self {
            name: name.into(),
            sort,
            data_type: None,
        }
    }

    pub fn with_data_type(mut self, data_type: ValueKind) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

impl TryFrom<BTreeMap<String, String>> for PriorityRule {
    type Error = Error;

    fn try_from(mut map: BTreeMap<String, String>) -> Result<Self> {
        let data_type = map
            .remove(TYPE_KEY)
            .map(|kind| kind.parse::<ValueKind>())
            .transpose()?;

        if map.len() != 1 {
            return Err(Error::Configuration(format!(
                "priority rule must name exactly one property, found {}",
                map.len()
            )));
        }

        // Length checked above
        let (name, sort) = map.into_iter().next().ok_or_else(|| {
            Error::Configuration("priority rule must name exactly one property".to_string())
        })?;

        Ok(Self {
            name,
            sort: sort.parse()?,
            data_type,
        })
    }
}

impl From<PriorityRule> for BTreeMap<String, String> {
    fn from(rule: PriorityRule) -> Self {
        let mut map = BTreeMap::new();
        map.insert(rule.name, rule.sort.as_str().to_string());
        if let Some(kind) = rule.data_type {
            map.insert(TYPE_KEY.to_string(), kind.as_str().to_string());
        }
        map
    }
}

/// Ordered rules plus the preference lists used by `list` rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    /// Rules in precedence order; the first non-tie decides
    pub property: Vec<PriorityRule>,

    /// Preferred file extensions, best first
    #[serde(default)]
    pub extension: Vec<String>,

    /// Preferred video codecs, best first
    #[serde(default)]
    pub codec: Vec<String>,

    /// Preferred path prefixes, best first
    #[serde(default)]
    pub path: Vec<String>,

    /// Preference lists for any other property, keyed by property name
    #[serde(flatten)]
    pub lists: BTreeMap<String, Vec<String>>,
}

impl Priority {
    /// Preference list consulted by a `list` rule on `property`.
    ///
    /// `ext` shares the extension list and `video_codec` the codec list.
    pub fn preference_list(&self, property: &str) -> Option<&[String]> {
        let list = match property {
            "extension" | "ext" => &self.extension,
            "codec" | "video_codec" => &self.codec,
            "path" => &self.path,
            other => self.lists.get(other)?,
        };
        if list.is_empty() {
            None
        } else {
            Some(list)
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self {
            property: vec![
                PriorityRule::new("resolution", SortOrder::Max),
                PriorityRule::new("bit_rate", SortOrder::Max),
                PriorityRule::new("size", SortOrder::Max),
                PriorityRule::new("mod_time", SortOrder::Min),
            ],
            extension: Vec::new(),
            codec: Vec::new(),
            path: Vec::new(),
            lists: BTreeMap::new(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            prefix: "Dupe".to_string(),
            parent: "[Library management]".to_string(),
            keep: "[Dupe: Keep]".to_string(),
            remove: "[Dupe: Remove]".to_string(),
            ignore: "[Dupe: Ignore]".to_string(),
            check: "[Dupe: To check]".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tags: TagNames::default(),
            priority: Priority::default(),
            dry_run: false,
            show_progress: true,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Standard config file path: `<config dir>/scene-dedupe/config.json`
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("SCENE_DEDUPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("scene-dedupe")
            .join("config.json")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.tags.prefix;
        if prefix.is_empty() || prefix.contains(']') {
            return Err(Error::Configuration(format!(
                "Tag prefix '{}' must be non-empty and must not contain ']'",
                prefix
            )));
        }

        let mut names = vec![self.tags.parent.as_str()];
        names.extend(self.tags.actionable_tags());
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::Configuration("Tag names must not be empty".to_string()));
            }
            if names[..i].contains(name) {
                return Err(Error::Configuration(format!(
                    "Tag name '{}' is used for more than one role",
                    name
                )));
            }
        }

        if self.priority.property.is_empty() {
            return Err(Error::Configuration(
                "At least one priority property rule is required".to_string(),
            ));
        }

        for rule in &self.priority.property {
            if rule.sort == SortOrder::List && self.priority.preference_list(&rule.name).is_none() {
                return Err(Error::Configuration(format!(
                    "Priority rule '{}' uses list ordering but no '{}' preference list is configured",
                    rule.name, rule.name
                )));
            }
        }

        Ok(())
    }
}
