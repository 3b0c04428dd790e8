use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a tag in the scene store
pub type TagId = i64;

/// A tag attached to a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(deserialize_with = "de_id")]
    pub id: TagId,
    pub name: String,
}

/// Raw scene record as returned by the scene store.
///
/// Only `id`, `title`, `tags` and `files` are typed; every other top-level
/// field is kept as-is in `fields` so that any of them can be named by a
/// priority rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// File descriptors; only the first one takes part in comparison
    #[serde(default)]
    pub files: Vec<Map<String, Value>>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// The first file descriptor, the one used for comparison
    pub fn primary_file(&self) -> Option<&Map<String, Value>> {
        self.files.first()
    }
}

/// Accepts ids encoded either as JSON integers or as numeric strings.
fn de_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Int(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{}'", text))),
    }
}

/// A comparable property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
    /// Floats, booleans, null, arrays and objects; never ordered
    Other(Value),
}

impl PropertyValue {
    /// Converts a JSON value, turning integer-looking strings into integers.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => match s.parse::<i64>() {
                Ok(n) => Self::Int(n),
                Err(_) => Self::Text(s.clone()),
            },
            Value::Number(n) => match n.as_i64() {
                Some(n) => Self::Int(n),
                None => Self::Other(value.clone()),
            },
            other => Self::Other(other.clone()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%:z")),
            Self::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Flattened, typed snapshot of a scene used for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub id: i64,

    /// Title with any audit marker removed
    pub title: String,

    pub properties: BTreeMap<String, PropertyValue>,
}

impl NormalizedRecord {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// A set of scenes believed to hold the same content
pub type DuplicateGroup = Vec<Record>;

/// Role a scene plays after its group has been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Keep,
    Remove,
}

impl Role {
    /// Letter written into the audit marker
    pub fn marker(&self) -> char {
        match self {
            Self::Keep => 'K',
            Self::Remove => 'R',
        }
    }
}

/// Outcome of resolving one duplicate group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub winner: i64,
    pub losers: Vec<i64>,
    /// Every decision taken during the fold, in order
    pub reasons: Vec<String>,
}
