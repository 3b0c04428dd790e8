//! Turns raw scene records into flat, typed property maps.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use log::trace;
use serde_json::{Map, Value};

use crate::config::PriorityRule;
use crate::error::{Error, Result};
use crate::marker::AuditMarker;
use crate::types::{NormalizedRecord, PropertyValue, Record};

/// Fields that are never copied into the property map
const IGNORED_FIELDS: [&str; 3] = ["id", "files", "title"];

/// Normalizes records against the active priority rules
pub struct PropertyExtractor<'a> {
    marker: &'a AuditMarker,
    rules: &'a [PriorityRule],
}

impl<'a> PropertyExtractor<'a> {
    pub fn new(marker: &'a AuditMarker, rules: &'a [PriorityRule]) -> Self {
        Self { marker, rules }
    }

    /// Build the comparable snapshot of a record.
    ///
    /// Fails if a derived field cannot be computed or if any property named
    /// by a priority rule is absent.
    pub fn normalize(&self, record: &Record) -> Result<NormalizedRecord> {
        let id = record.id;
        let mut properties = BTreeMap::new();

        copy_fields(&record.fields, &mut properties);
        properties.insert(
            "tags".to_string(),
            PropertyValue::Other(serde_json::to_value(&record.tags)?),
        );
        // File-level values win over record-level ones
        if let Some(file) = record.primary_file() {
            copy_fields(file, &mut properties);
        }

        let height = integer_field(id, &properties, "height")?;
        let width = integer_field(id, &properties, "width")?;
        properties.insert("resolution".to_string(), PropertyValue::Int(height.max(width)));

        let extension = match properties.get("path") {
            Some(path) => file_extension(&path.to_string()),
            None => return Err(missing(id, "path")),
        };
        properties.insert("extension".to_string(), PropertyValue::Text(extension.clone()));
        properties.insert("ext".to_string(), PropertyValue::Text(extension));

        let mod_time = match properties.get("mod_time") {
            Some(PropertyValue::Text(raw)) => parse_timestamp(raw).ok_or_else(|| {
                Error::TimestampParse {
                    record: id,
                    value: raw.clone(),
                }
            })?,
            Some(other) => {
                return Err(Error::TimestampParse {
                    record: id,
                    value: other.to_string(),
                })
            }
            None => return Err(missing(id, "mod_time")),
        };
        properties.insert("mod_time".to_string(), PropertyValue::Timestamp(mod_time));

        for rule in self.rules {
            if !properties.contains_key(&rule.name) {
                return Err(missing(id, &rule.name));
            }
        }

        let normalized = NormalizedRecord {
            id,
            title: self.marker.strip(record.title()).to_string(),
            properties,
        };
        trace!("Normalized scene {}: {:?}", id, normalized.properties);

        Ok(normalized)
    }
}

fn copy_fields(source: &Map<String, Value>, properties: &mut BTreeMap<String, PropertyValue>) {
    for (key, value) in source {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        properties.insert(key.clone(), PropertyValue::from_json(value));
    }
}

fn integer_field(id: i64, properties: &BTreeMap<String, PropertyValue>, name: &str) -> Result<i64> {
    match properties.get(name) {
        Some(PropertyValue::Int(n)) => Ok(*n),
        Some(other) => Err(Error::InvalidRecord(format!(
            "scene {} field '{}' is not an integer: {}",
            id, name, other
        ))),
        None => Err(missing(id, name)),
    }
}

fn missing(id: i64, field: &str) -> Error {
    Error::MissingField {
        record: id,
        field: field.to_string(),
    }
}

/// Lower-cased suffix of the path without the leading dot
pub fn file_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Parse a store timestamp such as `2023-04-05T06:07:08.123456+02:00`.
///
/// Fractional seconds are dropped before parsing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let ts = strip_fraction(raw.trim());
    DateTime::parse_from_rfc3339(&ts)
        .or_else(|_| DateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

/// Removes every `.<digits>` run, as in `05.123+01:00` -> `05+01:00`
fn strip_fraction(ts: &str) -> String {
    let mut out = String::with_capacity(ts.len());
    let mut chars = ts.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '.' && chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            while chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortOrder;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn scene(id: i64) -> Value {
        json!({
            "id": id.to_string(),
            "title": "[Dupe: 9K] My Scene",
            "rating": "4",
            "organized": true,
            "tags": [],
            "files": [{
                "path": "/media/Videos/My Scene.MP4",
                "size": "1048576",
                "mod_time": "2022-01-02T03:04:05.678+01:00",
                "height": 1080,
                "width": 1920,
                "video_codec": "h264",
                "frame_rate": 29.97
            }]
        })
    }

    #[test]
    fn test_normalize_derives_fields() {
        let marker = AuditMarker::new("Dupe").unwrap();
        let extractor = PropertyExtractor::new(&marker, &[]);
        let normalized = extractor.normalize(&record(scene(5))).unwrap();

        assert_eq!(normalized.id, 5);
        assert_eq!(normalized.title, "My Scene");
        assert_eq!(normalized.property("resolution"), Some(&PropertyValue::Int(1920)));
        assert_eq!(normalized.property("size"), Some(&PropertyValue::Int(1048576)));
        assert_eq!(normalized.property("rating"), Some(&PropertyValue::Int(4)));
        assert_eq!(
            normalized.property("extension"),
            Some(&PropertyValue::Text("mp4".to_string()))
        );
        assert_eq!(normalized.property("ext"), normalized.property("extension"));
        assert!(matches!(
            normalized.property("mod_time"),
            Some(PropertyValue::Timestamp(_))
        ));
        assert_eq!(normalized.property("tags"), Some(&PropertyValue::Other(json!([]))));
    }

    #[test]
    fn test_tags_are_kept_as_property() {
        let mut value = scene(2);
        value["tags"] = json!([{"id": "7", "name": "Favourite"}]);
        let marker = AuditMarker::new("Dupe").unwrap();
        let normalized = PropertyExtractor::new(&marker, &[])
            .normalize(&record(value))
            .unwrap();

        assert_eq!(
            normalized.property("tags"),
            Some(&PropertyValue::Other(json!([{"id": 7, "name": "Favourite"}])))
        );
    }

    #[test]
    fn test_file_fields_override_record_fields() {
        let mut value = scene(1);
        value["height"] = json!(10);
        value["video_codec"] = json!("mpeg2");
        let marker = AuditMarker::new("Dupe").unwrap();
        let normalized = PropertyExtractor::new(&marker, &[])
            .normalize(&record(value))
            .unwrap();

        assert_eq!(normalized.property("height"), Some(&PropertyValue::Int(1080)));
        assert_eq!(
            normalized.property("video_codec"),
            Some(&PropertyValue::Text("h264".to_string()))
        );
    }

    #[test]
    fn test_missing_height_fails() {
        let mut value = scene(3);
        value["files"][0].as_object_mut().unwrap().remove("height");
        let marker = AuditMarker::new("Dupe").unwrap();
        let err = PropertyExtractor::new(&marker, &[])
            .normalize(&record(value))
            .unwrap_err();

        assert!(matches!(err, Error::MissingField { record: 3, ref field } if field == "height"));
    }

    #[test]
    fn test_record_without_files_cannot_be_normalized() {
        let mut value = scene(4);
        value["files"] = json!([]);
        let marker = AuditMarker::new("Dupe").unwrap();
        let err = PropertyExtractor::new(&marker, &[])
            .normalize(&record(value))
            .unwrap_err();

        assert!(matches!(err, Error::MissingField { record: 4, .. }));
    }

    #[test]
    fn test_malformed_timestamp_fails() {
        let mut value = scene(6);
        value["files"][0]["mod_time"] = json!("yesterday");
        let marker = AuditMarker::new("Dupe").unwrap();
        let err = PropertyExtractor::new(&marker, &[])
            .normalize(&record(value))
            .unwrap_err();

        assert!(matches!(err, Error::TimestampParse { record: 6, .. }));
    }

    #[test]
    fn test_configured_property_must_exist() {
        let marker = AuditMarker::new("Dupe").unwrap();
        let rules = [PriorityRule::new("bit_rate", SortOrder::Max)];
        let err = PropertyExtractor::new(&marker, &rules)
            .normalize(&record(scene(8)))
            .unwrap_err();

        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "bit_rate"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = DateTime::parse_from_rfc3339("2022-01-02T03:04:05+01:00").unwrap();
        assert_eq!(parse_timestamp("2022-01-02T03:04:05.678+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2022-01-02T03:04:05+0100"), Some(expected));
        assert_eq!(
            parse_timestamp("2022-01-02T02:04:05Z"),
            Some(DateTime::parse_from_rfc3339("2022-01-02T02:04:05Z").unwrap())
        );
        assert_eq!(parse_timestamp("2022-01-02 03:04"), None);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("/a/b/Movie.MKV"), "mkv");
        assert_eq!(file_extension("/a/b/archive.tar.gz"), "gz");
        assert_eq!(file_extension("/a/b/noext"), "");
    }
}
