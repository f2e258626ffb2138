//! The entity store: records ripped from a map and their scratch file.
//!
//! The scratch file is the JSON document lazyripent produces and consumes:
//! a sequence of objects each carrying a single `KeyValues` mapping. The
//! field name and structure must round-trip exactly, so the serde shape
//! here is fixed.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RipkitError};

/// Name shown for records without a usable `classname` key.
pub const UNNAMED: &str = "<no classname>";

/// One entity record: a mapping from key to value, keys unique.
///
/// No schema is imposed; `classname` is conventional and used only for
/// display naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "KeyValues")]
    pub key_values: BTreeMap<String, String>,
}

impl Entity {
    /// Build a record by deep-copying a template mapping.
    pub fn from_template(template: &BTreeMap<String, String>) -> Self {
        Self {
            key_values: template.clone(),
        }
    }

    /// Fallback record used when no default template is configured.
    pub fn fallback() -> Self {
        let mut key_values = BTreeMap::new();
        key_values.insert("classname".to_string(), "new_entity".to_string());
        Self { key_values }
    }

    /// Display name for list views: the `classname` value, or
    /// [`UNNAMED`] when absent or empty.
    pub fn display_name(&self) -> &str {
        match self.key_values.get("classname") {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED,
        }
    }
}

/// Load the record sequence from a scratch file.
///
/// An unreadable file (including not-found) or malformed content is a
/// `Format` error; the caller aborts session initialization on it.
pub fn load(path: &Path) -> Result<Vec<Entity>> {
    let content = fs::read_to_string(path).map_err(|e| RipkitError::Format {
        message: format!("cannot read {}: {}", path.display(), e),
        help: Some("Extract the entity file from the map first".to_string()),
    })?;

    serde_json::from_str(&content).map_err(|e| RipkitError::Format {
        message: format!("{} is not a valid entity file: {}", path.display(), e),
        help: None,
    })
}

/// Persist the record sequence to a scratch file.
///
/// Pretty-printed JSON is written to a sibling temp file and renamed into
/// place, so a failed write leaves the prior file intact. The caller must
/// hand in a snapshot when saving asynchronously.
pub fn save(path: &Path, entities: &[Entity]) -> Result<()> {
    let data = serde_json::to_string_pretty(entities).map_err(|e| RipkitError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let tmp = path.with_extension("ent.tmp");
    fs::write(&tmp, data).map_err(|e| RipkitError::Write {
        path: tmp.clone(),
        message: e.to_string(),
    })?;
    fs::rename(&tmp, path).map_err(|e| RipkitError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Deep-copy the record sequence for a concurrent write.
///
/// Every record's mapping is independently copied; nothing is shared with
/// the live sequence.
pub fn snapshot(entities: &[Entity]) -> Vec<Entity> {
    entities.to_vec()
}

/// Filter records by a case-insensitive substring match against every key
/// and value. Returns absolute indices in original order; an empty needle
/// selects everything.
pub fn filter(entities: &[Entity], needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return (0..entities.len()).collect();
    }

    let needle = needle.to_lowercase();
    entities
        .iter()
        .enumerate()
        .filter(|(_, entity)| {
            entity.key_values.iter().any(|(key, value)| {
                key.to_lowercase().contains(&needle) || value.to_lowercase().contains(&needle)
            })
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entity(pairs: &[(&str, &str)]) -> Entity {
        Entity {
            key_values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.ent");
        let entities = vec![
            entity(&[("classname", "info_player_start"), ("origin", "0 0 0")]),
            entity(&[("classname", "light"), ("brightness", "200")]),
        ];

        save(&path, &entities).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, entities);
    }

    #[test]
    fn test_save_writes_exact_field_name() {
        let entities = vec![entity(&[("classname", "info_null")])];
        let json = serde_json::to_string_pretty(&entities).unwrap();
        insta::assert_snapshot!(json, @r#"
        [
          {
            "KeyValues": {
              "classname": "info_null"
            }
          }
        ]
        "#);
    }

    #[test]
    fn test_load_missing_file_is_format_error() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("absent.ent")).unwrap_err();
        assert!(matches!(err, RipkitError::Format { .. }));
    }

    #[test]
    fn test_load_malformed_content_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.ent");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, RipkitError::Format { .. }));
    }

    #[test]
    fn test_save_replaces_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.ent");

        save(&path, &[entity(&[("classname", "old")])]).unwrap();
        save(&path, &[entity(&[("classname", "new")])]).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded[0].display_name(), "new");
        // Temp file must not linger
        assert!(!path.with_extension("ent.tmp").exists());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut live = vec![entity(&[("classname", "light")])];
        let snap = snapshot(&live);

        live[0]
            .key_values
            .insert("classname".to_string(), "mutated".to_string());

        assert_eq!(snap[0].display_name(), "light");
    }

    #[test]
    fn test_filter_empty_needle_selects_all_in_order() {
        let entities = vec![
            entity(&[("classname", "a")]),
            entity(&[("classname", "b")]),
            entity(&[("classname", "c")]),
        ];
        assert_eq!(filter(&entities, ""), vec![0, 1, 2]);
    }

    #[test]
    fn test_filter_matches_keys_and_values() {
        let entities = vec![
            entity(&[("classname", "light"), ("targetname", "lamp1")]),
            entity(&[("classname", "func_door"), ("speed", "100")]),
        ];

        // Value match
        assert_eq!(filter(&entities, "lamp"), vec![0]);
        // Key match
        assert_eq!(filter(&entities, "speed"), vec![1]);
        // Case-insensitive
        assert_eq!(filter(&entities, "LIGHT"), vec![0]);
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        let entities = vec![entity(&[("classname", "light")])];
        assert!(filter(&entities, "zzz").is_empty());
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(entity(&[("origin", "0 0 0")]).display_name(), UNNAMED);
        assert_eq!(entity(&[("classname", "")]).display_name(), UNNAMED);
        assert_eq!(entity(&[("classname", "light")]).display_name(), "light");
    }

    #[test]
    fn test_fallback_record_shape() {
        let record = Entity::fallback();
        assert_eq!(record.key_values.len(), 1);
        assert_eq!(record.key_values.get("classname").unwrap(), "new_entity");
    }
}
