//! Backing stores for item data, description sets and the unit map.
//!
//! The core only sees the [`ItemStore`] trait. [`FsStore`] is the file-backed
//! implementation used locally; production deployments plug in a database or
//! object-store client behind the same trait.

use crate::config::Config;
use crate::i18n::LanguageTag;
use crate::item_id::{validate_item_id, ItemId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// One attribute of an item, in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: Value,
}

/// Attribute values of one item. Keys are unique; order is the record's own.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRecord {
    attributes: Vec<Attribute>,
}

impl DataRecord {
    /// Build a record, keeping the first occurrence of duplicate keys.
    pub fn new(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        let mut seen = HashSet::new();
        let attributes = attributes
            .into_iter()
            .filter(|attr| seen.insert(attr.key.clone()))
            .collect();
        Self { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| &attr.value)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// On-disk item file: `{"data-list": [{"key": "...", "value": ...}, ...]}`.
#[derive(Debug, Deserialize)]
struct DataFile {
    #[serde(rename = "data-list", default)]
    data_list: Vec<Value>,
}

impl From<DataFile> for DataRecord {
    fn from(file: DataFile) -> Self {
        // Entries without a string key are skipped; a missing value is "".
        DataRecord::new(file.data_list.into_iter().filter_map(|element| {
            let key = element.get("key")?.as_str()?.to_string();
            let value = element
                .get("value")
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            Some(Attribute { key, value })
        }))
    }
}

/// Attribute key → human-readable description, for one language.
pub type DescriptionSet = HashMap<String, String>;

/// Keep only string descriptions; `null` or any other value counts as missing.
fn description_set_from(raw: HashMap<String, Value>) -> DescriptionSet {
    raw.into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            _ => None,
        })
        .collect()
}

/// Attribute key → unit; `None` means "no unit".
pub type UnitMap = HashMap<String, Option<String>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("refusing to build a storage key from {0:?}")]
    RejectedKey(String),
}

/// Synchronous read access to the three data sources.
///
/// "Not found" is `Ok(None)`; every other failure is an error.
pub trait ItemStore: Send + Sync {
    fn fetch_data(&self, id: &ItemId) -> Result<Option<DataRecord>, StoreError>;

    fn fetch_descriptions(&self, lang: &LanguageTag) -> Result<Option<DescriptionSet>, StoreError>;

    fn fetch_units(&self) -> Result<Option<UnitMap>, StoreError>;
}

/// File-backed store: `<data_prefix>/<id>.json`, `<i18n_prefix>/<lang>.json`
/// and a single units file.
#[derive(Debug, Clone)]
pub struct FsStore {
    data_prefix: PathBuf,
    i18n_prefix: PathBuf,
    units_file: PathBuf,
}

impl FsStore {
    pub fn new(
        data_prefix: impl Into<PathBuf>,
        i18n_prefix: impl Into<PathBuf>,
        units_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_prefix: data_prefix.into(),
            i18n_prefix: i18n_prefix.into(),
            units_file: units_file.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.data_prefix.clone(),
            config.i18n_prefix.clone(),
            config.units_file.clone(),
        )
    }

    fn data_path(&self, id: &ItemId) -> Result<PathBuf, StoreError> {
        if !validate_item_id(id.as_str()) {
            return Err(StoreError::RejectedKey(id.as_str().to_string()));
        }
        Ok(self.data_prefix.join(format!("{}.json", id)))
    }

    fn i18n_path(&self, lang: &LanguageTag) -> Result<PathBuf, StoreError> {
        if LanguageTag::parse(lang.as_str()).as_ref() != Some(lang) {
            return Err(StoreError::RejectedKey(lang.as_str().to_string()));
        }
        Ok(self.i18n_prefix.join(format!("{}.json", lang)))
    }
}

/// Read and deserialize a JSON file; a missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Backing file not found");
            return Ok(None);
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

impl ItemStore for FsStore {
    fn fetch_data(&self, id: &ItemId) -> Result<Option<DataRecord>, StoreError> {
        let path = self.data_path(id)?;
        Ok(read_json::<DataFile>(&path)?.map(DataRecord::from))
    }

    fn fetch_descriptions(&self, lang: &LanguageTag) -> Result<Option<DescriptionSet>, StoreError> {
        let path = self.i18n_path(lang)?;
        Ok(read_json::<HashMap<String, Value>>(&path)?.map(description_set_from))
    }

    fn fetch_units(&self) -> Result<Option<UnitMap>, StoreError> {
        read_json(&self.units_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::create_dir(dir.path().join("i18n")).unwrap();
        let store = FsStore::new(
            dir.path().join("data"),
            dir.path().join("i18n"),
            dir.path().join("units.json"),
        );
        (dir, store)
    }

    fn id(raw: &str) -> ItemId {
        ItemId::parse(raw).unwrap()
    }

    fn lang(raw: &str) -> LanguageTag {
        LanguageTag::parse(raw).unwrap()
    }

    // ==================== DataRecord Tests ====================

    #[test]
    fn test_data_file_conversion_keeps_order_and_skips_keyless() {
        let file: DataFile = serde_json::from_value(json!({
            "data-list": [
                {"key": "key2", "value": 2},
                {"value": "orphan"},
                {"key": 7, "value": "numeric key"},
                {"key": "key1"},
                {"key": "key2", "value": "duplicate"}
            ]
        }))
        .unwrap();

        let record = DataRecord::from(file);
        let keys: Vec<_> = record.attributes().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["key2", "key1"]);
        assert_eq!(record.get("key2"), Some(&json!(2)));
        assert_eq!(record.get("key1"), Some(&json!("")));
    }

    #[test]
    fn test_data_file_without_list_is_empty() {
        let file: DataFile = serde_json::from_value(json!({"other": true})).unwrap();
        assert!(DataRecord::from(file).is_empty());
    }

    // ==================== FsStore Tests ====================

    #[test]
    fn test_fetch_data_found() {
        let (dir, store) = setup();
        std::fs::write(
            dir.path().join("data/ab12.json"),
            r#"{"data-list": [{"key": "len", "value": "3"}]}"#,
        )
        .unwrap();

        let record = store.fetch_data(&id("ab12")).unwrap().expect("record");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("len"), Some(&json!("3")));
    }

    #[test]
    fn test_fetch_data_missing_is_none() {
        let (_dir, store) = setup();
        assert!(store.fetch_data(&id("zzzz")).unwrap().is_none());
    }

    #[test]
    fn test_fetch_data_corrupt_is_parse_error() {
        let (dir, store) = setup();
        std::fs::write(dir.path().join("data/ab12.json"), "{not json").unwrap();

        let err = store.fetch_data(&id("ab12")).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_fetch_data_unreadable_is_io_error() {
        let (dir, store) = setup();
        // A directory where a file is expected
        std::fs::create_dir(dir.path().join("data/ab12.json")).unwrap();

        let err = store.fetch_data(&id("ab12")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_fetch_descriptions() {
        let (dir, store) = setup();
        std::fs::write(dir.path().join("i18n/de-ch.json"), r#"{"key1": "Länge"}"#).unwrap();

        let set = store.fetch_descriptions(&lang("de-CH")).unwrap().expect("descriptions");
        assert_eq!(set.get("key1").map(String::as_str), Some("Länge"));
        assert!(store.fetch_descriptions(&lang("fr")).unwrap().is_none());
    }

    #[test]
    fn test_fetch_descriptions_treats_null_and_non_string_as_missing() {
        let (dir, store) = setup();
        std::fs::write(
            dir.path().join("i18n/en.json"),
            r#"{"key1": "Length", "key2": null, "key3": 42, "key4": {"nested": "x"}}"#,
        )
        .unwrap();

        let set = store.fetch_descriptions(&lang("en")).unwrap().expect("descriptions");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("key1").map(String::as_str), Some("Length"));
        assert!(!set.contains_key("key2"));
        assert!(!set.contains_key("key3"));
    }

    #[test]
    fn test_fetch_descriptions_non_object_is_parse_error() {
        let (dir, store) = setup();
        std::fs::write(dir.path().join("i18n/en.json"), r#"["Length"]"#).unwrap();

        let err = store.fetch_descriptions(&lang("en")).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_fetch_units_with_null() {
        let (dir, store) = setup();
        std::fs::write(dir.path().join("units.json"), r#"{"key1": "m", "key3": null}"#).unwrap();

        let units = store.fetch_units().unwrap().expect("units");
        assert_eq!(units.get("key1"), Some(&Some("m".to_string())));
        assert_eq!(units.get("key3"), Some(&None));
    }

    #[test]
    fn test_fetch_units_missing_is_none() {
        let (_dir, store) = setup();
        assert!(store.fetch_units().unwrap().is_none());
    }

    #[test]
    fn test_error_message_does_not_embed_source() {
        let (dir, store) = setup();
        std::fs::write(dir.path().join("units.json"), "[1, 2]").unwrap();

        let err = store.fetch_units().unwrap_err();
        assert!(err.to_string().starts_with("failed to parse"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
