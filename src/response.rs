//! Response assembly: merges data, descriptions and units into the response
//! body and attaches the fixed header set.

use crate::i18n::LanguageTag;
use crate::store::{DataRecord, DescriptionSet, UnitMap};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// One entry of the `list-attribute` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeEntry {
    pub key: String,
    pub description: Option<String>,
    pub value: Value,
    pub unit: Option<String>,
}

/// Success payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemBody {
    pub id: String,
    pub language: LanguageTag,
    #[serde(rename = "list-attribute")]
    pub list_attribute: Vec<AttributeEntry>,
}

/// Error payload. `correlation_id` is only set for internal errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Item(ItemBody),
    Error(ErrorBody),
}

/// Ordered response headers with case-insensitive lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseHeaders {
    inner: Vec<(&'static str, String)>,
}

impl ResponseHeaders {
    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        self.inner.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.inner.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Serialize for ResponseHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (name, value) in &self.inner {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// `{statusCode, headers, body}` for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: ResponseHeaders,
    pub body: ResponseBody,
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(rename = "statusCode")]
    status_code: u16,
    headers: &'a ResponseHeaders,
    body: String,
}

impl ResponseEnvelope {
    /// Render the gateway shape: `body` is the JSON payload as a string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let wire = WireEnvelope {
            status_code: self.status_code,
            headers: &self.headers,
            body: serde_json::to_string(&self.body)?,
        };
        serde_json::to_string(&wire)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Order the record's attributes and join descriptions and units.
///
/// With `canon_keys` empty the record order is kept. Otherwise canonical keys
/// present in the record come first, in canonical order, followed by the
/// remaining keys in record order. Missing descriptions and units are `None`.
pub fn assemble_attributes(
    record: &DataRecord,
    descriptions: &DescriptionSet,
    units: &UnitMap,
    canon_keys: &[String],
) -> Vec<AttributeEntry> {
    let entry = |key: &str, value: &Value| AttributeEntry {
        key: key.to_string(),
        description: descriptions.get(key).cloned(),
        value: value.clone(),
        unit: units.get(key).cloned().flatten(),
    };

    let mut emitted: HashSet<&str> = HashSet::with_capacity(record.len());
    let mut entries = Vec::with_capacity(record.len());

    for key in canon_keys {
        if emitted.contains(key.as_str()) {
            continue;
        }
        if let Some(value) = record.get(key) {
            emitted.insert(key.as_str());
            entries.push(entry(key, value));
        }
    }

    for attr in record.attributes() {
        if !emitted.contains(attr.key.as_str()) {
            entries.push(entry(&attr.key, &attr.value));
        }
    }

    entries
}

/// Builds envelopes with the configured key order and `Cache-Control`.
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    canon_keys: Vec<String>,
    cache_control: String,
}

impl ResponseAssembler {
    pub fn new(canon_keys: Vec<String>, cache_control: impl Into<String>) -> Self {
        Self {
            canon_keys,
            cache_control: cache_control.into(),
        }
    }

    fn headers(&self, language: &LanguageTag) -> ResponseHeaders {
        let mut headers = ResponseHeaders::default();
        headers.insert("Content-Type", CONTENT_TYPE_JSON);
        headers.insert("Content-Language", language.as_str());
        headers.insert("Vary", "Accept-Language");
        headers.insert("Cache-Control", self.cache_control.as_str());
        headers
    }

    pub fn success(
        &self,
        id: &str,
        language: &LanguageTag,
        record: &DataRecord,
        descriptions: &DescriptionSet,
        units: &UnitMap,
    ) -> ResponseEnvelope {
        let list_attribute = assemble_attributes(record, descriptions, units, &self.canon_keys);
        ResponseEnvelope {
            status_code: 200,
            headers: self.headers(language),
            body: ResponseBody::Item(ItemBody {
                id: id.to_string(),
                language: language.clone(),
                list_attribute,
            }),
        }
    }

    pub fn error(
        &self,
        language: &LanguageTag,
        code: u16,
        message: impl Into<String>,
        correlation_id: Option<String>,
    ) -> ResponseEnvelope {
        ResponseEnvelope {
            status_code: code,
            headers: self.headers(language),
            body: ResponseBody::Error(ErrorBody {
                code,
                message: message.into(),
                correlation_id,
            }),
        }
    }
}
