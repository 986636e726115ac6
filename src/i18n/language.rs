//! Language tag: normalized, validated BCP-47-ish language identifier.
//!
//! Only the shape needed for negotiation is modeled: a base (primary) subtag
//! optionally followed by further hyphenated subtags such as a region.

use serde::{Serialize, Serializer};
use std::fmt;

/// Upper bound on the length of a tag we are willing to consider.
pub const MAX_TAG_LEN: usize = 35;

/// How closely two tags match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchLevel {
    /// Only the base subtags agree (`de-ch` vs `de`).
    Base,
    /// The full tags are equal.
    Exact,
}

/// A normalized lowercase language tag (e.g. `de`, `de-ch`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageTag {
    tag: String,
}

impl LanguageTag {
    /// Parse and normalize a language tag.
    ///
    /// Surrounding whitespace is trimmed and the tag is lowercased. Returns
    /// `None` for empty tags, tags longer than [`MAX_TAG_LEN`], empty subtags
    /// (`de-`, `-ch`, `de--ch`), or characters outside `[a-z0-9-]`.
    ///
    /// The wildcard `*` is not a language tag and is rejected here; the
    /// negotiator handles it separately.
    ///
    /// # Example
    /// ```
    /// use item_lookup::i18n::LanguageTag;
    ///
    /// let tag = LanguageTag::parse(" de-CH ").unwrap();
    /// assert_eq!(tag.as_str(), "de-ch");
    /// assert_eq!(tag.base(), "de");
    /// ```
    pub fn parse(raw: &str) -> Option<LanguageTag> {
        let tag = raw.trim().to_ascii_lowercase();
        if tag.is_empty() || tag.len() > MAX_TAG_LEN {
            return None;
        }
        let well_formed = tag.split('-').all(|subtag| {
            !subtag.is_empty()
                && subtag
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        });
        if !well_formed {
            return None;
        }
        Some(LanguageTag { tag })
    }

    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// The primary language subtag (`de` for `de-ch`).
    pub fn base(&self) -> &str {
        self.tag.split('-').next().unwrap_or(&self.tag)
    }

    /// Whether the tag carries subtags beyond the base.
    pub fn has_region(&self) -> bool {
        self.tag.contains('-')
    }

    /// Compare two tags.
    ///
    /// # Returns
    /// * `Some(MatchLevel::Exact)` if the tags are equal
    /// * `Some(MatchLevel::Base)` if only their base subtags are equal
    /// * `None` otherwise
    pub fn match_level(&self, other: &LanguageTag) -> Option<MatchLevel> {
        if self.tag == other.tag {
            Some(MatchLevel::Exact)
        } else if self.base() == other.base() {
            Some(MatchLevel::Base)
        } else {
            None
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl Serialize for LanguageTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag)
    }
}
