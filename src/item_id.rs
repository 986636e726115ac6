//! Item identifier validation.
//!
//! Item IDs end up in storage keys (file names in the demo backend, object
//! keys in production), so nothing reaches a loader unless it passed through
//! [`validate_item_id`] first.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Exact length of a valid item identifier.
pub const ITEM_ID_LEN: usize = 4;

static ITEM_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn item_id_regex() -> &'static Regex {
    ITEM_ID_REGEX.get_or_init(|| Regex::new(r"\A[a-z0-9]{4}\z").expect("static item id pattern"))
}

/// A validated item identifier: exactly four characters from `[a-z0-9]`.
///
/// The only way to obtain one is [`ItemId::parse`] (or [`validate_item_id`]),
/// so holding an `ItemId` means the value is safe to use as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    /// Validate `raw` and wrap it.
    ///
    /// # Returns
    /// * `Some(ItemId)` if `raw` is exactly 4 chars of `[a-z0-9]`
    /// * `None` for anything else (empty, wrong length, uppercase, punctuation, `/`, `.`)
    pub fn parse(raw: &str) -> Option<ItemId> {
        if validate_item_id(raw) {
            Some(ItemId(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Pure predicate: is `raw` a well-formed item identifier?
pub fn validate_item_id(raw: &str) -> bool {
    // Byte length check first keeps the regex off oversized input.
    raw.len() == ITEM_ID_LEN && item_id_regex().is_match(raw)
}
