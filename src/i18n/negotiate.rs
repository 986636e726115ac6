//! Accept-Language negotiation (RFC 9110 §12.5.4, lookup-style matching).
//!
//! The header is parsed into a quality-ordered [`LanguagePreference`] and
//! resolved against [`SupportedLanguages`]. Negotiation never fails: when
//! nothing matches, the default language is returned.

use crate::i18n::{LanguageTag, SupportedLanguages};
use tracing::debug;

/// Caps applied to untrusted Accept-Language input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationLimits {
    /// Headers longer than this (in bytes) are ignored entirely.
    pub max_header_len: usize,
    /// Entries after this many are ignored.
    pub max_entries: usize,
}

impl Default for NegotiationLimits {
    fn default() -> Self {
        Self {
            max_header_len: 256,
            max_entries: 16,
        }
    }
}

/// A language range from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageRange {
    Tag(LanguageTag),
    /// `*`: acknowledged but never bound to a concrete language.
    Wildcard,
}

/// One weighted entry of a parsed header.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedLanguage {
    pub range: LanguageRange,
    pub quality: f32,
}

/// Parsed Accept-Language header, highest quality first.
///
/// Entries with equal quality keep their header order. Entries with `q=0`
/// are not present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LanguagePreference {
    entries: Vec<WeightedLanguage>,
}

impl LanguagePreference {
    /// Parse an Accept-Language header value.
    ///
    /// Absent, empty or over-long headers yield an empty preference. A
    /// malformed `q` (non-numeric, NaN, outside `[0, 1]`) counts as `1.0`.
    /// Unparseable language ranges are skipped.
    pub fn parse(header: Option<&str>, limits: NegotiationLimits) -> Self {
        let header = match header {
            Some(h) if !h.trim().is_empty() && h.len() <= limits.max_header_len => h,
            _ => return Self::default(),
        };

        let mut entries: Vec<WeightedLanguage> = header
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .take(limits.max_entries)
            .filter_map(parse_entry)
            .filter(|entry| entry.quality > 0.0)
            .collect();

        // Vec::sort_by is stable: ties keep header order.
        entries.sort_by(|a, b| b.quality.total_cmp(&a.quality));

        Self { entries }
    }

    pub fn entries(&self) -> &[WeightedLanguage] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve against the supported set.
    ///
    /// For each preference in order: an exact match wins, then a base-subtag
    /// match, then the next preference is tried. Wildcards never bind. Falls
    /// back to the default language.
    pub fn resolve<'a>(&self, supported: &'a SupportedLanguages) -> &'a LanguageTag {
        for entry in &self.entries {
            let LanguageRange::Tag(tag) = &entry.range else {
                continue;
            };
            if let Some(found) = supported.get_exact(tag) {
                return found;
            }
            if let Some(found) = supported.get_by_base(tag) {
                return found;
            }
        }
        supported.default_language()
    }
}

fn parse_entry(part: &str) -> Option<WeightedLanguage> {
    let mut pieces = part.split(';');
    let range = pieces.next()?.trim();

    let mut quality = 1.0;
    for param in pieces {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("q") {
            quality = parse_quality(value.trim());
        }
    }

    let range = if range == "*" {
        LanguageRange::Wildcard
    } else {
        LanguageRange::Tag(LanguageTag::parse(range)?)
    };

    Some(WeightedLanguage { range, quality })
}

fn parse_quality(raw: &str) -> f32 {
    match raw.parse::<f32>() {
        Ok(q) if (0.0..=1.0).contains(&q) => q,
        _ => 1.0,
    }
}

/// Pick the response language for an Accept-Language header.
///
/// Always returns a member of `supported` or its default language.
///
/// # Example
/// ```
/// use item_lookup::i18n::{negotiate, LanguageTag, NegotiationLimits, SupportedLanguages};
///
/// let supported = SupportedLanguages::new(
///     vec![LanguageTag::parse("de").unwrap(), LanguageTag::parse("en").unwrap()],
///     LanguageTag::parse("en").unwrap(),
/// )
/// .unwrap();
/// let lang = negotiate(Some("de-CH,en;q=0.5"), &supported, NegotiationLimits::default());
/// assert_eq!(lang.as_str(), "de");
/// ```
pub fn negotiate(
    header: Option<&str>,
    supported: &SupportedLanguages,
    limits: NegotiationLimits,
) -> LanguageTag {
    let preference = LanguagePreference::parse(header, limits);
    let resolved = preference.resolve(supported).clone();
    debug!(
        header = header.unwrap_or(""),
        candidates = preference.entries().len(),
        language = %resolved,
        "Negotiated response language"
    );
    resolved
}
