//! Supported languages: the set of languages descriptions exist for.
//!
//! Built once from configuration and shared read-only by every invocation.
//! Order is preserved from configuration so base-level matching against
//! several regional variants is deterministic.

use crate::i18n::LanguageTag;
use anyhow::{bail, Result};

/// Ordered set of supported language tags plus the default language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLanguages {
    languages: Vec<LanguageTag>,
    default: LanguageTag,
}

impl SupportedLanguages {
    /// Build the registry.
    ///
    /// Duplicates are dropped (first occurrence wins). The default language
    /// does not have to be listed in `languages`; negotiation falls back to it
    /// regardless.
    ///
    /// # Errors
    /// Fails if `languages` is empty.
    pub fn new(languages: Vec<LanguageTag>, default: LanguageTag) -> Result<Self> {
        let mut unique: Vec<LanguageTag> = Vec::with_capacity(languages.len());
        for lang in languages {
            if !unique.contains(&lang) {
                unique.push(lang);
            }
        }

        if unique.is_empty() {
            bail!("Supported language set must not be empty");
        }

        Ok(Self {
            languages: unique,
            default,
        })
    }

    /// The fallback language used when nothing in a request matches.
    pub fn default_language(&self) -> &LanguageTag {
        &self.default
    }

    /// Get a supported tag equal to `tag`.
    pub fn get_exact(&self, tag: &LanguageTag) -> Option<&LanguageTag> {
        self.languages.iter().find(|lang| *lang == tag)
    }

    /// Get the supported tag sharing `tag`'s base subtag.
    ///
    /// A supported tag that *is* the bare base (`de` for `de-ch`) is preferred;
    /// otherwise the first supported regional variant in configuration order.
    pub fn get_by_base(&self, tag: &LanguageTag) -> Option<&LanguageTag> {
        let base = tag.base();
        self.languages
            .iter()
            .find(|lang| lang.as_str() == base)
            .or_else(|| self.languages.iter().find(|lang| lang.base() == base))
    }

    /// Whether `tag` is supported (or is the default).
    pub fn contains(&self, tag: &LanguageTag) -> bool {
        self.get_exact(tag).is_some() || &self.default == tag
    }

    pub fn list(&self) -> &[LanguageTag] {
        &self.languages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(raw: &str) -> LanguageTag {
        LanguageTag::parse(raw).unwrap()
    }

    fn registry(langs: &[&str], default: &str) -> SupportedLanguages {
        SupportedLanguages::new(langs.iter().map(|l| tag(l)).collect(), tag(default)).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_set() {
        let result = SupportedLanguages::new(vec![], tag("en"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_new_drops_duplicates() {
        let reg = registry(&["en", "de", "EN"], "en");
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn test_get_exact() {
        let reg = registry(&["en", "de-ch"], "en");
        assert_eq!(reg.get_exact(&tag("de-ch")), Some(&tag("de-ch")));
        assert_eq!(reg.get_exact(&tag("de")), None);
    }

    #[test]
    fn test_get_by_base_prefers_bare_base() {
        let reg = registry(&["de-at", "de", "en"], "en");
        assert_eq!(reg.get_by_base(&tag("de-ch")), Some(&tag("de")));
    }

    #[test]
    fn test_get_by_base_falls_back_to_first_variant() {
        let reg = registry(&["en", "de-at", "de-ch"], "en");
        assert_eq!(reg.get_by_base(&tag("de")), Some(&tag("de-at")));
    }

    #[test]
    fn test_get_by_base_none() {
        let reg = registry(&["en", "de"], "en");
        assert_eq!(reg.get_by_base(&tag("fr-ca")), None);
    }

    #[test]
    fn test_contains_includes_default() {
        let reg = registry(&["de"], "en");
        assert!(reg.contains(&tag("en")));
        assert!(reg.contains(&tag("de")));
        assert!(!reg.contains(&tag("fr")));
    }
}
