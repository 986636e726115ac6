use crate::cache::CachePolicy;
use crate::i18n::{LanguageTag, NegotiationLimits, SupportedLanguages};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Process-wide configuration, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage locations
    pub data_prefix: PathBuf,
    pub i18n_prefix: PathBuf,
    pub units_file: PathBuf,

    // Languages
    pub default_lang: LanguageTag,
    pub supported_langs: Vec<LanguageTag>,

    // Output ordering (empty = data record order)
    pub canon_keys: Vec<String>,

    // Cache TTLs
    pub data_cache_ttl_seconds: u64,
    pub miss_cache_ttl_seconds: u64,
    pub desc_cache_ttl_seconds: u64,
    pub units_cache_ttl_seconds: u64,

    // Cache bounds
    pub max_data_cache_entries: usize,
    pub max_miss_cache_entries: usize,
    pub max_desc_cache_entries: usize,

    // HTTP caching
    pub response_cache_control: String,

    // Accept-Language caps
    pub max_lang_header_len: usize,
    pub max_lang_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_prefix: PathBuf::from("data"),
            i18n_prefix: PathBuf::from("i18n"),
            units_file: PathBuf::from("units.json"),
            default_lang: LanguageTag::parse("en").expect("static language tag"),
            supported_langs: ["en", "de", "fr"]
                .iter()
                .filter_map(|code| LanguageTag::parse(code))
                .collect(),
            canon_keys: Vec::new(),
            data_cache_ttl_seconds: 600,
            miss_cache_ttl_seconds: 60,
            desc_cache_ttl_seconds: 1200,
            units_cache_ttl_seconds: 1200,
            max_data_cache_entries: 1024,
            max_miss_cache_entries: 256,
            max_desc_cache_entries: 32,
            response_cache_control: "public, max-age=300".to_string(),
            max_lang_header_len: 256,
            max_lang_entries: 16,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unset variables take their defaults, as do numbers that fail to parse.
    /// Language tags are strict: a malformed `DEFAULT_LANG` or entry in
    /// `SUPPORTED_LANGS` is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let default_lang = match var("DEFAULT_LANG") {
            Some(raw) => LanguageTag::parse(&raw)
                .with_context(|| format!("DEFAULT_LANG is not a valid language tag: {:?}", raw))?,
            None => defaults.default_lang,
        };

        let supported_langs = match var("SUPPORTED_LANGS") {
            Some(raw) => split_list(&raw)
                .map(|code| {
                    LanguageTag::parse(code).with_context(|| {
                        format!("SUPPORTED_LANGS contains an invalid tag: {:?}", code)
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => defaults.supported_langs,
        };

        let config = Self {
            // Storage locations
            data_prefix: var("DATA_PREFIX")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_prefix),
            i18n_prefix: var("I18N_PREFIX")
                .map(PathBuf::from)
                .unwrap_or(defaults.i18n_prefix),
            units_file: var("UNITS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.units_file),

            // Languages
            default_lang,
            supported_langs,

            // Output ordering
            canon_keys: var("CANON_KEYS")
                .map(|raw| split_list(&raw).map(str::to_string).collect())
                .unwrap_or(defaults.canon_keys),

            // Cache TTLs
            data_cache_ttl_seconds: parse_or(
                var("DATA_CACHE_TTL_SECONDS"),
                defaults.data_cache_ttl_seconds,
            ),
            miss_cache_ttl_seconds: parse_or(
                var("MISS_CACHE_TTL_SECONDS"),
                defaults.miss_cache_ttl_seconds,
            ),
            desc_cache_ttl_seconds: parse_or(
                var("DESC_CACHE_TTL_SECONDS"),
                defaults.desc_cache_ttl_seconds,
            ),
            units_cache_ttl_seconds: parse_or(
                var("UNITS_CACHE_TTL_SECONDS"),
                defaults.units_cache_ttl_seconds,
            ),

            // Cache bounds
            max_data_cache_entries: parse_or(
                var("MAX_DATA_CACHE_ENTRIES"),
                defaults.max_data_cache_entries,
            ),
            max_miss_cache_entries: parse_or(
                var("MAX_MISS_CACHE_ENTRIES"),
                defaults.max_miss_cache_entries,
            ),
            max_desc_cache_entries: parse_or(
                var("MAX_DESC_CACHE_ENTRIES"),
                defaults.max_desc_cache_entries,
            ),

            // HTTP caching
            response_cache_control: var("RESPONSE_CACHE_CONTROL")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.response_cache_control),

            // Accept-Language caps
            max_lang_header_len: parse_or(var("MAX_LANG_HEADER_LEN"), defaults.max_lang_header_len),
            max_lang_entries: parse_or(var("MAX_LANG_ENTRIES"), defaults.max_lang_entries),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no request could be served with.
    pub fn validate(&self) -> Result<()> {
        if self.supported_langs.is_empty() {
            bail!("SUPPORTED_LANGS must list at least one language");
        }
        for (name, value) in [
            ("MAX_DATA_CACHE_ENTRIES", self.max_data_cache_entries),
            ("MAX_MISS_CACHE_ENTRIES", self.max_miss_cache_entries),
            ("MAX_DESC_CACHE_ENTRIES", self.max_desc_cache_entries),
            ("MAX_LANG_ENTRIES", self.max_lang_entries),
        ] {
            if value == 0 {
                bail!("{} must be greater than zero", name);
            }
        }
        Ok(())
    }

    pub fn supported_languages(&self) -> Result<SupportedLanguages> {
        SupportedLanguages::new(self.supported_langs.clone(), self.default_lang.clone())
    }

    pub fn negotiation_limits(&self) -> NegotiationLimits {
        NegotiationLimits {
            max_header_len: self.max_lang_header_len,
            max_entries: self.max_lang_entries,
        }
    }

    /// Item data: positive entries plus bounded "not found" entries.
    pub fn data_cache_policy(&self) -> CachePolicy {
        CachePolicy::new(
            Duration::from_secs(self.data_cache_ttl_seconds),
            self.max_data_cache_entries,
        )
        .with_negative(
            Duration::from_secs(self.miss_cache_ttl_seconds),
            self.max_miss_cache_entries,
        )
    }

    pub fn desc_cache_policy(&self) -> CachePolicy {
        CachePolicy::new(
            Duration::from_secs(self.desc_cache_ttl_seconds),
            self.max_desc_cache_entries,
        )
    }

    /// The unit map is a single global entry.
    pub fn units_cache_policy(&self) -> CachePolicy {
        CachePolicy::new(Duration::from_secs(self.units_cache_ttl_seconds), 1)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    // ==================== Default Tests ====================

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = from_pairs(&[]).expect("defaults are valid");
        assert_eq!(config.data_prefix, PathBuf::from("data"));
        assert_eq!(config.i18n_prefix, PathBuf::from("i18n"));
        assert_eq!(config.default_lang.as_str(), "en");
        let langs: Vec<_> = config.supported_langs.iter().map(|l| l.as_str()).collect();
        assert_eq!(langs, vec!["en", "de", "fr"]);
        assert!(config.canon_keys.is_empty());
        assert_eq!(config.data_cache_ttl_seconds, 600);
        assert_eq!(config.desc_cache_ttl_seconds, 1200);
        assert_eq!(config.response_cache_control, "public, max-age=300");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = from_pairs(&[("DATA_PREFIX", "  "), ("CANON_KEYS", "")]).unwrap();
        assert_eq!(config.data_prefix, PathBuf::from("data"));
        assert!(config.canon_keys.is_empty());
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_lists_are_trimmed_and_normalized() {
        let config = from_pairs(&[
            ("SUPPORTED_LANGS", " EN , de-CH,, fr "),
            ("CANON_KEYS", "key3, key1 ,,key2"),
        ])
        .unwrap();
        let langs: Vec<_> = config.supported_langs.iter().map(|l| l.as_str()).collect();
        assert_eq!(langs, vec!["en", "de-ch", "fr"]);
        assert_eq!(config.canon_keys, vec!["key3", "key1", "key2"]);
    }

    #[test]
    fn test_numbers_parse_and_bad_numbers_default() {
        let config = from_pairs(&[
            ("DATA_CACHE_TTL_SECONDS", "30"),
            ("MAX_MISS_CACHE_ENTRIES", "not-a-number"),
            ("MAX_LANG_HEADER_LEN", " 64 "),
        ])
        .unwrap();
        assert_eq!(config.data_cache_ttl_seconds, 30);
        assert_eq!(config.max_miss_cache_entries, 256);
        assert_eq!(config.max_lang_header_len, 64);
    }

    #[test]
    fn test_invalid_default_lang_is_error() {
        let err = from_pairs(&[("DEFAULT_LANG", "en_US")]).unwrap_err();
        assert!(err.to_string().contains("DEFAULT_LANG"));
    }

    #[test]
    fn test_invalid_supported_lang_is_error() {
        let err = from_pairs(&[("SUPPORTED_LANGS", "en,../de")]).unwrap_err();
        assert!(err.to_string().contains("SUPPORTED_LANGS"));
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_zero_capacity_rejected() {
        let err = from_pairs(&[("MAX_DATA_CACHE_ENTRIES", "0")]).unwrap_err();
        assert!(err.to_string().contains("MAX_DATA_CACHE_ENTRIES"));
    }

    #[test]
    fn test_empty_supported_set_rejected() {
        let config = Config {
            supported_langs: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    // ==================== Derived Settings Tests ====================

    #[test]
    fn test_data_cache_policy_has_negative_limits() {
        let config = Config::default();
        let policy = config.data_cache_policy();
        assert_eq!(policy.positive.ttl, Duration::from_secs(600));
        assert_eq!(policy.positive.max_entries, 1024);
        let negative = policy.negative.expect("negative caching enabled");
        assert_eq!(negative.ttl, Duration::from_secs(60));
        assert_eq!(negative.max_entries, 256);
    }

    #[test]
    fn test_desc_and_units_policies_do_not_cache_misses() {
        let config = Config::default();
        assert!(config.desc_cache_policy().negative.is_none());
        assert!(config.units_cache_policy().negative.is_none());
        assert_eq!(config.units_cache_policy().positive.max_entries, 1);
    }

    #[test]
    fn test_negotiation_limits() {
        let config = Config::default();
        let limits = config.negotiation_limits();
        assert_eq!(limits.max_header_len, 256);
        assert_eq!(limits.max_entries, 16);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("DEFAULT_LANG", "de");
        std::env::set_var("RESPONSE_CACHE_CONTROL", "no-store");
        let config = Config::from_env();
        std::env::remove_var("DEFAULT_LANG");
        std::env::remove_var("RESPONSE_CACHE_CONTROL");

        let config = config.expect("valid environment");
        assert_eq!(config.default_lang.as_str(), "de");
        assert_eq!(config.response_cache_control, "no-store");
    }
}
