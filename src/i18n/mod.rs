//! Internationalization: language tags, the supported-language registry and
//! Accept-Language negotiation.
//!
//! # Architecture
//!
//! - `language`: normalized [`LanguageTag`] with base/exact matching
//! - `registry`: [`SupportedLanguages`], the configured set plus default
//! - `negotiate`: header parsing into a [`LanguagePreference`] and resolution
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::i18n::{negotiate, NegotiationLimits};
//!
//! let lang = negotiate(Some("de-CH,en;q=0.5"), &config.languages, config.negotiation);
//! ```

mod language;
mod negotiate;
mod registry;

pub use language::{LanguageTag, MatchLevel, MAX_TAG_LEN};
pub use negotiate::{
    negotiate, LanguagePreference, LanguageRange, NegotiationLimits, WeightedLanguage,
};
pub use registry::SupportedLanguages;
