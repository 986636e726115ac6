//! Item lookup with localized descriptions and units.
//!
//! Answers "give me item X, described in language Y" by combining per-item
//! data, per-language description sets and a global unit map, each read
//! through its own in-process TTL cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod handler;
pub mod i18n;
pub mod item_id;
pub mod loader;
pub mod response;
pub mod store;

pub use config::Config;
pub use error::LookupError;
pub use handler::{Handler, ItemRequest};
pub use response::ResponseEnvelope;
pub use store::{FsStore, ItemStore};
