//! Request orchestration: validate → negotiate → load → assemble.
//!
//! A [`Handler`] is built once per warm process and shared by every
//! invocation; its caches live as long as it does.

use crate::cache::{CacheReport, Clock, SystemClock};
use crate::config::Config;
use crate::error::LookupError;
use crate::i18n::{negotiate, LanguageTag, NegotiationLimits, SupportedLanguages};
use crate::item_id::ItemId;
use crate::loader::Loaders;
use crate::response::{ResponseAssembler, ResponseEnvelope};
use crate::store::{ItemStore, StoreError};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// One inbound invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemRequest {
    pub item_id: String,
    #[serde(default)]
    pub accept_language: Option<String>,
}

impl ItemRequest {
    pub fn new(item_id: impl Into<String>, accept_language: Option<&str>) -> Self {
        Self {
            item_id: item_id.into(),
            accept_language: accept_language.map(str::to_string),
        }
    }
}

pub struct Handler {
    languages: SupportedLanguages,
    negotiation: NegotiationLimits,
    loaders: Arc<Loaders>,
    assembler: ResponseAssembler,
}

impl Handler {
    pub fn new(config: &Config, store: Arc<dyn ItemStore>) -> Result<Self> {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Build a handler whose caches read time from `clock`.
    pub fn with_clock(
        config: &Config,
        store: Arc<dyn ItemStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let languages = config
            .supported_languages()
            .context("Invalid language configuration")?;

        Ok(Self {
            languages,
            negotiation: config.negotiation_limits(),
            loaders: Arc::new(Loaders::new(config, store, clock)),
            assembler: ResponseAssembler::new(
                config.canon_keys.clone(),
                config.response_cache_control.clone(),
            ),
        })
    }

    /// Serve one request. Never fails: every outcome is an envelope.
    pub async fn handle(&self, request: &ItemRequest) -> ResponseEnvelope {
        let Some(id) = ItemId::parse(&request.item_id) else {
            return self.reject(self.languages.default_language(), LookupError::InvalidInput);
        };

        let language = negotiate(
            request.accept_language.as_deref(),
            &self.languages,
            self.negotiation,
        );

        match self.load_and_assemble(&id, &language).await {
            Ok(envelope) => envelope,
            Err(err) => self.reject(&language, err),
        }
    }

    /// Envelope for an invocation payload that could not be decoded.
    pub fn malformed_request(&self) -> ResponseEnvelope {
        self.reject(self.languages.default_language(), LookupError::MalformedRequest)
    }

    /// Serve one raw JSON invocation event.
    ///
    /// Bytes that are not UTF-8 or not an [`ItemRequest`] get a 400 envelope.
    pub async fn handle_event(&self, raw: &[u8]) -> ResponseEnvelope {
        match serde_json::from_slice::<ItemRequest>(raw) {
            Ok(request) => self.handle(&request).await,
            Err(e) => {
                warn!("Ignoring malformed invocation event: {}", e);
                self.malformed_request()
            }
        }
    }

    async fn load_and_assemble(
        &self,
        id: &ItemId,
        language: &LanguageTag,
    ) -> Result<ResponseEnvelope, LookupError> {
        // The three loads are independent; run them side by side.
        let units = {
            let loaders = Arc::clone(&self.loaders);
            tokio::task::spawn_blocking(move || loaders.units.load())
        };
        let descriptions = {
            let loaders = Arc::clone(&self.loaders);
            let language = language.clone();
            tokio::task::spawn_blocking(move || loaders.descriptions.load(&language))
        };
        let data = {
            let loaders = Arc::clone(&self.loaders);
            let id = id.clone();
            tokio::task::spawn_blocking(move || loaders.data.load(&id))
        };
        let (units, descriptions, data) = tokio::join!(units, descriptions, data);

        let units = joined(units, "units")?
            .ok_or_else(|| LookupError::internal(anyhow!("unit map is missing")))?;
        let descriptions = joined(descriptions, "descriptions")?.ok_or_else(|| {
            LookupError::internal(anyhow!("no description set for language '{}'", language))
        })?;
        let data = joined(data, "data")?.ok_or(LookupError::NotFound)?;

        Ok(self
            .assembler
            .success(id.as_str(), language, &data, &descriptions, &units))
    }

    fn reject(&self, language: &LanguageTag, err: LookupError) -> ResponseEnvelope {
        let code = err.status_code();
        match err {
            LookupError::Internal(source) => {
                let correlation_id = Uuid::new_v4().to_string();
                error!(
                    correlation_id = %correlation_id,
                    error = ?source,
                    "Internal error while handling item request"
                );
                self.assembler.error(
                    language,
                    code,
                    LookupError::Internal(source).to_string(),
                    Some(correlation_id),
                )
            }
            other => {
                debug!(code, reason = %other, "Rejected item request");
                self.assembler.error(language, code, other.to_string(), None)
            }
        }
    }

    pub fn supported_languages(&self) -> &SupportedLanguages {
        &self.languages
    }

    /// Snapshot of the data, description and unit caches.
    pub fn cache_reports(&self) -> Vec<CacheReport> {
        self.loaders.reports()
    }
}

/// Answer newline-delimited invocation events until `reader` is exhausted.
///
/// Lines are read as raw bytes so one undecodable line cannot end the loop.
/// Blank lines are skipped. Returns the number of envelopes written.
pub async fn serve_events<R, W>(handler: &Handler, mut reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    let mut served = 0usize;

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .context("Failed to read invocation event")?;
        if read == 0 {
            break;
        }

        let event = line.trim_ascii();
        if event.is_empty() {
            continue;
        }

        let envelope = handler.handle_event(event).await;
        let mut out = envelope.to_json().context("Failed to encode response")?;
        out.push('\n');
        writer
            .write_all(out.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await?;
        served += 1;
    }

    Ok(served)
}

fn joined<T>(
    result: Result<Result<T, StoreError>, JoinError>,
    source: &'static str,
) -> Result<T, LookupError> {
    let loaded = result
        .with_context(|| format!("{} load task did not complete", source))
        .map_err(LookupError::Internal)?;
    loaded
        .with_context(|| format!("failed to load {}", source))
        .map_err(LookupError::Internal)
}
