//! Inspirational quotes for captures.
//!
//! [`QuoteProvider::fetch_quote`] asks a [`QuoteSource`] for a quote and
//! never fails: anything that goes wrong (timeout, transport error, bad
//! status, malformed body) is logged and replaced with one of
//! [`FALLBACK_QUOTES`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::photo::Quote;

/// Local quotes used when the remote service is unavailable.
pub const FALLBACK_QUOTES: [&str; 10] = [
    "A vida é feita de momentos especiais.",
    "Cada foto conta uma história única.",
    "Capture o momento, guarde a memória.",
    "A beleza está nos pequenos detalhes.",
    "Viva o presente, fotografe o momento.",
    "Memórias são tesouros que guardamos no coração.",
    "Cada dia é uma nova oportunidade para criar.",
    "A vida é uma coleção de momentos.",
    "Sorria, você está criando memórias.",
    "O melhor momento é agora.",
];

/// Pick a fallback quote uniformly at random.
#[must_use]
pub fn fallback_quote() -> Quote {
    let text = FALLBACK_QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_QUOTES[0]);
    Quote::anonymous(text)
}

/// Whether `quote` is one of the local fallback entries.
#[must_use]
pub fn is_fallback(quote: &Quote) -> bool {
    quote.author.is_none() && FALLBACK_QUOTES.contains(&quote.text.as_str())
}

/// Somewhere quotes come from.
#[async_trait]
pub trait QuoteSource: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Fetch one quote.
    ///
    /// # Errors
    ///
    /// Returns an error if no quote could be obtained.
    async fn fetch(&self) -> Result<Quote>;
}

/// Response body of the remote quote service.
#[derive(Debug, Deserialize)]
struct RemoteQuote {
    content: String,
    author: String,
}

/// [`QuoteSource`] backed by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpQuoteSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpQuoteSource {
    /// Create a source for `endpoint` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint this source queries.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> Result<Quote> {
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::quote_fetch(format!("service returned {status}")));
        }

        let body: RemoteQuote = response
            .json()
            .await
            .map_err(|e| Error::quote_fetch(format!("malformed body: {e}")))?;

        if body.content.trim().is_empty() {
            return Err(Error::quote_fetch("empty quote"));
        }

        Ok(Quote::new(body.content, body.author))
    }
}

/// Fetches quotes with a deadline and a local fallback.
#[derive(Debug, Clone)]
pub struct QuoteProvider {
    source: Arc<dyn QuoteSource>,
    timeout: Duration,
}

impl QuoteProvider {
    /// Wrap `source`, cutting every fetch off after `timeout`.
    #[must_use]
    pub fn new(source: Arc<dyn QuoteSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Build the HTTP-backed provider described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.quote_timeout();
        let source = HttpQuoteSource::new(config.quotes.endpoint.clone(), timeout)?;
        Ok(Self::new(Arc::new(source), timeout))
    }

    /// The fetch deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a quote, falling back to a local one on any failure.
    pub async fn fetch_quote(&self) -> Quote {
        match self.try_fetch().await {
            Ok(quote) => {
                debug!(source = self.source.name(), "Fetched quote");
                quote
            }
            Err(e) => {
                info!(source = self.source.name(), error = %e, "Using fallback quote");
                fallback_quote()
            }
        }
    }

    async fn try_fetch(&self) -> Result<Quote> {
        tokio::time::timeout(self.timeout, self.source.fetch())
            .await
            .map_err(|_| Error::Timeout {
                operation: format!("quote fetch from {}", self.source.name()),
            })?
    }
}
