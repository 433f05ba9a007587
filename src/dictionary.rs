//! Remote dictionary confirmation.
//!
//! The validator only needs "what is the best known spelling for this word",
//! so the capability is a single async lookup. [`DatamuseClient`] talks to the
//! public Datamuse API; [`StaticDictionary`] answers from memory.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_DICTIONARY_URL: &str = "https://api.datamuse.com/words";

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("dictionary request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("dictionary returned HTTP {0}")]
    Status(StatusCode),
    #[error("dictionary response was malformed: {0}")]
    Malformed(String),
    #[error("dictionary unavailable: {0}")]
    Unavailable(String),
}

/// One entry of a lookup response, best match first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Suggestion {
    pub word: String,
    #[serde(default)]
    pub score: Option<u64>,
}

#[async_trait]
pub trait DictionaryLookup: Send + Sync {
    /// Suggestions for an exact spelling query, best first, at most `max_results`.
    async fn lookup(&self, spelling: &str, max_results: usize)
        -> Result<Vec<Suggestion>, LookupError>;
}

/// Datamuse `words?sp=` client
#[derive(Debug, Clone)]
pub struct DatamuseClient {
    client: Client,
    base_url: String,
}

impl DatamuseClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DictionaryLookup for DatamuseClient {
    async fn lookup(
        &self,
        spelling: &str,
        max_results: usize,
    ) -> Result<Vec<Suggestion>, LookupError> {
        debug!(spelling, max_results, "dictionary lookup");
        let max = max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("sp", spelling), ("max", max.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, spelling, "dictionary rejected request");
            return Err(LookupError::Status(status));
        }

        let body = response.text().await?;
        parse_suggestions(&body)
    }
}

pub(crate) fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>, LookupError> {
    serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))
}

/// In-memory dictionary: a known word suggests itself, anything else yields nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticDictionary {
    words: HashSet<String>,
}

impl StaticDictionary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl DictionaryLookup for StaticDictionary {
    async fn lookup(
        &self,
        spelling: &str,
        max_results: usize,
    ) -> Result<Vec<Suggestion>, LookupError> {
        if max_results == 0 || !self.words.contains(spelling) {
            return Ok(Vec::new());
        }
        Ok(vec![Suggestion {
            word: spelling.to_string(),
            score: None,
        }])
    }
}
