//! Typed loader for the journal's data documents.

use crate::cache::{CacheController, FetchRequest, FetchResponse};
use crate::config::DataConfig;
use crate::error::{Error, Result};
use crate::state::{AccountConfig, TradesDocument};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// An entry in the notes index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteEntry {
    pub title: String,
    pub file: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub tags: Vec<String>,
}

/// The notes index document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesIndex {
    pub notes: Vec<NoteEntry>,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// An entry in the books index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookEntry {
    pub title: String,
    pub file: String,
    pub filename: String,
    pub size: u64,
    pub size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

/// The books index document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BooksIndex {
    pub books: Vec<BookEntry>,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// High-level client for the journal's data endpoints.
///
/// Every request goes through the cache controller, so loads keep working
/// offline whenever a cached copy exists.
#[derive(Clone)]
pub struct DataClient {
    controller: Arc<CacheController>,
    base: Url,
    config: DataConfig,
}

impl DataClient {
    /// Create a client for the configured endpoints.
    pub fn new(controller: Arc<CacheController>, config: &DataConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            controller,
            base,
            config: config.clone(),
        })
    }

    /// Fetch the account configuration document.
    pub async fn fetch_account_config(&self) -> Result<AccountConfig> {
        self.fetch_json(&self.config.account_config_path).await
    }

    /// Fetch the trade index document.
    pub async fn fetch_trades(&self) -> Result<TradesDocument> {
        self.fetch_json(&self.config.trades_path).await
    }

    /// Fetch the derived analytics payload.
    pub async fn fetch_analytics(&self) -> Result<serde_json::Value> {
        self.fetch_json(&self.config.analytics_path).await
    }

    /// Fetch the notes index.
    pub async fn fetch_notes_index(&self) -> Result<NotesIndex> {
        self.fetch_json(&self.config.notes_index_path).await
    }

    /// Fetch the books index.
    pub async fn fetch_books_index(&self) -> Result<BooksIndex> {
        self.fetch_json(&self.config.books_index_path).await
    }

    /// Fetch a raw text document (markdown notes, book excerpts).
    pub async fn fetch_document(&self, path: &str) -> Result<String> {
        let response = self.request(path).await?;
        Ok(response.text())
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(path).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn request(&self, path: &str) -> Result<FetchResponse> {
        let request = FetchRequest::get(self.base.join(path)?);
        let response = self.controller.handle_fetch(&request).await?;
        if !response.is_success() {
            return Err(Error::network(format!(
                "GET {} returned {}",
                request.url, response.status
            )));
        }
        Ok(response)
    }
}
