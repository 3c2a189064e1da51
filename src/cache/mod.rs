//! Offline caching layer.
//!
//! Intercepts the application's own data traffic and applies one of two
//! strategies: cache-first for static assets, network-first for data
//! endpoints. The layer owns two named caches, a versioned static cache
//! replaced wholesale on version bumps and a runtime cache holding the
//! latest successfully fetched data.

mod controller;
mod storage;

pub use controller::{CacheController, Command, CommandAck, Phase};
pub use storage::CacheStorage;

use crate::error::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method of an intercepted request. Only GETs are ever cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Other,
}

impl RequestMethod {
    pub fn is_get(self) -> bool {
        matches!(self, RequestMethod::Get)
    }
}

/// An outgoing request seen by the caching layer.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub method: RequestMethod,
}

impl FetchRequest {
    /// A GET request for the given URL.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: RequestMethod::Get,
        }
    }

    /// Cache key for this request.
    pub fn key(&self) -> &str {
        self.url.as_str()
    }
}

/// A response as stored in and served from the caches.
///
/// Bodies are cheap-to-clone byte buffers, so storing a response always
/// stores a clone while the original stays deliverable to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }

    /// Only plain 200s are considered cacheable successes.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Plain-text 503 served when a static asset is unreachable and no
    /// fallback page is cached.
    pub fn offline_text() -> Self {
        Self {
            status: 503,
            content_type: Some("text/plain".to_string()),
            body: Bytes::from_static(b"Offline - Please check your connection"),
        }
    }

    /// Structured JSON 503 served when a data endpoint is unreachable and
    /// no cached copy exists.
    pub fn offline_json() -> Self {
        let body = serde_json::json!({
            "error": "Offline",
            "message": "Data not available offline. Please connect to the internet.",
            "cached": false,
        });
        Self {
            status: 503,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Classification of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// JSON data endpoint; served network-first.
    Data,
    /// Everything else; served cache-first.
    Static,
}

/// Classify a URL by the configured data markers.
pub fn classify(url: &Url, data_markers: &[String]) -> RequestClass {
    let target = url.as_str();
    if data_markers.iter().any(|marker| target.contains(marker.as_str())) {
        RequestClass::Data
    } else {
        RequestClass::Static
    }
}

/// Network access as seen by the caching layer.
///
/// The controller never talks to the network directly; it goes through
/// this seam so the strategies can be exercised without a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}
