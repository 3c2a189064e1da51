//! Cache lifecycle controller.
//!
//! Explicit state machine over the caching layer's lifecycle: the
//! controller installs the versioned static cache, activates by evicting
//! stale cache versions, and then intercepts the application's own GET
//! traffic, applying cache-first or network-first strategies.

use super::{
    CacheStorage, FetchRequest, FetchResponse, Fetcher, RequestClass, classify,
};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use futures::future::try_join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created; the static cache may be mid-population.
    Installing,
    /// Stale caches evicted, control not yet taken.
    Activated,
    /// In control; requests are intercepted.
    Intercepting,
}

/// Control commands accepted by the controller.
#[derive(Debug)]
pub enum Command {
    /// Activate immediately instead of waiting for the old version to wind down.
    SkipWaiting,
    /// Delete every cache and acknowledge on the reply channel.
    ClearCache { reply: oneshot::Sender<CommandAck> },
}

/// Acknowledgement for commands that reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandAck {
    pub success: bool,
}

/// The offline caching controller.
pub struct CacheController {
    config: CacheConfig,
    /// Origin plus scope the journal is served from; requests outside it
    /// pass through untouched.
    base: Url,
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    phase: Mutex<Phase>,
}

impl CacheController {
    /// Create a controller in the `Installing` phase.
    pub fn new(
        config: CacheConfig,
        base: Url,
        storage: Arc<CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            base,
            storage,
            fetcher,
            phase: Mutex::new(Phase::Installing),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    /// Bulk-populate the versioned static cache with the core assets.
    ///
    /// Fail-fast: the first asset that cannot be fetched with a 200 fails
    /// the whole install. Assets stored before the failure stay in place;
    /// the controller simply never activates from this install.
    pub async fn install(&self) -> Result<()> {
        let static_cache = self.config.static_cache_name();
        info!(
            version = %self.config.version,
            assets = self.config.core_assets.len(),
            "installing core assets"
        );

        let jobs = self.config.core_assets.iter().map(|asset| {
            let static_cache = static_cache.clone();
            async move {
                let request = FetchRequest::get(self.base.join(asset)?);
                let response = self.fetcher.fetch(&request).await?;
                if !response.is_success() {
                    return Err(Error::cache(format!(
                        "core asset {} returned {}",
                        request.url, response.status
                    )));
                }
                self.storage.put(&static_cache, request.key(), response);
                Ok(())
            }
        });
        try_join_all(jobs).await?;

        debug!(cache = %static_cache, "core assets cached");
        Ok(())
    }

    /// Evict every cache that is neither the current static cache nor the
    /// runtime cache, then take control of traffic immediately.
    pub fn activate(&self) {
        self.set_phase(Phase::Activated);

        let keep_static = self.config.static_cache_name();
        let keep_runtime = self.config.runtime_cache_name();
        for name in self.storage.cache_names() {
            if name != keep_static && name != keep_runtime {
                info!(cache = %name, "deleting old cache");
                self.storage.delete(&name);
            }
        }

        self.set_phase(Phase::Intercepting);
        info!(version = %self.config.version, "cache controller activated");
    }

    /// Handle an outgoing request.
    ///
    /// Non-GET and cross-origin requests pass straight through, as does
    /// everything before activation completes. Intercepted requests always
    /// resolve to a response; offline conditions surface as synthesized
    /// 503s, never as errors.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        if self.phase() != Phase::Intercepting
            || !request.method.is_get()
            || !self.intercepts(&request.url)
        {
            return self.fetcher.fetch(request).await;
        }

        match classify(&request.url, &self.config.data_markers) {
            RequestClass::Data => Ok(self.network_first(request).await),
            RequestClass::Static => Ok(self.cache_first(request).await),
        }
    }

    fn intercepts(&self, url: &Url) -> bool {
        url.origin() == self.base.origin() || url.path().starts_with(self.base.path())
    }

    /// Cache-first: serve the static cache, fall back to the network.
    async fn cache_first(&self, request: &FetchRequest) -> FetchResponse {
        let static_cache = self.config.static_cache_name();
        if let Some(cached) = self.storage.get(&static_cache, request.key()) {
            debug!(url = %request.url, "serving from cache");
            return cached;
        }

        debug!(url = %request.url, "fetching from network");
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.storage
                        .put(&static_cache, request.key(), response.clone());
                }
                response
            }
            Err(error) => {
                warn!(url = %request.url, %error, "static fetch failed");
                self.offline_fallback(&static_cache)
                    .unwrap_or_else(FetchResponse::offline_text)
            }
        }
    }

    fn offline_fallback(&self, static_cache: &str) -> Option<FetchResponse> {
        let url = self.base.join(&self.config.offline_fallback).ok()?;
        self.storage.get(static_cache, url.as_str())
    }

    /// Network-first: fetch fresh data, fall back to the runtime cache,
    /// then the static cache.
    async fn network_first(&self, request: &FetchRequest) -> FetchResponse {
        debug!(url = %request.url, "fetching fresh data");
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.storage.put(
                        self.config.runtime_cache_name(),
                        request.key(),
                        response.clone(),
                    );
                }
                response
            }
            Err(error) => {
                debug!(url = %request.url, %error, "network failed, serving from cache");
                if let Some(cached) = self
                    .storage
                    .get(self.config.runtime_cache_name(), request.key())
                {
                    return cached;
                }
                if let Some(cached) = self
                    .storage
                    .get(&self.config.static_cache_name(), request.key())
                {
                    return cached;
                }
                FetchResponse::offline_json()
            }
        }
    }

    /// Handle a control command.
    pub fn handle_command(&self, command: Command) {
        match command {
            Command::SkipWaiting => {
                if self.phase() != Phase::Intercepting {
                    info!("skip waiting requested, activating now");
                    self.activate();
                }
            }
            Command::ClearCache { reply } => {
                self.storage.delete_all();
                info!("all caches cleared");
                if reply.send(CommandAck { success: true }).is_err() {
                    warn!("clear-cache requester went away before the ack");
                }
            }
        }
    }

    /// Run commands off a channel on a background task.
    pub fn spawn_command_loop(
        self: &Arc<Self>,
    ) -> (mpsc::UnboundedSender<Command>, tokio::task::JoinHandle<()>) {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let controller = Arc::clone(self);

        let handle = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                controller.handle_command(command);
            }
        });

        (command_tx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MockFetcher, RequestMethod};
    use pretty_assertions::assert_eq;

    fn base() -> Url {
        Url::parse("http://localhost:8080/pennybook/").unwrap()
    }

    fn page_url(path: &str) -> Url {
        base().join(path).unwrap()
    }

    fn test_config() -> CacheConfig {
        CacheConfig {
            version: "1.0.0".to_string(),
            core_assets: vec!["index.html".to_string(), "offline.html".to_string()],
            ..CacheConfig::default()
        }
    }

    fn make(fetcher: MockFetcher) -> (Arc<CacheStorage>, CacheController) {
        let storage = Arc::new(CacheStorage::new());
        let controller = CacheController::new(
            test_config(),
            base(),
            Arc::clone(&storage),
            Arc::new(fetcher),
        );
        (storage, controller)
    }

    #[tokio::test]
    async fn test_install_populates_static_cache() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Ok(FetchResponse::ok("asset body", "text/html")));

        let (storage, controller) = make(fetcher);
        controller.install().await.unwrap();

        assert_eq!(storage.entry_count("pennybook-v1.0.0"), 2);
        assert!(
            storage
                .get("pennybook-v1.0.0", page_url("index.html").as_str())
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_install_fails_fast_when_any_asset_fails() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|request| {
            if request.url.path().ends_with("index.html") {
                Ok(FetchResponse::ok("<html>", "text/html"))
            } else {
                Err(Error::network("connection refused"))
            }
        });

        let (_, controller) = make(fetcher);
        assert!(controller.install().await.is_err());
        assert_eq!(controller.phase(), Phase::Installing);
    }

    #[tokio::test]
    async fn test_install_rejects_non_200_asset() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|_| {
            Ok(FetchResponse {
                status: 404,
                content_type: None,
                body: bytes::Bytes::new(),
            })
        });

        let (_, controller) = make(fetcher);
        assert!(controller.install().await.is_err());
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let original = FetchResponse::ok("cached page bytes", "text/html");
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().times(0);

        let (storage, controller) = make(fetcher);
        storage.put(
            "pennybook-v1.0.0",
            page_url("index.html").as_str(),
            original.clone(),
        );
        controller.activate();

        let request = FetchRequest::get(page_url("index.html"));
        let response = controller.handle_fetch(&request).await.unwrap();
        // byte-for-byte round trip
        assert_eq!(response.body, original.body);
        assert_eq!(response, original);
    }

    #[tokio::test]
    async fn test_cache_first_miss_caches_network_success() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchResponse::ok("fresh page", "text/html")));

        let (storage, controller) = make(fetcher);
        controller.activate();

        let request = FetchRequest::get(page_url("journal.html"));
        let response = controller.handle_fetch(&request).await.unwrap();
        assert_eq!(response.text(), "fresh page");

        let stored = storage
            .get("pennybook-v1.0.0", request.key())
            .expect("response cloned into static cache");
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn test_cache_first_offline_serves_fallback_page() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Err(Error::network("offline")));

        let (storage, controller) = make(fetcher);
        storage.put(
            "pennybook-v1.0.0",
            page_url("offline.html").as_str(),
            FetchResponse::ok("offline page", "text/html"),
        );
        controller.activate();

        let request = FetchRequest::get(page_url("journal.html"));
        let response = controller.handle_fetch(&request).await.unwrap();
        assert_eq!(response.text(), "offline page");
    }

    #[tokio::test]
    async fn test_cache_first_offline_without_fallback_is_plain_503() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Err(Error::network("offline")));

        let (_, controller) = make(fetcher);
        controller.activate();

        let request = FetchRequest::get(page_url("journal.html"));
        let response = controller.handle_fetch(&request).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_network_first_stores_runtime_copy_served_when_offline() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchResponse::ok("{\"trades\":[]}", "application/json")));

        let (storage, controller) = make(fetcher);
        controller.activate();

        let request = FetchRequest::get(page_url("data/trades-index.json"));
        let fresh = controller.handle_fetch(&request).await.unwrap();
        let cached = storage
            .get("pennybook-runtime", request.key())
            .expect("fresh data cloned into runtime cache");
        assert_eq!(cached, fresh);

        // same storage, network now down
        let mut offline = MockFetcher::new();
        offline
            .expect_fetch()
            .returning(|_| Err(Error::network("offline")));
        let controller = CacheController::new(
            test_config(),
            base(),
            Arc::clone(&storage),
            Arc::new(offline),
        );
        controller.activate();

        let response = controller.handle_fetch(&request).await.unwrap();
        assert_eq!(response.body, fresh.body);
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_static_cache() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Err(Error::network("offline")));

        let (storage, controller) = make(fetcher);
        let request = FetchRequest::get(page_url("data/trades-index.json"));
        storage.put(
            "pennybook-v1.0.0",
            request.key(),
            FetchResponse::ok("{\"trades\":[1]}", "application/json"),
        );
        controller.activate();

        let response = controller.handle_fetch(&request).await.unwrap();
        assert_eq!(response.text(), "{\"trades\":[1]}");
    }

    #[tokio::test]
    async fn test_network_first_offline_with_no_cache_is_json_503() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Err(Error::network("offline")));

        let (_, controller) = make(fetcher);
        controller.activate();

        let request = FetchRequest::get(page_url("data/trades-index.json"));
        let response = controller.handle_fetch(&request).await.unwrap();
        assert_eq!(response.status, 503);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"], "Offline");
    }

    #[tokio::test]
    async fn test_activation_evicts_stale_caches() {
        let fetcher = MockFetcher::new();
        let (storage, controller) = make(fetcher);
        storage.put("pennybook-v0.9.0", "/stale", FetchResponse::ok("old", "text/html"));
        storage.put("pennybook-runtime", "/data", FetchResponse::ok("{}", "application/json"));
        storage.put("pennybook-v1.0.0", "/page", FetchResponse::ok("new", "text/html"));

        controller.activate();

        let mut names = storage.cache_names();
        names.sort();
        assert_eq!(names, vec!["pennybook-runtime", "pennybook-v1.0.0"]);
        assert_eq!(controller.phase(), Phase::Intercepting);
    }

    #[tokio::test]
    async fn test_requests_pass_through_before_activation() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchResponse::ok("{}", "application/json")));

        let (storage, controller) = make(fetcher);
        let request = FetchRequest::get(page_url("data/trades-index.json"));
        controller.handle_fetch(&request).await.unwrap();

        assert_eq!(storage.entry_count("pennybook-runtime"), 0);
    }

    #[tokio::test]
    async fn test_non_get_passes_through_uncached() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchResponse::ok("created", "text/plain")));

        let (storage, controller) = make(fetcher);
        controller.activate();

        let request = FetchRequest {
            url: page_url("data/trades-index.json"),
            method: RequestMethod::Post,
        };
        controller.handle_fetch(&request).await.unwrap();
        assert_eq!(storage.entry_count("pennybook-runtime"), 0);
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through_uncached() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(FetchResponse::ok("lib", "text/javascript")));

        let (storage, controller) = make(fetcher);
        controller.activate();

        let request = FetchRequest::get(Url::parse("https://cdn.example.com/chart.js").unwrap());
        controller.handle_fetch(&request).await.unwrap();
        assert!(storage.cache_names().is_empty());
    }

    #[tokio::test]
    async fn test_skip_waiting_activates_immediately() {
        let (_, controller) = make(MockFetcher::new());
        assert_eq!(controller.phase(), Phase::Installing);

        controller.handle_command(Command::SkipWaiting);
        assert_eq!(controller.phase(), Phase::Intercepting);
    }

    #[tokio::test]
    async fn test_clear_cache_deletes_everything_and_acknowledges() {
        let (storage, controller) = make(MockFetcher::new());
        storage.put("pennybook-v1.0.0", "/page", FetchResponse::ok("x", "text/html"));
        storage.put("pennybook-runtime", "/data", FetchResponse::ok("{}", "application/json"));

        let (reply, ack) = oneshot::channel();
        controller.handle_command(Command::ClearCache { reply });

        assert_eq!(ack.await.unwrap(), CommandAck { success: true });
        assert!(storage.cache_names().is_empty());
    }
}
