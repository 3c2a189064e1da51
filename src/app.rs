//! Main application module.
//!
//! Wires the caching layer, the data client, the event bus, the state
//! manager, and the note renderer together, and owns their lifecycle.

use crate::api::{DataClient, HttpFetcher};
use crate::cache::{CacheController, CacheStorage, Command};
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::render::MarkdownRenderer;
use crate::state::{LocalAccountStore, StateManager};

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

/// The main application.
pub struct App {
    /// Event bus shared with every consumer.
    bus: EventBus,
    /// Cache store, persisted between runs.
    storage: Arc<CacheStorage>,
    /// Offline caching controller.
    controller: Arc<CacheController>,
    /// Journal data client.
    client: DataClient,
    /// State manager.
    state: StateManager,
    /// Note renderer.
    renderer: MarkdownRenderer,
    /// Sender for cache control commands.
    command_tx: mpsc::UnboundedSender<Command>,
    /// Background command loop.
    command_loop: tokio::task::JoinHandle<()>,
    /// Where the cache snapshot lives.
    snapshot_path: PathBuf,
}

impl App {
    /// Create a new application.
    pub async fn new(config: Config) -> Result<Self> {
        // Restore the cache snapshot from the previous run
        let storage = Arc::new(CacheStorage::new());
        let snapshot_path = config::cache_dir()?.join("cache-snapshot.json");
        if let Err(error) = storage.load_from(&snapshot_path) {
            warn!(%error, "could not restore cache snapshot, starting cold");
        }

        let fetcher = Arc::new(HttpFetcher::new(&config.network)?);
        let base = Url::parse(&config.data.base_url)?;
        let controller = Arc::new(CacheController::new(
            config.cache.clone(),
            base,
            Arc::clone(&storage),
            fetcher,
        ));

        // A failed install only costs offline coverage; keep going.
        if let Err(error) = controller.install().await {
            warn!(%error, "install failed, offline assets may be unavailable");
        }
        controller.activate();

        let (command_tx, command_loop) = controller.spawn_command_loop();

        let client = DataClient::new(Arc::clone(&controller), &config.data)?;
        let bus = EventBus::new();
        let local = LocalAccountStore::new(config::data_dir()?.join("account-config.json"));
        let state = StateManager::new(client.clone(), bus.clone(), local);

        Ok(Self {
            bus,
            storage,
            controller,
            client,
            state,
            renderer: MarkdownRenderer::new(),
            command_tx,
            command_loop,
            snapshot_path,
        })
    }

    /// Load the journal and report a summary.
    pub async fn run(&self) -> Result<()> {
        self.state.init().await;

        let account = self.state.account();
        let trades = self.state.trades();
        info!(
            portfolio_value = %account.portfolio_value,
            trades = trades.trades.len(),
            win_rate = %trades.statistics.win_rate,
            "journal loaded"
        );
        Ok(())
    }

    /// Re-run every data load.
    pub async fn refresh(&self) {
        self.state.refresh().await;
    }

    /// Fetch a markdown note through the cache layer and render it.
    pub async fn render_note(&self, path: &str) -> Result<String> {
        let markdown = self.client.fetch_document(path).await?;
        let html = self.renderer.render(&markdown)?;
        Ok(self.renderer.fix_image_paths(&html))
    }

    /// Queue a cache control command.
    pub fn queue_command(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| Error::channel(e.to_string()))
    }

    /// The shared event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// The state manager.
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// The cache controller.
    pub fn cache_controller(&self) -> &CacheController {
        &self.controller
    }

    /// Persist the cache snapshot and stop background work.
    pub fn shutdown(&self) -> Result<()> {
        self.storage.persist_to(&self.snapshot_path)?;
        self.command_loop.abort();
        info!("shut down");
        Ok(())
    }
}
