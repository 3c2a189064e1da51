//! # Pennybook - Trading Journal Data Layer
//!
//! The offline-first data and coordination layer for a personal trading
//! journal: cached document loading, reactive state, and markdown note
//! rendering.
//!
//! ## Architecture
//!
//! The application follows a clean architecture pattern:
//!
//! - **App**: Core application wiring and lifecycle management
//! - **Cache**: Offline caching layer with cache-first/network-first strategies
//! - **Api**: Journal document fetching over the cache layer
//! - **State**: Centralized state management
//! - **Events**: Typed publish/subscribe event bus
//! - **Render**: Markdown-to-HTML rendering for notes and books
//! - **Config**: Configuration management

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod render;
pub mod state;

pub use app::App;
pub use cache::{CacheController, CacheStorage, Command};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{Event, EventBus, EventKind};
pub use render::MarkdownRenderer;
pub use state::StateManager;
