//! Analytics state: the derived chart payload.

use serde::{Deserialize, Serialize};

/// Analytics state subtree.
///
/// The payload is the chart generator's output and is treated as opaque
/// structured data; consumers pick the series they need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsState {
    /// Derived analytics payload, if loaded.
    pub data: Option<serde_json::Value>,
    /// Whether the payload has been loaded at least once.
    pub loaded: bool,
}

impl AnalyticsState {
    /// Look up a top-level section of the analytics payload.
    pub fn section(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}
