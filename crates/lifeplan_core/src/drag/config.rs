//! Drag throttling constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Drag gesture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Minimum gap between store updates during a gesture.
    pub throttle_ms: u64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { throttle_ms: 50 }
    }
}

impl DragConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}
