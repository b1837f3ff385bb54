//! Core shared types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a video asset.
///
/// Transitions are strictly forward: `Uploading -> Processing -> Ready` or
/// `Uploading -> Processing -> Failed`. The catalog rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Bytes are still being written to storage.
    Uploading,
    /// Fully written; thumbnail generation pending or in flight.
    Processing,
    /// Thumbnail generated; asset fully available.
    Ready,
    /// Post-processing exhausted its retries.
    Failed,
}

impl AssetStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: AssetStatus) -> bool {
        matches!(
            (self, next),
            (AssetStatus::Uploading, AssetStatus::Processing)
                | (AssetStatus::Processing, AssetStatus::Ready)
                | (AssetStatus::Processing, AssetStatus::Failed)
        )
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetStatus::Uploading => "uploading",
            AssetStatus::Processing => "processing",
            AssetStatus::Ready => "ready",
            AssetStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
