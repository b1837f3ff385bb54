//! Typed ID wrapper for video assets.
//!
//! Asset ids are generated server-side at allocation time and are never
//! derived from user-supplied input, so a client string can never name a
//! filesystem location directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a video asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Generate a new random asset ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AssetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AssetId> for Uuid {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl std::str::FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_creation() {
        let id1 = AssetId::new();
        let id2 = AssetId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_asset_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let asset_id = AssetId::from(uuid);
        let uuid_back: Uuid = asset_id.into();
        assert_eq!(uuid, uuid_back);
    }

    #[test]
    fn test_asset_id_serialization() {
        let id = AssetId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_asset_id_parse_roundtrip() {
        let id = AssetId::new();
        let parsed: AssetId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_asset_id_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<AssetId>().is_err());
    }
}
