//! Reelhouse-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across reelhouse:
//!
//! - **Typed IDs**: Type-safe UUID wrapper for video assets
//! - **Core Types**: The asset lifecycle status enum and its state machine
//! - **Path Utilities**: Functions to detect file types by extension and map
//!   containers to MIME types
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use reelhouse_common::{AssetId, AssetStatus, Error, Result};
//! use reelhouse_common::paths::is_video_extension;
//!
//! // Create typed IDs
//! let asset_id = AssetId::new();
//!
//! // Work with the status state machine
//! assert!(AssetStatus::Uploading.can_transition_to(AssetStatus::Processing));
//!
//! // Check file types
//! assert!(is_video_extension("mp4"));
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("asset"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
