//! Error Types
//!
//! This module defines the error types used throughout the runtime.
//!
//! # Overview
//!
//! The main error type [`Error`] wraps two domain enums:
//! - [`AssetError`]: resource fetching and tier loading failures
//! - [`StoryError`]: scene script and playback failures
//!
//! Only [`AssetError::EssentialLoad`] is fatal for the experience. Every other
//! failure is recovered where it happens and reported through `log::warn!`.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! ```rust,ignore
//! use parallax::errors::{Error, Result};
//!
//! async fn boot(experience: &mut Experience<Chapter>) -> Result<()> {
//!     experience.load_essential(&manifest).await?;
//!     experience.start()
//! }
//! ```

use thiserror::Error;

use crate::assets::{ResourceId, TierId};

/// The main error type for the runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource loading failure.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Scene script or playback failure.
    #[error(transparent)]
    Story(#[from] StoryError),

    /// Configuration or script parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Asset Errors
// ============================================================================

/// Failures raised while fetching or committing resources.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// The host could not fetch or decode a single resource.
    #[error("Failed to load '{id}' from '{path}': {reason}")]
    Fetch {
        /// Resource key
        id: ResourceId,
        /// Source path as authored in the manifest
        path: String,
        /// Host-provided description of the failure
        reason: String,
    },

    /// The host returned a payload of the wrong kind for the request.
    #[error("Resource '{id}' returned a {actual} payload, expected {expected}")]
    KindMismatch {
        /// Resource key
        id: ResourceId,
        /// Kind declared in the manifest
        expected: &'static str,
        /// Kind actually returned
        actual: &'static str,
    },

    /// An item of the essential tier failed; the experience cannot start.
    #[error("Essential resource '{id}' failed to load: {source}")]
    EssentialLoad {
        /// The first item that failed
        id: ResourceId,
        /// Underlying per-item failure
        #[source]
        source: Box<AssetError>,
    },

    /// The same resource key appears twice in the manifest.
    #[error("Duplicate resource id '{0}'")]
    DuplicateId(ResourceId),

    /// A background tier was requested as essential or vice versa.
    #[error("Tier {0} cannot be loaded with this policy")]
    WrongTierPolicy(TierId),
}

impl AssetError {
    /// Builds a [`AssetError::Fetch`] from any displayable reason.
    pub fn fetch(id: &ResourceId, path: &str, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            id: id.clone(),
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Story Errors
// ============================================================================

/// Failures raised by the scene controller and playback coordinator.
///
/// Except for the lifecycle variants, these are recovered locally: the caller
/// logs them and continues with whatever content is available.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoryError {
    /// A transition target has no registered descriptor.
    #[error("Scene '{0}' has no registered setup")]
    MissingScene(String),

    /// A scene references a model or audio resource that never loaded.
    #[error("Resource '{0}' is not loaded")]
    ResourceMissing(ResourceId),

    /// The named clip does not exist on the named model.
    #[error("Model '{object}' has no animation clip '{clip}'")]
    ClipMissing {
        /// Model resource key
        object: ResourceId,
        /// Requested clip
        clip: String,
    },

    /// The resource exists but is not an audio track.
    #[error("Resource '{0}' is not an audio track")]
    AudioMissing(ResourceId),

    /// The experience was driven before `start`.
    #[error("Experience has not started")]
    NotStarted,

    /// `start` was called twice.
    #[error("Experience already started")]
    AlreadyStarted,

    /// The experience reached its terminal state.
    #[error("Experience has finished")]
    Finished,

    /// A tier the operation depends on has not reported ready.
    #[error("Tier {0} is not ready")]
    TierNotReady(TierId),

    /// A placement directive violates its invariants.
    #[error("Invalid placement for '{object}': {reason}")]
    InvalidPlacement {
        /// Model resource key
        object: ResourceId,
        /// Which invariant failed
        reason: &'static str,
    },
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
