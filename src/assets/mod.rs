//! Resource Loading
//!
//! Tiered asynchronous loading of the models and audio tracks a story uses:
//! - [`ResourceLoader`]: fan-out/join over a host [`AssetFetcher`]
//! - [`ResourceTable`]: the session-wide table scenes read from
//! - [`ResourceManifest`]: the authored tier lists

pub mod handle;
pub mod io;
pub mod loader;
pub mod prefab;
pub mod table;

pub use handle::{
    LoadStatus, ModelResource, ResourceHandle, ResourceId, ResourceKind, ResourcePayload, ResourceRequest, TierId,
};
#[cfg(not(target_arch = "wasm32"))]
pub use io::FileAssetReader;
pub use io::AssetFetcher;
pub use loader::{LoadProgress, PendingTier, ProgressReporter, ResourceLoader, ResourceManifest};
pub use prefab::{AudioTrack, LoadedAsset, ModelAsset, Prefab, PrefabNode};
pub use table::{ItemFailure, LoadingState, ResourceTable, TierOutcome, TierReport};
