//! Tiered Resource Loader
//!
//! Fans out every item of a tier to the host's [`AssetFetcher`] and joins the
//! results under the tier's failure policy:
//!
//! - **Essential**: fail-fast. The first failing item aborts the tier with
//!   [`AssetError::EssentialLoad`].
//! - **Background**: best-effort. Failures are collected as [`ItemFailure`]s
//!   and the tier still settles once every attempt has finished.
//!
//! Loading produces a [`TierOutcome`] and touches no shared state; the
//! outcome is committed into the [`ResourceTable`](super::ResourceTable) on
//! the tick thread.
//!
//! # Usage
//!
//! ```rust,ignore
//! let loader = ResourceLoader::new(fetcher).with_progress(|id, progress| {
//!     log::debug!("{id}: {progress:?}");
//! });
//! let outcome = loader.load_tier(TierId::Essential, manifest.essential.clone()).await?;
//! ```

use std::path::Path;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, join_all, try_join_all};
use serde::{Deserialize, Serialize};

use crate::assets::handle::{ResourceId, ResourceRequest, TierId};
use crate::assets::io::AssetFetcher;
use crate::assets::prefab::LoadedAsset;
use crate::assets::table::{ItemFailure, TierOutcome};
use crate::errors::{AssetError, Result};

// ============================================================================
// Progress
// ============================================================================

/// Per-item download progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    /// `round(loaded / total * 100)`, clamped to 0..=100.
    Percent(u8),
    /// Total size unknown.
    Indeterminate,
}

impl LoadProgress {
    #[must_use]
    pub fn from_bytes(loaded: u64, total: Option<u64>) -> Self {
        match total {
            Some(total) if total > 0 => {
                let pct = (loaded as f64 / total as f64 * 100.0).round();
                Self::Percent(pct.clamp(0.0, 100.0) as u8)
            }
            _ => Self::Indeterminate,
        }
    }
}

pub type ProgressCallback = dyn Fn(&ResourceId, LoadProgress);

/// Progress sink handed to the fetcher for one item. Silent when no callback
/// was installed on the loader.
#[derive(Clone)]
pub struct ProgressReporter {
    id: ResourceId,
    callback: Option<Rc<ProgressCallback>>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(id: ResourceId, callback: Option<Rc<ProgressCallback>>) -> Self {
        Self { id, callback }
    }

    #[must_use]
    pub fn silent(id: ResourceId) -> Self {
        Self { id, callback: None }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn report(&self, progress: LoadProgress) {
        if let Some(callback) = &self.callback {
            callback(&self.id, progress);
        }
    }

    pub fn report_bytes(&self, loaded: u64, total: Option<u64>) {
        self.report(LoadProgress::from_bytes(loaded, total));
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("id", &self.id)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// Authored list of resources, split into tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceManifest {
    pub essential: Vec<ResourceRequest>,
    /// Background tiers in load order; the first is `background-1`.
    pub background: Vec<Vec<ResourceRequest>>,
}

impl ResourceManifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects ids that appear more than once across all tiers.
    pub fn validate(&self) -> std::result::Result<(), AssetError> {
        let mut seen = rustc_hash::FxHashSet::default();
        for (_, requests) in self.tiers() {
            for request in requests {
                if !seen.insert(request.id.as_str()) {
                    return Err(AssetError::DuplicateId(request.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Background tiers paired with their ids.
    #[must_use]
    pub fn background_tiers(&self) -> Vec<(TierId, Vec<ResourceRequest>)> {
        self.background
            .iter()
            .enumerate()
            .map(|(i, requests)| (TierId::Background(i as u32 + 1), requests.clone()))
            .collect()
    }

    /// Every tier, essential first.
    pub fn tiers(&self) -> impl Iterator<Item = (TierId, &[ResourceRequest])> {
        std::iter::once((TierId::Essential, self.essential.as_slice())).chain(
            self.background
                .iter()
                .enumerate()
                .map(|(i, r)| (TierId::Background(i as u32 + 1), r.as_slice())),
        )
    }
}

// ============================================================================
// Loader
// ============================================================================

pub type TierFuture = LocalBoxFuture<'static, std::result::Result<TierOutcome, AssetError>>;

/// A background tier still in flight, polled from the frame tick.
pub struct PendingTier {
    tier: TierId,
    future: TierFuture,
}

impl PendingTier {
    #[inline]
    #[must_use]
    pub fn tier(&self) -> TierId {
        self.tier
    }

    /// Polls once without blocking; `Some` once the tier has settled.
    pub fn poll_settled(&mut self) -> Option<std::result::Result<TierOutcome, AssetError>> {
        (&mut self.future).now_or_never()
    }
}

impl std::fmt::Debug for PendingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTier").field("tier", &self.tier).finish_non_exhaustive()
    }
}

/// Drives the host fetcher under per-tier failure policies.
#[derive(Clone)]
pub struct ResourceLoader {
    fetcher: Rc<dyn AssetFetcher>,
    on_progress: Option<Rc<ProgressCallback>>,
}

impl ResourceLoader {
    pub fn new(fetcher: impl AssetFetcher + 'static) -> Self {
        Self {
            fetcher: Rc::new(fetcher),
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, callback: impl Fn(&ResourceId, LoadProgress) + 'static) -> Self {
        self.on_progress = Some(Rc::new(callback));
        self
    }

    /// Loads every item of `tier` concurrently under the tier's policy.
    ///
    /// Resolves when each item has either loaded or been abandoned. Only
    /// the essential tier can resolve to an error.
    pub fn load_tier(&self, tier: TierId, requests: Vec<ResourceRequest>) -> TierFuture {
        let items: Vec<_> = requests.into_iter().map(|request| self.load_item(request)).collect();
        log::info!("Loading tier {tier} ({} items)", items.len());

        match tier {
            TierId::Essential => async move {
                let loaded = try_join_all(items.into_iter().map(|item| {
                    item.map(|(request, result)| match result {
                        Ok(asset) => Ok((request, asset)),
                        Err(source) => Err(AssetError::EssentialLoad {
                            id: request.id,
                            source: Box::new(source),
                        }),
                    })
                }))
                .await
                .inspect_err(|e| log::error!("{e}"))?;

                Ok(TierOutcome {
                    tier,
                    loaded,
                    failures: Vec::new(),
                })
            }
            .boxed_local(),

            TierId::Background(_) => async move {
                let mut loaded = Vec::new();
                let mut failures = Vec::new();
                for (request, result) in join_all(items).await {
                    match result {
                        Ok(asset) => loaded.push((request, asset)),
                        Err(error) => {
                            log::warn!("Background tier {tier}: {error}");
                            failures.push(ItemFailure {
                                id: request.id,
                                tier,
                                error,
                            });
                        }
                    }
                }
                Ok(TierOutcome { tier, loaded, failures })
            }
            .boxed_local(),
        }
    }

    /// Starts every background tier at once. The tiers run concurrently with
    /// each other and are polled from the frame tick.
    pub fn load_background(
        &self,
        tiers: Vec<(TierId, Vec<ResourceRequest>)>,
    ) -> std::result::Result<Vec<PendingTier>, AssetError> {
        if let Some((tier, _)) = tiers.iter().find(|(tier, _)| tier.is_essential()) {
            return Err(AssetError::WrongTierPolicy(*tier));
        }
        Ok(tiers
            .into_iter()
            .map(|(tier, requests)| PendingTier {
                tier,
                future: self.load_tier(tier, requests),
            })
            .collect())
    }

    /// One item: fetch, then check the payload kind against the request.
    fn load_item(
        &self,
        request: ResourceRequest,
    ) -> LocalBoxFuture<'static, (ResourceRequest, std::result::Result<LoadedAsset, AssetError>)> {
        let reporter = ProgressReporter::new(request.id.clone(), self.on_progress.clone());
        let fetch = self.fetcher.fetch(&request, reporter);
        async move {
            let result = fetch.await.and_then(|asset| {
                if asset.kind() == request.kind {
                    Ok(asset)
                } else {
                    Err(AssetError::KindMismatch {
                        id: request.id.clone(),
                        expected: request.kind.as_str(),
                        actual: asset.kind().as_str(),
                    })
                }
            });
            if result.is_ok() {
                log::debug!("Loaded '{}' from '{}'", request.id, request.path);
            }
            (request, result)
        }
        .boxed_local()
    }
}

impl std::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("on_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_rounds_and_clamps() {
        assert_eq!(LoadProgress::from_bytes(1, Some(3)), LoadProgress::Percent(33));
        assert_eq!(LoadProgress::from_bytes(2, Some(3)), LoadProgress::Percent(67));
        assert_eq!(LoadProgress::from_bytes(500, Some(100)), LoadProgress::Percent(100));
    }

    #[test]
    fn unknown_total_is_indeterminate() {
        assert_eq!(LoadProgress::from_bytes(42, None), LoadProgress::Indeterminate);
        assert_eq!(LoadProgress::from_bytes(42, Some(0)), LoadProgress::Indeterminate);
    }

    #[test]
    fn manifest_rejects_duplicate_ids() {
        let json = r#"{
            "essential": [{ "id": "intro", "path": "intro.mp3", "kind": "audio" }],
            "background": [[{ "id": "intro", "path": "other.mp3", "kind": "audio" }]]
        }"#;
        assert!(ResourceManifest::from_json_str(json).is_err());
    }

    #[test]
    fn background_tiers_are_numbered_from_one() {
        let manifest = ResourceManifest {
            essential: Vec::new(),
            background: vec![Vec::new(), Vec::new()],
        };
        let ids: Vec<TierId> = manifest.background_tiers().into_iter().map(|(t, _)| t).collect();
        assert_eq!(ids, vec![TierId::Background(1), TierId::Background(2)]);
    }
}
