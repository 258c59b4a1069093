use rustc_hash::{FxHashMap, FxHashSet};

use crate::assets::handle::{
    LoadStatus, ModelResource, ResourceHandle, ResourceId, ResourceKind, ResourcePayload, ResourceRequest, TierId,
};
use crate::assets::prefab::{AudioTrack, LoadedAsset};
use crate::errors::AssetError;
use crate::scene::Scene;

/// One item a background tier had to give up on.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub id: ResourceId,
    pub tier: TierId,
    pub error: AssetError,
}

/// Everything a tier produced, before it is committed.
#[derive(Debug)]
pub struct TierOutcome {
    pub tier: TierId,
    pub loaded: Vec<(ResourceRequest, LoadedAsset)>,
    pub failures: Vec<ItemFailure>,
}

/// Summary of a committed tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierReport {
    pub tier: TierId,
    pub loaded: Vec<ResourceId>,
    pub failures: Vec<ItemFailure>,
}

impl TierReport {
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-tier ready flags.
#[derive(Debug, Clone, Default)]
pub struct LoadingState {
    ready: FxHashMap<TierId, bool>,
}

impl LoadingState {
    pub fn register(&mut self, tier: TierId) {
        self.ready.entry(tier).or_insert(false);
    }

    pub fn mark_ready(&mut self, tier: TierId) {
        self.ready.insert(tier, true);
    }

    #[must_use]
    pub fn is_ready(&self, tier: TierId) -> bool {
        self.ready.get(&tier).copied().unwrap_or(false)
    }

    /// True when every registered tier is ready.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.ready.values().all(|&r| r)
    }

    pub fn tiers(&self) -> impl Iterator<Item = (TierId, bool)> + '_ {
        self.ready.iter().map(|(&t, &r)| (t, r))
    }
}

/// Session-wide table of loaded resources.
///
/// Models are instantiated into the scene graph on commit, detached and
/// hidden, so scenes only ever attach and detach them.
#[derive(Debug, Default)]
pub struct ResourceTable {
    entries: FxHashMap<ResourceId, ResourceHandle>,
    failed: FxHashSet<ResourceId>,
    state: LoadingState,
}

impl ResourceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every item of a tier as pending.
    pub fn begin_tier(&mut self, tier: TierId, requests: &[ResourceRequest]) -> Result<(), AssetError> {
        if let Some(dup) = requests
            .iter()
            .enumerate()
            .find(|(i, r)| self.entries.contains_key(&r.id) || requests[..*i].iter().any(|o| o.id == r.id))
            .map(|(_, r)| r.id.clone())
        {
            return Err(AssetError::DuplicateId(dup));
        }
        for request in requests {
            self.failed.remove(&request.id);
            self.entries.insert(request.id.clone(), ResourceHandle::pending(request, tier));
        }
        self.state.register(tier);
        Ok(())
    }

    /// Commits a settled tier: loaded items become `Loaded`, failed ones are
    /// dropped from the table, and the tier is flagged ready.
    pub fn commit(&mut self, scene: &mut Scene, outcome: TierOutcome) -> TierReport {
        let TierOutcome { tier, loaded, failures } = outcome;
        let mut loaded_ids = Vec::with_capacity(loaded.len());

        for (request, asset) in loaded {
            let payload = match asset {
                LoadedAsset::Model(model) => {
                    let root = scene.instantiate(request.id.as_str(), &model.prefab);
                    scene.set_visible(root, false);
                    ResourcePayload::Model(ModelResource {
                        root,
                        clips: model.clips,
                    })
                }
                LoadedAsset::Audio(track) => ResourcePayload::Audio(track),
            };
            self.entries
                .entry(request.id.clone())
                .or_insert_with(|| ResourceHandle::pending(&request, tier))
                .fulfil(payload);
            loaded_ids.push(request.id);
        }

        for failure in &failures {
            log::warn!("Dropping '{}' from tier {tier}: {}", failure.id, failure.error);
            self.entries.remove(&failure.id);
            self.failed.insert(failure.id.clone());
        }

        self.state.mark_ready(tier);
        log::info!(
            "Tier {tier} ready: {} loaded, {} failed",
            loaded_ids.len(),
            failures.len()
        );

        TierReport {
            tier,
            loaded: loaded_ids,
            failures,
        }
    }

    /// Drops the pending entries of a tier that aborted. The tier stays not ready.
    pub fn abort_tier(&mut self, tier: TierId) {
        self.entries.retain(|_, h| !(h.tier() == tier && h.status() == LoadStatus::Pending));
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResourceHandle> {
        self.entries.get(id)
    }

    /// Status of `id`; `Failed` items are no longer in the table.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<LoadStatus> {
        if self.failed.contains(id) {
            return Some(LoadStatus::Failed);
        }
        self.entries.get(id).map(ResourceHandle::status)
    }

    /// The model if it finished loading.
    #[must_use]
    pub fn model(&self, id: &str) -> Option<&ModelResource> {
        match self.entries.get(id)?.payload()? {
            ResourcePayload::Model(model) => Some(model),
            ResourcePayload::Audio(_) => None,
        }
    }

    #[must_use]
    pub fn audio(&self, id: &str) -> Option<&AudioTrack> {
        match self.entries.get(id)?.payload()? {
            ResourcePayload::Audio(track) => Some(track),
            ResourcePayload::Model(_) => None,
        }
    }

    /// Resource id whose model root is `node`.
    #[must_use]
    pub fn model_id_of(&self, node: crate::scene::NodeHandle) -> Option<&ResourceId> {
        self.entries.values().find_map(|h| match h.payload() {
            Some(ResourcePayload::Model(m)) if m.root == node => Some(h.id()),
            _ => None,
        })
    }

    pub fn loaded(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceHandle> {
        self.entries
            .values()
            .filter(move |h| h.kind() == kind && h.status() == LoadStatus::Loaded)
    }

    #[inline]
    #[must_use]
    pub fn loading_state(&self) -> &LoadingState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self, tier: TierId) -> bool {
        self.state.is_ready(tier)
    }

    /// First unsettled tier holding any of `ids`. Failed items and ids
    /// outside the manifest never block.
    pub fn blocking_tier<'a>(&self, ids: impl IntoIterator<Item = &'a ResourceId>) -> Option<TierId> {
        ids.into_iter()
            .filter_map(|id| self.entries.get(id))
            .find(|h| h.status() == LoadStatus::Pending && !self.state.is_ready(h.tier()))
            .map(ResourceHandle::tier)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
