use std::sync::Arc;
use std::time::Duration;

use crate::animation::clip::AnimationClip;
use crate::scene::bounds::BoundingBox;
use crate::scene::transform::Transform;

/// Prefab node: plain data, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    pub name: String,
    pub transform: Transform,
    /// Indices into [`Prefab::nodes`].
    pub children: Vec<usize>,
    /// Pick volume for ray tests, in node-local space.
    pub bounds: Option<BoundingBox>,
}

impl PrefabNode {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Decoded model hierarchy handed over by the host's decoder.
///
/// Contains no scene handles; [`Scene::instantiate`](crate::scene::Scene::instantiate)
/// turns it into nodes.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    pub nodes: Vec<PrefabNode>,
    /// Indices of the top-level nodes.
    pub roots: Vec<usize>,
}

impl Prefab {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-node prefab with a pick box of the given size.
    #[must_use]
    pub fn single(name: &str, bounds: BoundingBox) -> Self {
        Self {
            nodes: vec![PrefabNode::new(name).with_bounds(bounds)],
            roots: vec![0],
        }
    }

    /// Appends a node under `parent` (or as a root) and returns its index.
    pub fn push(&mut self, node: PrefabNode, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.children.push(index),
            None => self.roots.push(index),
        }
        index
    }
}

pub type SharedPrefab = Arc<Prefab>;

/// Host result for a `model` request.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub prefab: SharedPrefab,
    pub clips: Vec<AnimationClip>,
}

impl ModelAsset {
    #[must_use]
    pub fn new(prefab: Prefab, clips: Vec<AnimationClip>) -> Self {
        Self {
            prefab: Arc::new(prefab),
            clips,
        }
    }
}

/// Host result for an `audio` request. The bytes are opaque to this crate;
/// the host's [`AudioOutput`](crate::animation::AudioOutput) interprets them.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub source: String,
    pub duration: Option<Duration>,
    pub data: Arc<[u8]>,
}

impl AudioTrack {
    #[must_use]
    pub fn new(source: &str, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: source.to_string(),
            duration: None,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// What a fetch produced.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Model(ModelAsset),
    Audio(AudioTrack),
}

impl LoadedAsset {
    #[must_use]
    pub fn kind(&self) -> crate::assets::ResourceKind {
        match self {
            Self::Model(_) => crate::assets::ResourceKind::Model,
            Self::Audio(_) => crate::assets::ResourceKind::Audio,
        }
    }
}
