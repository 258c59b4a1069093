use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::clip::AnimationClip;
use crate::assets::prefab::AudioTrack;
use crate::scene::NodeHandle;

/// Opaque string key naming a resource, e.g. `"wendy"` or `"correctAudio"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A batch of resources sharing one failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TierId {
    /// Fail-fast; must be ready before the experience starts.
    Essential,
    /// Best-effort; loaded after start, numbered from 1.
    Background(u32),
}

impl TierId {
    #[inline]
    #[must_use]
    pub fn is_essential(self) -> bool {
        matches!(self, Self::Essential)
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Essential => f.write_str("essential"),
            Self::Background(n) => write!(f, "background-{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Model,
    Audio,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    Pending,
    Loaded,
    Failed,
}

/// One manifest entry: what to load, from where, and as what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub id: ResourceId,
    pub path: String,
    pub kind: ResourceKind,
}

impl ResourceRequest {
    #[must_use]
    pub fn new(id: impl Into<ResourceId>, path: &str, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            path: path.to_string(),
            kind,
        }
    }

    #[must_use]
    pub fn model(id: &str, path: &str) -> Self {
        Self::new(id, path, ResourceKind::Model)
    }

    #[must_use]
    pub fn audio(id: &str, path: &str) -> Self {
        Self::new(id, path, ResourceKind::Audio)
    }
}

/// A model committed to the scene graph: a detached root node plus its clips.
#[derive(Debug, Clone)]
pub struct ModelResource {
    pub root: NodeHandle,
    pub clips: Vec<AnimationClip>,
}

impl ModelResource {
    #[must_use]
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum ResourcePayload {
    Model(ModelResource),
    Audio(AudioTrack),
}

/// Entry of the resource table.
///
/// Created `Pending` when its tier starts; the payload is written once when
/// the item commits and is only read afterwards.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    id: ResourceId,
    kind: ResourceKind,
    tier: TierId,
    status: LoadStatus,
    payload: Option<ResourcePayload>,
}

impl ResourceHandle {
    #[must_use]
    pub(crate) fn pending(request: &ResourceRequest, tier: TierId) -> Self {
        Self {
            id: request.id.clone(),
            kind: request.kind,
            tier,
            status: LoadStatus::Pending,
            payload: None,
        }
    }

    pub(crate) fn fulfil(&mut self, payload: ResourcePayload) {
        if self.status == LoadStatus::Loaded {
            log::warn!("Resource '{}' is already loaded, ignoring second payload", self.id);
            return;
        }
        self.payload = Some(payload);
        self.status = LoadStatus::Loaded;
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn tier(&self) -> TierId {
        self.tier
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&ResourcePayload> {
        self.payload.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_display() {
        assert_eq!(TierId::Essential.to_string(), "essential");
        assert_eq!(TierId::Background(2).to_string(), "background-2");
    }

    #[test]
    fn kind_is_lowercase_in_json() {
        let request: ResourceRequest =
            serde_json::from_str(r#"{ "id": "wendy", "path": "models/wendy.glb", "kind": "model" }"#).unwrap();
        assert_eq!(request.kind, ResourceKind::Model);
        assert_eq!(request.id.as_str(), "wendy");
    }
}
