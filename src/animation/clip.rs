use serde::{Deserialize, Serialize};

/// A named animation clip carried by a model.
///
/// Keyframe sampling belongs to the host renderer; this side only tracks
/// playback time against the clip's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Seconds.
    pub duration: f32,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: &str, duration: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
        }
    }
}
