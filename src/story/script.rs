use std::path::Path;

use glam::Vec3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::assets::ResourceId;
use crate::errors::Result;
use crate::scene::PlacementSpec;

/// The authored narrative: where to begin and what each scene contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryScript<S> {
    pub start: S,
    pub scenes: Vec<SceneDescriptor<S>>,
}

impl<S: DeserializeOwned> StoryScript<S> {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Static description of one scene, read-only at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
pub struct SceneDescriptor<S> {
    pub key: S,
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub placements: Vec<PlacementDirective>,
    #[serde(default)]
    pub bindings: Vec<InteractionBinding<S>>,
    /// Run in order once the placements and bindings are in.
    #[serde(default)]
    pub on_enter: Vec<StoryAction<S>>,
    #[serde(default)]
    pub cues: Vec<TimedCue<S>>,
    #[serde(default)]
    pub auto_advance: Option<AutoAdvance<S>>,
}

impl<S> SceneDescriptor<S> {
    #[must_use]
    pub fn new(key: S, name: &str) -> Self {
        Self {
            key,
            name: name.to_string(),
            caption: None,
            placements: Vec::new(),
            bindings: Vec::new(),
            on_enter: Vec::new(),
            cues: Vec::new(),
            auto_advance: None,
        }
    }

    #[must_use]
    pub fn caption(mut self, text: &str) -> Self {
        self.caption = Some(text.to_string());
        self
    }

    #[must_use]
    pub fn place(mut self, directive: PlacementDirective) -> Self {
        self.placements.push(directive);
        self
    }

    #[must_use]
    pub fn bind(mut self, binding: InteractionBinding<S>) -> Self {
        self.bindings.push(binding);
        self
    }

    #[must_use]
    pub fn on_enter(mut self, action: StoryAction<S>) -> Self {
        self.on_enter.push(action);
        self
    }

    #[must_use]
    pub fn cue(mut self, delay_ms: u64, actions: Vec<StoryAction<S>>) -> Self {
        self.cues.push(TimedCue { delay_ms, actions });
        self
    }

    #[must_use]
    pub fn auto_advance(mut self, delay_ms: u64, target: S) -> Self {
        self.auto_advance = Some(AutoAdvance { delay_ms, target });
        self
    }

    /// Every resource the scene places, binds or names in an action.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceId> {
        let actions = self
            .bindings
            .iter()
            .flat_map(|b| b.actions.iter())
            .chain(self.on_enter.iter())
            .chain(self.cues.iter().flat_map(|c| c.actions.iter()));

        self.placements
            .iter()
            .map(|p| &p.object)
            .chain(self.bindings.iter().map(|b| &b.object))
            .chain(actions.flat_map(StoryAction::resources))
    }
}

/// Put a loaded model into the scene at a viewer-relative pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDirective {
    pub object: ResourceId,
    #[serde(flatten)]
    pub spec: PlacementSpec,
    #[serde(default)]
    pub scale: Option<f32>,
    /// Apply the idle bob while shown.
    #[serde(default)]
    pub idle: bool,
    /// Park the model high above the viewer and drop it into place after
    /// this many milliseconds.
    #[serde(default)]
    pub drop_in_ms: Option<u64>,
}

impl PlacementDirective {
    #[must_use]
    pub fn new(object: &str, spec: PlacementSpec) -> Self {
        Self {
            object: object.into(),
            spec,
            scale: None,
            idle: false,
            drop_in_ms: None,
        }
    }

    #[must_use]
    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub fn idle(mut self) -> Self {
        self.idle = true;
        self
    }

    #[must_use]
    pub fn drop_in(mut self, delay_ms: u64) -> Self {
        self.drop_in_ms = Some(delay_ms);
        self
    }
}

/// Make a model clickable; a click runs `actions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionBinding<S> {
    pub object: ResourceId,
    #[serde(default)]
    pub once: bool,
    pub actions: Vec<StoryAction<S>>,
}

impl<S> InteractionBinding<S> {
    #[must_use]
    pub fn new(object: &str, actions: Vec<StoryAction<S>>) -> Self {
        Self {
            object: object.into(),
            once: false,
            actions,
        }
    }

    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// Actions run a fixed time after the scene is entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedCue<S> {
    pub delay_ms: u64,
    pub actions: Vec<StoryAction<S>>,
}

/// Self-transition after a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoAdvance<S> {
    pub delay_ms: u64,
    pub target: S,
}

/// One step of narrative behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryAction<S> {
    /// Transition to another scene.
    GoTo(S),
    /// Show the shared "next" control, wired to go to the given scene.
    ShowNext(S),
    PlayAudio(ResourceId),
    /// Stop one track, or every track.
    StopAudio(Option<ResourceId>),
    PlayClip { object: ResourceId, clip: String },
    Place(PlacementDirective),
    /// Hide and detach a model.
    Hide(ResourceId),
    /// Tween a model to `viewer position + offset` over `duration` seconds.
    MoveTo { object: ResourceId, offset: Vec3, duration: f32 },
    After { delay_ms: u64, actions: Vec<StoryAction<S>> },
    Caption(String),
    /// End the experience.
    Finish,
}

impl<S> StoryAction<S> {
    #[must_use]
    pub fn play_audio(id: &str) -> Self {
        Self::PlayAudio(id.into())
    }

    #[must_use]
    pub fn play_clip(object: &str, clip: &str) -> Self {
        Self::PlayClip {
            object: object.into(),
            clip: clip.to_string(),
        }
    }

    #[must_use]
    pub fn hide(object: &str) -> Self {
        Self::Hide(object.into())
    }

    #[must_use]
    pub fn move_to(object: &str, offset: Vec3, duration: f32) -> Self {
        Self::MoveTo {
            object: object.into(),
            offset,
            duration,
        }
    }

    #[must_use]
    pub fn after(delay_ms: u64, actions: Vec<StoryAction<S>>) -> Self {
        Self::After { delay_ms, actions }
    }

    /// Resources this action touches, including nested delayed actions.
    #[must_use]
    pub fn resources(&self) -> Vec<&ResourceId> {
        match self {
            Self::PlayAudio(id) | Self::Hide(id) | Self::StopAudio(Some(id)) => vec![id],
            Self::PlayClip { object, .. } | Self::MoveTo { object, .. } => vec![object],
            Self::Place(directive) => vec![&directive.object],
            Self::After { actions, .. } => actions.iter().flat_map(Self::resources).collect(),
            Self::GoTo(_) | Self::ShowNext(_) | Self::StopAudio(None) | Self::Caption(_) | Self::Finish => Vec::new(),
        }
    }
}
