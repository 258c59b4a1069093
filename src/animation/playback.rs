//! Playback Coordinator
//!
//! Owns everything that moves over time inside a scene: one
//! [`AnimationMixer`] per animated model, linear [`MotionTween`]s, and the
//! persistent [`IdleMotion`] bobs. Audio goes out through the host's
//! [`AudioOutput`].
//!
//! Mixers and tweens are scene-scoped and dropped by [`PlaybackCoordinator::stop_all`]
//! during a transition. Idle motions and audio outlive scene changes.

use glam::Vec3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::action::LoopMode;
use crate::animation::mixer::AnimationMixer;
use crate::animation::motion::{IdleMotion, MotionTween};
use crate::assets::{AudioTrack, ResourceId, ResourceTable};
use crate::errors::StoryError;
use crate::scene::{NodeHandle, Scene};

/// Host audio sink.
pub trait AudioOutput {
    /// Starts `track` from its beginning.
    fn play(&mut self, id: &ResourceId, track: &AudioTrack);
    fn stop(&mut self, id: &ResourceId);
}

/// Audio sink that only logs. Used when the host has no audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioOutput for SilentAudio {
    fn play(&mut self, id: &ResourceId, _track: &AudioTrack) {
        log::debug!("(silent) play '{id}'");
    }

    fn stop(&mut self, id: &ResourceId) {
        log::debug!("(silent) stop '{id}'");
    }
}

pub struct PlaybackCoordinator {
    mixers: FxHashMap<NodeHandle, AnimationMixer>,
    tweens: Vec<MotionTween>,
    idle: Vec<IdleMotion>,
    audio: Box<dyn AudioOutput>,
    playing: SmallVec<[ResourceId; 2]>,
}

impl PlaybackCoordinator {
    pub fn new(audio: impl AudioOutput + 'static) -> Self {
        Self {
            mixers: FxHashMap::default(),
            tweens: Vec::new(),
            idle: Vec::new(),
            audio: Box::new(audio),
            playing: SmallVec::new(),
        }
    }

    // ========================================================================
    // Clips
    // ========================================================================

    /// Starts `clip` on the model `object` from the beginning. Calling it
    /// again while the clip runs restarts it.
    pub fn play_clip(&mut self, resources: &ResourceTable, object: &str, clip: &str) -> Result<(), StoryError> {
        let model = resources
            .model(object)
            .ok_or_else(|| StoryError::ResourceMissing(object.into()))?;
        let found = model.clip(clip).ok_or_else(|| StoryError::ClipMissing {
            object: object.into(),
            clip: clip.to_string(),
        })?;

        self.mixers
            .entry(model.root)
            .or_insert_with(|| AnimationMixer::new(model.root))
            .play(found, LoopMode::Loop);
        log::debug!("Playing clip '{clip}' on '{object}'");
        Ok(())
    }

    #[must_use]
    pub fn mixer(&self, root: NodeHandle) -> Option<&AnimationMixer> {
        self.mixers.get(&root)
    }

    pub fn mixers(&self) -> impl Iterator<Item = &AnimationMixer> {
        self.mixers.values()
    }

    #[inline]
    #[must_use]
    pub fn mixer_count(&self) -> usize {
        self.mixers.len()
    }

    // ========================================================================
    // Audio
    // ========================================================================

    /// Starts the audio resource `track` from the beginning.
    pub fn play_audio(&mut self, resources: &ResourceTable, track: &str) -> Result<(), StoryError> {
        let id = ResourceId::from(track);
        let audio = match resources.audio(track) {
            Some(audio) => audio,
            None if resources.get(track).is_some() => return Err(StoryError::AudioMissing(id)),
            None => return Err(StoryError::ResourceMissing(id)),
        };

        self.audio.play(&id, audio);
        if !self.playing.contains(&id) {
            self.playing.push(id);
        }
        Ok(())
    }

    /// Stops `track`, or every started track when `None`.
    pub fn stop_audio(&mut self, track: Option<&str>) {
        match track {
            Some(track) => {
                if let Some(i) = self.playing.iter().position(|id| id.as_str() == track) {
                    let id = self.playing.remove(i);
                    self.audio.stop(&id);
                }
            }
            None => {
                for id in self.playing.drain(..) {
                    self.audio.stop(&id);
                }
            }
        }
    }

    #[must_use]
    pub fn playing_audio(&self) -> &[ResourceId] {
        &self.playing
    }

    // ========================================================================
    // Motion
    // ========================================================================

    /// Moves `node` linearly to `target` over `duration` seconds. Replaces
    /// any tween already running on the node.
    pub fn move_to(&mut self, node: NodeHandle, target: Vec3, duration: f32) {
        self.tweens.retain(|t| t.node != node);
        self.tweens.push(MotionTween::new(node, target, duration));
    }

    #[inline]
    #[must_use]
    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }

    /// Registers a persistent idle bob on `node`; re-adding updates it.
    pub fn add_idle(&mut self, node: NodeHandle, amplitude: f32, speed: f32) {
        match self.idle.iter_mut().find(|m| m.node == node) {
            Some(motion) => {
                motion.amplitude = amplitude;
                motion.speed = speed;
            }
            None => self.idle.push(IdleMotion::new(node, amplitude, speed)),
        }
    }

    /// Call after overwriting a bobbing node's position.
    pub fn rebase_idle(&mut self, node: NodeHandle) {
        if let Some(motion) = self.idle.iter_mut().find(|m| m.node == node) {
            motion.rebase();
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances every mixer and tween by `dt` seconds and applies idle
    /// motion at `elapsed_ms`.
    pub fn update(&mut self, dt: f32, elapsed_ms: f64, scene: &mut Scene) {
        for mixer in self.mixers.values_mut() {
            mixer.update(dt);
        }
        self.tweens.retain_mut(|tween| tween.update(dt, scene));
        for motion in &mut self.idle {
            motion.apply(elapsed_ms, scene);
        }
    }

    /// Scene clear: stops and releases every mixer and drops running tweens.
    pub fn stop_all(&mut self) {
        for mixer in self.mixers.values_mut() {
            mixer.stop_all_actions();
        }
        self.mixers.clear();
        self.tweens.clear();
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("mixers", &self.mixers.len())
            .field("tweens", &self.tweens.len())
            .field("idle", &self.idle.len())
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new(SilentAudio)
    }
}
