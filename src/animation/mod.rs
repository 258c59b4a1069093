//! Animation & Playback
//!
//! - [`AnimationClip`] / [`AnimationAction`] / [`AnimationMixer`]: clip time bookkeeping
//! - [`MotionTween`] / [`IdleMotion`]: transform motion driven by the tick
//! - [`PlaybackCoordinator`]: scene-scoped playback plus the audio sink

pub mod action;
pub mod clip;
pub mod mixer;
pub mod motion;
pub mod playback;

pub use action::{AnimationAction, LoopMode};
pub use clip::AnimationClip;
pub use mixer::AnimationMixer;
pub use motion::{IdleMotion, MotionTween};
pub use playback::{AudioOutput, PlaybackCoordinator, SilentAudio};
