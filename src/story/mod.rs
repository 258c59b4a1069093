//! Story
//!
//! The narrative state machine: an authored [`StoryScript`] of scenes, and the
//! [`SceneController`] that walks it.
//!
//! # Overview
//!
//! Scene identifiers are a caller-defined enum implementing [`SceneKey`]
//! (any `Copy + Eq + Hash + Debug` type qualifies). Each identifier maps to a
//! [`SceneDescriptor`] through an explicit table built from the script.
//!
//! [`SceneController::go_to`] is the only transition. It clears the current
//! scene immediately and enters the target after the settle delay. Every
//! delayed task is tagged with the scene generation at scheduling time and
//! silently dropped if the generation has moved on by the time it fires.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Chapter { Intro, Outro }
//!
//! let script = StoryScript {
//!     start: Chapter::Intro,
//!     scenes: vec![
//!         SceneDescriptor::new(Chapter::Intro, "intro")
//!             .place(PlacementDirective::new("startButton", PlacementSpec::new(1.5, StoryAngle::FRONT, -0.5)))
//!             .bind(InteractionBinding::new("startButton", vec![StoryAction::GoTo(Chapter::Outro)]).once()),
//!         SceneDescriptor::new(Chapter::Outro, "outro"),
//!     ],
//! };
//! let controller = SceneController::new(script, &settings);
//! ```

pub mod controller;
pub mod script;
pub mod scheduler;

pub use controller::{SceneController, StoryContext, StoryRegistry, StoryState, StoryTask};
pub use scheduler::{DueTask, Scheduler};
pub use script::{
    AutoAdvance, InteractionBinding, PlacementDirective, SceneDescriptor, StoryAction, StoryScript, TimedCue,
};

use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of an authored scene.
pub trait SceneKey: Copy + Eq + Hash + Debug + 'static {}

impl<T: Copy + Eq + Hash + Debug + 'static> SceneKey for T {}

/// Host callbacks for presentation the runtime does not draw itself.
pub trait StoryHost {
    /// Show the scene's text plate.
    fn show_caption(&mut self, text: &str) {
        log::debug!("Caption: {text}");
    }

    fn scene_entered(&mut self, name: &str) {
        let _ = name;
    }

    /// The experience reached its end.
    fn finished(&mut self) {}
}

/// Host that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl StoryHost for NullHost {}
