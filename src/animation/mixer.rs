use std::sync::Arc;

use crate::animation::action::{AnimationAction, LoopMode};
use crate::animation::clip::AnimationClip;
use crate::scene::NodeHandle;

/// All actions playing on one model root.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    root: NodeHandle,
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            actions: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Starts `clip` from the beginning. A clip already on this mixer is
    /// rewound rather than layered twice.
    pub fn play(&mut self, clip: &AnimationClip, loop_mode: LoopMode) -> &AnimationAction {
        let index = match self.actions.iter().position(|a| a.clip().name == clip.name) {
            Some(i) => {
                self.actions[i].restart();
                self.actions[i].loop_mode = loop_mode;
                i
            }
            None => {
                self.actions
                    .push(AnimationAction::new(Arc::new(clip.clone())).with_loop_mode(loop_mode));
                self.actions.len() - 1
            }
        };
        &self.actions[index]
    }

    pub fn update(&mut self, dt: f32) {
        for action in &mut self.actions {
            action.update(dt);
        }
    }

    /// Stops and drops every action. Fine to call on an idle mixer.
    pub fn stop_all_actions(&mut self) {
        self.actions.clear();
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    #[must_use]
    pub fn action(&self, clip: &str) -> Option<&AnimationAction> {
        self.actions.iter().find(|a| a.clip().name == clip)
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.actions.iter().all(|a| !a.is_running())
    }
}
