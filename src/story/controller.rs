use std::time::Duration;

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::assets::{ResourceId, ResourceTable};
use crate::errors::StoryError;
use crate::interaction::InteractionRegistry;
use crate::scene::{NodeHandle, PlacementSpec, Scene, StoryAngle, ViewerPose, placement};
use crate::settings::ExperienceSettings;
use crate::animation::PlaybackCoordinator;
use crate::story::scheduler::Scheduler;
use crate::story::script::{PlacementDirective, SceneDescriptor, StoryAction, StoryScript};
use crate::story::{SceneKey, StoryHost};

/// Height above the viewer where drop-in models wait.
const DROP_HEIGHT: f32 = 10.0;

/// Registry whose callbacks hand back story actions.
pub type StoryRegistry<S> = InteractionRegistry<Vec<StoryAction<S>>>;

/// Everything the controller mutates, borrowed for one call.
pub struct StoryContext<'a, S> {
    pub scene: &'a mut Scene,
    pub resources: &'a ResourceTable,
    pub registry: &'a mut StoryRegistry<S>,
    pub playback: &'a mut PlaybackCoordinator,
    pub host: &'a mut dyn StoryHost,
    /// Viewer pose polled this frame.
    pub viewer: ViewerPose,
    /// Time since the experience clock started.
    pub now: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoryState<S> {
    #[default]
    Idle,
    /// Cleared, waiting out the settle delay (and any tier the scene still
    /// needs) before entering `to`.
    Transitioning { to: S },
    Active(S),
    Finished,
}

/// Work the scheduler holds for the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryTask<S> {
    Enter(S),
    Run(Vec<StoryAction<S>>),
}

/// State machine over the scenes of a [`StoryScript`].
pub struct SceneController<S: SceneKey> {
    scenes: FxHashMap<S, SceneDescriptor<S>>,
    start: S,
    state: StoryState<S>,
    generation: u64,
    scheduler: Scheduler<StoryTask<S>>,
    /// Scene whose settle delay has passed but whose resources are still loading.
    awaiting: Option<S>,

    settle_delay: Duration,
    handoff: Vec<String>,
    next_button: ResourceId,
    idle_amplitude: f32,
    idle_speed: f32,
}

impl<S: SceneKey> SceneController<S> {
    #[must_use]
    pub fn new(script: StoryScript<S>, settings: &ExperienceSettings) -> Self {
        let mut scenes = FxHashMap::default();
        for descriptor in script.scenes {
            if let Some(old) = scenes.insert(descriptor.key, descriptor) {
                log::warn!("Scene {:?} declared twice, keeping the later one", old.key);
            }
        }
        if !scenes.contains_key(&script.start) {
            log::warn!("Start scene {:?} has no descriptor", script.start);
        }

        Self {
            scenes,
            start: script.start,
            state: StoryState::Idle,
            generation: 0,
            scheduler: Scheduler::new(),
            awaiting: None,
            settle_delay: settings.settle_delay(),
            handoff: settings.handoff_objects.clone(),
            next_button: settings
                .handoff_objects
                .first()
                .map_or_else(|| ResourceId::from("nextButton"), |n| ResourceId::from(n.as_str())),
            idle_amplitude: settings.idle_amplitude,
            idle_speed: settings.idle_speed,
        }
    }

    /// Resource used by [`StoryAction::ShowNext`].
    #[must_use]
    pub fn with_next_button(mut self, id: &str) -> Self {
        self.next_button = id.into();
        self
    }

    // ========================================================================
    // State
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn state(&self) -> StoryState<S> {
        self.state
    }

    /// The scene currently shown, if any.
    #[must_use]
    pub fn current(&self) -> Option<S> {
        match self.state {
            StoryState::Active(s) => Some(s),
            _ => None,
        }
    }

    /// Incremented on every transition; delayed work from older generations
    /// is dropped.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == StoryState::Finished
    }

    #[must_use]
    pub fn descriptor(&self, key: S) -> Option<&SceneDescriptor<S>> {
        self.scenes.get(&key)
    }

    #[inline]
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Enters the start scene right away, or as soon as its tiers settle.
    pub fn start(&mut self, ctx: &mut StoryContext<'_, S>) -> Result<(), StoryError> {
        match self.state {
            StoryState::Idle => {}
            StoryState::Finished => return Err(StoryError::Finished),
            _ => return Err(StoryError::AlreadyStarted),
        }
        log::info!("Starting story at {:?}", self.start);
        self.generation += 1;
        self.try_enter(self.start, ctx)
    }

    /// Clears the current scene and schedules `target` after the settle delay.
    ///
    /// With no descriptor for `target` the scene stays cleared and
    /// [`StoryError::MissingScene`] is returned.
    pub fn go_to(&mut self, target: S, ctx: &mut StoryContext<'_, S>) -> Result<(), StoryError> {
        match self.state {
            StoryState::Idle => return Err(StoryError::NotStarted),
            StoryState::Finished => return Err(StoryError::Finished),
            _ => {}
        }
        log::info!("Transitioning to {target:?}");

        self.generation += 1;
        self.scheduler.retain_generation(self.generation);
        self.awaiting = None;
        self.clear(ctx);

        if !self.scenes.contains_key(&target) {
            self.state = StoryState::Active(target);
            let error = StoryError::MissingScene(format!("{target:?}"));
            log::warn!("{error}");
            return Err(error);
        }

        self.state = StoryState::Transitioning { to: target };
        self.scheduler
            .schedule(ctx.now + self.settle_delay, self.generation, StoryTask::Enter(target));
        Ok(())
    }

    /// Ends the experience: clears everything and notifies the host.
    pub fn finish(&mut self, ctx: &mut StoryContext<'_, S>) {
        if self.state == StoryState::Finished {
            return;
        }
        self.generation += 1;
        self.scheduler.clear();
        self.awaiting = None;
        self.clear(ctx);
        ctx.registry.clear();
        ctx.playback.stop_audio(None);
        self.state = StoryState::Finished;
        log::info!("Story finished");
        ctx.host.finished();
    }

    /// Runs every scheduled task that has come due. Tasks from an older
    /// generation are dropped. A scene held back by a loading tier is
    /// entered on the first tick after that tier settles.
    pub fn tick(&mut self, ctx: &mut StoryContext<'_, S>) {
        if let Some(target) = self.awaiting
            && let Err(e) = self.try_enter(target, ctx)
        {
            log::warn!("{e}");
        }

        for due in self.scheduler.due(ctx.now) {
            if due.generation != self.generation {
                log::debug!("Dropping stale task from generation {}", due.generation);
                continue;
            }
            match due.task {
                StoryTask::Enter(target) => {
                    if let Err(e) = self.try_enter(target, ctx) {
                        log::warn!("{e}");
                    }
                }
                StoryTask::Run(actions) => self.run_actions(actions, ctx),
            }
        }
    }

    /// Runs actions in order. Stops early once an action changes the scene,
    /// since the rest belong to the scene that just ended.
    pub fn run_actions(&mut self, actions: Vec<StoryAction<S>>, ctx: &mut StoryContext<'_, S>) {
        let generation = self.generation;
        for action in actions {
            if self.generation != generation {
                log::debug!("Scene changed mid-sequence, dropping remaining actions");
                break;
            }
            self.run_action(action, ctx);
        }
    }

    fn run_action(&mut self, action: StoryAction<S>, ctx: &mut StoryContext<'_, S>) {
        match action {
            StoryAction::GoTo(target) => {
                // Missing scenes are logged inside go_to.
                if let Err(e @ (StoryError::NotStarted | StoryError::Finished)) = self.go_to(target, ctx) {
                    log::warn!("Ignoring transition to {target:?}: {e}");
                }
            }
            StoryAction::ShowNext(target) => self.show_next(target, ctx),
            StoryAction::PlayAudio(id) => {
                if let Err(e) = ctx.playback.play_audio(ctx.resources, id.as_str()) {
                    log::warn!("Skipping audio cue: {e}");
                }
            }
            StoryAction::StopAudio(id) => ctx.playback.stop_audio(id.as_ref().map(ResourceId::as_str)),
            StoryAction::PlayClip { object, clip } => {
                if let Err(e) = ctx.playback.play_clip(ctx.resources, object.as_str(), &clip) {
                    log::warn!("Skipping animation cue: {e}");
                }
            }
            StoryAction::Place(directive) => self.place(&directive, ctx),
            StoryAction::Hide(id) => {
                if let Some(model) = ctx.resources.model(id.as_str()) {
                    ctx.scene.set_visible(model.root, false);
                    ctx.scene.detach(model.root);
                }
            }
            StoryAction::MoveTo {
                object,
                offset,
                duration,
            } => match ctx.resources.model(object.as_str()) {
                Some(model) => ctx.playback.move_to(model.root, ctx.viewer.position + offset, duration),
                None => log::warn!("{}", StoryError::ResourceMissing(object)),
            },
            StoryAction::After { delay_ms, actions } => {
                self.scheduler.schedule(
                    ctx.now + Duration::from_millis(delay_ms),
                    self.generation,
                    StoryTask::Run(actions),
                );
            }
            StoryAction::Caption(text) => ctx.host.show_caption(&text),
            StoryAction::Finish => self.finish(ctx),
        }
    }

    // ========================================================================
    // Scene setup and teardown
    // ========================================================================

    /// Enters `key` unless one of its resources sits in a tier that has not
    /// settled yet, in which case the controller keeps waiting.
    fn try_enter(&mut self, key: S, ctx: &mut StoryContext<'_, S>) -> Result<(), StoryError> {
        let blocking = self
            .scenes
            .get(&key)
            .and_then(|descriptor| ctx.resources.blocking_tier(descriptor.resources()));

        match blocking {
            Some(tier) => {
                if self.awaiting != Some(key) {
                    log::info!("Scene {key:?} waiting for tier {tier}");
                }
                self.state = StoryState::Transitioning { to: key };
                self.awaiting = Some(key);
                Ok(())
            }
            None => {
                self.awaiting = None;
                self.enter(key, ctx)
            }
        }
    }

    fn enter(&mut self, key: S, ctx: &mut StoryContext<'_, S>) -> Result<(), StoryError> {
        let Some(descriptor) = self.scenes.get(&key).cloned() else {
            self.state = StoryState::Active(key);
            return Err(StoryError::MissingScene(format!("{key:?}")));
        };

        self.state = StoryState::Active(key);
        log::info!("Entering scene '{}'", descriptor.name);

        if let Some(caption) = &descriptor.caption {
            ctx.host.show_caption(caption);
        }

        for directive in &descriptor.placements {
            self.place(directive, ctx);
        }

        for binding in descriptor.bindings {
            let Some(model) = ctx.resources.model(binding.object.as_str()) else {
                log::warn!(
                    "Cannot make '{}' clickable: {}",
                    binding.object,
                    StoryError::ResourceMissing(binding.object.clone())
                );
                continue;
            };
            let actions = binding.actions;
            ctx.registry
                .register(model.root, move |_, _| actions.clone(), binding.once);
        }

        for cue in descriptor.cues {
            self.scheduler.schedule(
                ctx.now + Duration::from_millis(cue.delay_ms),
                self.generation,
                StoryTask::Run(cue.actions),
            );
        }

        if let Some(auto) = descriptor.auto_advance {
            self.scheduler.schedule(
                ctx.now + Duration::from_millis(auto.delay_ms),
                self.generation,
                StoryTask::Run(vec![StoryAction::GoTo(auto.target)]),
            );
        }

        ctx.host.scene_entered(&descriptor.name);
        self.run_actions(descriptor.on_enter, ctx);
        Ok(())
    }

    /// Hides and detaches every live object outside the persistent set,
    /// prunes registrations and releases the scene's mixers.
    fn clear(&mut self, ctx: &mut StoryContext<'_, S>) {
        let mut hidden = 0usize;
        for object in ctx.scene.live_objects() {
            if ctx.scene.get_node(object).is_some_and(|n| n.is_persistent()) {
                continue;
            }
            ctx.scene.set_visible(object, false);
            ctx.scene.detach(object);
            hidden += 1;
        }

        let scene: &Scene = ctx.scene;
        let handoff = &self.handoff;
        let keep = |node: NodeHandle| scene.get_node(node).is_some_and(|n| handoff.iter().any(|h| *h == n.name));
        let pruned = ctx.registry.prune(scene, keep);

        ctx.playback.stop_all();
        log::debug!("Scene cleared: {hidden} objects hidden, {pruned} interactions pruned");
    }

    fn place(&mut self, directive: &PlacementDirective, ctx: &mut StoryContext<'_, S>) {
        let Some(model) = ctx.resources.model(directive.object.as_str()) else {
            log::warn!(
                "Cannot place '{}': {}",
                directive.object,
                StoryError::ResourceMissing(directive.object.clone())
            );
            return;
        };
        if let Err(reason) = directive.spec.validate() {
            log::warn!(
                "{}",
                StoryError::InvalidPlacement {
                    object: directive.object.clone(),
                    reason
                }
            );
            return;
        }
        let root = model.root;

        if let Some(delay_ms) = directive.drop_in_ms {
            if let Some(node) = ctx.scene.get_node_mut(root) {
                node.transform.position = ctx.viewer.position + Vec3::Y * DROP_HEIGHT;
            }
            let mut landing = directive.clone();
            landing.drop_in_ms = None;
            self.scheduler.schedule(
                ctx.now + Duration::from_millis(delay_ms),
                self.generation,
                StoryTask::Run(vec![StoryAction::Place(landing)]),
            );
        } else {
            placement::place(ctx.scene, root, &ctx.viewer, &directive.spec);
        }

        if let Some(scale) = directive.scale {
            placement::scale_model(ctx.scene, root, scale);
        }
        if !ctx.scene.root_nodes().contains(&root) {
            ctx.scene.add_to_root(root);
        }
        ctx.scene.set_visible(root, true);

        ctx.playback.rebase_idle(root);
        if directive.idle {
            ctx.playback.add_idle(root, self.idle_amplitude, self.idle_speed);
        }
    }

    fn show_next(&mut self, target: S, ctx: &mut StoryContext<'_, S>) {
        let id = self.next_button.clone();
        let Some(model) = ctx.resources.model(id.as_str()) else {
            log::warn!("Cannot show the next control: {}", StoryError::ResourceMissing(id));
            return;
        };
        let root = model.root;

        let directive = PlacementDirective::new(id.as_str(), PlacementSpec::new(1.5, StoryAngle::FRONT, -0.3))
            .scaled(0.5)
            .idle();
        self.place(&directive, ctx);

        ctx.registry
            .register(root, move |_, _| vec![StoryAction::GoTo(target)], false);
    }
}

impl<S: SceneKey> std::fmt::Debug for SceneController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("scenes", &self.scenes.len())
            .field("pending", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}
