//! Experience Orchestrator
//!
//! [`Experience`] owns every subsystem and drives them from the host's frame
//! tick. It is a pure runtime without rendering, XR session or DOM code, so
//! the same instance can sit behind a WebXR page, a native viewer or a
//! headless test.
//!
//! # Lifecycle
//!
//! 1. Create with [`Experience::new`].
//! 2. Await [`Experience::load_essential`]. A failure here is fatal.
//! 3. Call [`Experience::start`]: enters the first scene and begins the
//!    background tiers.
//! 4. Every frame call [`Experience::tick`]; forward pointer and controller
//!    input as it arrives.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut experience = Experience::new(script, manifest, fetcher, ExperienceSettings::default())?;
//! pollster::block_on(experience.load_essential())?;
//! experience.start()?;
//!
//! loop {
//!     experience.tick(frame_time, head_pose);
//! }
//! ```

use std::time::Duration;

use glam::{Affine3A, Vec2, Vec3};

use crate::animation::{AudioOutput, PlaybackCoordinator};
use crate::assets::{
    AssetFetcher, LoadProgress, PendingTier, ResourceId, ResourceLoader, ResourceManifest, ResourceTable, TierId,
    TierReport,
};
use crate::errors::{Result, StoryError};
use crate::interaction::{ControllerRay, PointerGesture, RayIndicator};
use crate::scene::{BoundingBox, Camera, Node, NodeFlags, NodeHandle, Ray, Scene, ViewerMode, ViewerPose};
use crate::settings::ExperienceSettings;
use crate::story::{NullHost, SceneController, SceneKey, StoryContext, StoryHost, StoryRegistry, StoryScript};
use crate::utils::{Clock, FallbackLook};

/// Handles of the nodes that survive every scene clear.
#[derive(Debug, Clone, Copy)]
pub struct PersistentNodes {
    pub light: NodeHandle,
    pub camera: NodeHandle,
    pub controller: NodeHandle,
    pub ray: NodeHandle,
    pub ui: NodeHandle,
}

pub struct Experience<S: SceneKey> {
    settings: ExperienceSettings,

    scene: Scene,
    persistent: PersistentNodes,

    manifest: ResourceManifest,
    loader: ResourceLoader,
    resources: ResourceTable,
    background: Vec<PendingTier>,

    registry: StoryRegistry<S>,
    playback: PlaybackCoordinator,
    controller: SceneController<S>,
    host: Box<dyn StoryHost>,

    clock: Clock,
    mode: ViewerMode,
    viewer: ViewerPose,
    camera: Camera,
    viewport: Vec2,
    look: FallbackLook,
    gesture: PointerGesture,
    indicator: RayIndicator,

    started: bool,
}

impl<S: SceneKey> Experience<S> {
    /// Builds the runtime. Validates the manifest; loads nothing yet.
    pub fn new(
        script: StoryScript<S>,
        manifest: ResourceManifest,
        fetcher: impl AssetFetcher + 'static,
        settings: ExperienceSettings,
    ) -> Result<Self> {
        manifest.validate()?;

        let mut scene = Scene::new();
        let persistent = Self::spawn_persistent(&mut scene, settings.ray_length);
        let mode = ViewerMode::default();
        let viewer = ViewerPose::new(Vec3::new(0.0, settings.eye_height(mode), 0.0), glam::Quat::IDENTITY);

        Ok(Self {
            scene,
            persistent,
            manifest,
            loader: ResourceLoader::new(fetcher),
            resources: ResourceTable::new(),
            background: Vec::new(),
            registry: StoryRegistry::new(),
            playback: PlaybackCoordinator::default(),
            controller: SceneController::new(script, &settings),
            host: Box::new(NullHost),
            clock: Clock::new(),
            mode,
            viewer,
            camera: Camera::new_perspective(settings.fov_degrees, 1.0, settings.near, settings.far),
            viewport: Vec2::ONE,
            look: FallbackLook::new(),
            gesture: PointerGesture::new(settings.drag_threshold_px),
            indicator: RayIndicator::new(settings.ray_length),
            started: false,
            settings,
        })
    }

    #[must_use]
    pub fn with_audio(mut self, audio: impl AudioOutput + 'static) -> Self {
        self.playback = PlaybackCoordinator::new(audio);
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl StoryHost + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: impl Fn(&ResourceId, LoadProgress) + 'static) -> Self {
        self.loader = self.loader.with_progress(callback);
        self
    }

    fn spawn_persistent(scene: &mut Scene, ray_length: f32) -> PersistentNodes {
        let keep = NodeFlags::PERSISTENT;
        let light = scene.add_node(Node::new("light").with_flags(keep | NodeFlags::LIGHT));
        let camera = scene.add_node(Node::new("camera").with_flags(keep | NodeFlags::CAMERA));
        let controller = scene.add_node(Node::new("controller").with_flags(keep | NodeFlags::CONTROLLER));
        let mut ray_node = Node::new("ray").with_flags(keep | NodeFlags::RAY);
        ray_node.transform.scale = Vec3::new(1.0, 1.0, ray_length);
        let ray = scene.add_to_parent(ray_node, controller);
        let ui = scene.add_node(Node::new("ui").with_flags(keep | NodeFlags::UI));
        PersistentNodes {
            light,
            camera,
            controller,
            ray,
            ui,
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Loads the essential tier. Any single failure aborts it with
    /// [`AssetError::EssentialLoad`](crate::errors::AssetError::EssentialLoad)
    /// and the experience cannot start.
    pub async fn load_essential(&mut self) -> Result<TierReport> {
        let requests = self.manifest.essential.clone();
        self.resources.begin_tier(TierId::Essential, &requests)?;

        match self.loader.load_tier(TierId::Essential, requests).await {
            Ok(outcome) => Ok(self.resources.commit(&mut self.scene, outcome)),
            Err(e) => {
                self.resources.abort_tier(TierId::Essential);
                Err(e.into())
            }
        }
    }

    /// Starts the story. Requires the essential tier to be ready; kicks off
    /// every background tier.
    pub fn start(&mut self) -> Result<()> {
        if !self.resources.is_ready(TierId::Essential) {
            return Err(StoryError::TierNotReady(TierId::Essential).into());
        }
        if self.started {
            return Err(StoryError::AlreadyStarted.into());
        }

        let tiers = self.manifest.background_tiers();
        for (tier, requests) in &tiers {
            self.resources.begin_tier(*tier, requests)?;
        }
        self.background = self.loader.load_background(tiers)?;

        self.with_story(|controller, ctx| controller.start(ctx))?;
        self.started = true;
        log::info!("Experience started");
        Ok(())
    }

    /// Host-driven transition (e.g. a skip control).
    pub fn go_to(&mut self, target: S) -> Result<()> {
        if !self.started {
            return Err(StoryError::NotStarted.into());
        }
        self.with_story(|controller, ctx| controller.go_to(target, ctx))?;
        Ok(())
    }

    /// Ends the experience immediately.
    pub fn finish(&mut self) {
        self.with_story(|controller, ctx| controller.finish(ctx));
    }

    // ========================================================================
    // Frame tick
    // ========================================================================

    /// Advances one frame. `now` is measured from any fixed origin (the XR
    /// frame time works); `viewer` is the head pose polled this frame. In
    /// fallback mode the pointer look rotation replaces the pose's rotation.
    pub fn tick(&mut self, now: Duration, viewer: ViewerPose) {
        let dt = self.clock.tick_at(now).as_secs_f32();

        self.poll_background();

        self.viewer = match self.mode {
            ViewerMode::Immersive => viewer,
            ViewerMode::Fallback => {
                let mut pose = viewer;
                self.look.apply(&mut pose);
                pose
            }
        };
        if let Some(node) = self.scene.get_node_mut(self.persistent.camera) {
            node.transform.position = self.viewer.position;
            node.transform.rotation = self.viewer.rotation;
        }

        if self.started {
            self.with_story(|controller, ctx| controller.tick(ctx));
        }

        let elapsed_ms = self.clock.elapsed.as_secs_f64() * 1000.0;
        self.playback.update(dt, elapsed_ms, &mut self.scene);

        if self.mode == ViewerMode::Immersive {
            self.update_indicator();
        }
    }

    fn poll_background(&mut self) {
        let mut i = 0;
        while i < self.background.len() {
            match self.background[i].poll_settled() {
                None => i += 1,
                Some(result) => {
                    let tier = self.background.swap_remove(i).tier();
                    match result {
                        Ok(outcome) => {
                            self.resources.commit(&mut self.scene, outcome);
                        }
                        Err(e) => {
                            log::warn!("Background tier {tier} aborted: {e}");
                            self.resources.abort_tier(tier);
                        }
                    }
                }
            }
        }
    }

    fn update_indicator(&mut self) {
        let world = self.scene.world_matrix(self.persistent.controller);
        let ray = ControllerRay::from_world_matrix(&world);
        let hit = self.registry.probe(&self.scene, &ray);
        self.indicator.update(hit.as_ref());
        if let Some(node) = self.scene.get_node_mut(self.persistent.ray) {
            node.transform.scale.z = self.indicator.length;
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn pointer_down(&mut self, position: Vec2) {
        self.gesture.pointer_down(position);
        if self.mode == ViewerMode::Fallback {
            self.look.pointer_down(position);
        }
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        self.gesture.pointer_move(position);
        if self.mode == ViewerMode::Fallback {
            self.look.pointer_move(position);
            self.look.apply(&mut self.viewer);
        }
    }

    /// Ends a pointer gesture. A click (never a drag) is hit-tested through
    /// the camera; returns whether a callback fired.
    pub fn pointer_up(&mut self, position: Vec2) -> bool {
        self.look.pointer_up();
        let Some(click) = self.gesture.pointer_up(position) else {
            log::debug!("Pointer gesture was a drag, no hit-test");
            return false;
        };
        let ray = self.camera.screen_ray(click, self.viewport, &self.viewer);
        self.dispatch(&ray)
    }

    /// XR select: hit-tests along the controller's −Z. Returns whether a
    /// callback fired.
    pub fn controller_select(&mut self, world: Affine3A) -> bool {
        self.set_controller_pose(world);
        self.dispatch(&ControllerRay::from_world_matrix(&world))
    }

    /// Moves the persistent controller node to the host-tracked pose.
    pub fn set_controller_pose(&mut self, world: Affine3A) {
        if let Some(node) = self.scene.get_node_mut(self.persistent.controller) {
            node.transform.apply_local_matrix(world);
        }
    }

    /// Hit-tests an arbitrary ray and runs the actions of whatever fired.
    pub fn dispatch(&mut self, ray: &Ray) -> bool {
        if !self.started || self.controller.is_finished() {
            return false;
        }
        let Some(dispatched) = self.registry.dispatch(&self.scene, ray) else {
            return false;
        };
        self.with_story(|controller, ctx| controller.run_actions(dispatched.value, ctx));
        true
    }

    /// Canvas resize: updates the pointer viewport and camera aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.camera.set_aspect(self.viewport.x / self.viewport.y);
    }

    pub fn set_mode(&mut self, mode: ViewerMode) {
        if mode != self.mode {
            log::info!("Viewer mode: {mode:?}");
            self.mode = mode;
        }
    }

    /// Fallback head pose: eye height for the current mode plus pointer look.
    #[must_use]
    pub fn fallback_pose(&self) -> ViewerPose {
        ViewerPose::new(
            Vec3::new(0.0, self.settings.eye_height(self.mode), 0.0),
            self.look.rotation(),
        )
    }

    fn with_story<R>(&mut self, f: impl FnOnce(&mut SceneController<S>, &mut StoryContext<'_, S>) -> R) -> R {
        let mut ctx = StoryContext {
            scene: &mut self.scene,
            resources: &self.resources,
            registry: &mut self.registry,
            playback: &mut self.playback,
            host: self.host.as_mut(),
            viewer: self.viewer,
            now: self.clock.elapsed,
        };
        f(&mut self.controller, &mut ctx)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access for the host (e.g. adding its own persistent nodes).
    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[inline]
    #[must_use]
    pub fn persistent(&self) -> &PersistentNodes {
        &self.persistent
    }

    #[inline]
    #[must_use]
    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &StoryRegistry<S> {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    #[inline]
    #[must_use]
    pub fn controller(&self) -> &SceneController<S> {
        &self.controller
    }

    #[inline]
    #[must_use]
    pub fn indicator(&self) -> &RayIndicator {
        &self.indicator
    }

    #[inline]
    #[must_use]
    pub fn viewer(&self) -> ViewerPose {
        self.viewer
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ExperienceSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Background tiers still loading.
    #[inline]
    #[must_use]
    pub fn pending_tiers(&self) -> usize {
        self.background.len()
    }

    /// World-space box of a live model, for hosts that frame or debug it.
    #[must_use]
    pub fn model_bounds(&self, id: &str) -> Option<BoundingBox> {
        let root = self.resources.model(id)?.root;
        self.scene
            .descendants(root)
            .into_iter()
            .filter_map(|h| {
                let bounds = self.scene.get_node(h)?.bounds?;
                Some(bounds.transform(&self.scene.world_matrix(h)))
            })
            .reduce(|a, b| a.union(&b))
    }
}

impl<S: SceneKey> std::fmt::Debug for Experience<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Experience")
            .field("started", &self.started)
            .field("mode", &self.mode)
            .field("controller", &self.controller)
            .field("resources", &self.resources.len())
            .field("pending_tiers", &self.background.len())
            .finish_non_exhaustive()
    }
}
