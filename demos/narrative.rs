//! Headless Narrative Demo
//!
//! Runs the four-chapter story (welcome, 3D video, quiz, farewell) without a
//! renderer. Resources come from a synthetic fetcher, time advances at a
//! fixed 60 Hz, and a scripted "user" aims the XR controller at whatever the
//! current chapter wants clicked.
//!
//! Run with:
//! ```text
//! RUST_LOG=debug cargo run --example narrative
//! ```

use std::time::Duration;

use env_logger::Env;
use futures::future::{self, FutureExt, LocalBoxFuture};
use glam::{Affine3A, Quat, Vec2, Vec3};
use parallax::animation::{AnimationClip, AudioOutput};
use parallax::assets::{
    AudioTrack, LoadedAsset, ModelAsset, Prefab, PrefabNode, ProgressReporter, ResourceId, ResourceKind,
    ResourceManifest, ResourceRequest,
};
use parallax::scene::BoundingBox;
use parallax::story::{InteractionBinding, PlacementDirective, SceneDescriptor, StoryAction, StoryScript};
use parallax::{
    AssetError, Experience, ExperienceSettings, PlacementSpec, StoryAngle, StoryHost, ViewerMode, ViewerPose,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Chapter {
    Welcome,
    Video,
    Quiz,
    Farewell,
}

// ============================================================================
// Script
// ============================================================================

fn at(distance: f32, angle: f32, height: f32) -> PlacementSpec {
    PlacementSpec::new(distance, angle, height)
}

fn script() -> StoryScript<Chapter> {
    let wrong = || vec![StoryAction::play_audio("audioWrongAnswer")];

    StoryScript {
        start: Chapter::Welcome,
        scenes: vec![
            SceneDescriptor::new(Chapter::Welcome, "welcome")
                .caption("Welcome - use START below to begin")
                .on_enter(StoryAction::play_audio("audioIntroMsg"))
                .on_enter(StoryAction::play_clip("wendyNT", "Dance"))
                .place(PlacementDirective::new("startButton", at(1.5, StoryAngle::FRONT, -0.5)))
                .place(PlacementDirective::new("wendyNT", at(4.0, StoryAngle::BEHIND, 0.0)))
                .bind(
                    InteractionBinding::new(
                        "startButton",
                        vec![
                            StoryAction::move_to("wendyNT", Vec3::new(1.0, 10.0, -5.5), 7.0),
                            StoryAction::after(
                                2000,
                                vec![
                                    StoryAction::hide("wendyNT"),
                                    StoryAction::hide("startButton"),
                                    StoryAction::GoTo(Chapter::Video),
                                ],
                            ),
                        ],
                    )
                    .once(),
                ),
            SceneDescriptor::new(Chapter::Video, "video")
                .caption("Chapter 1: 3D Video")
                .place(PlacementDirective::new("cafe", at(4.0, StoryAngle::FRONT, 0.0)))
                .place(PlacementDirective::new("wendy", at(2.0, StoryAngle::FRONT_LEFT, 0.0)))
                .place(PlacementDirective::new("mendy", at(2.5, StoryAngle::BEHIND, 0.0)))
                .place(PlacementDirective::new("sunglasses", at(1.8, StoryAngle::FRONT_RIGHT, 0.3)).idle())
                .on_enter(StoryAction::play_clip("wendy", "Talk"))
                .on_enter(StoryAction::play_clip("mendy", "Talk"))
                .on_enter(StoryAction::play_audio("audioChapter1"))
                .cue(35_000, vec![StoryAction::ShowNext(Chapter::Quiz)]),
            SceneDescriptor::new(Chapter::Quiz, "quiz")
                .caption("Welcome to the Quiz!")
                .on_enter(StoryAction::play_audio("audioQuizIntro"))
                .place(PlacementDirective::new("wendyNT", at(3.0, StoryAngle::FRONT, 0.0)))
                .place(PlacementDirective::new("laptop", at(2.5, StoryAngle::FRONT_RIGHT, 0.2)).drop_in(1000))
                .place(PlacementDirective::new("tablet", at(2.5, StoryAngle::RIGHT, 0.2)).drop_in(1000))
                .place(PlacementDirective::new("table", at(2.5, StoryAngle::BACK_RIGHT, 0.2)).drop_in(1000))
                .place(PlacementDirective::new("notebook", at(2.5, StoryAngle::LEFT, 0.2)).drop_in(1000))
                .bind(InteractionBinding::new(
                    "laptop",
                    vec![
                        StoryAction::play_audio("audioCorrectAnswer"),
                        StoryAction::play_clip("wendyNT", "Dance"),
                        StoryAction::ShowNext(Chapter::Farewell),
                    ],
                ))
                .bind(InteractionBinding::new("tablet", wrong()))
                .bind(InteractionBinding::new("table", wrong()))
                .bind(InteractionBinding::new("notebook", wrong())),
            SceneDescriptor::new(Chapter::Farewell, "farewell")
                .caption("Thanks for looking around - use QUIT below to finish")
                .place(PlacementDirective::new("quitButton", at(1.5, StoryAngle::FRONT, -0.5)).scaled(0.3))
                .place(PlacementDirective::new("wendy", at(3.0, StoryAngle::LEFT, 0.0)))
                .bind(InteractionBinding::new("quitButton", vec![StoryAction::Finish]).once()),
        ],
    }
}

fn manifest() -> ResourceManifest {
    let model = |id: &str| ResourceRequest::model(id, &format!("models/{id}.glb"));
    let audio = |id: &str| ResourceRequest::audio(id, &format!("audio/{id}.mp3"));

    ResourceManifest {
        essential: vec![model("startButton"), model("nextButton"), model("wendyNT"), audio("audioIntroMsg")],
        background: vec![
            vec![model("cafe"), model("wendy"), model("mendy"), model("sunglasses"), audio("audioChapter1")],
            vec![
                model("laptop"),
                model("tablet"),
                model("table"),
                model("notebook"),
                model("quitButton"),
                audio("audioQuizIntro"),
                audio("audioCorrectAnswer"),
                audio("audioWrongAnswer"),
            ],
        ],
    }
}

// ============================================================================
// Host stand-ins
// ============================================================================

type FetchResult = LocalBoxFuture<'static, Result<LoadedAsset, AssetError>>;

/// Builds every model as a root with one 0.6 m body, and every track as a
/// few silent bytes. `table` always fails so the best-effort tier shows up
/// in the log.
fn synthetic_fetch(request: &ResourceRequest, progress: ProgressReporter) -> FetchResult {
    progress.report_bytes(0, Some(4096));

    let result = if request.id.as_str() == "table" {
        Err(AssetError::fetch(&request.id, &request.path, "503 Service Unavailable"))
    } else {
        progress.report_bytes(4096, Some(4096));
        Ok(match request.kind {
            ResourceKind::Model => {
                let mut prefab = Prefab::new();
                let root = prefab.push(PrefabNode::new("Scene"), None);
                prefab.push(
                    PrefabNode::new("Body").with_bounds(BoundingBox::from_size(Vec3::splat(0.6))),
                    Some(root),
                );
                let clips = match request.id.as_str() {
                    "wendyNT" => vec![AnimationClip::new("Dance", 3.2)],
                    "wendy" | "mendy" => vec![AnimationClip::new("Talk", 8.0)],
                    _ => Vec::new(),
                };
                LoadedAsset::Model(ModelAsset::new(prefab, clips))
            }
            ResourceKind::Audio => LoadedAsset::Audio(
                AudioTrack::new(&request.path, vec![0u8; 64]).with_duration(Duration::from_secs(12)),
            ),
        })
    };
    future::ready(result).boxed_local()
}

struct ConsoleHost;

impl StoryHost for ConsoleHost {
    fn show_caption(&mut self, text: &str) {
        log::info!("[caption] {text}");
    }

    fn scene_entered(&mut self, name: &str) {
        log::info!("[scene] {name}");
    }

    fn finished(&mut self) {
        log::info!("[end] Thanks for watching");
    }
}

struct ConsoleAudio;

impl AudioOutput for ConsoleAudio {
    fn play(&mut self, id: &ResourceId, track: &AudioTrack) {
        log::info!("[audio] play {id} ({:?})", track.duration);
    }

    fn stop(&mut self, id: &ResourceId) {
        log::info!("[audio] stop {id}");
    }
}

// ============================================================================
// Scripted user
// ============================================================================

/// Aims the controller from the viewer's eye at `id` and pulls the trigger.
fn select(experience: &mut Experience<Chapter>, id: &str) -> bool {
    let Some(root) = experience.resources().model(id).map(|m| m.root) else {
        return false;
    };
    let target = Vec3::from(experience.scene().world_matrix(root).translation);
    let eye = experience.viewer().position;
    let world = Affine3A::look_at_rh(eye, target, Vec3::Y).inverse();
    experience.controller_select(world)
}

fn is_shown(experience: &Experience<Chapter>, id: &str) -> bool {
    experience
        .resources()
        .model(id)
        .is_some_and(|m| experience.scene().is_shown(m.root))
}

const PLAN: &[(Chapter, &str)] = &[
    (Chapter::Welcome, "startButton"),
    (Chapter::Video, "nextButton"),
    (Chapter::Quiz, "notebook"),
    (Chapter::Quiz, "laptop"),
    (Chapter::Quiz, "nextButton"),
    (Chapter::Farewell, "quitButton"),
];

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut experience = Experience::new(script(), manifest(), synthetic_fetch, ExperienceSettings::default())?
        .with_host(ConsoleHost)
        .with_audio(ConsoleAudio)
        .with_progress(|id, progress| log::debug!("[progress] {id}: {progress:?}"));

    let report = pollster::block_on(experience.load_essential())?;
    log::info!("Essential tier loaded: {} resources", report.loaded.len());
    experience.start()?;

    // A short look-around drag in fallback mode never counts as a click.
    experience.resize(1280, 720);
    experience.pointer_down(Vec2::new(640.0, 360.0));
    experience.pointer_move(Vec2::new(700.0, 360.0));
    let clicked = experience.pointer_up(Vec2::new(700.0, 360.0));
    log::info!("Drag dispatched a click: {clicked}");

    experience.set_mode(ViewerMode::Immersive);
    let head = ViewerPose::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY);

    let frame = Duration::from_micros(16_667);
    let mut now = Duration::ZERO;
    let mut step = 0;
    let mut chapter = None;
    let mut chapter_since = Duration::ZERO;

    while !experience.controller().is_finished() && now < Duration::from_secs(120) {
        now += frame;
        experience.tick(now, head);

        let current = experience.controller().current();
        if current != chapter {
            chapter = current;
            chapter_since = now;
        }

        let Some(&(wanted, target)) = PLAN.get(step) else {
            continue;
        };
        let settled = now.saturating_sub(chapter_since) > Duration::from_millis(1500);
        if current == Some(wanted) && settled && is_shown(&experience, target) && select(&mut experience, target) {
            log::info!("[user] selected {target} at {:.1}s", now.as_secs_f32());
            step += 1;
            chapter_since = now;
        }
    }

    log::info!(
        "Done after {:.1}s simulated, {} frames",
        now.as_secs_f32(),
        experience.clock().frame_count
    );
    Ok(())
}
