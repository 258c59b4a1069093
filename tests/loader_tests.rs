//! Resource Loader Integration Tests
//!
//! Tests for:
//! - Essential tier: fail-fast join, commit into the table, start gating
//! - Background tiers: best-effort join, partial failure, tick polling
//! - Progress reporting (percent and indeterminate)
//! - Payload kind checks and manifest validation
//! - FileAssetReader against real files

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use glam::Vec3;
use parallax::animation::AnimationClip;
use parallax::assets::{
    AudioTrack, LoadProgress, LoadStatus, LoadedAsset, ModelAsset, Prefab, ProgressReporter, ResourceKind,
    ResourceLoader, ResourceManifest, ResourceRequest, ResourceTable, TierId,
};
use parallax::scene::{BoundingBox, Scene};
use parallax::story::{SceneDescriptor, StoryScript};
use parallax::{AssetError, Error, Experience, ExperienceSettings, StoryError};

type FetchResult = LocalBoxFuture<'static, Result<LoadedAsset, AssetError>>;

fn synthetic(request: &ResourceRequest) -> LoadedAsset {
    match request.kind {
        ResourceKind::Model => LoadedAsset::Model(ModelAsset::new(
            Prefab::single(request.id.as_str(), BoundingBox::from_size(Vec3::ONE)),
            vec![AnimationClip::new("Idle", 2.0)],
        )),
        ResourceKind::Audio => LoadedAsset::Audio(AudioTrack::new(&request.path, vec![0u8; 16])),
    }
}

/// Resolves every request immediately, failing the listed ids.
fn failing_fetcher(failing: &'static [&'static str]) -> impl Fn(&ResourceRequest, ProgressReporter) -> FetchResult {
    move |request: &ResourceRequest, _progress: ProgressReporter| -> FetchResult {
        let result = if failing.contains(&request.id.as_str()) {
            Err(AssetError::fetch(&request.id, &request.path, "404 Not Found"))
        } else {
            Ok(synthetic(request))
        };
        future::ready(result).boxed_local()
    }
}

fn essential_requests() -> Vec<ResourceRequest> {
    vec![
        ResourceRequest::model("startButton", "models/start.glb"),
        ResourceRequest::audio("intro", "audio/intro.mp3"),
    ]
}

fn background_requests() -> Vec<ResourceRequest> {
    vec![
        ResourceRequest::model("wendy", "models/wendy.glb"),
        ResourceRequest::model("laptop", "models/laptop.glb"),
        ResourceRequest::model("notebook", "models/notebook.glb"),
        ResourceRequest::model("tablet", "models/tablet.glb"),
        ResourceRequest::audio("correctAudio", "audio/correct.mp3"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Chapter {
    Intro,
}

fn one_scene_script() -> StoryScript<Chapter> {
    StoryScript {
        start: Chapter::Intro,
        scenes: vec![SceneDescriptor::new(Chapter::Intro, "intro")],
    }
}

// ============================================================================
// Essential Tier
// ============================================================================

#[test]
fn essential_tier_commits_hidden_detached_models() {
    let loader = ResourceLoader::new(failing_fetcher(&[]));
    let mut scene = Scene::new();
    let mut table = ResourceTable::new();
    let requests = essential_requests();

    table.begin_tier(TierId::Essential, &requests).unwrap();
    assert_eq!(table.status("startButton"), Some(LoadStatus::Pending));
    assert!(!table.is_ready(TierId::Essential));

    let outcome = pollster::block_on(loader.load_tier(TierId::Essential, requests)).unwrap();
    assert_eq!(outcome.loaded.len(), 2);
    let report = table.commit(&mut scene, outcome);

    assert!(report.is_complete());
    assert!(table.is_ready(TierId::Essential));
    assert_eq!(table.status("startButton"), Some(LoadStatus::Loaded));
    assert!(table.audio("intro").is_some());

    let root = table.model("startButton").unwrap().root;
    assert_eq!(scene.get_node(root).unwrap().name, "startButton");
    assert!(!scene.is_parented(root));
    assert!(!scene.is_shown(root));
    assert_eq!(table.model_id_of(root).map(|id| id.as_str()), Some("startButton"));
}

#[test]
fn essential_failure_aborts_the_tier() {
    let loader = ResourceLoader::new(failing_fetcher(&["intro"]));
    let result = pollster::block_on(loader.load_tier(TierId::Essential, essential_requests()));

    match result {
        Err(AssetError::EssentialLoad { id, source }) => {
            assert_eq!(id.as_str(), "intro");
            assert!(matches!(*source, AssetError::Fetch { .. }));
        }
        other => panic!("expected EssentialLoad, got {other:?}"),
    }
}

#[test]
fn essential_failure_blocks_start() {
    let manifest = ResourceManifest {
        essential: essential_requests(),
        background: Vec::new(),
    };
    let mut experience = Experience::new(
        one_scene_script(),
        manifest,
        failing_fetcher(&["startButton"]),
        ExperienceSettings::default(),
    )
    .unwrap();

    let loaded = pollster::block_on(experience.load_essential());
    assert!(matches!(loaded, Err(Error::Asset(AssetError::EssentialLoad { .. }))));
    assert!(!experience.resources().is_ready(TierId::Essential));
    assert!(experience.resources().get("startButton").is_none());

    let started = experience.start();
    assert!(matches!(
        started,
        Err(Error::Story(StoryError::TierNotReady(TierId::Essential)))
    ));
    assert!(!experience.is_started());
}

#[test]
fn start_before_loading_is_rejected() {
    let mut experience = Experience::new(
        one_scene_script(),
        ResourceManifest::default(),
        failing_fetcher(&[]),
        ExperienceSettings::default(),
    )
    .unwrap();
    assert!(matches!(
        experience.start(),
        Err(Error::Story(StoryError::TierNotReady(TierId::Essential)))
    ));
}

// ============================================================================
// Background Tiers
// ============================================================================

#[test]
fn one_failure_leaves_background_tier_ready() {
    let loader = ResourceLoader::new(failing_fetcher(&["tablet"]));
    let mut scene = Scene::new();
    let mut table = ResourceTable::new();
    let requests = background_requests();
    table.begin_tier(TierId::Background(1), &requests).unwrap();

    let mut pending = loader.load_background(vec![(TierId::Background(1), requests)]).unwrap();
    assert_eq!(pending.len(), 1);
    let outcome = pending[0].poll_settled().expect("ready futures settle on first poll").unwrap();

    assert_eq!(outcome.loaded.len(), 4);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].id.as_str(), "tablet");

    let report = table.commit(&mut scene, outcome);
    assert!(!report.is_complete());
    assert!(table.is_ready(TierId::Background(1)));
    assert_eq!(table.status("tablet"), Some(LoadStatus::Failed));
    assert!(table.model("tablet").is_none());
    for id in ["wendy", "laptop", "notebook", "correctAudio"] {
        assert_eq!(table.status(id), Some(LoadStatus::Loaded), "{id}");
    }
}

#[test]
fn background_loading_rejects_the_essential_tier() {
    let loader = ResourceLoader::new(failing_fetcher(&[]));
    let result = loader.load_background(vec![(TierId::Essential, essential_requests())]);
    assert!(matches!(result, Err(AssetError::WrongTierPolicy(TierId::Essential))));
}

#[test]
fn pending_tier_settles_once_the_fetch_completes() {
    let senders: Rc<RefCell<Vec<oneshot::Sender<LoadedAsset>>>> = Rc::new(RefCell::new(Vec::new()));
    let stash = Rc::clone(&senders);
    let fetcher = move |request: &ResourceRequest, _progress: ProgressReporter| -> FetchResult {
        let (tx, rx) = oneshot::channel();
        stash.borrow_mut().push(tx);
        let id = request.id.clone();
        let path = request.path.clone();
        rx.map(move |r| r.map_err(|_| AssetError::fetch(&id, &path, "cancelled")))
            .boxed_local()
    };

    let loader = ResourceLoader::new(fetcher);
    let mut pending = loader
        .load_background(vec![(TierId::Background(1), vec![ResourceRequest::model("wendy", "wendy.glb")])])
        .unwrap();
    let tier = &mut pending[0];

    assert_eq!(tier.tier(), TierId::Background(1));
    assert!(tier.poll_settled().is_none());
    assert!(tier.poll_settled().is_none());

    let request = ResourceRequest::model("wendy", "wendy.glb");
    let sender = senders.borrow_mut().pop().unwrap();
    assert!(sender.send(synthetic(&request)).is_ok());

    let outcome = tier.poll_settled().expect("settled").unwrap();
    assert_eq!(outcome.loaded.len(), 1);
    assert!(outcome.failures.is_empty());
}

#[test]
fn payload_kind_must_match_the_request() {
    let fetcher = |request: &ResourceRequest, _progress: ProgressReporter| -> FetchResult {
        future::ready(Ok(LoadedAsset::Audio(AudioTrack::new(&request.path, vec![1u8])))).boxed_local()
    };
    let loader = ResourceLoader::new(fetcher);
    let mut pending = loader
        .load_background(vec![(TierId::Background(1), vec![ResourceRequest::model("wendy", "wendy.glb")])])
        .unwrap();

    let outcome = pending[0].poll_settled().unwrap().unwrap();
    assert!(outcome.loaded.is_empty());
    assert_eq!(
        outcome.failures[0].error,
        AssetError::KindMismatch {
            id: "wendy".into(),
            expected: "model",
            actual: "audio",
        }
    );
}

// ============================================================================
// Progress
// ============================================================================

#[test]
fn progress_is_reported_per_item() {
    let fetcher = |request: &ResourceRequest, progress: ProgressReporter| -> FetchResult {
        match request.kind {
            ResourceKind::Model => {
                progress.report_bytes(50, Some(100));
                progress.report_bytes(100, Some(100));
            }
            ResourceKind::Audio => progress.report_bytes(4096, None),
        }
        future::ready(Ok(synthetic(request))).boxed_local()
    };

    let events: Rc<RefCell<Vec<(String, LoadProgress)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let loader = ResourceLoader::new(fetcher).with_progress(move |id, progress| {
        sink.borrow_mut().push((id.to_string(), progress));
    });

    pollster::block_on(loader.load_tier(TierId::Essential, essential_requests())).unwrap();

    let events = events.borrow();
    assert!(events.contains(&("startButton".to_string(), LoadProgress::Percent(50))));
    assert!(events.contains(&("startButton".to_string(), LoadProgress::Percent(100))));
    assert!(events.contains(&("intro".to_string(), LoadProgress::Indeterminate)));
    assert!(!events.iter().any(|(id, p)| id == "intro" && matches!(p, LoadProgress::Percent(_))));
}

// ============================================================================
// Manifest & Table
// ============================================================================

#[test]
fn manifest_parses_tiers_from_json() {
    let manifest = ResourceManifest::from_json_str(
        r#"{
            "essential": [
                { "id": "startButton", "path": "models/start.glb", "kind": "model" }
            ],
            "background": [
                [{ "id": "wendy", "path": "models/wendy.glb", "kind": "model" }],
                [{ "id": "quizMusic", "path": "audio/quiz.mp3", "kind": "audio" }]
            ]
        }"#,
    )
    .unwrap();

    let tiers: Vec<TierId> = manifest.tiers().map(|(tier, _)| tier).collect();
    assert_eq!(
        tiers,
        vec![TierId::Essential, TierId::Background(1), TierId::Background(2)]
    );
    assert_eq!(manifest.background[1][0].kind, ResourceKind::Audio);
}

#[test]
fn table_rejects_duplicate_ids_across_tiers() {
    let mut table = ResourceTable::new();
    table.begin_tier(TierId::Essential, &essential_requests()).unwrap();

    let again = vec![ResourceRequest::audio("intro", "audio/other.mp3")];
    assert!(matches!(
        table.begin_tier(TierId::Background(1), &again),
        Err(AssetError::DuplicateId(id)) if id.as_str() == "intro"
    ));
}

#[test]
fn abort_drops_pending_entries() {
    let mut table = ResourceTable::new();
    table.begin_tier(TierId::Essential, &essential_requests()).unwrap();
    table.abort_tier(TierId::Essential);

    assert!(table.is_empty());
    assert!(!table.is_ready(TierId::Essential));
}

// ============================================================================
// File Reader
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod file_reader {
    use super::*;
    use parallax::assets::FileAssetReader;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("parallax-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn audio_decoder(request: &ResourceRequest, bytes: Vec<u8>) -> Result<LoadedAsset, String> {
        Ok(LoadedAsset::Audio(AudioTrack::new(&request.path, bytes)))
    }

    #[tokio::test]
    async fn reads_files_in_chunks_with_progress() {
        let dir = scratch_dir("reader");
        std::fs::write(dir.join("theme.bin"), vec![7u8; 200_000]).unwrap();

        let events: Rc<RefCell<Vec<LoadProgress>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let loader = ResourceLoader::new(FileAssetReader::new(&dir, audio_decoder))
            .with_progress(move |_, progress| sink.borrow_mut().push(progress));

        let outcome = loader
            .load_tier(TierId::Essential, vec![ResourceRequest::audio("theme", "theme.bin")])
            .await
            .unwrap();

        match &outcome.loaded[0].1 {
            LoadedAsset::Audio(track) => assert_eq!(track.data.len(), 200_000),
            LoadedAsset::Model(_) => panic!("expected audio"),
        }
        let events = events.borrow();
        assert_eq!(events.first(), Some(&LoadProgress::Percent(0)));
        assert_eq!(events.last(), Some(&LoadProgress::Percent(100)));
        assert!(events.len() > 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let dir = scratch_dir("missing");
        let loader = ResourceLoader::new(FileAssetReader::new(&dir, audio_decoder));

        let result = loader
            .load_tier(TierId::Essential, vec![ResourceRequest::audio("ghost", "ghost.mp3")])
            .await;

        match result {
            Err(AssetError::EssentialLoad { id, source }) => {
                assert_eq!(id.as_str(), "ghost");
                assert!(matches!(*source, AssetError::Fetch { .. }));
            }
            other => panic!("expected EssentialLoad, got {other:?}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
