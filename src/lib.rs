#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod experience;
pub mod interaction;
pub mod scene;
pub mod settings;
pub mod story;
pub mod utils;

pub use animation::{AnimationClip, AudioOutput, PlaybackCoordinator};
pub use assets::{
    AssetFetcher, LoadedAsset, ModelAsset, Prefab, ResourceId, ResourceKind, ResourceLoader, ResourceManifest,
    ResourceRequest, ResourceTable, TierId,
};
pub use errors::{AssetError, Error, Result, StoryError};
pub use experience::Experience;
pub use interaction::{InteractionRegistry, PointerGesture, RayHit};
pub use scene::{Node, NodeHandle, PlacementSpec, Scene, StoryAngle, ViewerMode, ViewerPose};
pub use settings::ExperienceSettings;
pub use story::{SceneController, SceneDescriptor, StoryAction, StoryHost, StoryScript};
