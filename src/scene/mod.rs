//! Scene Graph
//!
//! The in-memory hierarchy the story mutates and the interaction layer hit-tests:
//! - [`Node`]: hierarchy links, transform, visibility, pick volume
//! - [`Transform`]: local position/rotation/scale
//! - [`Scene`]: node storage and graph operations
//! - [`ViewerPose`] / [`Camera`]: the reference frame for placement and pointer rays
//! - [`placement`]: viewer-relative positioning

pub mod bounds;
pub mod camera;
pub mod node;
pub mod placement;
pub mod scene;
pub mod transform;

pub use bounds::{BoundingBox, Ray};
pub use camera::{Camera, ViewerMode, ViewerPose};
pub use node::{Node, NodeFlags};
pub use placement::{PlacementSpec, ResolvedPose, StoryAngle};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
