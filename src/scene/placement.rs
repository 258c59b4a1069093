//! Viewer-Relative Placement
//!
//! Positions objects on a circle around the viewer, measured from wherever
//! the viewer is facing right now:
//!
//! ```text
//! heading = atan2(forward.x, forward.z) + angle
//! position = viewer + (sin(heading) * distance, height, cos(heading) * distance)
//! ```
//!
//! Positive angles turn toward the viewer's left. Nothing is cached: calling
//! [`place`] twice with the same pose and spec writes the same transform.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::camera::ViewerPose;
use crate::scene::transform::Transform;
use crate::scene::{NodeHandle, Scene};

/// Named angles used by authored scripts, in radians.
pub struct StoryAngle;

impl StoryAngle {
    pub const FRONT: f32 = 0.0;
    pub const FRONT_LEFT: f32 = std::f32::consts::FRAC_PI_4;
    pub const LEFT: f32 = std::f32::consts::FRAC_PI_2;
    pub const BACK_LEFT: f32 = 3.0 * std::f32::consts::FRAC_PI_4;
    pub const BEHIND: f32 = std::f32::consts::PI;
    pub const BACK_RIGHT: f32 = -3.0 * std::f32::consts::FRAC_PI_4;
    pub const RIGHT: f32 = -std::f32::consts::FRAC_PI_2;
    pub const FRONT_RIGHT: f32 = -std::f32::consts::FRAC_PI_4;
}

/// Where to put an object relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    /// Horizontal distance from the viewer, meters. Must be positive.
    pub distance: f32,
    /// Signed yaw offset from the viewer's heading, radians.
    #[serde(default)]
    pub angle: f32,
    /// Vertical offset from the viewer's eye, meters.
    #[serde(default)]
    pub height: f32,
    /// Turn the object to face the viewer.
    #[serde(default = "default_face_viewer")]
    pub face_viewer: bool,
}

fn default_face_viewer() -> bool {
    true
}

impl PlacementSpec {
    #[must_use]
    pub fn new(distance: f32, angle: f32, height: f32) -> Self {
        Self {
            distance,
            angle,
            height,
            face_viewer: true,
        }
    }

    #[must_use]
    pub fn facing(mut self, face_viewer: bool) -> Self {
        self.face_viewer = face_viewer;
        self
    }

    /// Checks the numeric invariants. The error names the first one broken.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err("distance must be a positive finite number");
        }
        if !self.angle.is_finite() {
            return Err("angle must be finite");
        }
        if !self.height.is_finite() {
            return Err("height offset must be finite");
        }
        Ok(())
    }
}

/// Result of resolving a [`PlacementSpec`] against a viewer pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPose {
    pub position: Vec3,
    /// Present only when the spec asks the object to face the viewer.
    pub rotation: Option<Quat>,
}

/// Computes the world pose for `spec` from the current viewer pose.
#[must_use]
pub fn resolve(pose: &ViewerPose, spec: &PlacementSpec) -> ResolvedPose {
    let heading = pose.heading() + spec.angle;
    let offset = Vec3::new(heading.sin() * spec.distance, spec.height, heading.cos() * spec.distance);
    let position = pose.position + offset;

    let rotation = spec.face_viewer.then(|| {
        let mut transform = Transform::from_position(position);
        transform.face_toward(pose.position, Vec3::Y);
        transform.rotation
    });

    ResolvedPose { position, rotation }
}

/// Resolves `spec` and writes it into the object's local transform.
///
/// Objects are placed as scene roots, so the local transform is the world
/// transform. Returns `None` if the node does not exist.
pub fn place(scene: &mut Scene, object: NodeHandle, pose: &ViewerPose, spec: &PlacementSpec) -> Option<ResolvedPose> {
    let resolved = resolve(pose, spec);
    let node = scene.get_node_mut(object)?;
    node.transform.position = resolved.position;
    if let Some(rotation) = resolved.rotation {
        node.transform.rotation = rotation;
    }
    Some(resolved)
}

/// Sets a uniform scale on the object.
pub fn scale_model(scene: &mut Scene, object: NodeHandle, scale: f32) {
    if let Some(node) = scene.get_node_mut(object) {
        node.transform.scale = Vec3::splat(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_is_invalid() {
        assert!(PlacementSpec::new(0.0, 0.0, 0.0).validate().is_err());
        assert!(PlacementSpec::new(f32::NAN, 0.0, 0.0).validate().is_err());
        assert!(PlacementSpec::new(1.5, StoryAngle::LEFT, -0.5).validate().is_ok());
    }

    #[test]
    fn face_viewer_defaults_on_in_json() {
        let spec: PlacementSpec = serde_json::from_str(r#"{ "distance": 2.0 }"#).unwrap();
        assert!(spec.face_viewer);
        assert!(spec.angle.abs() < f32::EPSILON);
    }
}
