use glam::{Affine3A, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::bounds::Ray;

/// How the experience is being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewerMode {
    /// Head-tracked XR session.
    Immersive,
    /// 2D canvas with pointer look controls.
    #[default]
    Fallback,
}

/// Position and orientation of the user's head (or fallback camera) in world space.
///
/// Polled from the host every frame and on every input event; nothing keeps
/// a stale copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl ViewerPose {
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Extracts the pose from a camera world matrix. Scale is discarded.
    #[must_use]
    pub fn from_affine(world: &Affine3A) -> Self {
        let (_, rotation, position) = world.to_scale_rotation_translation();
        Self { position, rotation }
    }

    /// Viewing direction: local −Z rotated into world space.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Yaw of the viewing direction around +Y, measured from +Z.
    #[inline]
    #[must_use]
    pub fn heading(&self) -> f32 {
        let forward = self.forward();
        forward.x.atan2(forward.z)
    }
}

impl Default for ViewerPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Perspective camera used to turn pointer coordinates into pick rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// `fov` is in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Ray through the pixel `pointer_px` of a `viewport_px` sized canvas.
    ///
    /// Pixel origin is the top-left corner, +Y down.
    #[must_use]
    pub fn screen_ray(&self, pointer_px: Vec2, viewport_px: Vec2, pose: &ViewerPose) -> Ray {
        let size = viewport_px.max(Vec2::ONE);
        let ndc = Vec2::new(
            pointer_px.x / size.x * 2.0 - 1.0,
            -(pointer_px.y / size.y) * 2.0 + 1.0,
        );
        let half_h = (self.fov * 0.5).tan();
        let half_w = half_h * self.aspect;
        let local = Vec3::new(ndc.x * half_w, ndc.y * half_h, -1.0);
        Ray::new(pose.position, pose.rotation * local)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(70.0, 1.0, 0.01, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn identity_pose_faces_negative_z() {
        let pose = ViewerPose::default();
        assert!(pose.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!((pose.heading().abs() - PI).abs() < 1e-5);
    }

    #[test]
    fn turned_pose_heading() {
        // Turning left a quarter turn faces −X.
        let pose = ViewerPose::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        assert!(pose.forward().abs_diff_eq(Vec3::NEG_X, 1e-6));
        assert!((pose.heading() + FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn center_pixel_ray_follows_forward() {
        let camera = Camera::new_perspective(70.0, 2.0, 0.01, 100.0);
        let pose = ViewerPose::new(Vec3::new(0.0, 1.6, 0.0), Quat::IDENTITY);
        let ray = camera.screen_ray(Vec2::new(400.0, 200.0), Vec2::new(800.0, 400.0), &pose);
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert_eq!(ray.origin, pose.position);
    }
}
