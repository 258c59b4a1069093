use glam::{Affine3A, Vec3};

use crate::interaction::ray::RayHit;
use crate::scene::Ray;

/// Ray cast by an XR controller.
pub struct ControllerRay;

impl ControllerRay {
    /// Origin at the controller, direction along its local −Z.
    #[must_use]
    pub fn from_world_matrix(world: &Affine3A) -> Ray {
        let (_, rotation, origin) = world.to_scale_rotation_translation();
        Ray::new(origin, rotation * Vec3::NEG_Z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    /// Pointing at an interactive object.
    Hovering,
    #[default]
    Idle,
}

/// The persistent ray visual attached to the controller.
///
/// The host draws a line of `length` along the controller's −Z, colored by
/// `state`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIndicator {
    pub max_length: f32,
    pub length: f32,
    pub state: IndicatorState,
}

impl RayIndicator {
    #[must_use]
    pub fn new(max_length: f32) -> Self {
        Self {
            max_length,
            length: max_length,
            state: IndicatorState::Idle,
        }
    }

    /// Shortens the ray to the hit, or resets it to full length.
    pub fn update(&mut self, hit: Option<&RayHit>) {
        match hit {
            Some(hit) => {
                self.state = IndicatorState::Hovering;
                self.length = hit.distance.min(self.max_length);
            }
            None => {
                self.state = IndicatorState::Idle;
                self.length = self.max_length;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn controller_ray_follows_rotation() {
        let world = Affine3A::from_rotation_translation(Quat::from_rotation_y(FRAC_PI_2), Vec3::new(0.0, 1.2, 0.0));
        let ray = ControllerRay::from_world_matrix(&world);
        assert!(ray.origin.abs_diff_eq(Vec3::new(0.0, 1.2, 0.0), 1e-6));
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn scaled_controller_keeps_unit_direction() {
        let world = Affine3A::from_scale_rotation_translation(Vec3::splat(3.0), Quat::IDENTITY, Vec3::ZERO);
        let ray = ControllerRay::from_world_matrix(&world);
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }
}
