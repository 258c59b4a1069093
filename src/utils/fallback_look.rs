use glam::{EulerRot, Quat, Vec2};

use crate::scene::ViewerPose;

/// Drag-to-look control for the 2D fallback (no immersive session).
///
/// Dragging rotates the viewer: horizontal travel turns the heading, vertical
/// travel tilts the pitch, which is clamped so the view never flips over.
pub struct FallbackLook {
    pub rotate_speed: f32,

    pub yaw: f32,
    pub pitch: f32,

    pressed: bool,
    last: Vec2,
}

impl Default for FallbackLook {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackLook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rotate_speed: 0.005,
            yaw: 0.0,
            pitch: 0.0,
            pressed: false,
            last: Vec2::ZERO,
        }
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.pressed = true;
        self.last = position;
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        if !self.pressed {
            return;
        }
        let delta = position - self.last;
        self.yaw -= delta.x * self.rotate_speed;
        self.pitch -= delta.y * self.rotate_speed;
        self.pitch = self
            .pitch
            .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        self.last = position;
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
    }

    /// Orientation produced by the accumulated drags (yaw about +Y, then pitch).
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Writes the look orientation into `pose`, keeping its position.
    pub fn apply(&self, pose: &mut ViewerPose) {
        pose.rotation = self.rotation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_without_press_are_ignored() {
        let mut look = FallbackLook::new();
        look.pointer_move(Vec2::new(300.0, 0.0));
        assert!(look.yaw.abs() < f32::EPSILON);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut look = FallbackLook::new();
        look.pointer_down(Vec2::ZERO);
        look.pointer_move(Vec2::new(0.0, -10_000.0));
        assert!((look.pitch - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn dragging_right_turns_right() {
        let mut look = FallbackLook::new();
        look.pointer_down(Vec2::ZERO);
        look.pointer_move(Vec2::new(100.0, 0.0));
        look.pointer_up();
        let mut pose = ViewerPose::default();
        look.apply(&mut pose);
        // Turning right from -Z swings the forward vector toward +X.
        assert!(pose.forward().x > 0.0);
    }
}
