use glam::Vec3;

use crate::scene::{NodeHandle, Scene};

/// Linear move of a node to a target position over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTween {
    pub node: NodeHandle,
    from: Option<Vec3>,
    pub to: Vec3,
    /// Seconds.
    pub duration: f32,
    elapsed: f32,
}

impl MotionTween {
    /// The start position is taken from the node on the first update.
    #[must_use]
    pub fn new(node: NodeHandle, to: Vec3, duration: f32) -> Self {
        Self {
            node,
            from: None,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances and writes the interpolated position. Returns `false` once
    /// the tween is done or its node is gone.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) -> bool {
        let Some(node) = scene.get_node_mut(self.node) else {
            return false;
        };
        let from = *self.from.get_or_insert(node.transform.position);

        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        };
        node.transform.position = from.lerp(self.to, t);
        !self.is_finished()
    }
}

/// Vertical bob: `y += sin(t * speed) * amplitude`, applied every tick.
///
/// Only the change of offset is written each frame, so placement and
/// tweens can move the node freely underneath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleMotion {
    pub node: NodeHandle,
    pub amplitude: f32,
    /// Radians per millisecond.
    pub speed: f32,
    applied: f32,
}

impl IdleMotion {
    #[must_use]
    pub fn new(node: NodeHandle, amplitude: f32, speed: f32) -> Self {
        Self {
            node,
            amplitude,
            speed,
            applied: 0.0,
        }
    }

    /// Forgets the offset currently baked into the node, after something
    /// overwrote its position.
    pub fn rebase(&mut self) {
        self.applied = 0.0;
    }

    /// Applies the bob at `elapsed_ms`; hidden or detached nodes are skipped.
    pub fn apply(&mut self, elapsed_ms: f64, scene: &mut Scene) {
        if !scene.is_shown(self.node) {
            return;
        }
        let Some(node) = scene.get_node_mut(self.node) else {
            return;
        };
        let offset = ((elapsed_ms * f64::from(self.speed)).sin() as f32) * self.amplitude;
        node.transform.position.y += offset - self.applied;
        self.applied = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    #[test]
    fn tween_reaches_target() {
        let mut scene = Scene::new();
        let node = scene.add_node(Node::new("wendy"));
        let mut tween = MotionTween::new(node, Vec3::new(0.0, 10.0, 0.0), 2.0);

        assert!(tween.update(1.0, &mut scene));
        let mid = scene.get_node(node).unwrap().transform.position;
        assert!((mid.y - 5.0).abs() < 1e-5);

        assert!(!tween.update(5.0, &mut scene));
        let end = scene.get_node(node).unwrap().transform.position;
        assert!((end.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn idle_bob_does_not_drift() {
        let mut scene = Scene::new();
        let node = scene.add_node(Node::new("button"));
        let mut idle = IdleMotion::new(node, 0.05, 0.002);

        for ms in (0..10_000).step_by(16) {
            idle.apply(f64::from(ms), &mut scene);
        }
        let y = scene.get_node(node).unwrap().transform.position.y;
        assert!(y.abs() <= 0.05 + 1e-5);
    }
}
