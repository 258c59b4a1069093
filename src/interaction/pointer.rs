use glam::Vec2;

/// Click-versus-drag tracker for one pointer.
///
/// A press that travels more than `threshold` pixels along either axis
/// becomes a drag (camera look) and will not produce a click on release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerGesture {
    threshold: f32,
    start: Option<Vec2>,
    dragged: bool,
}

impl PointerGesture {
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            start: None,
            dragged: false,
        }
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.start = Some(position);
        self.dragged = false;
    }

    /// Returns `true` once the gesture has become a drag.
    pub fn pointer_move(&mut self, position: Vec2) -> bool {
        if let Some(start) = self.start
            && self.exceeds(start, position)
        {
            self.dragged = true;
        }
        self.dragged
    }

    /// Ends the gesture. Returns the click position, or `None` for a drag
    /// or a release without a matching press.
    pub fn pointer_up(&mut self, position: Vec2) -> Option<Vec2> {
        let start = self.start.take()?;
        let dragged = std::mem::take(&mut self.dragged) || self.exceeds(start, position);
        (!dragged).then_some(position)
    }

    #[inline]
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.start.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragged
    }

    fn exceeds(&self, start: Vec2, position: Vec2) -> bool {
        let delta = (position - start).abs();
        delta.x > self.threshold || delta.y > self.threshold
    }
}

impl Default for PointerGesture {
    fn default() -> Self {
        Self::new(5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_jitter_is_a_click() {
        let mut g = PointerGesture::default();
        g.pointer_down(Vec2::new(100.0, 100.0));
        assert!(!g.pointer_move(Vec2::new(104.0, 96.0)));
        assert_eq!(g.pointer_up(Vec2::new(102.0, 101.0)), Some(Vec2::new(102.0, 101.0)));
    }

    #[test]
    fn drag_survives_return_to_start() {
        let mut g = PointerGesture::default();
        g.pointer_down(Vec2::new(100.0, 100.0));
        assert!(g.pointer_move(Vec2::new(110.0, 100.0)));
        g.pointer_move(Vec2::new(100.0, 100.0));
        assert_eq!(g.pointer_up(Vec2::new(100.0, 100.0)), None);
    }

    #[test]
    fn exactly_threshold_is_still_a_click() {
        let mut g = PointerGesture::default();
        g.pointer_down(Vec2::ZERO);
        assert!(!g.pointer_move(Vec2::new(5.0, -5.0)));
        assert!(g.pointer_up(Vec2::new(5.0, 5.0)).is_some());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut g = PointerGesture::default();
        assert_eq!(g.pointer_up(Vec2::ZERO), None);
    }
}
