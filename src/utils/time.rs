#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Frame clock shared by every per-tick consumer.
///
/// Elapsed time is monotonic: a timestamp earlier than the previous tick
/// yields a zero delta instead of running time backwards. All mixers and
/// timers read the same delta, so playback speed does not depend on the
/// frame rate.
#[derive(Debug, Clone)]
pub struct Clock {
    origin: Option<Instant>,
    /// Time since last tick
    pub delta: Duration,
    /// Total elapsed time since the first tick
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: None,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances using the wall clock. The first call establishes the origin.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let origin = *self.origin.get_or_insert(now);
        self.tick_at(now - origin)
    }

    /// Advances to a host-provided timestamp measured from any fixed origin
    /// (for instance the XR frame time).
    pub fn tick_at(&mut self, now: Duration) -> Duration {
        self.delta = now.saturating_sub(self.elapsed);
        self.elapsed = self.elapsed.max(now);
        self.frame_count += 1;
        self.delta
    }

    /// Advances by a fixed step.
    pub fn advance(&mut self, step: Duration) -> Duration {
        self.tick_at(self.elapsed + step)
    }

    #[inline]
    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_measured_since_previous_tick() {
        let mut clock = Clock::new();
        assert_eq!(clock.tick_at(Duration::from_millis(16)), Duration::from_millis(16));
        assert_eq!(clock.tick_at(Duration::from_millis(50)), Duration::from_millis(34));
        assert_eq!(clock.elapsed, Duration::from_millis(50));
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut clock = Clock::new();
        clock.tick_at(Duration::from_secs(2));
        assert_eq!(clock.tick_at(Duration::from_secs(1)), Duration::ZERO);
        assert_eq!(clock.elapsed, Duration::from_secs(2));
    }
}
