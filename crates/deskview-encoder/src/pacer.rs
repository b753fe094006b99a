//! Frame-rate pacing for the capture loop

use std::time::Duration;

/// Sleeps away whatever is left of the frame interval after each cycle
///
/// The target rate is a ceiling: a cycle that takes longer than the interval
/// is followed immediately by the next one.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    /// Create a pacer for the given target frame rate
    pub fn new(fps: u32) -> Self {
        Self::with_interval(Duration::from_secs_f64(1.0 / fps.max(1) as f64))
    }

    /// Create a pacer with an explicit frame interval
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Target interval between cycle starts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left in the interval after `elapsed`, never negative
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }

    /// Block the current thread for the rest of the interval
    pub fn wait(&self, elapsed: Duration) {
        let remaining = self.remaining(elapsed);
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_remaining_is_interval_minus_elapsed() {
        let pacer = Pacer::with_interval(Duration::from_millis(50));
        assert_eq!(pacer.remaining(Duration::ZERO), Duration::from_millis(50));
        assert_eq!(pacer.remaining(Duration::from_millis(20)), Duration::from_millis(30));
        assert_eq!(pacer.remaining(Duration::from_millis(50)), Duration::ZERO);
    }

    #[test]
    fn test_remaining_never_negative() {
        let pacer = Pacer::with_interval(Duration::from_millis(50));
        for ms in [51, 100, 10_000] {
            assert_eq!(pacer.remaining(Duration::from_millis(ms)), Duration::ZERO);
        }
        assert_eq!(pacer.remaining(Duration::MAX), Duration::ZERO);
    }

    #[test]
    fn test_interval_from_fps() {
        assert_eq!(Pacer::new(20).interval(), Duration::from_millis(50));
        assert_eq!(Pacer::new(1).interval(), Duration::from_secs(1));
        // fps 0 is clamped rather than dividing by zero
        assert_eq!(Pacer::new(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_wait_returns_immediately_when_over_budget() {
        let pacer = Pacer::with_interval(Duration::from_secs(5));
        let start = Instant::now();
        pacer.wait(Duration::from_secs(6));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
