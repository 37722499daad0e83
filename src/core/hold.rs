//! Press-and-hold gesture that reveals the settings screen.

use std::time::{Duration, Instant};

/// A single pending hold, checked by the main loop.
#[derive(Debug)]
pub struct HoldGesture {
    hold_duration: Duration,
    deadline: Option<Instant>,
}

impl HoldGesture {
    pub fn new(hold_duration: Duration) -> Self {
        Self {
            hold_duration,
            deadline: None,
        }
    }

    /// Start (or restart) the hold from `now`.
    pub fn press(&mut self, now: Instant) {
        self.deadline = Some(now + self.hold_duration);
    }

    /// Cancel a pending hold.
    pub fn release(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before the hold completes, if one is pending.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// `true` exactly once when the hold has been kept long enough.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(1800);

    #[test]
    fn test_hold_completes_after_duration() {
        let start = Instant::now();
        let mut hold = HoldGesture::new(HOLD);
        hold.press(start);

        assert!(!hold.poll(start + Duration::from_millis(1799)));
        assert!(hold.poll(start + HOLD));
        assert!(!hold.poll(start + HOLD * 2));
    }

    #[test]
    fn test_release_cancels() {
        let start = Instant::now();
        let mut hold = HoldGesture::new(HOLD);
        hold.press(start);
        hold.release();

        assert!(!hold.is_pending());
        assert!(!hold.poll(start + HOLD * 2));
    }

    #[test]
    fn test_second_press_rearms() {
        let start = Instant::now();
        let mut hold = HoldGesture::new(HOLD);
        hold.press(start);
        hold.press(start + Duration::from_millis(1000));

        assert!(!hold.poll(start + HOLD));
        assert_eq!(
            hold.remaining(start + HOLD),
            Some(Duration::from_millis(1000))
        );
        assert!(hold.poll(start + Duration::from_millis(2800)));
    }
}
