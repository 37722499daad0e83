//! Refresh cadence for the board.
//!
//! Two periodic deadlines drive re-evaluation: the display tick (which also
//! catches midnight) and the slower day-rollover poll that backs it up when
//! ticks are delayed. Wake and focus events are handled by the caller as a
//! forced date check outside this schedule.

use std::time::{Duration, Instant};

/// What became due on a call to [`RefreshTrigger::take_due`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub tick: bool,
    pub rollover_poll: bool,
}

impl Due {
    pub fn any(&self) -> bool {
        self.tick || self.rollover_poll
    }
}

#[derive(Debug)]
pub struct RefreshTrigger {
    tick_interval: Duration,
    poll_interval: Duration,
    next_tick: Instant,
    next_poll: Instant,
}

impl RefreshTrigger {
    /// The first tick is due immediately, the first poll one interval later.
    pub fn new(tick_interval: Duration, poll_interval: Duration, now: Instant) -> Self {
        Self {
            tick_interval,
            poll_interval,
            next_tick: now,
            next_poll: now + poll_interval,
        }
    }

    /// How long the loop may block before something is due.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_tick
            .min(self.next_poll)
            .saturating_duration_since(now)
    }

    /// Report and reschedule whatever is due at `now`.
    ///
    /// Missed periods are skipped rather than replayed, so a loop that stalled
    /// (e.g. across suspend) fires once and then resumes the normal cadence.
    pub fn take_due(&mut self, now: Instant) -> Due {
        let mut due = Due::default();

        if now >= self.next_tick {
            due.tick = true;
            self.next_tick = Self::advance(self.next_tick, self.tick_interval, now);
        }
        if now >= self.next_poll {
            due.rollover_poll = true;
            self.next_poll = Self::advance(self.next_poll, self.poll_interval, now);
        }

        due
    }

    /// Change the cadence, keeping the next tick as scheduled.
    pub fn set_intervals(&mut self, tick_interval: Duration, poll_interval: Duration, now: Instant) {
        self.tick_interval = tick_interval;
        if poll_interval != self.poll_interval {
            self.poll_interval = poll_interval;
            self.next_poll = now + poll_interval;
        }
    }

    fn advance(deadline: Instant, interval: Duration, now: Instant) -> Instant {
        let next = deadline + interval;
        if next > now { next } else { now + interval }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_secs(1);
    const POLL: Duration = Duration::from_secs(300);

    #[test]
    fn test_first_tick_is_immediate() {
        let start = Instant::now();
        let mut trigger = RefreshTrigger::new(TICK, POLL, start);

        assert_eq!(trigger.time_until_due(start), Duration::ZERO);
        assert_eq!(
            trigger.take_due(start),
            Due {
                tick: true,
                rollover_poll: false
            }
        );
        assert_eq!(trigger.time_until_due(start), TICK);
    }

    #[test]
    fn test_poll_due_after_interval() {
        let start = Instant::now();
        let mut trigger = RefreshTrigger::new(TICK, POLL, start);
        trigger.take_due(start);

        let later = start + POLL;
        let due = trigger.take_due(later);
        assert!(due.tick);
        assert!(due.rollover_poll);
        assert!(!trigger.take_due(later).any());
    }

    #[test]
    fn test_stall_does_not_replay_ticks() {
        let start = Instant::now();
        let mut trigger = RefreshTrigger::new(TICK, POLL, start);
        trigger.take_due(start);

        let after_stall = start + Duration::from_secs(10);
        assert!(trigger.take_due(after_stall).tick);
        assert!(!trigger.take_due(after_stall).tick);
        assert_eq!(trigger.time_until_due(after_stall), TICK);
    }

    #[test]
    fn test_ticks_keep_cadence() {
        let start = Instant::now();
        let mut trigger = RefreshTrigger::new(TICK, POLL, start);
        trigger.take_due(start);

        // Loop woke up slightly late; next tick stays on the original grid.
        let late = start + Duration::from_millis(1050);
        assert!(trigger.take_due(late).tick);
        assert_eq!(trigger.time_until_due(late), Duration::from_millis(950));
    }
}
