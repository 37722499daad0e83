//! System event monitoring: resume from suspend and wall-clock jumps.
//!
//! - Resume via the systemd-logind `PrepareForSleep` signal (zbus, blocking API)
//! - Clock changes via a `CLOCK_REALTIME` timerfd armed with
//!   `TFD_TIMER_CANCEL_ON_SET`, which the kernel cancels whenever the wall
//!   clock is set
//!
//! Both monitors run in their own thread and send [`BoardEvent::Wake`] so the
//! board re-checks the date immediately instead of waiting for the next poll.
//! Either one failing only loses that wake source.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::time::TimeSpec;
use nix::sys::timerfd::{ClockId, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zbus::blocking::Connection;

use crate::io::signals::{BoardEvent, WakeReason};

const MAX_MONITOR_RESTARTS: u8 = 3;
const RESTART_DELAY: Duration = Duration::from_secs(2);
/// Clock jumps right after resume come from the suspend itself.
const RESUME_GRACE_SECS: i64 = 5;

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait LogindManager {
    /// `start` is `true` before suspend and `false` after resume.
    #[zbus(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

/// Shared between the two monitors so suspend does not also count as a clock change.
#[derive(Clone, Default)]
struct SleepTracker {
    is_sleeping: Arc<AtomicBool>,
    /// Unix seconds of the last resume, 0 before the first one
    resume_time: Arc<AtomicI64>,
}

impl SleepTracker {
    fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn mark_sleeping(&self) {
        self.is_sleeping.store(true, Ordering::SeqCst);
    }

    fn mark_resumed(&self) {
        self.resume_time
            .store(Self::current_timestamp(), Ordering::SeqCst);
        self.is_sleeping.store(false, Ordering::SeqCst);
    }

    /// Whether a clock change event should be attributed to suspend/resume.
    fn explains_clock_change(&self) -> bool {
        if self.is_sleeping.load(Ordering::Relaxed) {
            return true;
        }
        let resume_time = self.resume_time.load(Ordering::Relaxed);
        resume_time != 0 && Self::current_timestamp() - resume_time <= RESUME_GRACE_SECS
    }
}

/// Spawn the resume and clock-change monitors.
pub fn start_system_event_monitor(sender: Sender<BoardEvent>, debug_enabled: bool) {
    let tracker = SleepTracker::default();

    thread::spawn({
        let sender = sender.clone();
        let tracker = tracker.clone();
        move || run_sleep_monitor(sender, debug_enabled, tracker)
    });

    thread::spawn(move || {
        if let Err(e) = monitor_time_changes(sender, debug_enabled, tracker) {
            log_pipe!();
            log_warning!("Clock change monitor error: {e}");
            log_indented!("Clock changes will be picked up by the rollover poll");
        }
    });
}

/// Sleep monitor with a bounded number of reconnects.
fn run_sleep_monitor(sender: Sender<BoardEvent>, debug_enabled: bool, tracker: SleepTracker) {
    for attempt in 0..=MAX_MONITOR_RESTARTS {
        match monitor_sleep_signals(&sender, debug_enabled, &tracker) {
            Ok(()) => {
                if debug_enabled {
                    log_pipe!();
                    log_debug!("Sleep monitor thread exiting normally");
                }
                return;
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Sleep monitor error: {e}");
                if attempt == MAX_MONITOR_RESTARTS {
                    log_indented!("Maximum restart attempts reached for sleep monitor");
                    log_indented!("Resume detection will not be available");
                    return;
                }
                log_indented!(
                    "Will restart D-Bus monitor (attempt {}/{})",
                    attempt + 1,
                    MAX_MONITOR_RESTARTS
                );
                thread::sleep(RESTART_DELAY);
            }
        }
    }
}

/// Returns `Ok(())` when the main loop is gone, `Err` when the bus connection is lost.
fn monitor_sleep_signals(
    sender: &Sender<BoardEvent>,
    debug_enabled: bool,
    tracker: &SleepTracker,
) -> Result<()> {
    let connection = Connection::system().context("Failed to connect to system D-Bus")?;
    let logind =
        LogindManagerProxyBlocking::new(&connection).context("Failed to create logind proxy")?;
    let sleep_signals = logind
        .receive_prepare_for_sleep()
        .context("Failed to subscribe to PrepareForSleep signals")?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Subscribed to systemd-logind PrepareForSleep signals");
    }

    for signal in sleep_signals {
        let args = match signal.args() {
            Ok(args) => args,
            Err(e) => {
                log_pipe!();
                log_warning!("Failed to parse PrepareForSleep signal args: {e}");
                continue;
            }
        };

        if args.start {
            tracker.mark_sleeping();
            if debug_enabled {
                log_pipe!();
                log_debug!("System entering sleep");
            }
            continue;
        }

        tracker.mark_resumed();
        log_pipe!();
        log_info!("System resumed from sleep, checking date");
        if sender.send(BoardEvent::Wake(WakeReason::Resume)).is_err() {
            return Ok(());
        }
    }

    anyhow::bail!("D-Bus connection lost, PrepareForSleep signal stream ended")
}

/// Far-future `CLOCK_REALTIME` timer that only ever fires when the clock is set.
struct TimeChangeDetector {
    timer: TimerFd,
}

impl TimeChangeDetector {
    fn new() -> nix::Result<Self> {
        let timer = TimerFd::new(ClockId::CLOCK_REALTIME, TimerFlags::empty())?;
        let detector = TimeChangeDetector { timer };
        detector.arm()?;
        Ok(detector)
    }

    fn arm(&self) -> nix::Result<()> {
        let flags =
            TimerSetTimeFlags::TFD_TIMER_ABSTIME | TimerSetTimeFlags::TFD_TIMER_CANCEL_ON_SET;
        let far_future = TimeSpec::new(i64::MAX / 1000, 0);
        self.timer.set(Expiration::OneShot(far_future), flags)
    }

    /// Block until the clock changes, then re-arm.
    fn wait_for_change(&self) -> Result<()> {
        match self.timer.wait() {
            Ok(()) | Err(Errno::ECANCELED) => {
                self.arm().context("Failed to re-arm clock change timer")
            }
            Err(e) => Err(anyhow::anyhow!("Timer wait error: {e}")),
        }
    }
}

fn monitor_time_changes(
    sender: Sender<BoardEvent>,
    debug_enabled: bool,
    tracker: SleepTracker,
) -> Result<()> {
    let detector = TimeChangeDetector::new().context("Failed to create clock change timer")?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Watching for wall clock changes");
    }

    loop {
        detector.wait_for_change()?;

        if tracker.explains_clock_change() {
            continue;
        }

        log_pipe!();
        log_info!("System clock changed, checking date");
        if sender.send(BoardEvent::Wake(WakeReason::ClockChange)).is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_tracker_grace_period() {
        let tracker = SleepTracker::default();
        assert!(!tracker.explains_clock_change());

        tracker.mark_sleeping();
        assert!(tracker.explains_clock_change());

        tracker.mark_resumed();
        assert!(tracker.explains_clock_change());

        tracker.resume_time.store(
            SleepTracker::current_timestamp() - RESUME_GRACE_SECS - 1,
            Ordering::SeqCst,
        );
        assert!(!tracker.explains_clock_change());
    }
}
