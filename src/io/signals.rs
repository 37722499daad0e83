//! Events feeding the board's main loop, and Unix signal handling.
//!
//! Every helper thread (signals, D-Bus, timerfd, terminal input, settings
//! watcher, weather fetch) talks to the main loop through one mpsc channel of
//! [`BoardEvent`]s. Helpers exit when a send fails because the loop is gone.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGCONT, SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, channel},
    thread,
};

/// Why the board should re-check the date right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// System resumed from suspend
    Resume,
    /// Wall clock jumped (manual change, NTP step, DST)
    ClockChange,
    /// Process continued after SIGSTOP
    Continued,
}

impl WakeReason {
    pub fn describe(&self) -> &'static str {
        match self {
            WakeReason::Resume => "system resumed from sleep",
            WakeReason::ClockChange => "system clock changed",
            WakeReason::Continued => "process continued",
        }
    }
}

/// Messages delivered to the main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// Force an immediate date check
    Wake(WakeReason),
    /// Terminal regained focus, same handling as a wake
    Focus,
    /// Re-read the persisted settings (SIGUSR2 or settings file change)
    ReloadSettings,
    /// Re-read `prayerboard.toml`
    ReloadConfig,
    /// Result of a weather fetch, in Fahrenheit
    Weather(Option<f64>),
    /// Start of the settings press-and-hold
    HoldPress,
    HoldRelease,
    /// Leave the settings screen
    Back,
    Shutdown,
}

/// Channel ends and the running flag shared with helper threads.
pub struct SignalState {
    pub running: Arc<AtomicBool>,
    pub receiver: Receiver<BoardEvent>,
    pub sender: Sender<BoardEvent>,
}

impl SignalState {
    /// A channel with no signal handling attached (tests and one-shot commands).
    pub fn detached() -> Self {
        let (sender, receiver) = channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            receiver,
            sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Map a received signal to the event it produces.
pub fn event_for_signal(sig: i32) -> Option<BoardEvent> {
    match sig {
        SIGCONT => Some(BoardEvent::Wake(WakeReason::Continued)),
        SIGUSR2 => Some(BoardEvent::ReloadSettings),
        SIGINT | SIGTERM | SIGHUP => Some(BoardEvent::Shutdown),
        _ => None,
    }
}

/// Register signal handlers and spawn the thread forwarding them as events.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2, SIGCONT])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(event) = event_for_signal(sig) else {
                continue;
            };

            match &event {
                BoardEvent::Shutdown => {
                    log_pipe!();
                    match sig {
                        SIGINT if debug_enabled => {
                            log_info!("Received SIGINT (Ctrl+C), shutting down...")
                        }
                        SIGINT => log_info!("Received interrupt signal, shutting down..."),
                        SIGHUP => log_info!("Terminal disconnected, shutting down..."),
                        _ => log_info!("Received termination request, shutting down..."),
                    }
                    running.store(false, Ordering::SeqCst);
                }
                BoardEvent::ReloadSettings => {
                    log_pipe!();
                    log_info!("Received settings reload signal");
                }
                _ => {
                    if debug_enabled {
                        log_pipe!();
                        log_debug!("Received signal {sig}");
                    }
                }
            }

            if sender.send(event).is_err() {
                // Main loop is gone.
                running.store(false, Ordering::SeqCst);
                break;
            }
        }
    });

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(
            event_for_signal(SIGCONT),
            Some(BoardEvent::Wake(WakeReason::Continued))
        );
        assert_eq!(event_for_signal(SIGUSR2), Some(BoardEvent::ReloadSettings));
        for sig in [SIGINT, SIGTERM, SIGHUP] {
            assert_eq!(event_for_signal(sig), Some(BoardEvent::Shutdown));
        }
        assert_eq!(event_for_signal(signal_hook::consts::signal::SIGUSR1), None);
    }

    #[test]
    fn test_detached_state() {
        let state = SignalState::detached();
        assert!(state.is_running());
        state.sender.send(BoardEvent::Focus).unwrap();
        assert_eq!(state.receiver.recv().unwrap(), BoardEvent::Focus);
        state.stop();
        assert!(!state.is_running());
    }
}
