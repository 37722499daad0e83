//! Main application entry point and high-level flow coordination.
//!
//! [`Prayerboard`] wires the long-running board together: signal handling,
//! the single-instance lock, configuration, the state directory, file
//! watching, system event monitoring, terminal input and the renderer. The
//! assembled [`Core`] then runs the main loop until shutdown.
//!
//! ```ignore
//! Prayerboard::new(debug_enabled).headless().run()?;
//! ```

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;

use crate::{
    common::constants::SETTINGS_STORAGE_KEY,
    config::{self, Config, DisplayMode, watcher::WatchTarget},
    core::{
        Core, CoreParams,
        board::{Board, BoardParams},
    },
    display::{LogRenderer, Renderer, TerminalRenderer},
    io::{
        dbus, input,
        lock::acquire_lock,
        signals::{BoardEvent, setup_signal_handler},
        storage::FileStorage,
        weather::{OpenMeteo, WeatherProvider},
    },
    prayer::engine::SolarEngine,
    time::{labels::TabularIslamicCalendar, source::RealTimeSource},
};

/// Builder for configuring and running the board.
pub struct Prayerboard {
    debug_enabled: bool,
    headless: bool,
}

impl Prayerboard {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            headless: false,
        }
    }

    /// Log schedule changes instead of drawing, whatever the config says.
    pub fn headless(mut self) -> Self {
        self.headless = true;
        self
    }

    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing detailed event handling");
        }

        let config = Config::load()?;

        let Some(lock) = acquire_lock()? else {
            log_end!();
            return Ok(());
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let storage_dir = FileStorage::default_dir()?;
        std::fs::create_dir_all(&storage_dir)
            .context("Failed to create the state directory")?;
        let storage = Arc::new(FileStorage::new(storage_dir));

        let mut targets = vec![WatchTarget::new(
            storage.record_path(SETTINGS_STORAGE_KEY),
            BoardEvent::ReloadSettings,
        )];
        if let Ok(config_path) = Config::get_config_path() {
            targets.push(WatchTarget::new(config_path, BoardEvent::ReloadConfig));
        }
        if let Err(e) =
            config::start_file_watcher(targets, signal_state.sender.clone(), self.debug_enabled)
        {
            log_pipe!();
            log_warning!("File watching unavailable: {e}");
            log_indented!("Use SIGUSR2 to reload settings by hand");
        }

        if config.system_events_enabled() {
            dbus::start_system_event_monitor(signal_state.sender.clone(), self.debug_enabled);
        }

        config.log_config();

        let renderer = self.create_renderer(&config, &signal_state)?;

        let board = Board::new(BoardParams {
            storage,
            engine: Arc::new(SolarEngine::new()),
            clock: Arc::new(RealTimeSource),
            calendar: Box::new(TabularIslamicCalendar),
            hold_duration: config.hold_duration(),
            setup_origin: config.setup_origin().to_string(),
        });

        let weather: Option<Arc<dyn WeatherProvider>> = Some(Arc::new(OpenMeteo::new()));

        log_block_start!("Lock acquired, starting prayerboard...");

        let core = Core::new(CoreParams {
            board,
            renderer,
            config,
            signal_state,
            weather,
            debug_enabled: self.debug_enabled,
            lock: Some(lock),
        });

        core.execute()
    }

    /// Terminal when asked for (or on a TTY in auto mode), logging otherwise.
    fn create_renderer(
        &self,
        config: &Config,
        signal_state: &crate::io::signals::SignalState,
    ) -> Result<Box<dyn Renderer>> {
        let use_terminal = !self.headless
            && match config.display_mode() {
                DisplayMode::Terminal => true,
                DisplayMode::Log => false,
                DisplayMode::Auto => std::io::stdout().is_terminal(),
            };

        if !use_terminal {
            log_block_start!("Logging schedule changes (no terminal display)");
            return Ok(Box::new(LogRenderer::new()));
        }

        let renderer = TerminalRenderer::new().context("Failed to take over the terminal")?;
        input::spawn_input_thread(
            signal_state.sender.clone(),
            signal_state.running.clone(),
            renderer.key_releases(),
        );
        Ok(Box::new(renderer))
    }
}
