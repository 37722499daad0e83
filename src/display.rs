//! Rendering of board frames.
//!
//! The board produces a [`Frame`] on every tick; a [`Renderer`] puts it on
//! screen. The terminal renderer owns the terminal for the lifetime of the
//! kiosk session, the log renderer is used when there is no terminal to draw
//! on (systemd service, `--headless`) and only reports changes.

use anyhow::{Context, Result};
use crossterm::{
    cursor, event, execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
};
use std::io::{Stdout, Write, stdout};

use crate::logger::Log;
use crate::prayer::PrayerKey;
use crate::time::labels::{ClockFace, DateLabels};

/// Which screen the board is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    Settings,
}

/// One prayer in the schedule column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerRow {
    pub key: PrayerKey,
    pub time: String,
    pub ampm: String,
    pub is_next: bool,
}

/// Everything needed to draw one screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub clock: ClockFace,
    pub labels: DateLabels,
    /// Empty until times are known
    pub prayers: Vec<PrayerRow>,
    pub sunrise: Option<(String, String)>,
    pub sunset: Option<(String, String)>,
    /// `PRAYER` until a next prayer is known
    pub next_label: String,
    pub countdown: String,
    /// Fahrenheit
    pub temperature: Option<f64>,
    pub panel_left: bool,
    pub screen: Screen,
    /// Label/value pairs shown on the settings screen
    pub settings: Vec<(String, String)>,
    pub setup_link: String,
    pub status: Option<String>,
}

impl Frame {
    /// Clock and date panel.
    pub fn clock_panel(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} {} {}",
                self.clock.time, self.clock.seconds, self.clock.ampm
            ),
            String::new(),
            self.labels.gregorian.clone(),
            self.labels.hijri.clone(),
        ];
        if let Some(temp) = self.temperature {
            lines.push(String::new());
            lines.push(format!("{temp:.0}°F"));
        }
        lines
    }

    /// Next prayer, countdown and the day's schedule.
    pub fn schedule_panel(&self) -> Vec<String> {
        let mut lines = vec![
            format!("NEXT: {}", self.next_label),
            self.countdown.clone(),
            String::new(),
        ];

        for row in &self.prayers {
            let marker = if row.is_next { "▶" } else { " " };
            lines.push(format!(
                "{marker} {:<8} {:>5} {}",
                row.key.title(),
                row.time,
                row.ampm
            ));
        }

        if let (Some((rise, rise_ampm)), Some((set, set_ampm))) = (&self.sunrise, &self.sunset) {
            lines.push(String::new());
            lines.push(format!("  Sunrise {rise} {rise_ampm}  Sunset {set} {set_ampm}"));
        }

        lines
    }

    /// Settings screen body.
    pub fn settings_panel(&self) -> Vec<String> {
        let width = self
            .settings
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);

        let mut lines = vec!["SETTINGS".to_string(), String::new()];
        for (label, value) in &self.settings {
            lines.push(format!("{label:<width$}  {value}"));
        }
        lines.push(String::new());
        if self.setup_link.is_empty() {
            lines.push("No setup link: location not set".to_string());
        } else {
            lines.push("Setup link:".to_string());
            lines.push(self.setup_link.clone());
        }
        lines.push(String::new());
        lines.push("Esc: back".to_string());
        lines
    }

    /// Condensed one-line description for logs.
    pub fn summary(&self) -> String {
        let schedule = self
            .prayers
            .iter()
            .map(|row| format!("{} {} {}", row.key.title(), row.time, row.ampm))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} | {} | next {} | {}",
            self.labels.gregorian, self.labels.hijri, self.next_label, schedule
        )
    }
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> Result<()>;

    /// Release the output before the process exits.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Full-screen terminal display.
///
/// Takes over the terminal on creation (alternate screen, raw mode, mouse and
/// focus reporting) and hands it back on [`finish`](Renderer::finish) or drop.
pub struct TerminalRenderer {
    out: Stdout,
    active: bool,
    keyboard_enhanced: bool,
}

impl TerminalRenderer {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            event::EnableMouseCapture,
            event::EnableFocusChange
        )
        .context("Failed to prepare terminal")?;

        // Key release events are only reported with the enhanced protocol.
        let keyboard_enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if keyboard_enhanced {
            execute!(
                out,
                event::PushKeyboardEnhancementFlags(
                    event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
        }

        // Console logging would scribble over the display.
        Log::set_enabled(false);

        Ok(Self {
            out,
            active: true,
            keyboard_enhanced,
        })
    }

    /// Whether key release events are reported (needed for the `s` hold).
    pub fn key_releases(&self) -> bool {
        self.keyboard_enhanced
    }

    fn draw_column(&mut self, column: u16, lines: &[String]) -> Result<()> {
        for (row, line) in lines.iter().enumerate() {
            queue!(self.out, cursor::MoveTo(column, row as u16 + 1), Print(line))?;
        }
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        if self.keyboard_enhanced {
            execute!(self.out, event::PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.out,
            event::DisableFocusChange,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Log::set_enabled(true);
        Ok(())
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        queue!(self.out, terminal::Clear(ClearType::All))?;

        match frame.screen {
            Screen::Home => {
                let clock = frame.clock_panel();
                let schedule = frame.schedule_panel();
                let half = width / 2;
                let (clock_col, schedule_col) = if frame.panel_left {
                    (2, half + 2)
                } else {
                    (half + 2, 2)
                };

                queue!(self.out, SetAttribute(Attribute::Bold))?;
                self.draw_column(clock_col, &clock[..1])?;
                queue!(self.out, SetAttribute(Attribute::Reset))?;
                self.draw_column(clock_col, &clock)?;
                self.draw_column(schedule_col, &schedule)?;
            }
            Screen::Settings => {
                let lines = frame.settings_panel();
                self.draw_column(2, &lines)?;
            }
        }

        if let Some(status) = &frame.status {
            queue!(
                self.out,
                cursor::MoveTo(2, height.saturating_sub(2)),
                SetAttribute(Attribute::Dim),
                Print(status),
                SetAttribute(Attribute::Reset)
            )?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.restore()
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Headless output: logs the schedule whenever it changes.
#[derive(Default)]
pub struct LogRenderer {
    last_summary: Option<String>,
    last_status: Option<String>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        let summary = frame.summary();
        if self.last_summary.as_ref() != Some(&summary) {
            log_block_start!("{} {}", frame.labels.gregorian, frame.labels.hijri);
            for row in &frame.prayers {
                let marker = if row.is_next { "→" } else { " " };
                log_indented!("{marker} {:<8} {} {}", row.key.title(), row.time, row.ampm);
            }
            if !frame.countdown.is_empty() {
                log_decorated!("Next: {} in {}", frame.next_label, frame.countdown);
            }
            self.last_summary = Some(summary);
        }

        if frame.status != self.last_status {
            if let Some(status) = &frame.status {
                log_pipe!();
                log_info!("{status}");
            }
            self.last_status = frame.status.clone();
        }

        Ok(())
    }
}
