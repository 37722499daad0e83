//! # Prayerboard Library
//!
//! Internal library for the prayerboard binary application
//!
//! This library exists to enable testing of complex internals and provide clean separation
//! between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Entry Point**: `Prayerboard` struct assembles the running board with resource management
//! - **Core Logic**: `core` module contains the board state machine and the main loop
//! - **Prayer Times**: `prayer` module with the astronomical engine, per-day cache and scheduler
//! - **Settings**: `settings` module for operator settings, persistence and setup links
//! - **Configuration**: `config` module for TOML-based runtime options with hot-reload
//! - **Commands**: `commands` module for CLI subcommands (setup, times, settings, locate)
//! - **Display**: `display` module with the terminal and log renderers
//! - **Infrastructure**: Signal handling, D-Bus monitoring, input, storage, weather and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod display;
pub mod io;
pub mod prayer;
pub mod settings;
pub mod time;

mod prayerboard;

pub use prayerboard::Prayerboard;
