//! File watching for hot reload of the config file and the settings record.
//!
//! Each watched file maps to the [`BoardEvent`] sent when it changes. Parent
//! directories are watched rather than the files themselves, which survives
//! editors and atomic writers replacing the file.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::common::constants::WATCHER_DEBOUNCE_MS;
use crate::common::utils::private_path;
use crate::io::signals::BoardEvent;

/// A file to watch and the event its changes produce.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub event: BoardEvent,
}

impl WatchTarget {
    pub fn new(path: PathBuf, event: BoardEvent) -> Self {
        Self { path, event }
    }

    fn matches(&self, changed: &Path) -> bool {
        changed.parent() == self.path.parent() && changed.file_name() == self.path.file_name()
    }
}

/// Indices of the targets affected by `event`.
fn affected_targets(targets: &[WatchTarget], event: &Event) -> Vec<usize> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return Vec::new();
    }

    targets
        .iter()
        .enumerate()
        .filter(|(_, target)| event.paths.iter().any(|p| target.matches(p)))
        .map(|(index, _)| index)
        .collect()
}

/// Start watching `targets` in a background thread.
pub fn start_file_watcher(
    targets: Vec<WatchTarget>,
    sender: Sender<BoardEvent>,
    debug_enabled: bool,
) -> Result<()> {
    if targets.is_empty() {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;

    let mut watched_dirs = HashSet::new();
    for target in &targets {
        let Some(parent) = target.path.parent() else {
            continue;
        };
        if !watched_dirs.insert(parent.to_path_buf()) {
            continue;
        }
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", private_path(parent)))?;
        watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(parent)))?;
    }

    if debug_enabled {
        log_pipe!();
        log_debug!("Watching for changes:");
        for target in &targets {
            log_indented!("{}", private_path(&target.path));
        }
    }

    thread::spawn(move || {
        // The watcher stops when dropped.
        let _watcher = watcher;
        let debounce = Duration::from_millis(WATCHER_DEBOUNCE_MS);
        let mut last_sent: Vec<Option<Instant>> = vec![None; targets.len()];

        for event in rx {
            for index in affected_targets(&targets, &event) {
                if last_sent[index].is_some_and(|at| at.elapsed() < debounce) {
                    continue;
                }

                if debug_enabled {
                    log_pipe!();
                    log_debug!("Change detected: {}", private_path(&targets[index].path));
                }

                if sender.send(targets[index].event.clone()).is_err() {
                    return;
                }
                last_sent[index] = Some(Instant::now());
            }
        }
    });

    Ok(())
}
