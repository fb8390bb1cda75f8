//! Settings file watching for hot reload
//!
//! Watches the directory holding `settings.yaml` (editors often replace the
//! file rather than write in place) and reports when the file itself changed.

use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

type DebounceResult = Result<Vec<DebouncedEvent>, notify::Error>;

/// Debounced watcher for a single settings file
pub struct SettingsWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    rx: Receiver<DebounceResult>,
    file: PathBuf,
}

impl SettingsWatcher {
    /// Watch `file`. Its parent directory must exist.
    ///
    /// Events are debounced by 250ms so a save that truncates then writes
    /// reloads once.
    pub fn new(file: PathBuf) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(Duration::from_millis(250), tx)?;

        let dir = watch_dir(&file);
        debouncer
            .watcher()
            .watch(&dir, notify::RecursiveMode::NonRecursive)?;

        tracing::info!("Watching settings file: {}", file.display());

        Ok(Self {
            _debouncer: debouncer,
            rx,
            file,
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Drain pending events (non-blocking). True if the settings file changed.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;

        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(events) => {
                    changed |= events.iter().any(|event| {
                        event.kind != DebouncedEventKind::AnyContinuous
                            && self.is_settings_file(&event.path)
                    });
                }
                Err(e) => tracing::warn!("Settings watcher error: {:?}", e),
            }
        }

        if changed {
            tracing::debug!("Settings file changed on disk");
        }
        changed
    }

    fn is_settings_file(&self, path: &Path) -> bool {
        path.file_name().is_some() && path.file_name() == self.file.file_name()
    }
}

fn watch_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
