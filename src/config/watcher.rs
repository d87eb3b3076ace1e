//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a temp file and renaming it over the original replace the
//! inode, which would silently end a watch on the file.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AuthConfig;

/// Quiet period that must pass after the last event before the file is reloaded.
const SETTLE: Duration = Duration::from_millis(250);

pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AuthConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AuthConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Must be called inside a Tokio runtime.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
        let dir = watch_dir(&self.path);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_config_event(&event, &file_name) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tokio::spawn(reload_loop(self.path.clone(), event_rx, self.update_tx));
        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` may have changed the contents of the file named `file_name`.
fn is_config_event(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// Wait until no event has arrived for `quiet`, discarding the ones that do.
async fn settle(events: &mut mpsc::UnboundedReceiver<()>, quiet: Duration) {
    while let Ok(Some(())) = tokio::time::timeout(quiet, events.recv()).await {}
}

async fn reload_loop(
    path: PathBuf,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<AuthConfig>,
) {
    while events.recv().await.is_some() {
        settle(&mut events, SETTLE).await;
        tracing::info!(path = ?path, "Config file change detected, reloading");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            }
        }
    }
}
