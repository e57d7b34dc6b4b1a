//! Change sources feeding the scheduler

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

use crate::{Error, Result};

/// Something that reports "the central state file may have changed".
pub trait ChangeSource: Send {
    /// Begin delivering notifications on `changes`.
    fn start(&mut self, changes: UnboundedSender<()>) -> Result<()>;

    /// Stop delivering notifications and release any OS handles.
    fn stop(&mut self);
}

/// Watches the central state file through the platform file watcher.
///
/// The file's directory is watched (editors and the injection tool often
/// replace the file instead of writing in place) and events are filtered to
/// the file name, ignoring case.
#[derive(Debug)]
pub struct StateFileWatcher {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl StateFileWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            watcher: None,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}

impl ChangeSource for StateFileWatcher {
    /// # Errors
    ///
    /// Fails with [`Error::StateFileMissing`] when the file does not exist,
    /// or with [`Error::Watch`] when the platform watcher cannot be set up.
    fn start(&mut self, changes: UnboundedSender<()>) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        if !self.path.is_file() {
            return Err(Error::StateFileMissing {
                path: self.path.clone(),
            });
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if concerns_file(&event, &file_name) => {
                tracing::trace!(kind = ?event.kind, "Central state file changed");
                let _ = changes.send(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "File watcher error"),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Watching central state file");
        self.watcher = Some(watcher);
        Ok(())
    }

    fn stop(&mut self) {
        if self.watcher.take().is_some() {
            tracing::info!(path = %self.path.display(), "Stopped watching central state file");
        }
    }
}

fn concerns_file(event: &Event, file_name: &str) -> bool {
    let relevant = match &event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(kind) => !matches!(kind, ModifyKind::Metadata(_)),
        _ => false,
    };
    relevant
        && event.paths.iter().any(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().to_lowercase() == file_name)
        })
}

/// A change source driven by hand, for hosts with their own notification
/// mechanism and for tests.
#[derive(Debug, Clone, Default)]
pub struct ManualChangeSource {
    sender: Arc<Mutex<Option<UnboundedSender<()>>>>,
}

impl ManualChangeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a change. Ignored while the source is stopped.
    pub fn notify(&self) -> bool {
        let sender = self.sender.lock().unwrap_or_else(|p| p.into_inner());
        sender.as_ref().is_some_and(|tx| tx.send(()).is_ok())
    }

    pub fn is_active(&self) -> bool {
        self.sender.lock().unwrap_or_else(|p| p.into_inner()).is_some()
    }
}

impl ChangeSource for ManualChangeSource {
    fn start(&mut self, changes: UnboundedSender<()>) -> Result<()> {
        *self.sender.lock().unwrap_or_else(|p| p.into_inner()) = Some(changes);
        Ok(())
    }

    fn stop(&mut self) {
        self.sender.lock().unwrap_or_else(|p| p.into_inner()).take();
    }
}
