//! File watching: re-index stylesheets as they change on disk.
//!
//! Raw notify events funnel through a crossbeam channel into a debounced
//! loop. Modifications wait out the debounce window (editors save in
//! bursts); deletions apply immediately. The loop is cooperatively
//! cancellable and exits cleanly when the token trips.

use crate::error::{EngineError, EngineResult};
use crate::types::is_stylesheet_path;
use crate::workspace::Workspace;
use crossbeam_channel::RecvTimeoutError;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Debounces change events by path: a file becomes ready once it has been
/// stable for the configured window, so save bursts index once.
#[derive(Debug)]
struct Debouncer {
    pending: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            window: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change, resetting the path's stability timer.
    fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    fn remove(&mut self, path: &PathBuf) {
        self.pending.remove(path);
    }

    /// Drain every path that has been stable for the full window.
    fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();
        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.window {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready
    }
}

pub struct StylesheetWatcher {
    workspace: Arc<Workspace>,
    token: CancellationToken,
}

impl StylesheetWatcher {
    pub fn new(workspace: Arc<Workspace>, token: CancellationToken) -> Self {
        Self { workspace, token }
    }

    /// Watch the workspace root until cancelled. Blocks the calling
    /// thread; run it on a dedicated background thread.
    pub fn watch(&self) -> EngineResult<()> {
        let (tx, rx) = crossbeam_channel::unbounded::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        let root = self.workspace.root().to_path_buf();
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| EngineError::PathWatchFailed {
                path: root.clone(),
                reason: e.to_string(),
            })?;
        info!("watching {} for stylesheet changes", root.display());

        let debounce_ms = self.workspace.settings().indexing.debounce_ms;
        let mut debouncer = Debouncer::new(debounce_ms);

        loop {
            if self.token.is_cancelled() {
                info!("watcher stopped");
                return Ok(());
            }

            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => self.dispatch(event, &mut debouncer),
                Ok(Err(e)) => warn!("watch event error: {e}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::ChannelClosed),
            }

            for path in debouncer.take_ready() {
                self.reindex(&path)?;
            }
        }
    }

    fn dispatch(&self, event: Event, debouncer: &mut Debouncer) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in event.paths {
                    if is_stylesheet_path(&path) {
                        debouncer.record(path);
                    }
                }
            }
            EventKind::Remove(_) => {
                // Deletions apply immediately, no debounce
                for path in event.paths {
                    if is_stylesheet_path(&path) {
                        debug!("removing deleted file {}", path.display());
                        debouncer.remove(&path);
                        self.workspace.remove_file(&path);
                    }
                }
            }
            _ => {}
        }
    }

    /// Re-index one changed file. A file that vanished between the event
    /// and the debounce window is treated as a deletion; cancellation
    /// propagates, any other failure is logged and skipped.
    fn reindex(&self, path: &PathBuf) -> EngineResult<()> {
        match self.workspace.reindex_file(path, &self.token) {
            Ok(count) => {
                debug!("re-indexed {}: {count} declarations", path.display());
                Ok(())
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(EngineError::FileRead { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                self.workspace.remove_file(path);
                Ok(())
            }
            Err(e) => {
                warn!("failed to re-index {}: {e}", path.display());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_waits_out_the_window() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/test/app.css");
        debouncer.record(path.clone());
        assert!(debouncer.take_ready().is_empty());

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(debouncer.take_ready(), vec![path]);
        assert!(debouncer.take_ready().is_empty());
    }

    #[test]
    fn debouncer_resets_on_repeated_change() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/test/app.css");
        debouncer.record(path.clone());
        std::thread::sleep(Duration::from_millis(30));
        debouncer.record(path.clone());
        std::thread::sleep(Duration::from_millis(30));
        // Only 30ms since the second change
        assert!(debouncer.take_ready().is_empty());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready(), vec![path]);
    }

    #[test]
    fn debouncer_remove_clears_pending() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/test/app.css");
        debouncer.record(path.clone());
        debouncer.remove(&path);
        std::thread::sleep(Duration::from_millis(60));
        assert!(debouncer.take_ready().is_empty());
    }
}
