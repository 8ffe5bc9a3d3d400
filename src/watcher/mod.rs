pub mod event;
pub mod listeners;
mod stabilizer;

pub use event::{ChangeEvent, ChangeKind};
pub use listeners::{Listener, ListenerId, ListenerRegistry, Subscription};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use stabilizer::Stabilizer;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot watch {path}: neither it nor its parent directory exists")]
    MissingRoot { path: PathBuf },

    #[error("failed to watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Write-stabilization settings
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// How long size and mtime must hold still before a write is reported
    pub stability: Duration,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            stability: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&Config> for WatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            stability: config.watch_stability,
            poll_interval: config.watch_poll_interval,
        }
    }
}

/// Recursive watcher over the mock data root.
///
/// Raw notify events are bridged into a tokio task that holds writes back
/// until they settle, then fans them out to registered listeners.
pub struct ChangeWatcher {
    root: PathBuf,
    registry: Arc<ListenerRegistry>,
    // Kept alive for the lifetime of the watcher; dropping it ends the event loop
    _inner: Option<Arc<Mutex<RecommendedWatcher>>>,
}

impl ChangeWatcher {
    /// Start watching `root` recursively. Must be called inside a tokio runtime.
    ///
    /// If `root` does not exist yet its parent is watched until it appears.
    pub fn start(root: impl Into<PathBuf>, options: WatchOptions) -> Result<Self, WatchError> {
        let root = root.into();
        let (tx, rx) = mpsc::unbounded_channel::<Event>();

        let watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                // Receiver gone means the watcher is shutting down
                let _ = tx.send(event);
            }
            Err(e) => tracing::warn!(error = %e, "File watcher error"),
        })
        .map_err(|source| WatchError::Notify {
            path: root.clone(),
            source,
        })?;
        let watcher = Arc::new(Mutex::new(watcher));

        let awaiting_root = !root.is_dir();
        let (target, mode) = if awaiting_root {
            let parent = root
                .parent()
                .filter(|parent| parent.is_dir())
                .ok_or_else(|| WatchError::MissingRoot { path: root.clone() })?;
            (parent.to_path_buf(), RecursiveMode::NonRecursive)
        } else {
            (root.clone(), RecursiveMode::Recursive)
        };
        watch_path(&watcher, &target, mode)?;

        let mut stabilizer = Stabilizer::new(options.stability);
        if !awaiting_root {
            stabilizer.scan_existing(&root);
        }

        let registry = Arc::new(ListenerRegistry::new());
        let event_loop = EventLoop {
            root: root.clone(),
            awaiting_root,
            watcher: Arc::downgrade(&watcher),
            registry: registry.clone(),
            stabilizer,
        };
        tokio::spawn(event_loop.run(rx, options.poll_interval));

        tracing::info!(root = %root.display(), "Watching mock data root");

        Ok(Self {
            root,
            registry,
            _inner: Some(watcher),
        })
    }

    /// A watcher with no filesystem backing. Events only arrive through `dispatch`.
    pub fn detached(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: Arc::new(ListenerRegistry::new()),
            _inner: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register one callback for added, changed and removed events.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        Subscription::register(&self.registry, Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    pub fn dispatch(&self, event: &ChangeEvent) {
        self.registry.dispatch(event);
    }
}

fn watch_path(
    watcher: &Mutex<RecommendedWatcher>,
    path: &Path,
    mode: RecursiveMode,
) -> Result<(), WatchError> {
    watcher
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .watch(path, mode)
        .map_err(|source| WatchError::Notify {
            path: path.to_path_buf(),
            source,
        })
}

struct EventLoop {
    root: PathBuf,
    awaiting_root: bool,
    watcher: Weak<Mutex<RecommendedWatcher>>,
    registry: Arc<ListenerRegistry>,
    stabilizer: Stabilizer,
}

impl EventLoop {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Event>, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(event) => self.handle(event),
                    None => break,
                },
                _ = ticker.tick(), if self.stabilizer.has_pending() => {
                    for (kind, path) in self.stabilizer.poll(Instant::now()) {
                        self.emit(kind, path);
                    }
                }
            }
        }

        tracing::debug!(root = %self.root.display(), "File watcher stopped");
    }

    fn handle(&mut self, event: Event) {
        let now = Instant::now();
        let paths: Vec<&PathBuf> = event
            .paths
            .iter()
            .filter(|path| path.starts_with(&self.root))
            .collect();

        match event.kind {
            EventKind::Create(_) => {
                for path in paths {
                    self.touched(path, now);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
                for path in paths {
                    self.removed(path);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to] = paths.as_slice() {
                    self.removed(from);
                    self.touched(to, now);
                }
            }
            EventKind::Modify(_) | EventKind::Any => {
                for path in paths {
                    if path.exists() {
                        self.touched(path, now);
                    } else {
                        self.removed(path);
                    }
                }
            }
            EventKind::Access(_) | EventKind::Other => {}
        }
    }

    fn touched(&mut self, path: &Path, now: Instant) {
        if self.awaiting_root && path == self.root.as_path() && path.is_dir() {
            let Some(watcher) = self.watcher.upgrade() else {
                return;
            };
            match watch_path(&watcher, &self.root, RecursiveMode::Recursive) {
                Ok(()) => {
                    self.awaiting_root = false;
                    tracing::info!(root = %self.root.display(), "Mock data root appeared");
                }
                Err(e) => tracing::warn!(error = %e, "Failed to watch mock data root"),
            }
        }
        self.stabilizer.touched(path, now);
    }

    fn removed(&mut self, path: &Path) {
        for gone in self.stabilizer.removed(path) {
            self.emit(ChangeKind::Removed, gone);
        }
    }

    fn emit(&self, kind: ChangeKind, path: PathBuf) {
        tracing::debug!(kind = kind.as_str(), path = %path.display(), "File change");
        self.registry.dispatch(&ChangeEvent::new(kind, path));
    }
}
