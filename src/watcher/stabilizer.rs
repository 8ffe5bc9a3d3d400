use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use walkdir::WalkDir;

use crate::watcher::ChangeKind;

/// (size, mtime) observed on the last poll
type Snapshot = (u64, Option<SystemTime>);

struct PendingWrite {
    kind: ChangeKind,
    seq: u64,
    snapshot: Option<Snapshot>,
    since: Instant,
}

/// Defers add/change notifications until a file's size and mtime have held
/// still for the stability window.
///
/// `known` is the set of files already reported (or present at startup), so a
/// later write is a change rather than an add.
pub(crate) struct Stabilizer {
    stability: Duration,
    known: HashSet<PathBuf>,
    pending: HashMap<PathBuf, PendingWrite>,
    seq: u64,
}

impl Stabilizer {
    pub fn new(stability: Duration) -> Self {
        Self {
            stability,
            known: HashSet::new(),
            pending: HashMap::new(),
            seq: 0,
        }
    }

    /// Record every file under `root` as already present without emitting anything.
    pub fn scan_existing(&mut self, root: &Path) {
        for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_file() {
                self.known.insert(entry.into_path());
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// A create or modify was reported for `path`. Directories queue every file
    /// beneath them, which covers a directory renamed into place.
    pub fn touched(&mut self, path: &Path, now: Instant) {
        if path.is_dir() {
            let files: Vec<PathBuf> = WalkDir::new(path)
                .min_depth(1)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();
            for file in files {
                self.touch_file(file, now);
            }
            return;
        }
        self.touch_file(path.to_path_buf(), now);
    }

    fn touch_file(&mut self, path: PathBuf, now: Instant) {
        if let Some(pending) = self.pending.get_mut(&path) {
            pending.since = now;
            return;
        }

        let kind = if self.known.contains(&path) {
            ChangeKind::Changed
        } else {
            ChangeKind::Added
        };
        self.seq += 1;
        self.pending.insert(
            path,
            PendingWrite {
                kind,
                seq: self.seq,
                snapshot: None,
                since: now,
            },
        );
    }

    /// `path` (a file or a whole directory) is gone. Returns the previously
    /// known files that should be reported as removed, sorted.
    pub fn removed(&mut self, path: &Path) -> Vec<PathBuf> {
        self.pending.retain(|pending, _| !pending.starts_with(path));

        let mut gone: Vec<PathBuf> = self
            .known
            .iter()
            .filter(|known| known.starts_with(path))
            .cloned()
            .collect();
        for known in &gone {
            self.known.remove(known);
        }
        gone.sort();
        gone
    }

    /// Check pending files and return those that have settled, in the order
    /// they were first touched.
    pub fn poll(&mut self, now: Instant) -> Vec<(ChangeKind, PathBuf)> {
        let mut ready: Vec<(u64, ChangeKind, PathBuf)> = Vec::new();
        let mut vanished: Vec<PathBuf> = Vec::new();

        for (path, pending) in self.pending.iter_mut() {
            let metadata = match fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => metadata,
                // Deleted before settling, or replaced by a directory
                _ => {
                    vanished.push(path.clone());
                    continue;
                }
            };

            let snapshot = (metadata.len(), metadata.modified().ok());
            if pending.snapshot == Some(snapshot) {
                if now.saturating_duration_since(pending.since) >= self.stability {
                    ready.push((pending.seq, pending.kind, path.clone()));
                }
            } else {
                pending.snapshot = Some(snapshot);
                pending.since = now;
            }
        }

        for path in vanished {
            self.pending.remove(&path);
        }

        ready.sort_by_key(|(seq, _, _)| *seq);
        ready
            .into_iter()
            .map(|(_, kind, path)| {
                self.pending.remove(&path);
                self.known.insert(path.clone());
                (kind, path)
            })
            .collect()
    }
}
