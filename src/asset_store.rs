//! The dual-layer asset store.
//!
//! Originals come from the current [`AssetSource`] and are never modified. Edited
//! overlays live in memory, keyed by archive-style relative path, and are persisted
//! to a directory tree that mirrors those paths.

use crate::asset_source::{find_files_in_dir, AssetSource};
use crate::error::{Diagnostic, DiagnosticKind, StoreError};
use crate::pixel_grid::{is_image_path, PixelGrid};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the staging files written during a save.
const STAGING_SUFFIX: &str = "part";
/// Suffix of files moved aside while a save commits.
const BACKUP_SUFFIX: &str = "bak";

/// Notifications for the host, drained with [`AssetStore::take_events`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The asset list or many entries changed; views should reset.
    AllChanged,
    ImageChanged(String),
}

/// Outcome of [`AssetStore::remove_duplicates`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    pub removed: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Default)]
pub struct AssetStore {
    root: Option<PathBuf>,
    edited: HashMap<String, PixelGrid>,
    /// Edits dropped since the last load or save; their files go on the next save.
    removed: HashSet<String>,
    dirty: bool,
    source: Option<Box<dyn AssetSource>>,
    events: Vec<StoreEvent>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_path(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn edited_len(&self) -> usize {
        self.edited.len()
    }

    /// Paths with an edited overlay, sorted.
    pub fn edited_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.edited.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drops every edit without touching the pack directory.
    pub fn clear(&mut self) {
        self.edited.clear();
        self.removed.clear();
        self.dirty = false;
        self.events.push(StoreEvent::AllChanged);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Source (originals)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Swaps the archive. Previously fetched originals should be fetched again.
    pub fn set_source(&mut self, source: Option<Box<dyn AssetSource>>) {
        if let Some(source) = &source {
            log::info!("Using {} as original assets", source.describe());
        }
        self.source = source;
        self.events.push(StoreEvent::AllChanged);
    }

    pub fn has_original(&self, path: &str) -> bool {
        self.source.as_ref().is_some_and(|s| s.exists(path))
    }

    pub fn get_original(&self, path: &str) -> Result<PixelGrid, StoreError> {
        let source = self
            .source
            .as_ref()
            .filter(|s| s.exists(path))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let bytes = source.read(path)?;
        PixelGrid::decode(&bytes, path)
    }

    /// Image entries of the source, sorted. Empty without a source.
    pub fn asset_paths(&self) -> &[String] {
        match &self.source {
            Some(source) => source.entries(),
            None => &[],
        }
    }

    /// Asset paths containing `filter` (trimmed); an empty filter keeps everything.
    pub fn filtered_paths(&self, filter: &str) -> Vec<&str> {
        let filter = filter.trim();
        self.asset_paths()
            .iter()
            .map(String::as_str)
            .filter(|path| filter.is_empty() || path.contains(filter))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Edited overlays
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn has_edited(&self, path: &str) -> bool {
        self.edited.contains_key(path)
    }

    pub fn get_edited(&self, path: &str) -> Result<&PixelGrid, StoreError> {
        self.edited
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    pub fn set_edited(&mut self, path: &str, grid: PixelGrid) {
        self.removed.remove(path);
        self.edited.insert(path.to_string(), grid);
        self.dirty = true;
        self.events.push(StoreEvent::ImageChanged(path.to_string()));
    }

    pub fn remove_edited(&mut self, path: &str) {
        if self.edited.remove(path).is_some() {
            self.removed.insert(path.to_string());
            self.dirty = true;
            self.events.push(StoreEvent::ImageChanged(path.to_string()));
        }
    }

    /// Stores the original as the edit for `path` and returns it.
    pub fn copy_original(&mut self, path: &str) -> Result<PixelGrid, StoreError> {
        let original = self.get_original(path)?;
        self.set_edited(path, original.clone());
        Ok(original)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────────

    /// Replaces all edits with the images found under `root`.
    ///
    /// Nothing changes unless every image below `root` was read and decoded.
    pub fn load(&mut self, root: &Path) -> Result<(), StoreError> {
        let files = find_files_in_dir(root).map_err(|err| StoreError::io(root, err))?;

        let mut edited = HashMap::new();
        for relative in files.into_iter().filter(|f| is_image_path(f)) {
            let grid = PixelGrid::load(&root.join(&relative))?;
            log::debug!("Loaded {relative} ({}x{})", grid.width(), grid.height());
            edited.insert(relative, grid);
        }

        log::info!("Loaded {} images from {}", edited.len(), root.display());
        self.root = Some(root.to_path_buf());
        self.edited = edited;
        self.removed.clear();
        self.dirty = false;
        self.events.push(StoreEvent::AllChanged);
        Ok(())
    }

    /// Writes every edit below the current root and deletes the files of edits
    /// removed since the last load or save. All-or-nothing.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let root = self.root.clone().ok_or(StoreError::NoPath)?;

        let mut commit = Commit::default();
        if let Err(err) = self.stage_all(&root, &mut commit) {
            commit.roll_back();
            return Err(err);
        }
        let deleted: Vec<PathBuf> = self
            .removed
            .iter()
            .map(|relative| root.join(relative))
            .filter(|path| path.is_file())
            .collect();
        if let Err(err) = commit.apply(&deleted) {
            commit.roll_back();
            return Err(err);
        }
        commit.finish();

        log::info!(
            "Saved {} images to {} ({} deleted)",
            self.edited.len(),
            root.display(),
            deleted.len()
        );
        self.removed.clear();
        self.dirty = false;
        self.events.push(StoreEvent::AllChanged);
        Ok(())
    }

    fn stage_all(&self, root: &Path, commit: &mut Commit) -> Result<(), StoreError> {
        for (relative, grid) in &self.edited {
            let destination = root.join(relative);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
            }
            let staging = sibling_path(&destination, STAGING_SUFFIX);
            if let Err(err) = grid.save_png(&staging) {
                fs::remove_file(&staging).ok();
                return Err(err);
            }
            commit.staged.push((staging, destination));
        }
        Ok(())
    }

    pub fn save_as(&mut self, root: &Path) -> Result<(), StoreError> {
        self.root = Some(root.to_path_buf());
        self.save()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Duplicate removal
    // ─────────────────────────────────────────────────────────────────────────────

    /// Drops every edit that is pixel-identical to its original.
    ///
    /// Entries that cannot be compared are kept and reported; they never stop the scan.
    pub fn remove_duplicates(&mut self) -> Result<DuplicateReport, StoreError> {
        if self.source.is_none() {
            return Err(StoreError::NoSource);
        }

        let mut report = DuplicateReport::default();
        for path in self.edited_paths() {
            let Some(edited) = self.edited.get(&path) else {
                continue;
            };
            if !self.has_original(&path) {
                report.diagnostics.push(Diagnostic {
                    path,
                    kind: DiagnosticKind::MissingInSource,
                });
                continue;
            }
            let original = match self.get_original(&path) {
                Ok(original) => original,
                Err(err) => {
                    report.diagnostics.push(Diagnostic {
                        path,
                        kind: DiagnosticKind::Unreadable(err.to_string()),
                    });
                    continue;
                }
            };
            if !original.same_size(edited) {
                report.diagnostics.push(Diagnostic {
                    path,
                    kind: DiagnosticKind::SizeMismatch {
                        edited: edited.size(),
                        original: original.size(),
                    },
                });
                continue;
            }
            if original == *edited {
                report.removed.push(path);
            }
        }

        for diagnostic in &report.diagnostics {
            log::warn!("Duplicate removal kept {diagnostic}");
        }
        for path in &report.removed {
            self.edited.remove(path);
            self.removed.insert(path.clone());
        }
        if !report.removed.is_empty() {
            log::info!("Removed {} unchanged images", report.removed.len());
            self.dirty = true;
            self.events.push(StoreEvent::AllChanged);
        }
        Ok(report)
    }
}

/// File moves of one save. Existing files are moved aside before anything is
/// installed so a failure at any step can put the pack back as it was.
#[derive(Default)]
struct Commit {
    /// Staging file and its final destination.
    staged: Vec<(PathBuf, PathBuf)>,
    /// Moved-aside file and its backup location.
    backups: Vec<(PathBuf, PathBuf)>,
    installed: Vec<PathBuf>,
}

impl Commit {
    /// Moves overwritten and deleted files aside, then installs the staged ones.
    fn apply(&mut self, deleted: &[PathBuf]) -> Result<(), StoreError> {
        let replaced: Vec<PathBuf> = self
            .staged
            .iter()
            .map(|(_, destination)| destination.clone())
            .filter(|destination| destination.exists())
            .collect();
        for path in replaced.iter().chain(deleted) {
            let backup = sibling_path(path, BACKUP_SUFFIX);
            fs::rename(path, &backup).map_err(|err| StoreError::io(path, err))?;
            self.backups.push((path.clone(), backup));
        }

        for (staging, destination) in &self.staged {
            fs::rename(staging, destination).map_err(|err| StoreError::io(destination, err))?;
            self.installed.push(destination.clone());
        }
        Ok(())
    }

    fn roll_back(self) {
        for path in &self.installed {
            remove_logged(path);
        }
        for (staging, _) in &self.staged {
            if staging.exists() {
                remove_logged(staging);
            }
        }
        for (path, backup) in self.backups.iter().rev() {
            if let Err(err) = fs::rename(backup, path) {
                log::error!(
                    "Could not restore {} from {}: {err}",
                    path.display(),
                    backup.display()
                );
            }
        }
    }

    fn finish(self) {
        for (_, backup) in &self.backups {
            remove_logged(backup);
        }
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_logged(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        log::warn!("Could not remove {}: {err}", path.display());
    }
}
