//! Read-only providers of original assets.
//!
//! The store never talks to an archive directly; it holds a boxed [`AssetSource`]
//! which can be swapped when the user opens a different base archive.

use crate::error::SourceError;
use crate::pixel_grid::{is_image_path, PixelGrid};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// A read-only container of named byte streams.
pub trait AssetSource {
    /// Image entries (recognised extension), sorted.
    fn entries(&self) -> &[String];

    /// True if `path` names any entry of the container.
    fn exists(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<Vec<u8>, SourceError>;

    /// Human readable origin, used in log messages.
    fn describe(&self) -> String;
}

/// Lists every file below `root` as a forward-slash relative path, sorted.
pub fn find_files_in_dir(root: &Path) -> std::io::Result<Vec<String>> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                walk(root, &path, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort();
    Ok(files)
}

fn image_entries<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut images: Vec<String> = names.filter(|n| is_image_path(n)).cloned().collect();
    images.sort();
    images
}

// ─────────────────────────────────────────────────────────────────────────────
// Zip archives (.jar / .zip)
// ─────────────────────────────────────────────────────────────────────────────

/// A zip archive read lazily: entries are only inflated when requested.
pub struct ZipSource<R = BufReader<File>> {
    label: String,
    archive: RefCell<ZipArchive<R>>,
    names: HashSet<String>,
    images: Vec<String>,
}

impl ZipSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let source = Self::from_reader(BufReader::new(file), path.display().to_string())?;
        log::info!(
            "Opened archive {} ({} images)",
            path.display(),
            source.images.len()
        );
        Ok(source)
    }
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn from_reader(reader: R, label: impl Into<String>) -> Result<Self, SourceError> {
        let archive = ZipArchive::new(reader)?;
        let names: HashSet<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        let images = image_entries(names.iter());
        Ok(Self {
            label: label.into(),
            archive: RefCell::new(archive),
            names,
            images,
        })
    }
}

impl<R: Read + Seek> AssetSource for ZipSource<R> {
    fn entries(&self) -> &[String] {
        &self.images
    }

    fn exists(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        if !self.exists(path) {
            return Err(SourceError::MissingEntry(path.to_string()));
        }
        let mut archive = self.archive.borrow_mut();
        let mut entry = archive.by_name(path)?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unpacked directories
// ─────────────────────────────────────────────────────────────────────────────

/// An unpacked base pack on disk. The file list is captured when opened.
pub struct DirectorySource {
    root: PathBuf,
    names: HashSet<String>,
    images: Vec<String>,
}

impl DirectorySource {
    pub fn open(root: &Path) -> Result<Self, SourceError> {
        let names: HashSet<String> = find_files_in_dir(root)?.into_iter().collect();
        let images = image_entries(names.iter());
        log::info!("Opened directory {} ({} images)", root.display(), images.len());
        Ok(Self {
            root: root.to_path_buf(),
            names,
            images,
        })
    }
}

impl AssetSource for DirectorySource {
    fn entries(&self) -> &[String] {
        &self.images
    }

    fn exists(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        if !self.exists(path) {
            return Err(SourceError::MissingEntry(path.to_string()));
        }
        Ok(fs::read(self.root.join(path))?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Entries held in memory; handy for headless use and tests.
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
    images: Vec<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
        self.images = image_entries(self.files.keys());
    }

    /// Stores `grid` PNG-encoded under `path`.
    pub fn insert_grid(&mut self, path: impl Into<String>, grid: &PixelGrid) {
        let mut bytes = std::io::Cursor::new(Vec::new());
        match grid.as_image().write_to(&mut bytes, image::ImageFormat::Png) {
            Ok(()) => self.insert(path, bytes.into_inner()),
            Err(err) => log::warn!("Could not encode in-memory asset: {err}"),
        }
    }
}

impl AssetSource for MemorySource {
    fn entries(&self) -> &[String] {
        &self.images
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::MissingEntry(path.to_string()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("assets/", SimpleFileOptions::default())
            .unwrap();
        for (name, bytes) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_source_lists_images_only() {
        let bytes = build_zip(&[
            ("assets/b.png", b"b"),
            ("assets/a.png", b"a"),
            ("pack.mcmeta", b"{}"),
        ]);
        let source = ZipSource::from_reader(Cursor::new(bytes), "test.jar").unwrap();

        assert_eq!(source.entries(), ["assets/a.png", "assets/b.png"]);
        assert!(source.exists("pack.mcmeta"));
        assert!(!source.exists("assets/"));
        assert!(!source.exists("assets/c.png"));
        assert_eq!(source.read("assets/b.png").unwrap(), b"b");
        assert!(matches!(
            source.read("assets/c.png"),
            Err(SourceError::MissingEntry(_))
        ));
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new();
        source.insert("z.png", vec![1]);
        source.insert("notes.txt", vec![2]);
        source.insert("a/b.png", vec![3]);

        assert_eq!(source.entries(), ["a/b.png", "z.png"]);
        assert!(source.exists("notes.txt"));
        assert_eq!(source.read("a/b.png").unwrap(), vec![3]);
    }

    #[test]
    fn test_directory_source_relative_paths() {
        let root = std::env::temp_dir().join(format!("pack-skinner-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("assets/minecraft")).unwrap();
        fs::write(root.join("pack.png"), b"p").unwrap();
        fs::write(root.join("assets/minecraft/stone.png"), b"s").unwrap();
        fs::write(root.join("assets/minecraft/readme.txt"), b"r").unwrap();

        let source = DirectorySource::open(&root).unwrap();
        assert_eq!(source.entries(), ["assets/minecraft/stone.png", "pack.png"]);
        assert!(source.exists("assets/minecraft/readme.txt"));
        assert_eq!(source.read("assets/minecraft/stone.png").unwrap(), b"s");

        fs::remove_dir_all(&root).unwrap();
    }
}
