use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::paths::parent_folder;

/// What a vault path currently points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    NotFound,
    File,
    Folder,
}

/// Error type for vault access
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("note not found: {0}")]
    NotFound(String),
    #[error("{0} is a folder, not a note")]
    NotAFile(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0} points outside the vault")]
    OutsideVault(String),
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl VaultError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound(_))
    }
}

/// File access the planner needs from its host. Paths are vault-relative
/// and use `/` separators.
pub trait Vault {
    fn stat(&self, path: &str) -> Entry;
    fn read(&self, path: &str) -> Result<String, VaultError>;
    /// Replace the whole content of an existing note.
    fn write(&mut self, path: &str, content: &str) -> Result<(), VaultError>;
    /// Create a new note; fails if something already exists at `path`.
    fn create(&mut self, path: &str, content: &str) -> Result<(), VaultError>;
    /// Create a folder and any missing parents.
    fn create_folder(&mut self, path: &str) -> Result<(), VaultError>;

    fn exists(&self, path: &str) -> bool {
        self.stat(path) != Entry::NotFound
    }
}

/// A vault rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsVault { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, VaultError> {
        Ok(segments(path)?
            .into_iter()
            .fold(self.root.clone(), |acc, seg| acc.join(seg)))
    }

    fn io_error(&self, path: &str, source: std::io::Error) -> VaultError {
        VaultError::Io {
            path: self.root.join(path),
            source,
        }
    }
}

/// Segments of a vault-relative path. `..` is refused so nothing resolves
/// above the vault root; empty and `.` segments are dropped.
fn segments(path: &str) -> Result<Vec<&str>, VaultError> {
    let mut out = Vec::new();
    for seg in path.split(['/', '\\']) {
        match seg {
            "" | "." => {}
            ".." => return Err(VaultError::OutsideVault(path.to_string())),
            _ => out.push(seg),
        }
    }
    Ok(out)
}

impl Vault for FsVault {
    fn stat(&self, path: &str) -> Entry {
        let Ok(full) = self.full_path(path) else {
            return Entry::NotFound;
        };
        if full.is_dir() {
            Entry::Folder
        } else if full.is_file() {
            Entry::File
        } else {
            Entry::NotFound
        }
    }

    fn read(&self, path: &str) -> Result<String, VaultError> {
        match self.stat(path) {
            Entry::NotFound => Err(VaultError::NotFound(path.to_string())),
            Entry::Folder => Err(VaultError::NotAFile(path.to_string())),
            Entry::File => {
                fs::read_to_string(self.full_path(path)?).map_err(|e| self.io_error(path, e))
            }
        }
    }

    fn write(&mut self, path: &str, content: &str) -> Result<(), VaultError> {
        match self.stat(path) {
            Entry::NotFound => Err(VaultError::NotFound(path.to_string())),
            Entry::Folder => Err(VaultError::NotAFile(path.to_string())),
            Entry::File => atomic_write(&self.full_path(path)?, content.as_bytes())
                .map_err(|e| self.io_error(path, e)),
        }
    }

    fn create(&mut self, path: &str, content: &str) -> Result<(), VaultError> {
        let full = self.full_path(path)?;
        if self.exists(path) {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        if let Some(folder) = parent_folder(path)
            && self.stat(folder) == Entry::NotFound
        {
            return Err(VaultError::NotFound(folder.to_string()));
        }
        atomic_write(&full, content.as_bytes()).map_err(|e| self.io_error(path, e))
    }

    fn create_folder(&mut self, path: &str) -> Result<(), VaultError> {
        let full = self.full_path(path)?;
        if self.stat(path) == Entry::File {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        fs::create_dir_all(full).map_err(|e| self.io_error(path, e))
    }
}

/// A vault held in memory, for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    files: BTreeMap<String, String>,
    folders: BTreeSet<String>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note, creating its folders.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.add_folders(parent_folder(path));
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|s| s.as_str())
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn add_folders(&mut self, folder: Option<&str>) {
        let mut current = folder;
        while let Some(f) = current {
            self.folders.insert(f.to_string());
            current = parent_folder(f);
        }
    }
}

impl Vault for MemoryVault {
    fn stat(&self, path: &str) -> Entry {
        if self.files.contains_key(path) {
            Entry::File
        } else if self.folders.contains(path) {
            Entry::Folder
        } else {
            Entry::NotFound
        }
    }

    fn read(&self, path: &str) -> Result<String, VaultError> {
        match self.stat(path) {
            Entry::File => Ok(self.files[path].clone()),
            Entry::Folder => Err(VaultError::NotAFile(path.to_string())),
            Entry::NotFound => Err(VaultError::NotFound(path.to_string())),
        }
    }

    fn write(&mut self, path: &str, content: &str) -> Result<(), VaultError> {
        match self.files.get_mut(path) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None if self.folders.contains(path) => Err(VaultError::NotAFile(path.to_string())),
            None => Err(VaultError::NotFound(path.to_string())),
        }
    }

    fn create(&mut self, path: &str, content: &str) -> Result<(), VaultError> {
        segments(path)?;
        if self.exists(path) {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        if let Some(folder) = parent_folder(path)
            && !self.folders.contains(folder)
        {
            return Err(VaultError::NotFound(folder.to_string()));
        }
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn create_folder(&mut self, path: &str) -> Result<(), VaultError> {
        segments(path)?;
        if self.files.contains_key(path) {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        self.add_folders(Some(path));
        Ok(())
    }
}
