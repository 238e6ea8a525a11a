//! The `Services` context (spec section 9, "Global state" redesign note).
//!
//! The teacher reaches for a `shared` singleton wired through `std::env` and
//! direct `std::fs` calls (`src/main.rs`). Generalized here into a context
//! value passed explicitly to every public operation, so tests can swap in
//! recording/in-memory collaborators without touching global state.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::CoreResult;

/// A recoverable condition reported instead of aborting generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
  NoFilesMatchGlob { pattern: String },
  GlobPointsToDirectory { path: PathBuf },
  FolderReferenceNotDirectory { path: PathBuf },
  FolderReferenceMissing { path: PathBuf },
}

impl std::fmt::Display for Warning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Warning::NoFilesMatchGlob { pattern } =>
        write!(f, "No files found at: {}", pattern),
      Warning::GlobPointsToDirectory { path } =>
        write!(f, "{} is a directory, try using: '{}/**' to list its files", path.display(), path.display()),
      Warning::FolderReferenceNotDirectory { path } =>
        write!(f, "folder reference is not a directory: {}", path.display()),
      Warning::FolderReferenceMissing { path } =>
        write!(f, "folder reference does not exist: {}", path.display()),
    }
  }
}

pub trait Reporter {
  fn warn(&self, warning: Warning);
}

/// Production reporter: forwards every warning to `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
  fn warn(&self, warning: Warning) {
    tracing::warn!("{}", warning);
  }
}

/// Test reporter: records warnings for assertions instead of logging them.
#[derive(Default)]
pub struct RecordingReporter {
  pub warnings: RefCell<Vec<Warning>>,
}

impl Reporter for RecordingReporter {
  fn warn(&self, warning: Warning) {
    self.warnings.borrow_mut().push(warning);
  }
}

/// A filesystem entry as seen by [`FileSystem::glob`].
#[derive(Debug, Clone)]
pub struct DirEntryKind {
  pub path: PathBuf,
  pub is_dir: bool,
}

/// Narrow filesystem seam so the loader and path service are testable
/// without touching disk. Mirrors only the operations the core needs.
pub trait FileSystem {
  fn read_to_string(&self, path: &Path) -> CoreResult<String>;
  fn exists(&self, path: &Path) -> bool;
  fn is_dir(&self, path: &Path) -> bool;
  /// Enumerate entries directly reachable through `glob_pattern`, rooted at
  /// `root`. `glob_pattern` is an absolute path containing glob
  /// metacharacters (`*`, `{`, `}`).
  fn glob(&self, glob_pattern: &str) -> CoreResult<Vec<DirEntryKind>>;
}

pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
  fn read_to_string(&self, path: &Path) -> CoreResult<String> {
    std::fs::read_to_string(path)
      .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e).into())
  }

  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn glob(&self, glob_pattern: &str) -> CoreResult<Vec<DirEntryKind>> {
    let mut out = Vec::new();
    for entry in glob::glob(glob_pattern)
      .map_err(|e| anyhow::anyhow!("invalid glob pattern {}: {}", glob_pattern, e))?
    {
      let path = entry.map_err(|e| anyhow::anyhow!("glob walk error: {}", e))?;
      let is_dir = path.is_dir();
      out.push(DirEntryKind { path, is_dir });
    }
    Ok(out)
  }
}

/// An in-memory filesystem fixture for unit and scenario tests.
#[derive(Default)]
pub struct MemoryFileSystem {
  pub files: BTreeMap<PathBuf, String>,
  pub dirs: std::collections::BTreeSet<PathBuf>,
}

impl MemoryFileSystem {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
    let path = path.into();
    let mut dir = path.parent().map(Path::to_path_buf);
    while let Some(d) = dir {
      if !self.dirs.insert(d.clone()) {
        break;
      }
      dir = d.parent().map(Path::to_path_buf);
    }
    self.files.insert(path, contents.into());
    self
  }

  pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
    self.dirs.insert(path.into());
    self
  }
}

impl FileSystem for MemoryFileSystem {
  fn read_to_string(&self, path: &Path) -> CoreResult<String> {
    self.files.get(path).cloned()
      .ok_or_else(|| crate::error::CoreError::ManifestNotFound(path.to_path_buf()))
  }

  fn exists(&self, path: &Path) -> bool {
    self.files.contains_key(path) || self.dirs.contains(path)
  }

  fn is_dir(&self, path: &Path) -> bool {
    self.dirs.contains(path)
  }

  fn glob(&self, glob_pattern: &str) -> CoreResult<Vec<DirEntryKind>> {
    let pattern = glob::Pattern::new(glob_pattern)
      .map_err(|e| anyhow::anyhow!("invalid glob pattern {}: {}", glob_pattern, e))?;
    let mut out = Vec::new();
    for path in self.files.keys() {
      if pattern.matches_path(path) {
        out.push(DirEntryKind { path: path.clone(), is_dir: false });
      }
    }
    for path in &self.dirs {
      if pattern.matches_path(path) {
        out.push(DirEntryKind { path: path.clone(), is_dir: true });
      }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
  }
}

/// Threaded through every public operation; see the module doc comment.
pub struct Services<'a> {
  pub reporter: &'a dyn Reporter,
  pub fs: &'a dyn FileSystem,
  pub user_name: &'a str,
}

impl<'a> Services<'a> {
  pub fn new(reporter: &'a dyn Reporter, fs: &'a dyn FileSystem, user_name: &'a str) -> Self {
    Services { reporter, fs, user_name }
  }
}
