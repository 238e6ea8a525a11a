//! Path & glob service (spec 4.A).
//!
//! The teacher resolves globs ad hoc inside `main.rs::find_files`, stripping
//! a Windows verbatim prefix and joining patterns by hand. Generalized here
//! into a standalone, `Services`-driven component so the same algorithm
//! backs both the manifest converter (4.E) and the external-dependencies
//! generator (4.D).

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::services::Services;

/// Longest glob-metacharacter-free prefix of `pattern`, e.g. `"Sources/**"`
/// yields `"Sources"`, and `"a/{b,c}/*.h"` yields `"a"`.
fn literal_prefix(pattern: &str) -> &str {
  match pattern.find(['*', '{', '}']) {
    None => pattern,
    Some(i) => {
      let prefix = &pattern[..i];
      match prefix.rfind('/') {
        Some(slash) => &prefix[..slash],
        None => "",
      }
    }
  }
}

/// Expands `pattern` (relative to `root`) to absolute paths. Never fails:
/// a non-existent root yields an empty list, as would a pattern matching no
/// files.
pub fn glob(services: &Services, root: &Path, pattern: &str) -> Vec<PathBuf> {
  throwing_glob(services, root, pattern).unwrap_or_default()
}

/// Like [`glob`], but reports `NonExistentGlobDirectory` when the literal
/// (non-wildcard) prefix of `pattern` does not resolve to a directory.
pub fn throwing_glob(services: &Services, root: &Path, pattern: &str) -> CoreResult<Vec<PathBuf>> {
  let prefix = literal_prefix(pattern);
  let resolved_prefix = if prefix.is_empty() { root.to_path_buf() } else { root.join(prefix) };

  if !services.fs.exists(&resolved_prefix) {
    return Err(CoreError::NonExistentGlobDirectory {
      pattern: pattern.to_string(),
      resolved_root: resolved_prefix,
    });
  }

  let full_pattern = root.join(pattern);
  let full_pattern_str = full_pattern.to_str()
    .ok_or_else(|| anyhow::anyhow!("pattern is not valid UTF-8: {:?}", full_pattern))?;

  let mut out: Vec<PathBuf> = services.fs.glob(full_pattern_str)?
    .into_iter()
    .map(|entry| entry.path)
    .collect();
  out.sort();
  Ok(out)
}

/// Longest common ancestor directory of two absolute paths.
pub fn common_ancestor(a: &Path, b: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for (ca, cb) in a.components().zip(b.components()) {
    if ca != cb {
      break;
    }
    out.push(ca);
  }
  out
}

pub fn remove_last_component(path: &Path) -> PathBuf {
  path.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new)
}

pub fn is_folder(services: &Services, path: &Path) -> bool {
  services.fs.is_dir(path)
}

/// Splits `"Target.Config.ext"` into `(target, config)`, but only when
/// exactly two dot-separated components precede the extension.
pub fn extract_target_and_configuration_name(filename: &str) -> Option<(&str, &str)> {
  let stem = match filename.rfind('.') {
    Some(i) => &filename[..i],
    None => return None,
  };
  let mut parts = stem.split('.');
  let target = parts.next()?;
  let config = parts.next()?;
  if parts.next().is_some() {
    return None;
  }
  Some((target, config))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::{MemoryFileSystem, RecordingReporter};

  fn services(fs: &MemoryFileSystem, reporter: &RecordingReporter) -> Services<'_> {
    Services::new(reporter, fs, "tester")
  }

  #[test]
  fn glob_expands_matching_files_sorted() {
    let fs = MemoryFileSystem::new()
      .with_file("/root/Sources/public/A2.h", "")
      .with_file("/root/Sources/public/A1.h", "")
      .with_file("/root/Sources/public/A1.m", "");
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let files = throwing_glob(&svc, Path::new("/root"), "Sources/public/*.h").unwrap();
    assert_eq!(files, vec![
      PathBuf::from("/root/Sources/public/A1.h"),
      PathBuf::from("/root/Sources/public/A2.h"),
    ]);
  }

  #[test]
  fn throwing_glob_reports_non_existent_root() {
    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let err = throwing_glob(&svc, Path::new("/root"), "Missing/**").unwrap_err();
    match err {
      CoreError::NonExistentGlobDirectory { pattern, resolved_root } => {
        assert_eq!(pattern, "Missing/**");
        assert_eq!(resolved_root, PathBuf::from("/root/Missing"));
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn glob_with_no_matches_is_empty_not_an_error() {
    let fs = MemoryFileSystem::new().with_dir("/root/Sources");
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let files = glob(&svc, Path::new("/root"), "Sources/*.nonexistent");
    assert!(files.is_empty());
  }

  #[test]
  fn extracts_target_and_configuration_name() {
    assert_eq!(extract_target_and_configuration_name("App.Debug.xcconfig"), Some(("App", "Debug")));
    assert_eq!(extract_target_and_configuration_name("App.xcconfig"), None);
    assert_eq!(extract_target_and_configuration_name("App.Debug.Extra.xcconfig"), None);
  }
}
