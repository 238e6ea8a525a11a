//! Manifest loader (spec 4.B) and manifest value types (spec section 3).
//!
//! Each `load_*` operation parses one file into a typed manifest value or
//! fails with `ManifestNotFound`. This is the value-level boundary: nothing
//! here executes user code, it only deserializes TOML (the teacher's
//! `main.rs` does the same `toml::from_slice(...)` for `Jank.toml`).

pub mod config;
pub mod dependency;
pub mod project;
pub mod workspace;

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::services::Services;

pub use config::ConfigManifest;
pub use project::ProjectManifest;
pub use workspace::WorkspaceManifest;

pub const PROJECT_FILE_NAME: &str = "Project.toml";
pub const WORKSPACE_FILE_NAME: &str = "Workspace.toml";
pub const CONFIG_FILE_NAME: &str = "Config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ManifestKind {
  Project,
  Workspace,
  Config,
}

fn read(services: &Services, path: &Path) -> CoreResult<String> {
  if !services.fs.exists(path) {
    return Err(CoreError::ManifestNotFound(path.to_path_buf()));
  }
  services.fs.read_to_string(path)
}

pub fn load_project(services: &Services, path: &Path) -> CoreResult<ProjectManifest> {
  let text = read(services, path)?;
  toml::from_str(&text)
    .map_err(|e| anyhow::anyhow!("failed to parse project manifest {}: {}", path.display(), e).into())
}

pub fn load_workspace(services: &Services, path: &Path) -> CoreResult<WorkspaceManifest> {
  let text = read(services, path)?;
  toml::from_str(&text)
    .map_err(|e| anyhow::anyhow!("failed to parse workspace manifest {}: {}", path.display(), e).into())
}

pub fn load_config(services: &Services, path: &Path) -> CoreResult<ConfigManifest> {
  if !services.fs.exists(path) {
    return Ok(ConfigManifest::default_config());
  }
  let text = read(services, path)?;
  toml::from_str(&text)
    .map_err(|e| anyhow::anyhow!("failed to parse config manifest {}: {}", path.display(), e).into())
}

pub fn load_template(services: &Services, path: &Path) -> CoreResult<toml::Value> {
  let text = read(services, path)?;
  toml::from_str(&text)
    .map_err(|e| anyhow::anyhow!("failed to parse template {}: {}", path.display(), e).into())
}

/// Which manifest kinds are present in directory `path`.
pub fn manifests_at(services: &Services, path: &Path) -> BTreeSet<ManifestKind> {
  let mut out = BTreeSet::new();
  if services.fs.exists(&path.join(PROJECT_FILE_NAME)) {
    out.insert(ManifestKind::Project);
  }
  if services.fs.exists(&path.join(WORKSPACE_FILE_NAME)) {
    out.insert(ManifestKind::Workspace);
  }
  if services.fs.exists(&path.join(CONFIG_FILE_NAME)) {
    out.insert(ManifestKind::Config);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::{MemoryFileSystem, RecordingReporter};

  #[test]
  fn load_project_reports_manifest_not_found() {
    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");

    let err = load_project(&services, Path::new("/root/Project.toml")).unwrap_err();
    assert!(matches!(err, CoreError::ManifestNotFound(_)));
  }

  #[test]
  fn load_config_defaults_when_absent() {
    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");

    let config = load_config(&services, Path::new("/root/Config.toml")).unwrap();
    assert!(config.generation_options.is_empty());
    assert!(config.cloud.is_none());
  }

  #[test]
  fn manifests_at_reports_present_kinds() {
    let fs = MemoryFileSystem::new()
      .with_file("/root/Project.toml", "name = \"X\"");
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");

    let kinds = manifests_at(&services, Path::new("/root"));
    assert!(kinds.contains(&ManifestKind::Project));
    assert!(!kinds.contains(&ManifestKind::Workspace));
  }
}
