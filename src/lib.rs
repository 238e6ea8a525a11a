//! `xcodegraph`: reads declarative `Project.toml`/`Workspace.toml`/
//! `Config.toml` manifests and produces a container-format-agnostic
//! description of the Xcode-native workspace they describe (spec section 1).
//!
//! The pipeline, end to end:
//!   manifest loading (4.B/4.C) -> external dependencies (4.D) ->
//!   manifest -> model (4.E) -> target graph (4.F) -> project mappers
//!   (4.G) -> graph mappers (4.H) -> descriptors (4.I).
//! Every stage is exposed as its own module so callers (the CLI binary,
//! tests) can drive only the part they need.

pub mod descriptor;
pub mod error;
pub mod external;
pub mod graph;
pub mod loader;
pub mod manifest;
pub mod mappers;
pub mod model;
pub mod path;
pub mod services;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use error::CoreResult;
use external::{DependenciesGraph, PackageInfoLoader};
use manifest::project::{Platform, Product};
use manifest::ConfigManifest;
use mappers::SideEffectDescriptor;
use model::Project;
use services::Services;

pub const WORKSPACE_STATE_FILE_NAME: &str = "workspace-state.json";

/// Result of running the whole pipeline: the descriptors a concrete writer
/// serializes, plus the filesystem side effects the mapper pipeline
/// requested along the way (spec 4.G: deferred, declarative mutation).
pub struct GenerationResult {
  pub descriptor: descriptor::GraphDescriptor,
  pub side_effects: Vec<SideEffectDescriptor>,
}

fn load_external_dependencies(
  services: &Services,
  root: &Path,
  loader: &dyn PackageInfoLoader,
  configured_platforms: &[Platform],
  product_overrides: &BTreeMap<String, Product>,
) -> CoreResult<DependenciesGraph> {
  if !services.fs.exists(&root.join(WORKSPACE_STATE_FILE_NAME)) {
    return Ok(DependenciesGraph::default());
  }
  external::generate(services, root, loader, configured_platforms, product_overrides)
}

/// Generates every descriptor for the workspace or standalone project
/// rooted at `root`. `configured_platforms`/`product_overrides` feed the
/// external-dependencies generator (4.D); pass an empty slice/map when the
/// manifest tree has no `workspace-state.json`.
pub fn generate(
  services: &Services,
  root: &Path,
  loader: &dyn PackageInfoLoader,
  configured_platforms: &[Platform],
  product_overrides: &BTreeMap<String, Product>,
) -> CoreResult<GenerationResult> {
  let config_path = root.join(manifest::CONFIG_FILE_NAME);
  let config = manifest::load_config(services, &config_path)?;

  let kinds = manifest::manifests_at(services, root);
  let deps_graph = load_external_dependencies(services, root, loader, configured_platforms, product_overrides)?;

  let (workspace_manifest, loaded) = if kinds.contains(&manifest::ManifestKind::Workspace) {
    let (w, loaded) = loader::load_workspace(services, root, &deps_graph)?;
    (Some(w), loaded)
  } else {
    (None, loader::load_project(services, root, &deps_graph)?)
  };

  let mut projects: BTreeMap<PathBuf, Project> = BTreeMap::new();
  for (dir, project_manifest) in &loaded.projects {
    projects.insert(dir.clone(), model::convert::convert_project(services, dir, project_manifest)?);
  }
  projects.extend(deps_graph.external_projects.clone());

  let mut side_effects = Vec::new();
  let mut mapped_projects: BTreeMap<PathBuf, Project> = BTreeMap::new();
  for (dir, project) in projects {
    let (mapped, mut effects) = mappers::run(services, &config, project)?;
    side_effects.append(&mut effects);
    mapped_projects.insert(dir, mapped);
  }

  let workspace_model = workspace_manifest.as_ref().map(|w| {
    let project_paths: Vec<PathBuf> = mapped_projects.keys().cloned().collect();
    model::convert::convert_workspace(root, w, project_paths, &mapped_projects)
  });

  let graph = graph::Graph::new(workspace_model, mapped_projects, deps_graph)?;
  let graph = mappers::graph_mappers::run(services, &config, graph)?;

  let descriptor = descriptor::describe(services, &graph, &config)?;

  Ok(GenerationResult { descriptor, side_effects })
}

#[cfg(test)]
mod tests {
  use super::*;
  use external::package_info::PackageInfo;
  use services::{MemoryFileSystem, RecordingReporter};

  struct NeverLoader;
  impl PackageInfoLoader for NeverLoader {
    fn load(&self, _folder: &Path) -> CoreResult<PackageInfo> {
      unreachable!("no workspace-state.json present, loader should not be invoked")
    }
  }

  #[test]
  fn generates_single_app_project_with_autogenerated_scheme() {
    let fs = MemoryFileSystem::new().with_file(
      "/root/Project.toml",
      r#"
        name = "App"
        [targets.App]
        platform = "ios"
        product = "app"
        bundle_id = "com.example.app"
        sources = ["Sources/**"]
      "#,
    ).with_file("/root/Sources/AppDelegate.swift", "");
    let reporter = RecordingReporter::default();
    let svc = Services::new(&reporter, &fs, "tester");

    let result = generate(&svc, Path::new("/root"), &NeverLoader, &[], &BTreeMap::new()).unwrap();
    let project = &result.descriptor.projects[0];
    assert_eq!(project.targets.len(), 1);
    assert!(project.shared_schemes.iter().any(|s| s.name == "App"));
  }
}
