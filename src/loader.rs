//! Recursive manifest loader (spec 4.C).
//!
//! Walks the project-dependency graph starting from one or more root
//! paths, loading each `Project.toml` at most once. Cycles are tolerated
//! by the cache short-circuit — this is a loader, not a cycle detector
//! (that's `crate::graph`, which walks the already-loaded set).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::CoreResult;
use crate::external::DependenciesGraph;
use crate::manifest::{self, ProjectManifest, WorkspaceManifest};
use crate::manifest::dependency::DependencyManifest;
use crate::path;
use crate::services::Services;

/// Every `Project.toml` reached by recursively following `project`
/// dependencies and `external` dependencies that resolve to a local
/// source checkout, keyed by the manifest's directory.
#[derive(Debug, Default)]
pub struct LoadedProjects {
  pub projects: BTreeMap<PathBuf, ProjectManifest>,
}

/// Outgoing project-dependency edges for one loaded manifest: paths to
/// push onto the work stack next.
fn outgoing_project_paths(dir: &Path, manifest: &ProjectManifest, deps_graph: &DependenciesGraph) -> Vec<PathBuf> {
  let mut out = Vec::new();
  for target in manifest.targets.values() {
    for dep in &target.dependencies {
      match dep {
        DependencyManifest::Project { path, .. } => out.push(dir.join(path)),
        DependencyManifest::External { name } => {
          if let Some(edges) = deps_graph.external_dependencies.get(name) {
            for edge in edges {
              if let crate::model::Dependency::Project { path, .. } = edge {
                out.push(path.clone());
              }
              // xcframework-resolved external dependencies contribute no
              // further project to load.
            }
          }
        }
        _ => {}
      }
    }
  }
  out
}

/// `load_project(root_path, deps_graph)`: loads `root_path` and every
/// project transitively reachable from it.
pub fn load_project(services: &Services, root_path: &Path, deps_graph: &DependenciesGraph) -> CoreResult<LoadedProjects> {
  load_many(services, vec![root_path.to_path_buf()], deps_graph)
}

fn load_many(services: &Services, initial: Vec<PathBuf>, deps_graph: &DependenciesGraph) -> CoreResult<LoadedProjects> {
  let mut cache: BTreeMap<PathBuf, ProjectManifest> = BTreeMap::new();
  let mut stack = initial;

  while let Some(dir) = stack.pop() {
    if cache.contains_key(&dir) {
      continue;
    }
    let manifest_path = dir.join(manifest::PROJECT_FILE_NAME);
    let parsed = manifest::load_project(services, &manifest_path)?;
    stack.extend(outgoing_project_paths(&dir, &parsed, deps_graph));
    cache.insert(dir, parsed);
  }

  Ok(LoadedProjects { projects: cache })
}

/// `load_workspace(root_path, deps_graph)`: expands the workspace's
/// `projects` list against `root_path`, globs each entry, keeps only
/// directories that actually contain a `Project.toml`, then recursively
/// loads from there.
pub fn load_workspace(services: &Services, root_path: &Path, deps_graph: &DependenciesGraph) -> CoreResult<(WorkspaceManifest, LoadedProjects)> {
  let manifest_path = root_path.join(manifest::WORKSPACE_FILE_NAME);
  let workspace = manifest::load_workspace(services, &manifest_path)?;

  let mut roots = Vec::new();
  for entry in &workspace.projects {
    for candidate in path::glob(services, root_path, entry) {
      if services.fs.exists(&candidate.join(manifest::PROJECT_FILE_NAME)) {
        roots.push(candidate);
      }
    }
  }

  let loaded = load_many(services, roots, deps_graph)?;
  Ok((workspace, loaded))
}
