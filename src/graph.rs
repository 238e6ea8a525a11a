//! Graph loader (spec 4.F).
//!
//! Builds the target-dependency graph from `{workspace, projects[]}` plus
//! the external-dependencies graph (4.D), resolving every dependency edge
//! and detecting cycles by DFS with coloring.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::external::DependenciesGraph;
use crate::manifest::dependency::SdkStatus;
use crate::model::{Dependency, Product, Project, TargetReference, Workspace};

/// One resolved dependency edge (spec 4.F: target / pre-compiled /
/// SDK / package product).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDependency {
  Target(TargetReference),
  PreCompiled(PathBuf),
  Sdk { name: String, status: SdkStatus },
  PackageProduct { name: String },
}

pub struct Graph {
  pub workspace: Option<Workspace>,
  pub projects: BTreeMap<PathBuf, Project>,
  external: DependenciesGraph,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
  White,
  Gray,
  Black,
}

impl Graph {
  pub fn new(workspace: Option<Workspace>, projects: BTreeMap<PathBuf, Project>, external: DependenciesGraph) -> CoreResult<Self> {
    let graph = Graph { workspace, projects, external };
    graph.check_cycles()?;
    Ok(graph)
  }

  /// Decompose back into the parts `new` takes, for graph mappers (spec
  /// 4.H) that rebuild a `Graph` after rewriting `projects`.
  pub fn into_parts(self) -> (Option<Workspace>, BTreeMap<PathBuf, Project>, DependenciesGraph) {
    (self.workspace, self.projects, self.external)
  }

  fn resolve_one(&self, project_path: &Path, dep: &Dependency) -> Vec<ResolvedDependency> {
    match dep {
      Dependency::Target { name } =>
        vec![ResolvedDependency::Target(TargetReference { project_path: project_path.to_path_buf(), target_name: name.clone() })],
      Dependency::Project { name, path } =>
        vec![ResolvedDependency::Target(TargetReference { project_path: path.clone(), target_name: name.clone() })],
      Dependency::Framework { path } | Dependency::Xcframework { path } | Dependency::Cocoapods { path } =>
        vec![ResolvedDependency::PreCompiled(path.clone())],
      Dependency::Library { path, .. } => vec![ResolvedDependency::PreCompiled(path.clone())],
      Dependency::Sdk { name, status } => vec![ResolvedDependency::Sdk { name: name.clone(), status: *status }],
      Dependency::PackageProduct { name } => vec![ResolvedDependency::PackageProduct { name: name.clone() }],
      Dependency::External { name } => self.external.external_dependencies.get(name)
        .into_iter()
        .flatten()
        .flat_map(|edge| self.resolve_one(project_path, edge))
        .collect(),
    }
  }

  /// Direct dependencies of `target_name` in `project_path`, insertion
  /// order from the manifest.
  pub fn target_dependencies(&self, project_path: &Path, target_name: &str) -> CoreResult<Vec<ResolvedDependency>> {
    let target = self.find_target(project_path, target_name)?;
    Ok(target.dependencies.iter().flat_map(|d| self.resolve_one(project_path, d)).collect())
  }

  fn find_target(&self, project_path: &Path, target_name: &str) -> CoreResult<&crate::model::Target> {
    self.projects.get(project_path)
      .and_then(|p| p.target(target_name))
      .ok_or_else(|| CoreError::Other(anyhow::anyhow!(
        "no such target {} in project {}", target_name, project_path.display()
      )))
  }

  fn product_of(&self, reference: &TargetReference) -> Option<Product> {
    self.projects.get(&reference.project_path)?.target(&reference.target_name).map(|t| t.product)
  }

  fn is_linkable_product(product: Product) -> bool {
    matches!(product, Product::Framework | Product::StaticFramework | Product::StaticLibrary | Product::DynamicLibrary)
  }

  /// Transitive closure of `target_dependencies`, filtered to linkable
  /// products (spec 4.F: "`linkable_dependencies`").
  pub fn linkable_dependencies(&self, project_path: &Path, target_name: &str) -> CoreResult<Vec<ResolvedDependency>> {
    let mut out = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    let mut stack = self.target_dependencies(project_path, target_name)?;
    stack.reverse();

    while let Some(dep) = stack.pop() {
      match &dep {
        ResolvedDependency::Target(reference) => {
          if !seen.insert(reference.clone()) {
            continue;
          }
          if self.product_of(reference).is_some_and(Self::is_linkable_product) {
            out.push(dep.clone());
          }
          let mut next = self.target_dependencies(&reference.project_path, &reference.target_name)?;
          next.reverse();
          stack.extend(next);
        }
        ResolvedDependency::PreCompiled(_) | ResolvedDependency::Sdk { .. } | ResolvedDependency::PackageProduct { .. } =>
          out.push(dep),
      }
    }
    Ok(out)
  }

  fn check_cycles(&self) -> CoreResult<()> {
    let mut colors: BTreeMap<TargetReference, Color> = BTreeMap::new();

    for (path, project) in &self.projects {
      for target in &project.targets {
        let root = TargetReference { project_path: path.clone(), target_name: target.name.clone() };
        if !matches!(colors.get(&root), Some(Color::Black)) {
          self.visit(&root, &mut colors)?;
        }
      }
    }
    Ok(())
  }

  fn visit(&self, node: &TargetReference, colors: &mut BTreeMap<TargetReference, Color>) -> CoreResult<()> {
    match colors.get(node) {
      Some(Color::Gray) => return Err(CoreError::CyclicDependency(node.project_path.clone())),
      Some(Color::Black) => return Ok(()),
      _ => {}
    }
    colors.insert(node.clone(), Color::Gray);

    if let Ok(deps) = self.target_dependencies(&node.project_path, &node.target_name) {
      for dep in deps {
        if let ResolvedDependency::Target(next) = dep {
          self.visit(&next, colors)?;
        }
      }
    }

    colors.insert(node.clone(), Color::Black);
    Ok(())
  }
}

impl std::cmp::PartialOrd for TargetReference {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl std::cmp::Ord for TargetReference {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    (&self.project_path, &self.target_name).cmp(&(&other.project_path, &other.target_name))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::project::{Platform, Product as ManifestProduct};
  use crate::model::{Actions, ResourceSynthesizers, Settings};

  fn target(name: &str, product: ManifestProduct, dependencies: Vec<Dependency>) -> crate::model::Target {
    crate::model::Target {
      name: name.to_string(),
      platform: Platform::Ios,
      product,
      bundle_id: String::new(),
      deployment_target: None,
      info_plist: None,
      entitlements: None,
      sources: vec![],
      resources: vec![],
      headers: None,
      dependencies,
      settings: Settings::default(),
      environment: BTreeMap::new(),
      launch_arguments: vec![],
      core_data_models: vec![],
      actions: Actions::default(),
    }
  }

  fn project(path: &str, targets: Vec<crate::model::Target>) -> Project {
    Project {
      path: PathBuf::from(path),
      name: path.to_string(),
      organization_name: None,
      targets,
      schemes: vec![],
      settings: Settings::default(),
      additional_files: vec![],
      resource_synthesizers: ResourceSynthesizers::default(),
      default_debug_build_configuration_name: "Debug".to_string(),
      file_name: path.to_string(),
    }
  }

  #[test]
  fn detects_cyclic_dependency() {
    let mut projects = BTreeMap::new();
    projects.insert(PathBuf::from("/p"), project("/p", vec![
      target("A", ManifestProduct::Framework, vec![Dependency::Target { name: "B".into() }]),
      target("B", ManifestProduct::Framework, vec![Dependency::Target { name: "A".into() }]),
    ]));

    let err = Graph::new(None, projects, DependenciesGraph::default()).unwrap_err();
    assert!(matches!(err, CoreError::CyclicDependency(_)));
  }

  #[test]
  fn linkable_dependencies_excludes_app_transitively() {
    let mut projects = BTreeMap::new();
    projects.insert(PathBuf::from("/p"), project("/p", vec![
      target("App", ManifestProduct::App, vec![Dependency::Target { name: "Lib".into() }]),
      target("Lib", ManifestProduct::StaticLibrary, vec![Dependency::Sdk { name: "Foundation".into(), status: SdkStatus::Required }]),
    ]));

    let graph = Graph::new(None, projects, DependenciesGraph::default()).unwrap();
    let linkable = graph.linkable_dependencies(Path::new("/p"), "App").unwrap();
    assert_eq!(linkable.len(), 2);
    assert!(linkable.iter().any(|d| matches!(d, ResolvedDependency::Target(t) if t.target_name == "Lib")));
    assert!(linkable.iter().any(|d| matches!(d, ResolvedDependency::Sdk { name, .. } if name == "Foundation")));
  }
}
