//! Graph mapper pipeline (spec 4.H): runs once per whole `Graph`, after
//! every project has already been through the project mapper pipeline
//! (4.G). Unlike project mappers these can see across project boundaries,
//! which is what cache-hit pruning and the aggregate automation scheme
//! need.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::error::CoreResult;
use crate::graph::Graph;
use crate::manifest::ConfigManifest;
use crate::manifest::project::Product;
use crate::model::{Dependency, Scheme, SchemeAction, Target, TargetReference};
use crate::services::Services;

pub trait GraphMapper {
  fn map(&self, services: &Services, config: &ConfigManifest, graph: Graph) -> CoreResult<Graph>;
}

/// Build configuration is folded into the fingerprint implicitly via
/// `target.settings`'s `Debug` output, so a settings-only change still
/// misses the cache.
fn fingerprint(target: &Target) -> String {
  let mut hasher = DefaultHasher::new();
  target.name.hash(&mut hasher);
  format!("{:?}", target.sources).hash(&mut hasher);
  format!("{:?}", target.settings).hash(&mut hasher);
  format!("{:x}", hasher.finish())
}

/// Replaces a target with a cached artefact whenever the cache directory
/// (`Config.cache.path`) already has a marker file for its fingerprint,
/// rewriting sibling targets' `Dependency::Target` edges into
/// `Dependency::Library` edges pointing at the artefact.
pub struct CacheHitPruningGraphMapper;

impl GraphMapper for CacheHitPruningGraphMapper {
  fn map(&self, services: &Services, config: &ConfigManifest, graph: Graph) -> CoreResult<Graph> {
    let Some(cache) = config.cache.as_ref() else { return Ok(graph) };
    let Some(cache_path) = cache.path.as_ref() else { return Ok(graph) };
    let cache_dir = PathBuf::from(cache_path);

    let (workspace, mut projects, external) = graph.into_parts();

    for project in projects.values_mut() {
      let mut hits = Vec::new();
      for target in &project.targets {
        let marker = cache_dir.join(format!("{}-{}.artifact", target.name, fingerprint(target)));
        if services.fs.exists(&marker) {
          hits.push((target.name.clone(), marker));
        }
      }
      if hits.is_empty() {
        continue;
      }

      let hit_names: std::collections::BTreeMap<String, PathBuf> = hits.into_iter().collect();
      project.targets.retain(|t| !hit_names.contains_key(&t.name));

      for target in &mut project.targets {
        for dep in &mut target.dependencies {
          if let Dependency::Target { name } = dep {
            if let Some(artifact) = hit_names.get(name) {
              *dep = Dependency::Library { path: artifact.clone(), public_headers: None, swift_module_map: None };
            }
          }
        }
      }
    }

    Graph::new(workspace, projects, external)
  }
}

/// Injects one `<Project>-Project` shared scheme enumerating every
/// buildable and testable target, for CI/scripted invocations that want a
/// single scheme instead of iterating every target's autogenerated one.
pub struct AutomationSchemeGraphMapper;

impl GraphMapper for AutomationSchemeGraphMapper {
  fn map(&self, _services: &Services, _config: &ConfigManifest, graph: Graph) -> CoreResult<Graph> {
    let (workspace, mut projects, external) = graph.into_parts();

    for project in projects.values_mut() {
      if project.targets.is_empty() {
        continue;
      }
      let scheme_name = format!("{}-Project", project.name);
      if project.schemes.iter().any(|s| s.name == scheme_name) {
        continue;
      }

      let mut build_targets: Vec<TargetReference> = project.targets.iter()
        .map(|t| TargetReference { project_path: project.path.clone(), target_name: t.name.clone() })
        .collect();
      build_targets.sort_by(|a, b| a.target_name.cmp(&b.target_name));

      let mut test_targets: Vec<TargetReference> = project.targets.iter()
        .filter(|t| t.product.is_test_bundle())
        .map(|t| TargetReference { project_path: project.path.clone(), target_name: t.name.clone() })
        .collect();
      test_targets.sort_by(|a, b| a.target_name.cmp(&b.target_name));

      project.schemes.push(Scheme {
        name: scheme_name,
        shared: true,
        build_action: Some(SchemeAction { targets: build_targets, ..SchemeAction::default() }),
        test_action: Some(SchemeAction { targets: test_targets, ..SchemeAction::default() }),
        run_action: None,
        profile_action: None,
        analyze_action: None,
        archive_action: None,
      });
    }

    Graph::new(workspace, projects, external)
  }
}

pub fn pipeline(config: &ConfigManifest) -> Vec<Box<dyn GraphMapper>> {
  let mut mappers: Vec<Box<dyn GraphMapper>> = Vec::new();
  if config.cache.is_some() {
    mappers.push(Box::new(CacheHitPruningGraphMapper));
  }
  mappers.push(Box::new(AutomationSchemeGraphMapper));
  mappers
}

pub fn run(services: &Services, config: &ConfigManifest, mut graph: Graph) -> CoreResult<Graph> {
  for mapper in pipeline(config) {
    graph = mapper.map(services, config, graph)?;
  }
  Ok(graph)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::external::DependenciesGraph;
  use crate::manifest::config::CacheConfig;
  use crate::manifest::project::Platform;
  use crate::model::{Actions, ResourceSynthesizers, Settings};
  use crate::services::{MemoryFileSystem, RecordingReporter};
  use std::collections::BTreeMap;

  fn target(name: &str, product: Product, dependencies: Vec<Dependency>) -> Target {
    Target {
      name: name.to_string(),
      platform: Platform::Ios,
      product,
      bundle_id: String::new(),
      deployment_target: None,
      info_plist: None,
      entitlements: None,
      sources: vec![PathBuf::from(format!("/p/{name}/main.swift"))],
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

  fn project(targets: Vec<Target>) -> crate::model::Project {
    crate::model::Project {
      path: PathBuf::from("/p"),
      name: "P".into(),
      organization_name: None,
      targets,
      schemes: vec![],
      settings: Settings::default(),
      additional_files: vec![],
      resource_synthesizers: ResourceSynthesizers::default(),
      default_debug_build_configuration_name: "Debug".into(),
      file_name: "P".into(),
    }
  }

  #[test]
  fn automation_scheme_covers_every_target() {
    let mut projects = BTreeMap::new();
    projects.insert(PathBuf::from("/p"), project(vec![
      target("App", Product::App, vec![]),
      target("AppTests", Product::UnitTests, vec![Dependency::Target { name: "App".into() }]),
    ]));
    let graph = Graph::new(None, projects, DependenciesGraph::default()).unwrap();

    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let graph = AutomationSchemeGraphMapper.map(&services, &config, graph).unwrap();
    let (_, projects, _) = graph.into_parts();
    let scheme = projects[&PathBuf::from("/p")].schemes.iter().find(|s| s.name == "P-Project").unwrap();
    assert_eq!(scheme.build_action.as_ref().unwrap().targets.len(), 2);
    assert_eq!(scheme.test_action.as_ref().unwrap().targets.len(), 1);
  }

  #[test]
  fn cache_hit_rewrites_dependency_into_library() {
    let core = target("Core", Product::StaticLibrary, vec![]);
    let core_fingerprint = fingerprint(&core);
    let marker = format!("/cache/Core-{core_fingerprint}.artifact");

    let mut projects = BTreeMap::new();
    projects.insert(PathBuf::from("/p"), project(vec![
      core,
      target("App", Product::App, vec![Dependency::Target { name: "Core".into() }]),
    ]));
    let graph = Graph::new(None, projects, DependenciesGraph::default()).unwrap();

    let fs = MemoryFileSystem::new().with_file(marker.clone(), "");
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let mut config = ConfigManifest::default_config();
    config.cache = Some(CacheConfig { path: Some("/cache".into()) });

    let graph = CacheHitPruningGraphMapper.map(&services, &config, graph).unwrap();
    let (_, projects, _) = graph.into_parts();
    let p = &projects[&PathBuf::from("/p")];
    assert!(p.target("Core").is_none());
    let app = p.target("App").unwrap();
    assert!(app.dependencies.iter().any(|d| matches!(d, Dependency::Library { path, .. } if path.to_string_lossy().contains("Core"))));
  }
}
