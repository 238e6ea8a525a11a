//! Step 1 of the project mapper pipeline (spec 4.G): generate one shared
//! scheme per target that has no user-defined scheme of the same name.
//! Must run before `SigningMapper`/`ProjectNameAndOrganizationMapper` so
//! later steps see the full scheme list, and after nothing (it is the
//! first step) since every other mapper may add or rewrite targets that
//! schemes reference.

use std::collections::BTreeSet;

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::manifest::project::Product;
use crate::model::convert::{default_scheme_action, SchemeActionKind};
use crate::model::{Dependency, Project, Scheme, Target, TargetReference};
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

pub struct AutogeneratedSchemesProjectMapper;

fn depends_on(candidate: &Target, target_name: &str) -> bool {
  candidate.dependencies.iter().any(|d| matches!(d, Dependency::Target { name } if name == target_name))
}

fn host_app_for<'a>(project: &'a Project, target: &Target) -> Option<&'a Target> {
  project.targets.iter().find(|t| t.product.can_host_tests() && depends_on(t, &target.name))
}

fn host_watch_app_for<'a>(project: &'a Project, target: &Target) -> Option<&'a Target> {
  project.targets.iter().find(|t| matches!(t.product, Product::Watch2App) && depends_on(t, &target.name))
}

fn test_bundles_depending_on<'a>(project: &'a Project, target: &Target) -> Vec<&'a Target> {
  let mut bundles: Vec<&Target> = project.targets.iter()
    .filter(|t| t.product.is_test_bundle() && depends_on(t, &target.name))
    .collect();
  bundles.sort_by(|a, b| a.name.cmp(&b.name));
  bundles
}

fn scheme_for_target(project: &Project, target: &Target, default_debug_config: &str, enable_coverage: bool) -> Scheme {
  let project_path = project.path.clone();
  let target_ref = TargetReference { project_path: project_path.clone(), target_name: target.name.clone() };
  let reference_to = |t: &Target| TargetReference { project_path: project_path.clone(), target_name: t.name.clone() };

  let mut build_targets = vec![target_ref.clone()];
  if matches!(target.product, Product::AppExtension | Product::MessagesExtension) {
    if let Some(host) = host_app_for(project, target) {
      build_targets.push(reference_to(host));
    }
  }
  build_targets.sort_by(|a, b| a.target_name.cmp(&b.target_name));
  let mut build_action = default_scheme_action(SchemeActionKind::Build, default_debug_config);
  build_action.targets = build_targets;

  let test_targets = if target.product.is_test_bundle() {
    vec![target_ref.clone()]
  } else {
    test_bundles_depending_on(project, target).into_iter().map(reference_to).collect()
  };
  let mut test_action = default_scheme_action(SchemeActionKind::Test, default_debug_config);
  test_action.targets = test_targets;
  test_action.coverage = enable_coverage;
  test_action.code_coverage_targets = if enable_coverage { vec![target_ref.clone()] } else { vec![] };

  let mut run_action = default_scheme_action(SchemeActionKind::Run, default_debug_config);
  run_action.executable = if target.product.is_runnable() {
    Some(target_ref.clone())
  } else if matches!(target.product, Product::AppExtension | Product::MessagesExtension) {
    host_app_for(project, target).map(reference_to)
  } else if matches!(target.product, Product::Watch2Extension) {
    host_watch_app_for(project, target).map(reference_to)
  } else {
    None
  };
  if !target.environment.is_empty() || !target.launch_arguments.is_empty() {
    run_action.arguments = target.launch_arguments.clone();
    run_action.environment = target.environment.clone();
  }

  let mut profile_action = default_scheme_action(SchemeActionKind::Profile, default_debug_config);
  if target.product.is_runnable() {
    profile_action.executable = Some(target_ref.clone());
  } else {
    profile_action.macro_expansion = Some(target_ref.clone());
    profile_action.enable_testability_when_profiling_tests = true;
  }

  let mut analyze_action = default_scheme_action(SchemeActionKind::Analyze, default_debug_config);
  analyze_action.targets = vec![target_ref.clone()];

  let archive_action = default_scheme_action(SchemeActionKind::Archive, default_debug_config);

  Scheme {
    name: target.name.clone(),
    shared: true,
    build_action: Some(build_action),
    test_action: Some(test_action),
    run_action: Some(run_action),
    profile_action: Some(profile_action),
    analyze_action: Some(analyze_action),
    archive_action: Some(archive_action),
  }
}

impl ProjectMapper for AutogeneratedSchemesProjectMapper {
  fn map(&self, _services: &Services, config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    let existing: BTreeSet<String> = project.schemes.iter().map(|s| s.name.clone()).collect();
    let default_debug_config = project.default_debug_build_configuration_name.clone();
    let enable_coverage = config.enable_code_coverage();

    let new_schemes: Vec<Scheme> = project.targets.iter()
      .filter(|t| !existing.contains(&t.name))
      .map(|t| scheme_for_target(&project, t, &default_debug_config, enable_coverage))
      .collect();

    project.schemes.extend(new_schemes);
    Ok((project, vec![]))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::ConfigManifest;
  use crate::model::{Actions, ResourceSynthesizers, Settings};
  use crate::services::{MemoryFileSystem, RecordingReporter};
  use std::collections::BTreeMap;
  use std::path::PathBuf;

  fn target(name: &str, product: Product, dependencies: Vec<Dependency>) -> Target {
    Target {
      name: name.to_string(),
      platform: crate::manifest::project::Platform::Ios,
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

  fn project(targets: Vec<Target>) -> Project {
    Project {
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
  fn auto_scheme_skipped_when_user_scheme_with_same_name_exists() {
    let mut p = project(vec![target("App", Product::App, vec![])]);
    p.schemes.push(Scheme { name: "App".into(), shared: true, ..Scheme::default() });

    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let (mapped, _) = AutogeneratedSchemesProjectMapper.map(&services, &config, p).unwrap();
    assert_eq!(mapped.schemes.len(), 1);
  }

  #[test]
  fn extension_scheme_builds_host_app_too() {
    let host = target("App", Product::App, vec![Dependency::Target { name: "Widget".into() }]);
    let ext = target("Widget", Product::AppExtension, vec![]);
    let p = project(vec![host, ext]);

    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let (mapped, _) = AutogeneratedSchemesProjectMapper.map(&services, &config, p).unwrap();
    let widget_scheme = mapped.schemes.iter().find(|s| s.name == "Widget").unwrap();
    let build_targets = &widget_scheme.build_action.as_ref().unwrap().targets;
    assert_eq!(build_targets.len(), 2);
    assert!(build_targets.iter().any(|t| t.target_name == "App"));
  }
}
