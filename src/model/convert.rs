//! Manifest→model converter (spec 4.E).
//!
//! Resolves every relative path against the manifest's directory, expands
//! source/resource/header globs through `crate::path`, and converts
//! dependency/settings values one-for-one into their model counterparts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::manifest::dependency::DependencyManifest;
use crate::manifest::project::{
  self, ActionManifest, ActionsManifest, ConfigurationVariant as ManifestVariant, FileElementManifest,
  HeadersManifest, InfoPlistManifest, ProjectManifest, ResourceSynthesizersManifest, ResourcesManifest,
  SchemeActionManifest, SchemeManifest, SettingValue as ManifestSettingValue, SettingsManifest,
  TargetManifest,
};
use crate::manifest::workspace::WorkspaceManifest;
use crate::path;
use crate::services::{Services, Warning};

use super::{
  Action, Actions, BuildConfiguration, Configuration, ConfigurationVariant, CoreDataModel,
  Dependency, FileElement, Headers, InfoPlist, Platform, Project, Scheme, SchemeAction, Settings,
  SettingsTable, SettingValue, Target, TargetReference, Workspace, ResourceSynthesizers,
};

fn has_glob_metacharacters(pattern: &str) -> bool {
  pattern.contains(['*', '{', '}'])
}

/// Resolves a list of source/header glob patterns to absolute file paths,
/// applying the recoverable-warning rules from spec 4.E.
fn resolve_file_globs(services: &Services, dir: &Path, patterns: &[String], allow_dirs: bool) -> Vec<PathBuf> {
  let mut out = Vec::new();
  for pattern in patterns {
    if !has_glob_metacharacters(pattern) {
      let resolved = dir.join(pattern);
      if services.fs.is_dir(&resolved) {
        if allow_dirs {
          out.push(resolved);
        } else {
          services.reporter.warn(Warning::GlobPointsToDirectory { path: resolved });
        }
        continue;
      }
      if !services.fs.exists(&resolved) {
        services.reporter.warn(Warning::NoFilesMatchGlob { pattern: pattern.clone() });
        continue;
      }
      out.push(resolved);
      continue;
    }

    let matches = path::glob(services, dir, pattern);
    if matches.is_empty() {
      services.reporter.warn(Warning::NoFilesMatchGlob { pattern: pattern.clone() });
      continue;
    }
    for m in matches {
      if !allow_dirs && services.fs.is_dir(&m) {
        continue;
      }
      out.push(m);
    }
  }
  out
}

fn resolve_required_file(services: &Services, dir: &Path, rel: &str) -> CoreResult<PathBuf> {
  let resolved = dir.join(rel);
  if !services.fs.exists(&resolved) {
    return Err(CoreError::MissingFile(resolved));
  }
  Ok(resolved)
}

fn convert_platform(platform: project::Platform) -> CoreResult<Platform> {
  match platform {
    project::Platform::Watchos =>
      Err(CoreError::FeatureNotYetSupported("watchOS platform".to_string())),
    other => Ok(other),
  }
}

fn convert_value(value: &ManifestSettingValue) -> SettingValue {
  match value {
    ManifestSettingValue::Bool(b) => SettingValue::Bool(*b),
    ManifestSettingValue::String(s) => SettingValue::String(s.clone()),
    ManifestSettingValue::List(l) => SettingValue::List(l.clone()),
  }
}

fn convert_table(table: &project::SettingsTable) -> SettingsTable {
  table.iter().map(|(k, v)| (k.clone(), convert_value(v))).collect()
}

fn convert_variant(variant: ManifestVariant) -> ConfigurationVariant {
  match variant {
    ManifestVariant::Debug => ConfigurationVariant::Debug,
    ManifestVariant::Release => ConfigurationVariant::Release,
  }
}

pub fn convert_settings(dir: &Path, manifest: &SettingsManifest) -> Settings {
  let configurations = manifest.configurations.iter()
    .map(|(name, cfg)| {
      let key = BuildConfiguration { name: name.clone(), variant: convert_variant(cfg.variant) };
      let value = Configuration {
        settings: convert_table(&cfg.settings),
        xcconfig: cfg.xcconfig.as_ref().map(|p| dir.join(p)),
      };
      (key, value)
    })
    .collect();

  Settings { base: convert_table(&manifest.base), configurations }
}

fn convert_dependency(dir: &Path, dep: &DependencyManifest) -> Dependency {
  match dep {
    DependencyManifest::Target { name } => Dependency::Target { name: name.clone() },
    DependencyManifest::Project { name, path } =>
      Dependency::Project { name: name.clone(), path: dir.join(path) },
    DependencyManifest::Framework { path } => Dependency::Framework { path: dir.join(path) },
    DependencyManifest::Xcframework { path } => Dependency::Xcframework { path: dir.join(path) },
    DependencyManifest::Library { path, public_headers, swift_module_map } => Dependency::Library {
      path: dir.join(path),
      public_headers: public_headers.as_ref().map(|p| dir.join(p)),
      swift_module_map: swift_module_map.as_ref().map(|p| dir.join(p)),
    },
    DependencyManifest::Sdk { name, status } => Dependency::Sdk { name: name.clone(), status: *status },
    DependencyManifest::PackageProduct { name } => Dependency::PackageProduct { name: name.clone() },
    DependencyManifest::Cocoapods { path } => Dependency::Cocoapods { path: dir.join(path) },
    DependencyManifest::External { name } => Dependency::External { name: name.clone() },
  }
}

fn convert_headers(services: &Services, dir: &Path, manifest: &HeadersManifest) -> Headers {
  let expand = |pattern: &Option<String>| match pattern {
    None => Vec::new(),
    Some(p) => resolve_file_globs(services, dir, std::slice::from_ref(p), false),
  };
  Headers {
    public: expand(&manifest.public),
    private: expand(&manifest.private),
    project: expand(&manifest.project),
  }
}

fn convert_resources(services: &Services, dir: &Path, manifests: &[ResourcesManifest]) -> Vec<PathBuf> {
  let mut out = Vec::new();
  for entry in manifests {
    let included = resolve_file_globs(services, dir, &entry.patterns, true);
    if entry.excludes.is_empty() {
      out.extend(included);
      continue;
    }
    let excluded: std::collections::BTreeSet<PathBuf> =
      resolve_file_globs(services, dir, &entry.excludes, true).into_iter().collect();
    out.extend(included.into_iter().filter(|p| !excluded.contains(p)));
  }
  out
}

fn convert_action(a: &ActionManifest) -> Action {
  Action { name: a.name.clone(), script: a.script.clone(), show_env_vars: a.show_env_vars }
}

fn convert_actions(a: &ActionsManifest) -> Actions {
  Actions {
    pre: a.pre.iter().map(convert_action).collect(),
    post: a.post.iter().map(convert_action).collect(),
  }
}

fn convert_resource_synthesizers(m: &ResourceSynthesizersManifest) -> ResourceSynthesizers {
  ResourceSynthesizers {
    assets: m.assets,
    strings: m.strings,
    fonts: m.fonts,
    plists: m.plists,
    interface_builder: m.interface_builder,
  }
}

pub fn convert_target(services: &Services, dir: &Path, name: &str, manifest: &TargetManifest) -> CoreResult<Target> {
  let platform = convert_platform(manifest.platform)?;

  let info_plist = match &manifest.info_plist {
    None => None,
    Some(InfoPlistManifest::Path(p)) => Some(InfoPlist::Path(resolve_required_file(services, dir, p)?)),
    Some(InfoPlistManifest::Synthesized(dict)) => Some(InfoPlist::Synthesized(
      dict.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<BTreeMap<_, _>>(),
    )),
  };

  let entitlements = match &manifest.entitlements {
    None => None,
    Some(p) => Some(resolve_required_file(services, dir, p)?),
  };

  let sources = resolve_file_globs(services, dir, &manifest.sources, false);
  let resources = convert_resources(services, dir, &manifest.resources);
  let headers = manifest.headers.as_ref().map(|h| convert_headers(services, dir, h));
  let dependencies = manifest.dependencies.iter().map(|d| convert_dependency(dir, d)).collect();
  let settings = convert_settings(dir, &manifest.settings);
  let core_data_models = manifest.core_data_models.iter()
    .map(|p| CoreDataModel { path: dir.join(p) })
    .collect();

  Ok(Target {
    name: name.to_string(),
    platform,
    product: manifest.product,
    bundle_id: manifest.bundle_id.clone(),
    deployment_target: manifest.deployment_target.clone(),
    info_plist,
    entitlements,
    sources,
    resources,
    headers,
    dependencies,
    settings,
    environment: manifest.environment.clone(),
    launch_arguments: manifest.launch_arguments.clone(),
    core_data_models,
    actions: convert_actions(&manifest.actions),
  })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeActionKind {
  Build,
  Test,
  Run,
  Profile,
  Analyze,
  Archive,
}

/// Section 6's "Scheme bit-level contract" defaults, shared by both
/// user-authored schemes (converted here) and auto-generated ones
/// (`crate::mappers::auto_schemes`).
pub fn default_scheme_action(kind: SchemeActionKind, default_debug_config: &str) -> SchemeAction {
  let mut action = SchemeAction {
    saved_tool_identifier: String::new(),
    ignores_persistent_state_on_launch: false,
    use_custom_working_directory: false,
    debug_document_versioning: true,
    ..SchemeAction::default()
  };

  match kind {
    SchemeActionKind::Build => {
      action.build_configuration = Some(default_debug_config.to_string());
      action.main_thread_checker = true;
    }
    SchemeActionKind::Test => {
      action.build_configuration = Some(default_debug_config.to_string());
    }
    SchemeActionKind::Run => {
      action.build_configuration = Some(default_debug_config.to_string());
      action.main_thread_checker = true;
    }
    SchemeActionKind::Profile => {
      action.build_configuration = Some("Release".to_string());
      action.should_use_launch_scheme_args_env = true;
    }
    SchemeActionKind::Analyze => {
      action.build_configuration = Some(default_debug_config.to_string());
    }
    SchemeActionKind::Archive => {
      action.build_configuration = Some("Release".to_string());
      action.reveal_archive_in_organizer = true;
    }
  }
  action
}

fn convert_scheme_action(
  kind: SchemeActionKind,
  project_path: &Path,
  default_debug_config: &str,
  manifest: &Option<SchemeActionManifest>,
) -> Option<SchemeAction> {
  let manifest = manifest.as_ref()?;
  let mut action = default_scheme_action(kind, default_debug_config);
  action.targets = manifest.targets.iter()
    .map(|t| TargetReference { project_path: project_path.to_path_buf(), target_name: t.clone() })
    .collect();
  action.coverage = manifest.coverage;
  if manifest.coverage {
    action.code_coverage_targets = action.targets.clone();
  }
  if action.targets.len() == 1 {
    action.executable = action.targets.first().cloned();
  }
  Some(action)
}

pub fn convert_scheme(project_path: &Path, default_debug_config: &str, manifest: &SchemeManifest) -> Scheme {
  Scheme {
    name: manifest.name.clone(),
    shared: manifest.shared,
    build_action: convert_scheme_action(SchemeActionKind::Build, project_path, default_debug_config, &manifest.build_action),
    test_action: convert_scheme_action(SchemeActionKind::Test, project_path, default_debug_config, &manifest.test_action),
    run_action: convert_scheme_action(SchemeActionKind::Run, project_path, default_debug_config, &manifest.run_action),
    profile_action: convert_scheme_action(SchemeActionKind::Profile, project_path, default_debug_config, &manifest.profile_action),
    analyze_action: convert_scheme_action(SchemeActionKind::Analyze, project_path, default_debug_config, &manifest.analyze_action),
    archive_action: convert_scheme_action(SchemeActionKind::Archive, project_path, default_debug_config, &manifest.archive_action),
  }
}

/// Converts a loaded `Project.toml` at `dir` into the typed model.
/// `dir` is the manifest's directory — the base every relative path in it
/// resolves against.
pub fn convert_project(services: &Services, dir: &Path, manifest: &ProjectManifest) -> CoreResult<Project> {
  let mut targets = Vec::with_capacity(manifest.targets.len());
  for (name, target_manifest) in &manifest.targets {
    targets.push(convert_target(services, dir, name, target_manifest)?);
  }

  let schemes = manifest.schemes.iter()
    .map(|s| convert_scheme(dir, &manifest.default_debug_build_configuration_name, s))
    .collect();

  let additional_files = manifest.additional_files.iter()
    .filter_map(|f| {
      let resolved = dir.join(&f.path);
      if !services.fs.exists(&resolved) {
        services.reporter.warn(Warning::FolderReferenceMissing { path: resolved });
        return None;
      }
      if !services.fs.is_dir(&resolved) {
        services.reporter.warn(Warning::FolderReferenceNotDirectory { path: resolved });
        return None;
      }
      Some(FileElement { path: resolved })
    })
    .collect();

  Ok(Project {
    path: dir.to_path_buf(),
    name: manifest.name.clone(),
    organization_name: manifest.organization_name.clone(),
    targets,
    schemes,
    settings: convert_settings(dir, &manifest.settings),
    additional_files,
    resource_synthesizers: convert_resource_synthesizers(&manifest.resource_synthesizers),
    default_debug_build_configuration_name: manifest.default_debug_build_configuration_name.clone(),
    file_name: manifest.name.clone(),
  })
}

/// Converts a loaded `Workspace.toml` at `dir`. `project_paths` is the set
/// already resolved by the recursive loader (spec 4.C).
pub fn convert_workspace(dir: &Path, manifest: &WorkspaceManifest, project_paths: Vec<PathBuf>, projects: &BTreeMap<PathBuf, Project>) -> Workspace {
  let additional_files = manifest.additional_files.iter()
    .map(|f| FileElement { path: dir.join(&f.path) })
    .collect();

  let schemes = manifest.schemes.iter()
    .filter_map(|s| projects.values().flat_map(|p| p.schemes.iter()).find(|sch| sch.name == s.name).cloned())
    .collect();

  Workspace {
    path: dir.to_path_buf(),
    name: manifest.name.clone(),
    projects: project_paths,
    additional_files,
    schemes,
  }.with_deduped_projects()
}
