//! External-dependencies graph generator (spec 4.D).
//!
//! Lowers a third-party package manager's checkout state into the same
//! `model::Project` shape the rest of the pipeline already understands, so
//! a synthetic package "project" is indistinguishable downstream from one
//! loaded off a real `Project.toml`.

pub mod package_info;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::manifest::dependency::SdkStatus;
use crate::manifest::project::{Platform, Product};
use crate::model::{Dependency, Project, ResourceSynthesizers, Settings, SettingValue, Target};
use crate::services::Services;

pub use package_info::{JsonFilePackageInfoLoader, PackageInfo, PackageInfoLoader, PackageTarget, ProductKind, TargetDependencyRef, TargetKind, Tool};

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceState {
  object: WorkspaceStateObject,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceStateObject {
  dependencies: Vec<WorkspaceStateDependency>,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceStateDependency {
  #[serde(rename = "packageRef")]
  package_ref: PackageRef,
}

#[derive(Debug, Clone, Deserialize)]
struct PackageRef {
  name: String,
  kind: String,
  #[serde(default)]
  path: Option<String>,
}

/// Output of the generator (spec 4.D): ready-made dependency edges per
/// product name, plus a synthetic `Project` per resolved package.
#[derive(Debug, Default)]
pub struct DependenciesGraph {
  pub external_dependencies: BTreeMap<String, Vec<Dependency>>,
  pub external_projects: BTreeMap<PathBuf, Project>,
}

fn platform_name(p: Platform) -> &'static str {
  match p {
    Platform::Ios => "ios",
    Platform::Macos => "macos",
    Platform::Tvos => "tvos",
    Platform::Watchos => "watchos",
  }
}

fn resolve_package_folder(root: &Path, package_ref: &PackageRef) -> CoreResult<PathBuf> {
  match package_ref.kind.as_str() {
    "remote" => Ok(root.join("checkouts").join(&package_ref.name)),
    "local" => match &package_ref.path {
      Some(p) => Ok(PathBuf::from(p)),
      None => Err(CoreError::UnsupportedDependencyKind("local (missing path)".to_string())),
    },
    other => Err(CoreError::UnsupportedDependencyKind(other.to_string())),
  }
}

fn choose_platform(package_name: &str, configured: &[Platform], declared: &[package_info::PackagePlatform]) -> CoreResult<(Platform, Option<String>)> {
  let declared_platforms: Vec<Platform> = if declared.is_empty() {
    configured.to_vec()
  } else {
    declared.iter().map(|p| p.platform).collect()
  };

  let intersection: BTreeSet<Platform> = configured.iter()
    .copied()
    .filter(|p| declared_platforms.contains(p))
    .collect();

  let chosen = *intersection.iter().next().ok_or_else(|| CoreError::NoSupportedPlatforms {
    package: package_name.to_string(),
    configured: configured.iter().map(|p| platform_name(*p).to_string()).collect(),
    declared: declared_platforms.iter().map(|p| platform_name(*p).to_string()).collect(),
  })?;

  let deployment_target = if declared.is_empty() {
    None
  } else {
    declared.iter().find(|p| p.platform == chosen).map(|p| p.version.clone())
  };

  Ok((chosen, deployment_target))
}

fn derive_product(
  overrides: &BTreeMap<String, Product>,
  info: &PackageInfo,
  target_name: &str,
) -> Option<Product> {
  if let Some(p) = overrides.get(target_name) {
    return Some(*p);
  }
  match info.products.iter().find(|p| p.targets.iter().any(|t| t == target_name)) {
    None => Some(Product::StaticFramework),
    Some(owning) => match owning.kind {
      ProductKind::LibraryStatic | ProductKind::LibraryAutomatic => Some(Product::StaticFramework),
      ProductKind::LibraryDynamic => Some(Product::Framework),
      ProductKind::Executable | ProductKind::Plugin | ProductKind::Test => None,
    },
  }
}

fn resource_pattern(path: &str) -> String {
  let has_extension = Path::new(path).extension().is_some();
  if has_extension { path.to_string() } else { format!("{}/**", path) }
}

/// A define in `NAME=VALUE` or bare `NAME` form, split for sorted emission.
fn split_define(value: &str) -> (String, String) {
  match value.split_once('=') {
    Some((k, v)) => (k.to_string(), v.to_string()),
    None => (value.to_string(), "1".to_string()),
  }
}

fn push_list(table: &mut crate::model::SettingsTable, key: &str, value: String) {
  match table.get_mut(key) {
    Some(SettingValue::List(list)) => list.push(value),
    _ => {
      table.insert(key.to_string(), SettingValue::List(vec![value]));
    }
  }
}

/// Applies one `(tool, name, value)` package setting, per the grouping
/// table in spec 4.D. Linker settings become dependency edges, not
/// settings entries.
fn apply_setting(
  table: &mut crate::model::SettingsTable,
  defines: &mut BTreeMap<String, String>,
  swift_conditions: &mut BTreeSet<String>,
  extra_deps: &mut Vec<Dependency>,
  tool: Tool,
  name: &str,
  value: &str,
) -> CoreResult<()> {
  match (tool, name) {
    (Tool::C, "header_search_path") | (Tool::Cxx, "header_search_path") =>
      push_list(table, "HEADER_SEARCH_PATHS", value.to_string()),
    (Tool::C, "define") | (Tool::Cxx, "define") => {
      let (k, v) = split_define(value);
      defines.insert(k, v);
    }
    (Tool::C, "unsafe_flags") => push_list(table, "OTHER_CFLAGS", value.to_string()),
    (Tool::Cxx, "unsafe_flags") => push_list(table, "OTHER_CPLUSPLUSFLAGS", value.to_string()),
    (Tool::Swift, "define") => {
      swift_conditions.insert(value.to_string());
    }
    (Tool::Swift, "unsafe_flags") => push_list(table, "OTHER_SWIFT_FLAGS", value.to_string()),
    (Tool::Linker, "linked_framework") =>
      extra_deps.push(Dependency::Sdk { name: format!("{}.framework", value), status: SdkStatus::Required }),
    (Tool::Linker, "linked_library") =>
      extra_deps.push(Dependency::Sdk { name: format!("{}.tbd", value), status: SdkStatus::Required }),
    _ => return Err(CoreError::UnsupportedSetting { tool: format!("{:?}", tool), name: name.to_string() }),
  }
  Ok(())
}

struct PackageIndex<'a> {
  infos: &'a BTreeMap<String, PackageInfo>,
  folders: &'a BTreeMap<String, PathBuf>,
  product_to_package: &'a BTreeMap<String, String>,
}

impl<'a> PackageIndex<'a> {
  fn resolve_product_targets(&self, package: &str, product: &str) -> Option<&'a [String]> {
    self.infos.get(package)?.products.iter()
      .find(|p| p.name == product)
      .map(|p| p.targets.as_slice())
  }

  fn product_edges(&self, package: &str, product: &str) -> CoreResult<Vec<Dependency>> {
    let targets = self.resolve_product_targets(package, product).ok_or_else(|| CoreError::UnknownProductDependency {
      product: product.to_string(),
      package: package.to_string(),
    })?;
    Ok(targets.iter()
      .map(|target_name| Dependency::Project {
        name: target_name.clone(),
        path: self.folders.get(package).cloned().unwrap_or_default(),
      })
      .collect())
  }
}

fn convert_dependency_ref(
  index: &PackageIndex,
  target_to_framework: &BTreeMap<String, PathBuf>,
  this_package: &str,
  info: &PackageInfo,
  dep: &TargetDependencyRef,
) -> CoreResult<Vec<Dependency>> {
  match dep {
    TargetDependencyRef::Target { name } => Ok(vec![Dependency::Target { name: name.clone() }]),
    TargetDependencyRef::Product { name, package } => {
      let package = package.as_deref().unwrap_or(this_package);
      index.product_edges(package, name)
    }
    TargetDependencyRef::ByName { name } => {
      if let Some(t) = info.targets.iter().find(|t| &t.name == name) {
        if t.is_binary {
          let path = target_to_framework.get(name).cloned()
            .unwrap_or_else(|| PathBuf::from(format!("{}.xcframework", name)));
          return Ok(vec![Dependency::Xcframework { path }]);
        }
        return Ok(vec![Dependency::Target { name: name.clone() }]);
      }
      if let Some(package) = index.product_to_package.get(name) {
        return index.product_edges(package, name);
      }
      Err(CoreError::UnknownByNameDependency(name.clone()))
    }
  }
}

#[allow(clippy::too_many_arguments)]
fn convert_package_target(
  services: &Services,
  folder: &Path,
  package_name: &str,
  info: &PackageInfo,
  target: &PackageTarget,
  configured_platforms: &[Platform],
  product_overrides: &BTreeMap<String, Product>,
  index: &PackageIndex,
  target_to_framework: &BTreeMap<String, PathBuf>,
) -> CoreResult<Option<Target>> {
  let Some(product) = derive_product(product_overrides, info, &target.name) else {
    return Ok(None);
  };

  let (platform, deployment_target) = choose_platform(package_name, configured_platforms, &info.platforms)?;

  let source_pattern = match &target.path {
    Some(p) => format!("{}/**", p),
    None => format!("Sources/{}/**", target.name),
  };
  let sources = crate::path::glob(services, folder, &source_pattern);

  let resources = target.resources.iter()
    .flat_map(|r| crate::path::glob(services, folder, &resource_pattern(r)))
    .collect::<Vec<_>>();

  let mut dependencies = Vec::new();
  for dep in &target.dependencies {
    dependencies.extend(convert_dependency_ref(index, target_to_framework, package_name, info, dep)?);
  }

  let mut table = crate::model::SettingsTable::new();
  let mut defines = BTreeMap::new();
  let mut swift_conditions = BTreeSet::new();
  for (tool, name, value) in &target.settings {
    apply_setting(&mut table, &mut defines, &mut swift_conditions, &mut dependencies, *tool, name, value)?;
  }
  if !defines.is_empty() {
    let list = defines.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    table.insert("GCC_PREPROCESSOR_DEFINITIONS".to_string(), SettingValue::List(list));
  }
  if !swift_conditions.is_empty() {
    table.insert(
      "SWIFT_ACTIVE_COMPILATION_CONDITIONS".to_string(),
      SettingValue::List(swift_conditions.into_iter().collect()),
    );
  }

  Ok(Some(Target {
    name: target.name.clone(),
    platform,
    product,
    bundle_id: String::new(),
    deployment_target,
    info_plist: None,
    entitlements: None,
    sources,
    resources,
    headers: None,
    dependencies,
    settings: Settings { base: table, configurations: BTreeMap::new() },
    environment: BTreeMap::new(),
    launch_arguments: vec![],
    core_data_models: vec![],
    actions: Default::default(),
  }))
}

/// Entry point (spec 4.D). `root` is the directory holding
/// `workspace-state.json`, `checkouts/`, and `artifacts/`.
pub fn generate(
  services: &Services,
  root: &Path,
  loader: &dyn PackageInfoLoader,
  configured_platforms: &[Platform],
  product_overrides: &BTreeMap<String, Product>,
) -> CoreResult<DependenciesGraph> {
  let state_path = root.join("workspace-state.json");
  let text = services.fs.read_to_string(&state_path)?;
  let state: WorkspaceState = serde_json::from_str(&text)
    .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", state_path.display(), e))?;

  let mut folders = BTreeMap::new();
  let mut infos = BTreeMap::new();
  for dep in &state.object.dependencies {
    let folder = resolve_package_folder(root, &dep.package_ref)?;
    let info = loader.load(&folder)?;
    folders.insert(dep.package_ref.name.clone(), folder);
    infos.insert(dep.package_ref.name.clone(), info);
  }

  let mut product_to_package = BTreeMap::new();
  let mut target_to_framework = BTreeMap::new();
  for (pkg_name, info) in &infos {
    for product in &info.products {
      product_to_package.insert(product.name.clone(), pkg_name.clone());
    }
    for target in &info.targets {
      if target.is_binary {
        target_to_framework.insert(
          target.name.clone(),
          root.join("artifacts").join(pkg_name).join(format!("{}.xcframework", target.name)),
        );
      }
    }
  }

  let index = PackageIndex { infos: &infos, folders: &folders, product_to_package: &product_to_package };

  let mut external_projects = BTreeMap::new();
  let mut external_dependencies = BTreeMap::new();

  for (pkg_name, info) in &infos {
    let folder = &folders[pkg_name];

    let mut targets = Vec::new();
    for target in &info.targets {
      if target.kind != TargetKind::Regular {
        tracing::debug!(package = %pkg_name, target = %target.name, kind = ?target.kind, "ignoring non-regular package target");
        continue;
      }
      if let Some(t) = convert_package_target(services, folder, pkg_name, info, target, configured_platforms, product_overrides, &index, &target_to_framework)? {
        targets.push(t);
      }
    }

    for product in &info.products {
      external_dependencies.insert(product.name.clone(), index.product_edges(pkg_name, &product.name)?);
    }

    external_projects.insert(folder.clone(), Project {
      path: folder.clone(),
      name: pkg_name.clone(),
      organization_name: None,
      targets,
      schemes: vec![],
      settings: Settings::default(),
      additional_files: vec![],
      resource_synthesizers: ResourceSynthesizers::default(),
      default_debug_build_configuration_name: "Debug".to_string(),
      file_name: pkg_name.clone(),
    });
  }

  Ok(DependenciesGraph { external_dependencies, external_projects })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::{MemoryFileSystem, RecordingReporter};
  use package_info::{PackagePlatform, PackageProduct};

  struct FixedLoader(BTreeMap<PathBuf, PackageInfo>);

  impl PackageInfoLoader for FixedLoader {
    fn load(&self, folder: &Path) -> CoreResult<PackageInfo> {
      self.0.get(folder).cloned()
        .ok_or_else(|| CoreError::MissingFile(folder.to_path_buf()))
    }
  }

  fn services<'a>(fs: &'a MemoryFileSystem, reporter: &'a RecordingReporter) -> Services<'a> {
    Services::new(reporter, fs, "tester")
  }

  #[test]
  fn resolves_regular_target_with_linker_settings_as_sdk_edges() {
    let state_json = r#"{"object":{"dependencies":[{"packageRef":{"name":"Box","kind":"remote"}}]}}"#;
    let fs = MemoryFileSystem::new().with_file("/root/workspace-state.json", state_json);
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let info = PackageInfo {
      name: "Box".into(),
      platforms: vec![PackagePlatform { platform: Platform::Ios, version: "13.0".into() }],
      products: vec![PackageProduct { name: "Box".into(), kind: ProductKind::LibraryAutomatic, targets: vec!["Box".into()] }],
      targets: vec![PackageTarget {
        name: "Box".into(),
        kind: TargetKind::Regular,
        dependencies: vec![],
        settings: vec![(Tool::Linker, "linked_framework".into(), "CoreML".into())],
        path: None,
        resources: vec![],
        is_binary: false,
      }],
    };

    let mut loaded = BTreeMap::new();
    loaded.insert(PathBuf::from("/root/checkouts/Box"), info);
    let loader = FixedLoader(loaded);

    let graph = generate(&svc, Path::new("/root"), &loader, &[Platform::Ios, Platform::Macos], &BTreeMap::new()).unwrap();
    let project = &graph.external_projects[&PathBuf::from("/root/checkouts/Box")];
    assert_eq!(project.targets.len(), 1);
    let target = &project.targets[0];
    assert!(target.settings.base.is_empty());
    assert!(target.dependencies.iter().any(|d| matches!(d, Dependency::Sdk { name, .. } if name == "CoreML.framework")));
  }

  #[test]
  fn empty_platform_intersection_is_fatal() {
    let state_json = r#"{"object":{"dependencies":[{"packageRef":{"name":"Box","kind":"remote"}}]}}"#;
    let fs = MemoryFileSystem::new().with_file("/root/workspace-state.json", state_json);
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let info = PackageInfo {
      name: "Box".into(),
      platforms: vec![PackagePlatform { platform: Platform::Watchos, version: "6.0".into() }],
      products: vec![],
      targets: vec![PackageTarget {
        name: "Box".into(), kind: TargetKind::Regular, dependencies: vec![],
        settings: vec![], path: None, resources: vec![], is_binary: false,
      }],
    };
    let mut loaded = BTreeMap::new();
    loaded.insert(PathBuf::from("/root/checkouts/Box"), info);
    let loader = FixedLoader(loaded);

    let err = generate(&svc, Path::new("/root"), &loader, &[Platform::Ios, Platform::Macos], &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, CoreError::NoSupportedPlatforms { .. }));
  }

  #[test]
  fn target_with_no_owning_product_defaults_to_static_framework() {
    let state_json = r#"{"object":{"dependencies":[{"packageRef":{"name":"Box","kind":"remote"}}]}}"#;
    let fs = MemoryFileSystem::new().with_file("/root/workspace-state.json", state_json);
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let info = PackageInfo {
      name: "Box".into(),
      platforms: vec![PackagePlatform { platform: Platform::Ios, version: "13.0".into() }],
      products: vec![],
      targets: vec![PackageTarget {
        name: "Box".into(), kind: TargetKind::Regular, dependencies: vec![],
        settings: vec![], path: None, resources: vec![], is_binary: false,
      }],
    };
    let mut loaded = BTreeMap::new();
    loaded.insert(PathBuf::from("/root/checkouts/Box"), info);
    let loader = FixedLoader(loaded);

    let graph = generate(&svc, Path::new("/root"), &loader, &[Platform::Ios], &BTreeMap::new()).unwrap();
    let project = &graph.external_projects[&PathBuf::from("/root/checkouts/Box")];
    assert_eq!(project.targets.len(), 1);
    assert_eq!(project.targets[0].product, Product::StaticFramework);
  }

  #[test]
  fn product_dependency_on_nonexistent_product_is_fatal() {
    let state_json = r#"{"object":{"dependencies":[{"packageRef":{"name":"Box","kind":"remote"}}]}}"#;
    let fs = MemoryFileSystem::new().with_file("/root/workspace-state.json", state_json);
    let reporter = RecordingReporter::default();
    let svc = services(&fs, &reporter);

    let info = PackageInfo {
      name: "Box".into(),
      platforms: vec![PackagePlatform { platform: Platform::Ios, version: "13.0".into() }],
      products: vec![PackageProduct { name: "Box".into(), kind: ProductKind::LibraryAutomatic, targets: vec!["Box".into()] }],
      targets: vec![PackageTarget {
        name: "Box".into(),
        kind: TargetKind::Regular,
        dependencies: vec![TargetDependencyRef::Product { name: "DoesNotExist".into(), package: None }],
        settings: vec![], path: None, resources: vec![], is_binary: false,
      }],
    };
    let mut loaded = BTreeMap::new();
    loaded.insert(PathBuf::from("/root/checkouts/Box"), info);
    let loader = FixedLoader(loaded);

    let err = generate(&svc, Path::new("/root"), &loader, &[Platform::Ios], &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, CoreError::UnknownProductDependency { .. }));
  }
}
