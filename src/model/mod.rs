//! The typed model (spec section 3): immutable values produced by the
//! manifest→model converter (4.E) and consumed by everything downstream.
//! Mappers (4.G/4.H) return new instances rather than mutating in place.

pub mod convert;

use std::collections::BTreeMap;
use std::path::PathBuf;

pub use crate::manifest::project::{Platform, Product};
use crate::manifest::dependency::SdkStatus;

/// Resolved dependency edge. Shares its shape with
/// `manifest::dependency::DependencyManifest`, but path-bearing variants now
/// hold an absolute `PathBuf` instead of a manifest-relative `String`
/// (spec 4.E: "resolve all relative paths against the manifest's
/// directory").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
  Target { name: String },
  Project { name: String, path: PathBuf },
  Framework { path: PathBuf },
  Xcframework { path: PathBuf },
  Library { path: PathBuf, public_headers: Option<PathBuf>, swift_module_map: Option<PathBuf> },
  Sdk { name: String, status: SdkStatus },
  PackageProduct { name: String },
  Cocoapods { path: PathBuf },
  External { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
  Bool(bool),
  String(String),
  List(Vec<String>),
}

pub type SettingsTable = BTreeMap<String, SettingValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigurationVariant {
  Debug,
  Release,
}

/// `{name, variant}`, ordered lexicographically by name with debug-before-
/// release tiebreaking for emission (spec section 3 invariant, tested by
/// property 3 in section 8).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BuildConfiguration {
  pub name: String,
  pub variant: ConfigurationVariant,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
  pub settings: SettingsTable,
  pub xcconfig: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
  pub base: SettingsTable,
  pub configurations: BTreeMap<BuildConfiguration, Configuration>,
}

impl Settings {
  /// Configurations in the deterministic emission order required by
  /// property 3: ascending by name, debug before release on ties.
  pub fn ordered_configurations(&self) -> Vec<(&BuildConfiguration, &Configuration)> {
    let mut v: Vec<_> = self.configurations.iter().collect();
    v.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name).then(a.variant.cmp(&b.variant)));
    v
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreDataModel {
  pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
  pub name: String,
  pub script: String,
  pub show_env_vars: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Actions {
  pub pre: Vec<Action>,
  pub post: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfoPlist {
  Path(PathBuf),
  Synthesized(BTreeMap<String, toml::Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Headers {
  pub public: Vec<PathBuf>,
  pub private: Vec<PathBuf>,
  pub project: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSynthesizers {
  pub assets: bool,
  pub strings: bool,
  pub fonts: bool,
  pub plists: bool,
  pub interface_builder: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
  pub name: String,
  pub platform: Platform,
  pub product: Product,
  pub bundle_id: String,
  pub deployment_target: Option<String>,
  pub info_plist: Option<InfoPlist>,
  pub entitlements: Option<PathBuf>,
  pub sources: Vec<PathBuf>,
  pub resources: Vec<PathBuf>,
  pub headers: Option<Headers>,
  pub dependencies: Vec<Dependency>,
  pub settings: Settings,
  pub environment: BTreeMap<String, String>,
  pub launch_arguments: Vec<String>,
  pub core_data_models: Vec<CoreDataModel>,
  pub actions: Actions,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetReference {
  pub project_path: PathBuf,
  pub target_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemeAction {
  pub targets: Vec<TargetReference>,
  pub coverage: bool,
  pub code_coverage_targets: Vec<TargetReference>,
  pub build_configuration: Option<String>,
  pub executable: Option<TargetReference>,
  pub macro_expansion: Option<TargetReference>,
  pub arguments: Vec<String>,
  pub environment: BTreeMap<String, String>,
  pub main_thread_checker: bool,
  pub reveal_archive_in_organizer: bool,
  pub should_use_launch_scheme_args_env: bool,
  pub enable_testability_when_profiling_tests: bool,
  pub saved_tool_identifier: String,
  pub ignores_persistent_state_on_launch: bool,
  pub use_custom_working_directory: bool,
  pub debug_document_versioning: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scheme {
  pub name: String,
  pub shared: bool,
  pub build_action: Option<SchemeAction>,
  pub test_action: Option<SchemeAction>,
  pub run_action: Option<SchemeAction>,
  pub profile_action: Option<SchemeAction>,
  pub analyze_action: Option<SchemeAction>,
  pub archive_action: Option<SchemeAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileElement {
  pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
  pub path: PathBuf,
  pub name: String,
  pub organization_name: Option<String>,
  pub targets: Vec<Target>,
  pub schemes: Vec<Scheme>,
  pub settings: Settings,
  pub additional_files: Vec<FileElement>,
  pub resource_synthesizers: ResourceSynthesizers,
  pub default_debug_build_configuration_name: String,
  pub file_name: String,
}

impl Project {
  pub fn target(&self, name: &str) -> Option<&Target> {
    self.targets.iter().find(|t| t.name == name)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
  pub path: PathBuf,
  pub name: String,
  pub projects: Vec<PathBuf>,
  pub additional_files: Vec<FileElement>,
  pub schemes: Vec<Scheme>,
}

impl Workspace {
  /// Dedupe `projects`, preserving first occurrence (spec section 3
  /// invariant).
  pub fn with_deduped_projects(mut self) -> Self {
    let mut seen = std::collections::BTreeSet::new();
    self.projects.retain(|p| seen.insert(p.clone()));
    self
  }
}
