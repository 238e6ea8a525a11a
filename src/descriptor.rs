//! Descriptor generator (spec 4.I): the last pure step before a concrete
//! container format is written out. Turns a `Graph` into descriptor
//! values a serializer can walk without ever touching the graph, the
//! model, or the filesystem itself — this module is deliberately silent
//! on pbxproj/XML syntax, which belongs to whatever writer consumes it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::CoreResult;
use crate::graph::{Graph, ResolvedDependency};
use crate::manifest::ConfigManifest;
use crate::manifest::project::{Platform, Product};
use crate::model::{BuildConfiguration, Dependency, InfoPlist, Scheme, SchemeAction, SettingValue, Target, TargetReference, Workspace};
use crate::services::Services;

/// One configuration's fully-resolved build settings, derived keys layered
/// under the manifest's own `base`/per-configuration settings (spec
/// section 6's build-configuration key list).
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSettingsDescriptor {
  pub configuration: BuildConfiguration,
  pub settings: BTreeMap<String, SettingValue>,
  pub xcconfig: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
  pub name: String,
  pub platform: Platform,
  pub product: Product,
  pub sources: Vec<PathBuf>,
  pub resources: Vec<PathBuf>,
  pub dependencies: Vec<ResolvedDependency>,
  pub configurations: Vec<BuildSettingsDescriptor>,
  pub pre_actions: Vec<crate::model::Action>,
  pub post_actions: Vec<crate::model::Action>,
}

/// The run/profile runnable-vs-non-runnable contract (spec section 6):
/// a scheme either launches a product, expands a macro against one, or
/// does neither (a library target with no host app, say).
#[derive(Debug, Clone, PartialEq)]
pub enum Runnable {
  BuildableProductRunnable(TargetReference),
  MacroExpansion(TargetReference),
  None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeActionDescriptor {
  pub targets: Vec<TargetReference>,
  pub build_configuration: Option<String>,
  pub runnable: Runnable,
  pub coverage: bool,
  pub code_coverage_targets: Vec<TargetReference>,
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

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeDescriptor {
  pub name: String,
  pub build_action: Option<SchemeActionDescriptor>,
  pub test_action: Option<SchemeActionDescriptor>,
  pub run_action: Option<SchemeActionDescriptor>,
  pub profile_action: Option<SchemeActionDescriptor>,
  pub analyze_action: Option<SchemeActionDescriptor>,
  pub archive_action: Option<SchemeActionDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
  pub path: PathBuf,
  pub name: String,
  pub file_name: String,
  pub organization_name: Option<String>,
  pub targets: Vec<TargetDescriptor>,
  /// Lives at `<file_name>.xcodeproj/xcshareddata/xcschemes/`.
  pub shared_schemes: Vec<SchemeDescriptor>,
  /// Lives at `<file_name>.xcodeproj/xcuserdata/<user>.xcuserdatad/xcschemes/`.
  pub user_schemes: Vec<SchemeDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceDescriptor {
  pub path: PathBuf,
  pub name: String,
  pub project_references: Vec<PathBuf>,
  pub shared_schemes: Vec<SchemeDescriptor>,
  pub user_schemes: Vec<SchemeDescriptor>,
}

fn sdkroot(platform: Platform) -> &'static str {
  match platform {
    Platform::Ios => "iphoneos",
    Platform::Macos => "macosx",
    Platform::Tvos => "appletvos",
    Platform::Watchos => "watchos",
  }
}

fn targeted_device_family(platform: Platform) -> Option<&'static str> {
  match platform {
    Platform::Ios => Some("1,2"),
    Platform::Tvos => Some("3"),
    Platform::Macos | Platform::Watchos => None,
  }
}

fn swift_version(config: &ConfigManifest) -> String {
  config.generation_options.iter().find_map(|o| match o {
    crate::manifest::config::GenerationOption::SwiftToolsVersion { version } => Some(version.clone()),
    _ => None,
  }).unwrap_or_else(|| "5.0".to_string())
}

fn depends_on(candidate: &Target, target_name: &str) -> bool {
  candidate.dependencies.iter().any(|d| matches!(d, Dependency::Target { name } if name == target_name))
}

fn host_app_for<'a>(project: &'a crate::model::Project, target: &Target) -> Option<&'a Target> {
  project.targets.iter().find(|t| t.product.can_host_tests() && depends_on(t, &target.name))
}

fn derived_settings(project: &crate::model::Project, target: &Target, config: &ConfigManifest) -> BTreeMap<String, SettingValue> {
  let mut out = BTreeMap::new();
  out.insert("PRODUCT_NAME".into(), SettingValue::String(target.name.clone()));
  out.insert("PRODUCT_BUNDLE_IDENTIFIER".into(), SettingValue::String(target.bundle_id.clone()));
  out.insert("SDKROOT".into(), SettingValue::String(sdkroot(target.platform).to_string()));
  out.insert("SUPPORTED_PLATFORMS".into(), SettingValue::String(sdkroot(target.platform).to_string()));
  out.insert("SWIFT_VERSION".into(), SettingValue::String(swift_version(config)));

  if let Some(family) = targeted_device_family(target.platform) {
    out.insert("TARGETED_DEVICE_FAMILY".into(), SettingValue::String(family.to_string()));
  }
  if target.product == Product::StaticFramework {
    out.insert("MACH_O_TYPE".into(), SettingValue::String("staticlib".into()));
  }
  match &target.info_plist {
    Some(InfoPlist::Path(path)) => {
      out.insert("INFOPLIST_FILE".into(), SettingValue::String(path.display().to_string()));
    }
    Some(InfoPlist::Synthesized(_)) | None => {}
  }
  if let Some(entitlements) = &target.entitlements {
    out.insert("CODE_SIGN_ENTITLEMENTS".into(), SettingValue::String(entitlements.display().to_string()));
  }
  if target.product.is_test_bundle() {
    if let Some(host) = host_app_for(project, target) {
      out.insert("TEST_HOST".into(), SettingValue::String(format!("$(BUILT_PRODUCTS_DIR)/{}.app/{}", host.name, host.name)));
      out.insert("BUNDLE_LOADER".into(), SettingValue::String("$(TEST_HOST)".into()));
      out.insert("TEST_TARGET_NAME".into(), SettingValue::String(host.name.clone()));
    }
  }
  out
}

fn describe_target(project: &crate::model::Project, target: &Target, graph: &Graph, config: &ConfigManifest) -> CoreResult<TargetDescriptor> {
  let defaults = derived_settings(project, target, config);
  let dependencies = graph.target_dependencies(&project.path, &target.name)?;

  // Configurations are meant to live on the Project (spec section 3); a
  // target only overrides them. Union the two declaration sites so a
  // project-level Release configuration still reaches targets that never
  // declare their own configurations.
  let mut keys: std::collections::BTreeSet<BuildConfiguration> = project.settings.configurations.keys().cloned().collect();
  keys.extend(target.settings.configurations.keys().cloned());
  let mut ordered: Vec<&BuildConfiguration> = keys.iter().collect();
  ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.variant.cmp(&b.variant)));

  let mut configurations: Vec<BuildSettingsDescriptor> = ordered.into_iter()
    .map(|configuration| {
      let mut settings = defaults.clone();
      settings.extend(project.settings.base.clone());
      let project_configuration = project.settings.configurations.get(configuration);
      if let Some(c) = project_configuration {
        settings.extend(c.settings.clone());
      }
      settings.extend(target.settings.base.clone());
      let target_configuration = target.settings.configurations.get(configuration);
      if let Some(c) = target_configuration {
        settings.extend(c.settings.clone());
      }
      let xcconfig = target_configuration.and_then(|c| c.xcconfig.clone())
        .or_else(|| project_configuration.and_then(|c| c.xcconfig.clone()));
      BuildSettingsDescriptor { configuration: configuration.clone(), settings, xcconfig }
    })
    .collect();

  if configurations.is_empty() {
    let mut settings = defaults;
    settings.extend(project.settings.base.clone());
    settings.extend(target.settings.base.clone());
    configurations.push(BuildSettingsDescriptor {
      configuration: BuildConfiguration { name: project.default_debug_build_configuration_name.clone(), variant: crate::model::ConfigurationVariant::Debug },
      settings,
      xcconfig: None,
    });
  }

  Ok(TargetDescriptor {
    name: target.name.clone(),
    platform: target.platform,
    product: target.product,
    sources: target.sources.clone(),
    resources: target.resources.clone(),
    dependencies,
    configurations,
    pre_actions: target.actions.pre.clone(),
    post_actions: target.actions.post.clone(),
  })
}

fn describe_runnable(executable: &Option<TargetReference>, macro_expansion: &Option<TargetReference>) -> Runnable {
  if let Some(executable) = executable {
    Runnable::BuildableProductRunnable(executable.clone())
  } else if let Some(macro_expansion) = macro_expansion {
    Runnable::MacroExpansion(macro_expansion.clone())
  } else {
    Runnable::None
  }
}

fn describe_action(action: &SchemeAction) -> SchemeActionDescriptor {
  SchemeActionDescriptor {
    targets: action.targets.clone(),
    build_configuration: action.build_configuration.clone(),
    runnable: describe_runnable(&action.executable, &action.macro_expansion),
    coverage: action.coverage,
    code_coverage_targets: action.code_coverage_targets.clone(),
    arguments: action.arguments.clone(),
    environment: action.environment.clone(),
    main_thread_checker: action.main_thread_checker,
    reveal_archive_in_organizer: action.reveal_archive_in_organizer,
    should_use_launch_scheme_args_env: action.should_use_launch_scheme_args_env,
    enable_testability_when_profiling_tests: action.enable_testability_when_profiling_tests,
    saved_tool_identifier: action.saved_tool_identifier.clone(),
    ignores_persistent_state_on_launch: action.ignores_persistent_state_on_launch,
    use_custom_working_directory: action.use_custom_working_directory,
    debug_document_versioning: action.debug_document_versioning,
  }
}

fn describe_scheme(scheme: &Scheme) -> SchemeDescriptor {
  SchemeDescriptor {
    name: scheme.name.clone(),
    build_action: scheme.build_action.as_ref().map(describe_action),
    test_action: scheme.test_action.as_ref().map(describe_action),
    run_action: scheme.run_action.as_ref().map(describe_action),
    profile_action: scheme.profile_action.as_ref().map(describe_action),
    analyze_action: scheme.analyze_action.as_ref().map(describe_action),
    archive_action: scheme.archive_action.as_ref().map(describe_action),
  }
}

fn partition_schemes(schemes: &[Scheme]) -> (Vec<SchemeDescriptor>, Vec<SchemeDescriptor>) {
  let mut shared = Vec::new();
  let mut user = Vec::new();
  for scheme in schemes {
    let descriptor = describe_scheme(scheme);
    if scheme.shared {
      shared.push(descriptor);
    } else {
      user.push(descriptor);
    }
  }
  (shared, user)
}

fn describe_project(project: &crate::model::Project, graph: &Graph, config: &ConfigManifest) -> CoreResult<ProjectDescriptor> {
  let targets = project.targets.iter().map(|t| describe_target(project, t, graph, config)).collect::<CoreResult<Vec<_>>>()?;
  let (shared_schemes, user_schemes) = partition_schemes(&project.schemes);

  Ok(ProjectDescriptor {
    path: project.path.clone(),
    name: project.name.clone(),
    file_name: project.file_name.clone(),
    organization_name: project.organization_name.clone(),
    targets,
    shared_schemes,
    user_schemes,
  })
}

fn describe_workspace(workspace: &Workspace) -> WorkspaceDescriptor {
  let (shared_schemes, user_schemes) = partition_schemes(&workspace.schemes);
  WorkspaceDescriptor {
    path: workspace.path.clone(),
    name: workspace.name.clone(),
    project_references: workspace.projects.clone(),
    shared_schemes,
    user_schemes,
  }
}

pub struct GraphDescriptor {
  pub workspace: Option<WorkspaceDescriptor>,
  pub projects: Vec<ProjectDescriptor>,
}

pub fn describe(_services: &Services, graph: &Graph, config: &ConfigManifest) -> CoreResult<GraphDescriptor> {
  let projects = graph.projects.values().map(|p| describe_project(p, graph, config)).collect::<CoreResult<Vec<_>>>()?;
  let workspace = graph.workspace.as_ref().map(describe_workspace);
  Ok(GraphDescriptor { workspace, projects })
}
