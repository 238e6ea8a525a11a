//! Project, target, scheme and settings manifest values (spec section 3).
//!
//! These are the value-level types `crate::manifest` parses a `Project.toml`
//! into (spec 4.B: "Parsing is value-level, no code execution inside the
//! core's trust boundary"). The manifest→model converter (4.E, see
//! `crate::model::convert`) lowers these into the typed model.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::dependency::DependencyManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Ios,
  Macos,
  Tvos,
  Watchos,
}

impl Platform {
  /// Parses a CLI-facing platform name (`--platforms ios,macos`). Manifest
  /// platforms never go through this path: they're already validated by
  /// `Deserialize` at load time.
  pub fn parse(name: &str) -> crate::error::CoreResult<Self> {
    match name {
      "ios" => Ok(Platform::Ios),
      "macos" => Ok(Platform::Macos),
      "tvos" => Ok(Platform::Tvos),
      "watchos" => Ok(Platform::Watchos),
      other => Err(crate::error::CoreError::UnknownPlatform(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
  App,
  Framework,
  StaticFramework,
  StaticLibrary,
  DynamicLibrary,
  UnitTests,
  UiTests,
  Bundle,
  AppExtension,
  MessagesExtension,
  Watch2App,
  Watch2Extension,
  TvTopShelfExtension,
  StickerPackExtension,
  AppClip,
  CommandLineTool,
}

impl Product {
  pub fn is_test_bundle(self) -> bool {
    matches!(self, Product::UnitTests | Product::UiTests)
  }

  pub fn is_runnable(self) -> bool {
    matches!(self, Product::App | Product::CommandLineTool | Product::Watch2App | Product::AppClip)
  }

  pub fn can_host_tests(self) -> bool {
    matches!(self, Product::App | Product::AppClip)
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
  Bool(bool),
  String(String),
  List(Vec<String>),
}

pub type SettingsTable = BTreeMap<String, SettingValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationVariant {
  Debug,
  Release,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationManifest {
  pub variant: ConfigurationVariant,
  #[serde(default)]
  pub settings: SettingsTable,
  #[serde(default)]
  pub xcconfig: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsManifest {
  #[serde(default)]
  pub base: SettingsTable,
  #[serde(default)]
  pub configurations: BTreeMap<String, ConfigurationManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesManifest {
  pub patterns: Vec<String>,
  #[serde(default)]
  pub excludes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeadersManifest {
  #[serde(default)]
  pub public: Option<String>,
  #[serde(default)]
  pub private: Option<String>,
  #[serde(default)]
  pub project: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InfoPlistManifest {
  Path(String),
  Synthesized(BTreeMap<String, toml::Value>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionManifest {
  pub name: String,
  pub script: String,
  #[serde(default)]
  pub show_env_vars: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionsManifest {
  #[serde(default)]
  pub pre: Vec<ActionManifest>,
  #[serde(default)]
  pub post: Vec<ActionManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetManifest {
  pub platform: Platform,
  pub product: Product,
  #[serde(default)]
  pub bundle_id: String,
  #[serde(default)]
  pub deployment_target: Option<String>,
  #[serde(default)]
  pub info_plist: Option<InfoPlistManifest>,
  #[serde(default)]
  pub entitlements: Option<String>,
  #[serde(default)]
  pub sources: Vec<String>,
  #[serde(default)]
  pub resources: Vec<ResourcesManifest>,
  #[serde(default)]
  pub headers: Option<HeadersManifest>,
  #[serde(default)]
  pub dependencies: Vec<DependencyManifest>,
  #[serde(default)]
  pub settings: SettingsManifest,
  #[serde(default)]
  pub environment: BTreeMap<String, String>,
  #[serde(default)]
  pub launch_arguments: Vec<String>,
  #[serde(default)]
  pub core_data_models: Vec<String>,
  #[serde(default)]
  pub actions: ActionsManifest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemeActionManifest {
  #[serde(default)]
  pub targets: Vec<String>,
  #[serde(default)]
  pub coverage: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemeManifest {
  pub name: String,
  #[serde(default = "default_true")]
  pub shared: bool,
  #[serde(default)]
  pub build_action: Option<SchemeActionManifest>,
  #[serde(default)]
  pub test_action: Option<SchemeActionManifest>,
  #[serde(default)]
  pub run_action: Option<SchemeActionManifest>,
  #[serde(default)]
  pub profile_action: Option<SchemeActionManifest>,
  #[serde(default)]
  pub analyze_action: Option<SchemeActionManifest>,
  #[serde(default)]
  pub archive_action: Option<SchemeActionManifest>,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileElementManifest {
  pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceSynthesizersManifest {
  #[serde(default = "default_true")]
  pub assets: bool,
  #[serde(default = "default_true")]
  pub strings: bool,
  #[serde(default = "default_true")]
  pub fonts: bool,
  #[serde(default = "default_true")]
  pub plists: bool,
  #[serde(default = "default_true")]
  pub interface_builder: bool,
}

impl Default for SettingsManifest {
  fn default() -> Self {
    SettingsManifest { base: BTreeMap::new(), configurations: BTreeMap::new() }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
  pub name: String,
  #[serde(default)]
  pub organization_name: Option<String>,
  #[serde(default)]
  pub targets: BTreeMap<String, TargetManifest>,
  #[serde(default)]
  pub schemes: Vec<SchemeManifest>,
  #[serde(default)]
  pub settings: SettingsManifest,
  #[serde(default)]
  pub additional_files: Vec<FileElementManifest>,
  #[serde(default)]
  pub resource_synthesizers: ResourceSynthesizersManifest,
  #[serde(default = "default_debug_configuration_name")]
  pub default_debug_build_configuration_name: String,
}

fn default_debug_configuration_name() -> String {
  "Debug".to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_platform_names() {
    assert_eq!(Platform::parse("ios").unwrap(), Platform::Ios);
    assert_eq!(Platform::parse("macos").unwrap(), Platform::Macos);
    assert_eq!(Platform::parse("tvos").unwrap(), Platform::Tvos);
    assert_eq!(Platform::parse("watchos").unwrap(), Platform::Watchos);
  }

  #[test]
  fn rejects_unknown_platform_name() {
    let err = Platform::parse("linux").unwrap_err();
    assert!(matches!(err, crate::error::CoreError::UnknownPlatform(name) if name == "linux"));
  }
}
