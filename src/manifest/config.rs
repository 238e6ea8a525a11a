//! `Config` manifest value (spec section 3 "Config", section 4.J).

use serde::Deserialize;
use std::collections::BTreeMap;

/// One entry of the closed `generation_options` set. Represented as a tagged
/// enum inside an ordered `Vec` (not a map) because the first-one-wins
/// invariant for duplicate `xcode_project_name`/`organization_name` entries
/// depends on insertion order (spec section 3, S3 in section 8).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "option", rename_all = "snake_case")]
pub enum GenerationOption {
  XcodeProjectName { template: String },
  OrganizationName { name: String },
  DevelopmentRegion { region: String },
  DisableAutogeneratedSchemes,
  DisableSynthesizedResourceAccessors,
  DisableShowEnvironmentVarsInScriptPhases,
  EnableCodeCoverage,
  ResolveDependenciesWithSystemScm,
  DisablePackageVersionLocking,
  TemplateMacros { value: toml::Value },
  SwiftToolsVersion { version: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudOption {
  Insights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cloud {
  pub url: String,
  pub project_id: String,
  #[serde(default)]
  pub options: Vec<CloudOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigManifest {
  #[serde(default)]
  pub generation_options: Vec<GenerationOption>,
  #[serde(default)]
  pub compatible_ide_versions: Vec<String>,
  #[serde(default)]
  pub cloud: Option<Cloud>,
  #[serde(default)]
  pub cache: Option<CacheConfig>,
  #[serde(default)]
  pub plugins: Vec<String>,
}

impl ConfigManifest {
  /// `Config.default`: empty options, nil cloud/cache, all compatible IDE
  /// versions (represented as an empty list meaning "no restriction").
  pub fn default_config() -> Self {
    ConfigManifest::default()
  }

  pub fn has_option(&self, predicate: impl Fn(&GenerationOption) -> bool) -> bool {
    self.generation_options.iter().any(predicate)
  }

  /// First `xcode_project_name` template, if any (first-wins, section 3).
  pub fn xcode_project_name_template(&self) -> Option<&str> {
    self.generation_options.iter().find_map(|o| match o {
      GenerationOption::XcodeProjectName { template } => Some(template.as_str()),
      _ => None,
    })
  }

  /// First `organization_name`, if any (first-wins, section 3).
  pub fn organization_name(&self) -> Option<&str> {
    self.generation_options.iter().find_map(|o| match o {
      GenerationOption::OrganizationName { name } => Some(name.as_str()),
      _ => None,
    })
  }

  pub fn disable_autogenerated_schemes(&self) -> bool {
    self.has_option(|o| matches!(o, GenerationOption::DisableAutogeneratedSchemes))
  }

  pub fn disable_synthesized_resource_accessors(&self) -> bool {
    self.has_option(|o| matches!(o, GenerationOption::DisableSynthesizedResourceAccessors))
  }

  pub fn enable_code_coverage(&self) -> bool {
    self.has_option(|o| matches!(o, GenerationOption::EnableCodeCoverage))
  }
}

pub type TemplateMacros = BTreeMap<String, toml::Value>;
