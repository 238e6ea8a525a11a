//! Lowered shape of a resolved third-party package (spec 4.D step 2,
//! expanded per `SPEC_FULL.md` "external-dependencies generator").
//!
//! `PackageInfo` is what the package-info loader collaborator hands back for
//! one package folder. The core never parses the package manifest itself;
//! it only consumes this already-decoded shape.

use serde::Deserialize;

use crate::manifest::project::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
  LibraryStatic,
  LibraryDynamic,
  LibraryAutomatic,
  Executable,
  Plugin,
  Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
  Regular,
  Test,
  Binary,
  System,
  Plugin,
  Macro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
  C,
  Cxx,
  Swift,
  Linker,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackagePlatform {
  pub platform: Platform,
  pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageProduct {
  pub name: String,
  pub kind: ProductKind,
  pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDependencyRef {
  ByName { name: String },
  Target { name: String },
  Product { name: String, package: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageTarget {
  pub name: String,
  pub kind: TargetKind,
  #[serde(default)]
  pub dependencies: Vec<TargetDependencyRef>,
  /// `(tool, setting_name, value)`.
  #[serde(default)]
  pub settings: Vec<(Tool, String, String)>,
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub resources: Vec<String>,
  #[serde(default)]
  pub is_binary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageInfo {
  pub name: String,
  #[serde(default)]
  pub platforms: Vec<PackagePlatform>,
  pub products: Vec<PackageProduct>,
  pub targets: Vec<PackageTarget>,
}

/// The external collaborator that turns an on-disk package folder into a
/// `PackageInfo` (spec 4.D step 2: "invoke the package-info loader
/// (external collaborator)"). Production wires this to the real package
/// manager; tests supply a canned map.
pub trait PackageInfoLoader {
  fn load(&self, folder: &std::path::Path) -> crate::error::CoreResult<PackageInfo>;
}

/// Default production loader: reads `<folder>/package-info.json`, already
/// shaped as `PackageInfo`. A real package manager integration would shell
/// out to introspect the package manifest directly and translate its
/// output into this shape instead; that translation step is the "external
/// collaborator" the trait exists to keep out of the core's trust boundary.
pub struct JsonFilePackageInfoLoader;

impl PackageInfoLoader for JsonFilePackageInfoLoader {
  fn load(&self, folder: &std::path::Path) -> crate::error::CoreResult<PackageInfo> {
    let path = folder.join("package-info.json");
    let text = std::fs::read_to_string(&path)
      .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let info = serde_json::from_str(&text)
      .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;
    Ok(info)
  }
}
