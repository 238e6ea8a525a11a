//! Tagged dependency variants (spec section 3, "Dependency").
//!
//! A sum type, per the design note in spec section 9: every consumer
//! (external-dependencies generator, manifest converter) must exhaustively
//! match it.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkStatus {
  Required,
  Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyManifest {
  Target { name: String },
  Project { name: String, path: String },
  Framework { path: String },
  Xcframework { path: String },
  Library {
    path: String,
    #[serde(default)]
    public_headers: Option<String>,
    #[serde(default)]
    swift_module_map: Option<String>,
  },
  Sdk { name: String, status: SdkStatus },
  PackageProduct { name: String },
  Cocoapods { path: String },
  External { name: String },
}
