//! Workspace manifest value (spec section 3, "Workspace").

use serde::Deserialize;

use super::project::FileElementManifest;

#[derive(Debug, Clone, Deserialize)]
pub struct SchemeRefManifest {
  pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceManifest {
  pub name: String,
  #[serde(default)]
  pub projects: Vec<String>,
  #[serde(default)]
  pub additional_files: Vec<FileElementManifest>,
  #[serde(default)]
  pub schemes: Vec<SchemeRefManifest>,
}
