//! Fatal error taxonomy for the core (spec ``7. ERROR HANDLING DESIGN``).
//!
//! Recoverable conditions (a glob matching nothing, a folder reference that
//! isn't a directory, ...) are *not* represented here: they are reported
//! through [`crate::services::Reporter`] as [`crate::services::Warning`]
//! values and never abort generation. Everything in this enum aborts the
//! pipeline the moment it is produced.

use std::path::PathBuf;

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("manifest not found: {0}")]
  ManifestNotFound(PathBuf),

  #[error("feature not yet supported: {0}")]
  FeatureNotYetSupported(String),

  #[error("missing file: {0}")]
  MissingFile(PathBuf),

  #[error("no directory at {resolved_root} while expanding glob pattern {pattern}")]
  NonExistentGlobDirectory { pattern: String, resolved_root: PathBuf },

  #[error("cyclic dependency detected at {0}")]
  CyclicDependency(PathBuf),

  #[error("unsupported dependency kind: {0}")]
  UnsupportedDependencyKind(String),

  #[error("unknown by-name dependency: {0}")]
  UnknownByNameDependency(String),

  #[error("unknown product dependency {product} in package {package}")]
  UnknownProductDependency { product: String, package: String },

  #[error("unknown platform: {0}")]
  UnknownPlatform(String),

  #[error("no supported platforms for package {package} (configured: {configured:?}, declared: {declared:?})")]
  NoSupportedPlatforms { package: String, configured: Vec<String>, declared: Vec<String> },

  #[error("unsupported setting {name} for tool {tool}")]
  UnsupportedSetting { tool: String, name: String },

  #[error("Cartfile not found")]
  CartfileNotFound,

  #[error("carthage executable not found")]
  CarthageNotFound,

  #[error("{0}")]
  Other(#[from] anyhow::Error),
}

impl CoreError {
  /// A terse, user-facing description. Silent/internal variants fall back to
  /// a generic notice rather than leaking collaborator internals, matching
  /// the propagation rule in spec section 7.
  pub fn user_message(&self) -> String {
    match self {
      CoreError::Other(_) => "An unexpected error occurred".to_string(),
      other => other.to_string(),
    }
  }
}
