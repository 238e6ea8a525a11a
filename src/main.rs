//! CLI entry point. Deliberately small: argument parsing and applying the
//! side effects the library pipeline returns are the only things that
//! belong outside `xcodegraph`'s trust boundary (spec section 1/6 scope
//! the CLI surface out of the core).

use std::path::PathBuf;

use clap::Parser;

use xcodegraph::external::JsonFilePackageInfoLoader;
use xcodegraph::manifest::project::Platform;
use xcodegraph::mappers::SideEffectDescriptor;
use xcodegraph::services::{RealFileSystem, Services, TracingReporter};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"), version, author, about = env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
  /// Folder containing a Project.toml or Workspace.toml
  root: PathBuf,

  /// Platforms to intersect external package dependencies against
  /// (comma-separated: ios, macos, tvos). Defaults to none configured.
  #[arg(long, value_delimiter = ',')]
  platforms: Vec<String>,
}

fn apply_side_effect(effect: SideEffectDescriptor) -> std::io::Result<()> {
  match effect {
    SideEffectDescriptor::DeleteDirectory(path) => {
      if path.exists() {
        std::fs::remove_dir_all(path)?;
      }
      Ok(())
    }
    SideEffectDescriptor::WriteFile { path, contents } => {
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
      }
      std::fs::write(path, contents)
    }
  }
}

fn main() {
  tracing_subscriber::fmt::init();

  let cli = Cli::parse();
  let root = cli.root.canonicalize().unwrap_or(cli.root);
  let configured_platforms: Vec<Platform> = match cli.platforms.iter().map(|p| Platform::parse(p)).collect() {
    Ok(platforms) => platforms,
    Err(e) => {
      eprintln!("{}", e.user_message());
      std::process::exit(1);
    }
  };

  let user_name = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
  let fs = RealFileSystem;
  let reporter = TracingReporter;
  let services = Services::new(&reporter, &fs, &user_name);
  let loader = JsonFilePackageInfoLoader;

  let result = xcodegraph::generate(&services, &root, &loader, &configured_platforms, &Default::default());

  match result {
    Ok(result) => {
      for effect in result.side_effects {
        if let Err(e) = apply_side_effect(effect) {
          tracing::error!("failed to apply side effect: {e}");
          std::process::exit(1);
        }
      }
      tracing::info!(
        "generated {} project(s){}",
        result.descriptor.projects.len(),
        result.descriptor.workspace.as_ref().map(|w| format!(" in workspace {}", w.name)).unwrap_or_default(),
      );
    }
    Err(e) => {
      eprintln!("{}", e.user_message());
      std::process::exit(1);
    }
  }
}
