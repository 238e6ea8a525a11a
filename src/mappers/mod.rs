//! Project mapper pipeline (spec 4.G) and graph mapper pipeline (spec 4.H).
//!
//! Each project mapper is a pure `Project -> (Project, side effects)`
//! transform; the pipeline is the ordered composition of all of them
//! (order matters — see each module's doc comment for why).

pub mod auto_schemes;
pub mod delete_derived;
pub mod graph_mappers;
pub mod info_plist;
pub mod project_name;
pub mod resource_synthesizer;
pub mod resources;
pub mod signing;

use std::path::PathBuf;

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::model::Project;
use crate::services::Services;

/// A declarative, deferred filesystem action (spec 4.G: "returns
/// `(Project, list<SideEffectDescriptor>)`"). Nothing in this crate
/// touches disk directly; the caller applies these.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffectDescriptor {
  DeleteDirectory(PathBuf),
  WriteFile { path: PathBuf, contents: Vec<u8> },
}

pub trait ProjectMapper {
  fn map(&self, services: &Services, config: &ConfigManifest, project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)>;
}

/// The ordered pipeline (spec 4.G, steps 1-7). Steps gated by a `Config`
/// option are omitted entirely rather than run as a no-op.
pub fn pipeline(config: &ConfigManifest) -> Vec<Box<dyn ProjectMapper>> {
  let mut mappers: Vec<Box<dyn ProjectMapper>> = Vec::new();
  if !config.disable_autogenerated_schemes() {
    mappers.push(Box::new(auto_schemes::AutogeneratedSchemesProjectMapper));
  }
  mappers.push(Box::new(delete_derived::DeleteDerivedDirectoryProjectMapper));
  mappers.push(Box::new(resources::ResourcesProjectMapper));
  mappers.push(Box::new(info_plist::GenerateInfoPlistProjectMapper));
  if !config.disable_synthesized_resource_accessors() {
    mappers.push(Box::new(resource_synthesizer::SynthesizedResourceInterfaceProjectMapper));
  }
  mappers.push(Box::new(project_name::ProjectNameAndOrganizationMapper));
  mappers.push(Box::new(signing::SigningMapper));
  mappers
}

/// Runs every mapper in `pipeline` over `project`, concatenating side
/// effects in pipeline order.
pub fn run(services: &Services, config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
  let mut effects = Vec::new();
  for mapper in pipeline(config) {
    let (next, mut these) = mapper.map(services, config, project)?;
    project = next;
    effects.append(&mut these);
  }
  Ok((project, effects))
}
