//! Step 2 of the project mapper pipeline (spec 4.G): schedule removal of
//! the project's derived-artefact directory. Declarative only — the
//! mapper never touches disk itself, it emits a side effect descriptor
//! for the caller to apply.

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::model::Project;
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

pub struct DeleteDerivedDirectoryProjectMapper;

impl ProjectMapper for DeleteDerivedDirectoryProjectMapper {
  fn map(&self, _services: &Services, _config: &ConfigManifest, project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    let derived = project.path.join("DerivedData");
    Ok((project, vec![SideEffectDescriptor::DeleteDirectory(derived)]))
  }
}
