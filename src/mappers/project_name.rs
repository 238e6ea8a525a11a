//! Step 6 of the project mapper pipeline (spec 4.G): apply the
//! `organization_name`/`xcode_project_name` generation options. Both are
//! first-wins across duplicate option entries (spec section 3), which is
//! already handled by `ConfigManifest::organization_name()`/
//! `xcode_project_name_template()` — this mapper just applies whichever
//! value (if any) was found.

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::model::Project;
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

pub struct ProjectNameAndOrganizationMapper;

fn expand_template(template: &str, project_name: &str) -> String {
  template.replace("$(project_name)", project_name)
}

impl ProjectMapper for ProjectNameAndOrganizationMapper {
  fn map(&self, _services: &Services, config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    if let Some(organization_name) = config.organization_name() {
      project.organization_name = Some(organization_name.to_string());
    }
    if let Some(template) = config.xcode_project_name_template() {
      project.file_name = expand_template(template, &project.name);
    }
    Ok((project, vec![]))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::config::GenerationOption;
  use crate::model::{ResourceSynthesizers, Settings};
  use crate::services::{MemoryFileSystem, RecordingReporter};
  use std::path::PathBuf;

  fn project() -> Project {
    Project {
      path: PathBuf::from("/p"),
      name: "MyApp".into(),
      organization_name: None,
      targets: vec![],
      schemes: vec![],
      settings: Settings::default(),
      additional_files: vec![],
      resource_synthesizers: ResourceSynthesizers::default(),
      default_debug_build_configuration_name: "Debug".into(),
      file_name: "MyApp".into(),
    }
  }

  #[test]
  fn applies_template_substitution_and_organization_name() {
    let mut config = ConfigManifest::default_config();
    config.generation_options.push(GenerationOption::XcodeProjectName { template: "$(project_name)-Workspace".into() });
    config.generation_options.push(GenerationOption::OrganizationName { name: "Acme Corp".into() });

    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");

    let (mapped, _) = ProjectNameAndOrganizationMapper.map(&services, &config, project()).unwrap();
    assert_eq!(mapped.file_name, "MyApp-Workspace");
    assert_eq!(mapped.organization_name.as_deref(), Some("Acme Corp"));
  }

  #[test]
  fn first_duplicate_option_wins() {
    let mut config = ConfigManifest::default_config();
    config.generation_options.push(GenerationOption::OrganizationName { name: "First".into() });
    config.generation_options.push(GenerationOption::OrganizationName { name: "Second".into() });

    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");

    let (mapped, _) = ProjectNameAndOrganizationMapper.map(&services, &config, project()).unwrap();
    assert_eq!(mapped.organization_name.as_deref(), Some("First"));
  }

  #[test]
  fn no_options_leaves_project_unchanged() {
    let config = ConfigManifest::default_config();
    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");

    let (mapped, _) = ProjectNameAndOrganizationMapper.map(&services, &config, project()).unwrap();
    assert_eq!(mapped.file_name, "MyApp");
    assert!(mapped.organization_name.is_none());
  }
}
