//! Step 4 of the project mapper pipeline (spec 4.G): materialise
//! synthesized `Info.plist` dictionaries into an actual XML plist file
//! (spec calls this the "info-plist content provider collaborator"; we
//! implement it in-process with the `plist` crate rather than shelling
//! out, since the content is already fully known at this point).

use std::collections::BTreeMap;

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::model::{InfoPlist, Project};
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

fn toml_to_plist(value: &toml::Value) -> plist::Value {
  match value {
    toml::Value::String(s) => plist::Value::String(s.clone()),
    toml::Value::Integer(i) => plist::Value::Integer((*i).into()),
    toml::Value::Float(f) => plist::Value::Real(*f),
    toml::Value::Boolean(b) => plist::Value::Boolean(*b),
    toml::Value::Array(items) => plist::Value::Array(items.iter().map(toml_to_plist).collect()),
    toml::Value::Table(table) => {
      let dict: plist::Dictionary = table.iter().map(|(k, v)| (k.clone(), toml_to_plist(v))).collect();
      plist::Value::Dictionary(dict)
    }
    toml::Value::Datetime(dt) => plist::Value::String(dt.to_string()),
  }
}

fn materialize(dict: &BTreeMap<String, toml::Value>) -> CoreResult<Vec<u8>> {
  let plist_dict: plist::Dictionary = dict.iter().map(|(k, v)| (k.clone(), toml_to_plist(v))).collect();
  let mut out = Vec::new();
  plist::to_writer_xml(&mut out, &plist::Value::Dictionary(plist_dict))
    .map_err(|e| anyhow::anyhow!("failed to serialize synthesized Info.plist: {}", e))?;
  Ok(out)
}

pub struct GenerateInfoPlistProjectMapper;

impl ProjectMapper for GenerateInfoPlistProjectMapper {
  fn map(&self, _services: &Services, _config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    let mut effects = Vec::new();
    let project_path = project.path.clone();

    for target in &mut project.targets {
      let Some(InfoPlist::Synthesized(dict)) = &target.info_plist else { continue };
      let contents = materialize(dict)?;
      let generated_path = project_path.join("DerivedSources").join(format!("{}-Info.plist", target.name));
      effects.push(SideEffectDescriptor::WriteFile { path: generated_path.clone(), contents });
      target.info_plist = Some(InfoPlist::Path(generated_path));
    }

    Ok((project, effects))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Actions, ResourceSynthesizers, Settings, Target};
  use crate::services::{MemoryFileSystem, RecordingReporter};
  use std::path::PathBuf;

  fn target_with_synthesized_plist() -> Target {
    let mut dict = BTreeMap::new();
    dict.insert("CFBundleIdentifier".to_string(), toml::Value::String("$(PRODUCT_BUNDLE_IDENTIFIER)".into()));
    Target {
      name: "App".into(),
      platform: crate::manifest::project::Platform::Ios,
      product: crate::manifest::project::Product::App,
      bundle_id: "com.example.app".into(),
      deployment_target: None,
      info_plist: Some(InfoPlist::Synthesized(dict)),
      entitlements: None,
      sources: vec![],
      resources: vec![],
      headers: None,
      dependencies: vec![],
      settings: Settings::default(),
      environment: Default::default(),
      launch_arguments: vec![],
      core_data_models: vec![],
      actions: Actions::default(),
    }
  }

  #[test]
  fn synthesized_plist_becomes_write_file_and_path() {
    let project = Project {
      path: PathBuf::from("/p"),
      name: "P".into(),
      organization_name: None,
      targets: vec![target_with_synthesized_plist()],
      schemes: vec![],
      settings: Settings::default(),
      additional_files: vec![],
      resource_synthesizers: ResourceSynthesizers::default(),
      default_debug_build_configuration_name: "Debug".into(),
      file_name: "P".into(),
    };
    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let (mapped, effects) = GenerateInfoPlistProjectMapper.map(&services, &config, project).unwrap();
    assert_eq!(effects.len(), 1);
    match &mapped.targets[0].info_plist {
      Some(InfoPlist::Path(p)) => assert_eq!(p, &PathBuf::from("/p/DerivedSources/App-Info.plist")),
      other => panic!("expected a path, got {other:?}"),
    }
  }
}
