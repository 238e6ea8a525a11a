//! Step 7 of the project mapper pipeline: per-target manual code signing.
//! A `signing/<Target>.signing.toml` file sibling to the project manifest
//! switches that target from `CODE_SIGN_STYLE=Automatic` to `Manual` and
//! supplies the matching `DEVELOPMENT_TEAM`/`PROVISIONING_PROFILE_SPECIFIER`/
//! `CODE_SIGN_IDENTITY` settings on every configuration. Targets that are
//! neither app-like nor extension-like are never signed.

use serde::Deserialize;

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::manifest::project::Product;
use crate::model::{Project, SettingValue, SettingsTable};
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

#[derive(Debug, Deserialize)]
struct SigningManifest {
  team_id: String,
  identity: String,
  provisioning_profile_specifier: String,
}

fn is_signable(product: Product) -> bool {
  product.is_runnable()
    || matches!(
      product,
      Product::AppExtension
        | Product::MessagesExtension
        | Product::Watch2Extension
        | Product::TvTopShelfExtension
        | Product::StickerPackExtension
    )
}

pub struct SigningMapper;

impl ProjectMapper for SigningMapper {
  fn map(&self, services: &Services, _config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    let signing_dir = project.path.join("signing");

    for target in &mut project.targets {
      if !is_signable(target.product) {
        continue;
      }

      let manifest_path = signing_dir.join(format!("{}.signing.toml", target.name));
      let signing = if services.fs.exists(&manifest_path) {
        let contents = services.fs.read_to_string(&manifest_path)?;
        Some(toml::from_str::<SigningManifest>(&contents)
          .map_err(|e| anyhow::anyhow!("invalid signing manifest {}: {}", manifest_path.display(), e))?)
      } else {
        None
      };

      if target.settings.configurations.is_empty() {
        apply_signing(&mut target.settings.base, signing.as_ref());
      } else {
        for (_, configuration) in target.settings.configurations.iter_mut() {
          apply_signing(&mut configuration.settings, signing.as_ref());
        }
      }
    }

    Ok((project, vec![]))
  }
}

fn apply_signing(settings: &mut SettingsTable, signing: Option<&SigningManifest>) {
  match signing {
    Some(s) => {
      settings.insert("CODE_SIGN_STYLE".into(), SettingValue::String("Manual".into()));
      settings.insert("DEVELOPMENT_TEAM".into(), SettingValue::String(s.team_id.clone()));
      settings.insert("PROVISIONING_PROFILE_SPECIFIER".into(), SettingValue::String(s.provisioning_profile_specifier.clone()));
      settings.insert("CODE_SIGN_IDENTITY".into(), SettingValue::String(s.identity.clone()));
    }
    None => {
      settings.insert("CODE_SIGN_STYLE".into(), SettingValue::String("Automatic".into()));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Actions, BuildConfiguration, Configuration, ConfigurationVariant, ResourceSynthesizers, Settings, Target};
  use crate::services::{MemoryFileSystem, RecordingReporter};
  use std::collections::BTreeMap;
  use std::path::PathBuf;

  fn app_target() -> Target {
    let mut settings = Settings::default();
    settings.configurations.insert(
      BuildConfiguration { name: "Debug".into(), variant: ConfigurationVariant::Debug },
      Configuration::default(),
    );
    Target {
      name: "App".into(),
      platform: crate::manifest::project::Platform::Ios,
      product: Product::App,
      bundle_id: "com.example.app".into(),
      deployment_target: None,
      info_plist: None,
      entitlements: None,
      sources: vec![],
      resources: vec![],
      headers: None,
      dependencies: vec![],
      settings,
      environment: BTreeMap::new(),
      launch_arguments: vec![],
      core_data_models: vec![],
      actions: Actions::default(),
    }
  }

  fn project(target: Target) -> Project {
    Project {
      path: PathBuf::from("/p"),
      name: "P".into(),
      organization_name: None,
      targets: vec![target],
      schemes: vec![],
      settings: Settings::default(),
      additional_files: vec![],
      resource_synthesizers: ResourceSynthesizers::default(),
      default_debug_build_configuration_name: "Debug".into(),
      file_name: "P".into(),
    }
  }

  #[test]
  fn signing_manifest_present_injects_manual_signing() {
    let fs = MemoryFileSystem::new().with_file(
      "/p/signing/App.signing.toml",
      "team_id = \"ABCDE12345\"\nidentity = \"Apple Distribution\"\nprovisioning_profile_specifier = \"App Store Profile\"\n",
    );
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let (mapped, _) = SigningMapper.map(&services, &config, project(app_target())).unwrap();
    let configuration = mapped.targets[0].settings.ordered_configurations()[0].1;
    assert_eq!(configuration.settings.get("CODE_SIGN_STYLE"), Some(&SettingValue::String("Manual".into())));
    assert_eq!(configuration.settings.get("DEVELOPMENT_TEAM"), Some(&SettingValue::String("ABCDE12345".into())));
  }

  #[test]
  fn no_signing_manifest_defaults_to_automatic() {
    let fs = MemoryFileSystem::new();
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let (mapped, _) = SigningMapper.map(&services, &config, project(app_target())).unwrap();
    let configuration = mapped.targets[0].settings.ordered_configurations()[0].1;
    assert_eq!(configuration.settings.get("CODE_SIGN_STYLE"), Some(&SettingValue::String("Automatic".into())));
  }

  #[test]
  fn non_signable_target_untouched() {
    let mut target = app_target();
    target.product = Product::Framework;
    target.name = "Core".into();
    let fs = MemoryFileSystem::new().with_file(
      "/p/signing/Core.signing.toml",
      "team_id = \"X\"\nidentity = \"Y\"\nprovisioning_profile_specifier = \"Z\"\n",
    );
    let reporter = RecordingReporter::default();
    let services = Services::new(&reporter, &fs, "tester");
    let config = ConfigManifest::default_config();

    let (mapped, _) = SigningMapper.map(&services, &config, project(target)).unwrap();
    let configuration = mapped.targets[0].settings.ordered_configurations()[0].1;
    assert!(configuration.settings.get("CODE_SIGN_STYLE").is_none());
  }
}
