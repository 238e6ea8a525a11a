//! Step 3 of the project mapper pipeline (spec 4.G): library/framework
//! targets can't embed resources directly in Xcode, so resources are
//! split into a companion bundle target the host target links against.

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::manifest::project::Product;
use crate::model::{Actions, Dependency, Project, Settings, Target};
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

pub struct ResourcesProjectMapper;

fn needs_companion_bundle(product: Product) -> bool {
  matches!(product, Product::Framework | Product::StaticFramework | Product::StaticLibrary | Product::DynamicLibrary)
}

impl ProjectMapper for ResourcesProjectMapper {
  fn map(&self, _services: &Services, _config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    let mut companions = Vec::new();

    for target in &mut project.targets {
      if !needs_companion_bundle(target.product) || target.resources.is_empty() {
        continue;
      }
      let bundle_name = format!("{}Resources", target.name);
      companions.push(Target {
        name: bundle_name.clone(),
        platform: target.platform,
        product: Product::Bundle,
        bundle_id: format!("{}.resources", target.bundle_id),
        deployment_target: target.deployment_target.clone(),
        info_plist: None,
        entitlements: None,
        sources: vec![],
        resources: std::mem::take(&mut target.resources),
        headers: None,
        dependencies: vec![],
        settings: Settings::default(),
        environment: Default::default(),
        launch_arguments: vec![],
        core_data_models: vec![],
        actions: Actions::default(),
      });
      target.dependencies.push(Dependency::Target { name: bundle_name });
    }

    project.targets.extend(companions);
    Ok((project, vec![]))
  }
}
