//! Step 5 of the project mapper pipeline (spec 4.G): for each resource
//! kind the project hasn't disabled, generate one typed accessor source
//! file per target and append it to `target.sources`.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::CoreResult;
use crate::manifest::ConfigManifest;
use crate::model::{Project, ResourceSynthesizers};
use crate::services::Services;

use super::{ProjectMapper, SideEffectDescriptor};

fn kind_for(path: &Path) -> Option<&'static str> {
  match path.extension().and_then(|e| e.to_str()) {
    Some("xcassets") => Some("assets"),
    Some("strings") => Some("strings"),
    Some("ttf") | Some("otf") => Some("fonts"),
    Some("plist") => Some("plists"),
    Some("storyboard") | Some("xib") => Some("interface_builder"),
    _ => None,
  }
}

fn enabled(synth: &ResourceSynthesizers, kind: &str) -> bool {
  match kind {
    "assets" => synth.assets,
    "strings" => synth.strings,
    "fonts" => synth.fonts,
    "plists" => synth.plists,
    "interface_builder" => synth.interface_builder,
    _ => false,
  }
}

fn accessor_source(target_name: &str, kind: &str) -> String {
  format!("// Generated accessor for {kind} resources of target {target_name}.\n")
}

pub struct SynthesizedResourceInterfaceProjectMapper;

impl ProjectMapper for SynthesizedResourceInterfaceProjectMapper {
  fn map(&self, _services: &Services, _config: &ConfigManifest, mut project: Project) -> CoreResult<(Project, Vec<SideEffectDescriptor>)> {
    let mut effects = Vec::new();
    let project_path = project.path.clone();
    let synthesizers = project.resource_synthesizers.clone();

    for target in &mut project.targets {
      let mut seen_kinds: BTreeSet<&'static str> = BTreeSet::new();
      for resource in &target.resources {
        let Some(kind) = kind_for(resource) else { continue };
        if !enabled(&synthesizers, kind) || !seen_kinds.insert(kind) {
          continue;
        }
        let generated_path = project_path.join("DerivedSources").join(format!("{}+{}.generated.swift", target.name, kind));
        effects.push(SideEffectDescriptor::WriteFile {
          path: generated_path.clone(),
          contents: accessor_source(&target.name, kind).into_bytes(),
        });
        target.sources.push(generated_path);
      }
    }

    Ok((project, effects))
  }
}
