//! Expansion of artifact declarations into fully resolved output
//! artifacts.
//!
//! Resolution is all-or-nothing: every artifact is attempted so that all
//! problems are reported in one pass, but a single failure discards the
//! entire result. The caller never receives a partial artifact set.

use std::path::Path;

use crate::diag::{DiagSink, ScopedSink};
use crate::model::{ConfiguredArtifact, Group, OutputArtifact, SplitConfig};

/// Copy the values of a referenced group into `target`.
///
/// No reference means nothing to do and no error; a reference to a missing
/// label is the caller's error to report.
fn copy_group_values<T: Clone>(
    reference: &Option<String>,
    groups: &Group<T>,
    target: &mut Vec<T>,
) -> bool {
    let Some(label) = reference else {
        return true;
    };
    match groups.get(label) {
        Some(values) => {
            target.extend_from_slice(values);
            true
        }
        None => false,
    }
}

fn to_output_artifact(
    artifact: &ConfiguredArtifact,
    apk_name: &str,
    config: &SplitConfig,
    diag: &mut dyn DiagSink,
) -> Option<OutputArtifact> {
    if artifact.name.is_none() && config.artifact_format.is_none() {
        diag.error("artifact has no name and no global artifact format is defined".to_string());
        return None;
    }

    let name = match (&artifact.name, &config.artifact_format) {
        (Some(_), _) => artifact.literal_name(apk_name, diag),
        (None, Some(format)) => artifact.to_artifact_name(format, apk_name, diag),
        (None, None) => unreachable!("checked above"),
    };
    let Some(name) = name else {
        diag.error("could not determine split artifact name".to_string());
        return None;
    };

    let mut output = OutputArtifact {
        name,
        version: artifact.version,
        ..OutputArtifact::default()
    };

    // Later messages carry the resolved name so the caller can tell which
    // artifact each one belongs to.
    let mut scoped = ScopedSink::new(output.name.clone(), diag);
    let mut has_errors = false;

    if !copy_group_values(&artifact.abi_group, &config.abi_groups, &mut output.abis) {
        scoped.error(format!(
            "could not lookup required ABIs: {}",
            artifact.abi_group.as_deref().unwrap_or_default()
        ));
        has_errors = true;
    }

    if !copy_group_values(
        &artifact.locale_group,
        &config.locale_groups,
        &mut output.locales,
    ) {
        scoped.error(format!(
            "could not lookup required locales: {}",
            artifact.locale_group.as_deref().unwrap_or_default()
        ));
        has_errors = true;
    }

    if !copy_group_values(
        &artifact.screen_density_group,
        &config.screen_density_groups,
        &mut output.screen_densities,
    ) {
        scoped.error(format!(
            "could not lookup required screen densities: {}",
            artifact.screen_density_group.as_deref().unwrap_or_default()
        ));
        has_errors = true;
    }

    if !copy_group_values(
        &artifact.device_feature_group,
        &config.device_feature_groups,
        &mut output.features,
    ) {
        scoped.error(format!(
            "could not lookup required device features: {}",
            artifact.device_feature_group.as_deref().unwrap_or_default()
        ));
        has_errors = true;
    }

    if !copy_group_values(
        &artifact.gl_texture_group,
        &config.gl_texture_groups,
        &mut output.textures,
    ) {
        scoped.error(format!(
            "could not lookup required GL texture formats: {}",
            artifact.gl_texture_group.as_deref().unwrap_or_default()
        ));
        has_errors = true;
    }

    if let Some(label) = &artifact.android_sdk_group {
        match config.android_sdk_groups.get(label) {
            Some(entry) => output.android_sdk = Some(entry.clone()),
            None => {
                scoped.error(format!(
                    "could not lookup required Android SDK version: {}",
                    label
                ));
                has_errors = true;
            }
        }
    }

    if has_errors {
        return None;
    }
    Some(output)
}

/// Resolve every artifact declaration against the group registries.
///
/// `apk_path` supplies the input file name whose base name and extension
/// feed the name templates. Returns `None` when any artifact fails, after
/// reporting every failure.
pub fn resolve_artifacts(
    config: &SplitConfig,
    apk_path: &str,
    diag: &mut dyn DiagSink,
) -> Option<Vec<OutputArtifact>> {
    let mut by_version: Vec<&ConfiguredArtifact> = config.artifacts.iter().collect();
    by_version.sort_by_key(|artifact| artifact.version);
    if by_version
        .windows(2)
        .any(|pair| pair[0].version == pair[1].version)
    {
        diag.error("configuration has duplicate versions".to_string());
        return None;
    }

    let apk_name = Path::new(apk_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(apk_path);

    let mut outputs = Vec::with_capacity(config.artifacts.len());
    let mut has_errors = false;

    // Declaration order, so the output list matches the document.
    for artifact in &config.artifacts {
        match to_output_artifact(artifact, apk_name, config, diag) {
            Some(output) => outputs.push(output),
            None => has_errors = true,
        }
    }

    if has_errors {
        return None;
    }
    Some(outputs)
}
