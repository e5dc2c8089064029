//! Artifact file-name construction by placeholder substitution.
//!
//! Every axis a template references must be visible in the output name and
//! vice versa: a placeholder without a value, a value without a
//! placeholder, or a repeated placeholder are all errors. Without that
//! contract two variants differing only in an unreferenced axis would
//! collide on the same file name.

use crate::diag::DiagSink;
use crate::model::ConfiguredArtifact;

/// Substitute `placeholder` in `name` with `value`, enforcing the
/// presence/absence contract. Returns false after reporting when the
/// contract is violated.
fn replace_placeholder(
    name: &mut String,
    placeholder: &str,
    value: Option<&str>,
    diag: &mut dyn DiagSink,
) -> bool {
    let offset = name.find(placeholder);
    match (offset, value) {
        (None, None) => true,
        (None, Some(_)) => {
            diag.error(format!("missing placeholder for artifact: {}", placeholder));
            false
        }
        (Some(_), None) => {
            diag.error(format!(
                "placeholder present but no value for artifact: {}",
                placeholder
            ));
            false
        }
        (Some(at), Some(value)) => {
            name.replace_range(at..at + placeholder.len(), value);
            if name.contains(placeholder) {
                diag.error(format!("placeholder present multiple times: {}", placeholder));
                return false;
            }
            true
        }
    }
}

/// Extension of a file name, including the leading separator; empty when
/// the name has none.
fn extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(at) => &file_name[at..],
        None => "",
    }
}

/// Expand `${basename}` and `${ext}` from the input file name.
///
/// Both are optional to reference; when `${ext}` is absent and the result
/// does not already end in the input extension, the extension is appended
/// so the output stays openable by the same tooling.
fn to_base_name(template: &str, apk_name: &str, diag: &mut dyn DiagSink) -> Option<String> {
    let ext = extension(apk_name);
    let base_name = &apk_name[..apk_name.len() - ext.len()];

    let mut result = template.to_string();

    if result.contains("${basename}") {
        let value = (!base_name.is_empty()).then_some(base_name);
        if !replace_placeholder(&mut result, "${basename}", value, diag) {
            return None;
        }
    }

    if result.contains("${ext}") {
        let bare_ext = ext.strip_prefix('.').unwrap_or(ext);
        if !replace_placeholder(&mut result, "${ext}", Some(bare_ext), diag) {
            return None;
        }
    } else if !result.ends_with(ext) {
        result.push_str(ext);
    }

    Some(result)
}

impl ConfiguredArtifact {
    /// Expand the global name format for this artifact.
    ///
    /// Axis placeholders substitute the referenced group labels; the
    /// presence/absence contract applies to each of the six axes.
    pub fn to_artifact_name(
        &self,
        format: &str,
        apk_name: &str,
        diag: &mut dyn DiagSink,
    ) -> Option<String> {
        let mut result = to_base_name(format, apk_name, diag)?;

        let substitutions = [
            ("${abi}", &self.abi_group),
            ("${density}", &self.screen_density_group),
            ("${locale}", &self.locale_group),
            ("${sdk}", &self.android_sdk_group),
            ("${feature}", &self.device_feature_group),
            ("${gl}", &self.gl_texture_group),
        ];
        for (placeholder, value) in substitutions {
            if !replace_placeholder(&mut result, placeholder, value.as_deref(), diag) {
                return None;
            }
        }
        Some(result)
    }

    /// Expand this artifact's literal name template. Only the base-name and
    /// extension placeholders apply; axis placeholders are left to the
    /// global format path.
    pub fn literal_name(&self, apk_name: &str, diag: &mut dyn DiagSink) -> Option<String> {
        let name = self.name.as_ref()?;
        to_base_name(name, apk_name, diag)
    }
}
