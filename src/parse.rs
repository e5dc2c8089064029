//! Document extraction: walks the markup tree and populates a
//! [`SplitConfig`] through a static tag-handler table.
//!
//! Handlers aggregate their problems through the diagnostics sink and keep
//! going, so one bad element never hides errors in its siblings. Only
//! structural problems (unparseable document, wrong root, foreign
//! namespace) abort immediately.

use roxmltree::{Document, Node};

use crate::diag::DiagSink;
use crate::model::{
    Abi, AndroidManifest, AndroidSdk, ConfiguredArtifact, GlTexture, SplitConfig,
};
use crate::qualifier::{ConfigAxis, ConfigQualifier};

/// The only namespace a configuration document may declare
pub const CONFIG_NAMESPACE: &str = "http://schemas.android.com/tools/aapt";

const ROOT_ELEMENT: &str = "post-process";

type TagHandler =
    for<'a, 'input> fn(&mut SplitConfig, Node<'a, 'input>, &mut dyn DiagSink) -> bool;

/// (parent element, child element) pairs routed to their handlers.
/// Elements outside this closed set are skipped.
const TAG_ACTIONS: &[(&str, &str, TagHandler)] = &[
    ("artifacts", "artifact", handle_artifact),
    ("artifacts", "artifact-format", handle_artifact_format),
    ("groups", "abi-group", handle_abi_group),
    ("groups", "screen-density-group", handle_screen_density_group),
    ("groups", "locale-group", handle_locale_group),
    ("groups", "android-sdk-group", handle_android_sdk_group),
    ("groups", "gl-texture-group", handle_gl_texture_group),
    ("groups", "device-feature-group", handle_device_feature_group),
];

/// Parse a configuration document into registries and artifact templates.
///
/// Returns `None` when the document is structurally invalid or any handler
/// reported a schema violation; every violation is reported before the
/// extraction gives up.
pub fn extract_config(contents: &str, diag: &mut dyn DiagSink) -> Option<SplitConfig> {
    let document = match Document::parse(contents) {
        Ok(document) => document,
        Err(e) => {
            diag.error(format!("could not parse configuration document: {}", e));
            return None;
        }
    };

    let root = document.root_element();
    if let Some(namespace) = root.tag_name().namespace() {
        if namespace != CONFIG_NAMESPACE {
            diag.error_at(
                root.range(),
                format!("unknown namespace found on root element: {}", namespace),
            );
            return None;
        }
    }
    if root.tag_name().name() != ROOT_ELEMENT {
        diag.error_at(
            root.range(),
            format!(
                "expected root element <{}>, found <{}>",
                ROOT_ELEMENT,
                root.tag_name().name()
            ),
        );
        return None;
    }

    let mut config = SplitConfig::default();
    let mut valid = true;

    for branch in child_elements(root) {
        for element in child_elements(branch) {
            let action = TAG_ACTIONS.iter().find(|(parent, name, _)| {
                *parent == branch.tag_name().name() && *name == element.tag_name().name()
            });
            if let Some((_, _, handler)) = action {
                valid &= handler(&mut config, element, diag);
            }
        }
    }

    if !valid {
        diag.error("could not process configuration document".to_string());
        return None;
    }
    Some(config)
}

fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// First text node of an element, trimmed
fn element_text<'a>(element: Node<'a, '_>) -> Option<&'a str> {
    element
        .children()
        .find(|n| n.is_text())
        .and_then(|n| n.text())
        .map(str::trim)
}

/// The `label` attribute of a group element. Missing or empty is fatal for
/// that element only; other attributes degrade to notes.
fn group_label(element: Node, diag: &mut dyn DiagSink) -> Option<String> {
    let mut label = None;
    for attr in element.attributes() {
        if attr.name() == "label" {
            label = Some(attr.value());
        } else {
            diag.note(format!(
                "unknown attribute: {} = \"{}\"",
                attr.name(),
                attr.value()
            ));
        }
    }
    match label {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            diag.error_at(
                element.range(),
                format!(
                    "no label found for element <{}>",
                    element.tag_name().name()
                ),
            );
            None
        }
    }
}

// ── artifacts branch ──────────────────────────────────────────────

fn handle_artifact(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    // Versions start above zero so the first artifact is always distinct
    // from the base build.
    let current_version = config.artifacts.last().map(|a| a.version).unwrap_or(0);

    let mut artifact = ConfiguredArtifact::default();
    let mut version = None;
    let mut valid = true;

    for attr in element.attributes() {
        match attr.name() {
            "name" => artifact.name = Some(attr.value().to_string()),
            "version" => match attr.value().parse::<u32>() {
                Ok(v) => version = Some(v),
                Err(_) => {
                    diag.error_at(
                        element.range(),
                        format!("invalid artifact version: {}", attr.value()),
                    );
                    valid = false;
                }
            },
            "abi-group" => artifact.abi_group = Some(attr.value().to_string()),
            "screen-density-group" => {
                artifact.screen_density_group = Some(attr.value().to_string())
            }
            "locale-group" => artifact.locale_group = Some(attr.value().to_string()),
            "android-sdk-group" => {
                artifact.android_sdk_group = Some(attr.value().to_string())
            }
            "gl-texture-group" => {
                artifact.gl_texture_group = Some(attr.value().to_string())
            }
            "device-feature-group" => {
                artifact.device_feature_group = Some(attr.value().to_string())
            }
            other => diag.note(format!(
                "unknown artifact attribute: {} = \"{}\"",
                other,
                attr.value()
            )),
        }
    }

    artifact.version = version.unwrap_or(current_version + 1);
    config.artifacts.push(artifact);
    valid
}

fn handle_artifact_format(
    config: &mut SplitConfig,
    element: Node,
    _diag: &mut dyn DiagSink,
) -> bool {
    if let Some(text) = element_text(element) {
        config.artifact_format = Some(text.to_string());
    }
    true
}

// ── groups branch ─────────────────────────────────────────────────

fn handle_abi_group(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    let Some(label) = group_label(element, diag) else {
        return false;
    };
    let group = config.abi_groups.entry(&label);
    let mut valid = true;

    for child in child_elements(element) {
        if child.tag_name().name() != "abi" {
            diag.error_at(
                child.range(),
                format!(
                    "unexpected element in ABI group: <{}>",
                    child.tag_name().name()
                ),
            );
            valid = false;
            continue;
        }
        let Some(text) = element_text(child) else {
            continue;
        };
        match text.parse::<Abi>() {
            Ok(abi) => group.push(abi),
            Err(e) => {
                diag.error_at(child.range(), e.to_string());
                valid = false;
            }
        }
    }
    valid
}

/// Shared body of the screen-density and locale group handlers: each entry
/// must parse as a qualifier and, once stripped of any SDK version, differ
/// from the default configuration in exactly the expected axis.
fn qualifier_group_entries(
    element: Node,
    child_tag: &str,
    axis: ConfigAxis,
    group: &mut Vec<ConfigQualifier>,
    diag: &mut dyn DiagSink,
) -> bool {
    let mut valid = true;
    for child in child_elements(element) {
        if child.tag_name().name() != child_tag {
            diag.error_at(
                child.range(),
                format!(
                    "unexpected element in {} group: <{}>",
                    child_tag,
                    child.tag_name().name()
                ),
            );
            valid = false;
            continue;
        }
        let Some(text) = element_text(child) else {
            continue;
        };
        let stripped = ConfigQualifier::parse(text).map(|q| q.without_sdk_version());
        match stripped {
            Ok(qualifier) if qualifier.diff(&ConfigQualifier::default()) == axis => {
                group.push(qualifier);
            }
            _ => {
                diag.error_at(
                    child.range(),
                    format!(
                        "could not parse config descriptor for {}: {}",
                        child_tag, text
                    ),
                );
                valid = false;
            }
        }
    }
    valid
}

fn handle_screen_density_group(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    let Some(label) = group_label(element, diag) else {
        return false;
    };
    let group = config.screen_density_groups.entry(&label);
    qualifier_group_entries(element, "screen-density", ConfigAxis::DENSITY, group, diag)
}

fn handle_locale_group(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    let Some(label) = group_label(element, diag) else {
        return false;
    };
    let group = config.locale_groups.entry(&label);
    qualifier_group_entries(element, "locale", ConfigAxis::LOCALE, group, diag)
}

fn handle_android_sdk_group(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    let Some(label) = group_label(element, diag) else {
        return false;
    };
    let mut valid = true;
    let mut found = false;

    for child in child_elements(element) {
        if child.tag_name().name() != "android-sdk" {
            diag.error_at(
                child.range(),
                format!(
                    "unexpected element in Android SDK group: <{}>",
                    child.tag_name().name()
                ),
            );
            valid = false;
            continue;
        }

        let mut entry = AndroidSdk::default();
        for attr in child.attributes() {
            let target = match attr.name() {
                "minSdkVersion" => &mut entry.min_sdk_version,
                "targetSdkVersion" => &mut entry.target_sdk_version,
                "maxSdkVersion" => &mut entry.max_sdk_version,
                other => {
                    diag.warn(format!(
                        "unknown attribute: {} = \"{}\"",
                        other,
                        attr.value()
                    ));
                    continue;
                }
            };
            match attr.value().parse::<u32>() {
                Ok(version) => *target = Some(version),
                Err(_) => {
                    diag.error_at(
                        child.range(),
                        format!("invalid attribute: {} = \"{}\"", attr.name(), attr.value()),
                    );
                    valid = false;
                }
            }
        }

        for node in child_elements(child) {
            if node.tag_name().name() == "manifest" {
                if entry.manifest.is_some() {
                    diag.warn("found multiple manifest tags, ignoring duplicates".to_string());
                    continue;
                }
                entry.manifest = Some(AndroidManifest);
            }
        }

        config.android_sdk_groups.insert(label.clone(), entry);
        if found {
            diag.error_at(
                child.range(),
                format!("multiple SDK entries in group \"{}\"", label),
            );
            valid = false;
        }
        found = true;
    }
    valid
}

fn handle_gl_texture_group(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    let Some(label) = group_label(element, diag) else {
        return false;
    };
    let mut valid = true;

    for child in child_elements(element) {
        if child.tag_name().name() != "gl-texture" {
            diag.error_at(
                child.range(),
                format!(
                    "unexpected element in GL texture group: <{}>",
                    child.tag_name().name()
                ),
            );
            valid = false;
            continue;
        }

        let mut texture = GlTexture::default();
        for attr in child.attributes() {
            match attr.name() {
                "name" => texture.name = attr.value().to_string(),
                other => diag.note(format!(
                    "unknown attribute: {} = \"{}\"",
                    other,
                    attr.value()
                )),
            }
        }

        for path_element in child_elements(child) {
            if path_element.tag_name().name() != "texture-path" {
                diag.error_at(
                    path_element.range(),
                    format!(
                        "unexpected element in gl-texture element: <{}>",
                        path_element.tag_name().name()
                    ),
                );
                valid = false;
                continue;
            }
            if let Some(text) = element_text(path_element) {
                texture.texture_paths.push(text.to_string());
            }
        }

        config.gl_texture_groups.entry(&label).push(texture);
    }
    valid
}

fn handle_device_feature_group(
    config: &mut SplitConfig,
    element: Node,
    diag: &mut dyn DiagSink,
) -> bool {
    let Some(label) = group_label(element, diag) else {
        return false;
    };
    let group = config.device_feature_groups.entry(&label);
    let mut valid = true;

    for child in child_elements(element) {
        if child.tag_name().name() != "supports-feature" {
            diag.error_at(
                child.range(),
                format!(
                    "unexpected element in device feature group: <{}>",
                    child.tag_name().name()
                ),
            );
            valid = false;
            continue;
        }
        if let Some(text) = element_text(child) {
            group.push(text.to_string());
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{DiagnosticLog, Level};
    use pretty_assertions::assert_eq;

    fn extract(contents: &str) -> (Option<SplitConfig>, DiagnosticLog) {
        let mut log = DiagnosticLog::new();
        let config = extract_config(contents, &mut log);
        (config, log)
    }

    #[test]
    fn test_abi_group_preserves_entry_order() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <abi-group label="arm">
                     <abi>armeabi-v7a</abi>
                     <abi>arm64-v8a</abi>
                   </abi-group>
                 </groups>
               </post-process>"#,
        );
        assert!(!log.has_errors());
        let config = config.unwrap();
        assert_eq!(
            config.abi_groups.get("arm"),
            Some(&[Abi::ArmeabiV7a, Abi::Arm64V8a][..])
        );
    }

    #[test]
    fn test_unknown_abi_is_fatal_for_entry() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <abi-group label="arm">
                     <abi>sparc</abi>
                   </abi-group>
                 </groups>
               </post-process>"#,
        );
        assert!(config.is_none());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("unknown ABI: sparc")));
    }

    #[test]
    fn test_missing_label_does_not_stop_siblings() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <abi-group>
                     <abi>x86</abi>
                   </abi-group>
                   <abi-group label="other">
                     <abi>mips</abi>
                   </abi-group>
                 </groups>
               </post-process>"#,
        );
        // The labelless group fails the whole extraction, but the sibling
        // group was still processed and its own problems (none) reported.
        assert!(config.is_none());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("no label found")));
    }

    #[test]
    fn test_density_entry_must_vary_on_density_axis_only() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <screen-density-group label="large">
                     <screen-density>xhdpi</screen-density>
                     <screen-density>fr</screen-density>
                   </screen-density-group>
                 </groups>
               </post-process>"#,
        );
        assert!(config.is_none());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("could not parse config descriptor for screen-density: fr")));
    }

    #[test]
    fn test_density_entry_sdk_version_is_stripped() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <screen-density-group label="large">
                     <screen-density>xhdpi-v21</screen-density>
                   </screen-density-group>
                 </groups>
               </post-process>"#,
        );
        assert!(!log.has_errors());
        let config = config.unwrap();
        let entries = config.screen_density_groups.get("large").unwrap();
        assert_eq!(entries[0].to_string(), "xhdpi");
    }

    #[test]
    fn test_locale_group_entries() {
        let (config, _log) = extract(
            r#"<post-process>
                 <groups>
                   <locale-group label="europe">
                     <locale>en</locale>
                     <locale>fr-rFR</locale>
                   </locale-group>
                 </groups>
               </post-process>"#,
        );
        let config = config.unwrap();
        let entries = config.locale_groups.get("europe").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].to_string(), "fr-rFR");
    }

    #[test]
    fn test_android_sdk_group() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <android-sdk-group label="v19">
                     <android-sdk minSdkVersion="19" targetSdkVersion="24" maxSdkVersion="25">
                       <manifest/>
                       <manifest/>
                     </android-sdk>
                   </android-sdk-group>
                 </groups>
               </post-process>"#,
        );
        assert!(!log.has_errors());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.level == Level::Warning && d.message.contains("multiple manifest tags")));
        let config = config.unwrap();
        let entry = &config.android_sdk_groups["v19"];
        assert_eq!(entry.min_sdk_version, Some(19));
        assert_eq!(entry.target_sdk_version, Some(24));
        assert_eq!(entry.max_sdk_version, Some(25));
        assert!(entry.manifest.is_some());
    }

    #[test]
    fn test_android_sdk_group_unknown_attribute_warns() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <android-sdk-group label="v19">
                     <android-sdk minSdkVersion="19" codename="tiramisu"/>
                   </android-sdk-group>
                 </groups>
               </post-process>"#,
        );
        assert!(config.is_some());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.level == Level::Warning && d.message.contains("codename")));
    }

    #[test]
    fn test_android_sdk_group_rejects_second_entry() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <android-sdk-group label="v19">
                     <android-sdk minSdkVersion="19"/>
                     <android-sdk minSdkVersion="21"/>
                   </android-sdk-group>
                 </groups>
               </post-process>"#,
        );
        assert!(config.is_none());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("multiple SDK entries")));
    }

    #[test]
    fn test_gl_texture_group() {
        let (config, log) = extract(
            r#"<post-process>
                 <groups>
                   <gl-texture-group label="dxt1">
                     <gl-texture name="GL_EXT_texture_compression_dxt1">
                       <texture-path>assets/dxt1/main/*</texture-path>
                       <texture-path>assets/dxt1/fallback/*</texture-path>
                     </gl-texture>
                     <gl-texture name="GL_EXT_texture_compression_s3tc">
                       <texture-path>assets/s3tc/*</texture-path>
                     </gl-texture>
                   </gl-texture-group>
                 </groups>
               </post-process>"#,
        );
        assert!(!log.has_errors());
        let config = config.unwrap();
        let textures = config.gl_texture_groups.get("dxt1").unwrap();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].name, "GL_EXT_texture_compression_dxt1");
        assert_eq!(
            textures[0].texture_paths,
            vec!["assets/dxt1/main/*", "assets/dxt1/fallback/*"]
        );
        assert_eq!(textures[1].texture_paths, vec!["assets/s3tc/*"]);
    }

    #[test]
    fn test_device_feature_group() {
        let (config, _log) = extract(
            r#"<post-process>
                 <groups>
                   <device-feature-group label="low-latency">
                     <supports-feature>android.hardware.audio.low_latency</supports-feature>
                   </device-feature-group>
                 </groups>
               </post-process>"#,
        );
        let config = config.unwrap();
        assert_eq!(
            config.device_feature_groups.get("low-latency"),
            Some(&["android.hardware.audio.low_latency".to_string()][..])
        );
    }

    #[test]
    fn test_artifact_versions_auto_increment() {
        let (config, _log) = extract(
            r#"<post-process>
                 <artifacts>
                   <artifact name="one.apk"/>
                   <artifact name="five.apk" version="5"/>
                   <artifact name="six.apk"/>
                 </artifacts>
               </post-process>"#,
        );
        let config = config.unwrap();
        let versions: Vec<u32> = config.artifacts.iter().map(|a| a.version).collect();
        assert_eq!(versions, vec![1, 5, 6]);
    }

    #[test]
    fn test_unknown_artifact_attribute_is_a_note() {
        let (config, log) = extract(
            r#"<post-process>
                 <artifacts>
                   <artifact name="a.apk" color="red"/>
                 </artifacts>
               </post-process>"#,
        );
        assert!(config.is_some());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.level == Level::Note && d.message.contains("color")));
    }

    #[test]
    fn test_artifact_format_text() {
        let (config, _log) = extract(
            r#"<post-process>
                 <artifacts>
                   <artifact-format>
                     ${basename}.${abi}.apk
                   </artifact-format>
                 </artifacts>
               </post-process>"#,
        );
        let config = config.unwrap();
        assert_eq!(
            config.artifact_format.as_deref(),
            Some("${basename}.${abi}.apk")
        );
    }

    #[test]
    fn test_known_namespace_is_accepted() {
        let (config, log) = extract(
            r#"<post-process xmlns="http://schemas.android.com/tools/aapt">
                 <artifacts>
                   <artifact name="a.apk"/>
                 </artifacts>
               </post-process>"#,
        );
        assert!(!log.has_errors());
        assert_eq!(config.unwrap().artifacts.len(), 1);
    }

    #[test]
    fn test_foreign_namespace_rejects_document() {
        let (config, log) = extract(
            r#"<post-process xmlns="http://example.com/other">
                 <artifacts/>
               </post-process>"#,
        );
        assert!(config.is_none());
        assert!(log
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("unknown namespace")));
    }

    #[test]
    fn test_unparseable_document_is_fatal() {
        let (config, log) = extract("<post-process><artifacts>");
        assert!(config.is_none());
        assert_eq!(log.diagnostics().len(), 1);
    }

    #[test]
    fn test_unrecognized_elements_are_skipped() {
        let (config, log) = extract(
            r#"<post-process>
                 <artifacts>
                   <mystery/>
                   <artifact name="a.apk"/>
                 </artifacts>
                 <extras/>
               </post-process>"#,
        );
        assert!(!log.has_errors());
        assert_eq!(config.unwrap().artifacts.len(), 1);
    }
}
