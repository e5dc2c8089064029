//! Configuration data model: group registries, artifact declarations, and
//! resolved output artifacts.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::qualifier::ConfigQualifier;

/// Binary interface of a compiled native library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    Armeabi,
    ArmeabiV7a,
    Arm64V8a,
    X86,
    X86_64,
    Mips,
    Mips64,
    Universal,
}

/// All ABIs, paired with their canonical string form
static ABI_NAMES: [(Abi, &str); 8] = [
    (Abi::Armeabi, "armeabi"),
    (Abi::ArmeabiV7a, "armeabi-v7a"),
    (Abi::Arm64V8a, "arm64-v8a"),
    (Abi::X86, "x86"),
    (Abi::X86_64, "x86_64"),
    (Abi::Mips, "mips"),
    (Abi::Mips64, "mips64"),
    (Abi::Universal, "universal"),
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown ABI: {0}")]
pub struct ParseAbiError(pub String);

impl Abi {
    pub fn as_str(&self) -> &'static str {
        ABI_NAMES
            .iter()
            .find(|(abi, _)| abi == self)
            .map(|(_, name)| *name)
            .expect("every ABI variant has a name")
    }

    pub fn all() -> impl Iterator<Item = Abi> {
        ABI_NAMES.iter().map(|(abi, _)| *abi)
    }
}

impl FromStr for Abi {
    type Err = ParseAbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ABI_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(abi, _)| *abi)
            .ok_or_else(|| ParseAbiError(s.to_string()))
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Abi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Marker for a manifest override attached to an SDK entry.
///
/// The manifest contents are not modelled yet; only the presence of the tag
/// is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AndroidManifest;

/// SDK version range for one labeled SDK group
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AndroidSdk {
    pub min_sdk_version: Option<u32>,
    pub target_sdk_version: Option<u32>,
    pub max_sdk_version: Option<u32>,
    pub manifest: Option<AndroidManifest>,
}

/// A GL texture format and the asset paths packaged for it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GlTexture {
    pub name: String,
    pub texture_paths: Vec<String>,
}

pub type DeviceFeature = String;

/// Label-keyed registry of value lists for one split axis.
///
/// Labels are unique; re-using a label appends to its existing list. Both
/// label order and per-label value order follow the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<T> {
    entries: Vec<(String, Vec<T>)>,
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Group<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value list for `label`, inserted empty if absent
    pub fn entry(&mut self, label: &str) -> &mut Vec<T> {
        if let Some(at) = self.entries.iter().position(|(key, _)| key == label) {
            return &mut self.entries[at].1;
        }
        self.entries.push((label.to_string(), Vec::new()));
        &mut self.entries.last_mut().expect("just pushed").1
    }

    pub fn get(&self, label: &str) -> Option<&[T]> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An unresolved artifact declaration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfiguredArtifact {
    /// Literal name template; falls back to the global format when absent
    pub name: Option<String>,
    pub version: u32,
    pub abi_group: Option<String>,
    pub screen_density_group: Option<String>,
    pub locale_group: Option<String>,
    pub android_sdk_group: Option<String>,
    pub gl_texture_group: Option<String>,
    pub device_feature_group: Option<String>,
}

/// Everything extracted from one configuration document
#[derive(Debug, Default)]
pub struct SplitConfig {
    pub abi_groups: Group<Abi>,
    pub screen_density_groups: Group<ConfigQualifier>,
    pub locale_groups: Group<ConfigQualifier>,
    /// One SDK range per label
    pub android_sdk_groups: HashMap<String, AndroidSdk>,
    pub gl_texture_groups: Group<GlTexture>,
    pub device_feature_groups: Group<DeviceFeature>,
    /// Artifact declarations in document order
    pub artifacts: Vec<ConfiguredArtifact>,
    /// Global name template applied to artifacts without a literal name
    pub artifact_format: Option<String>,
}

/// A fully resolved output variant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OutputArtifact {
    pub name: String,
    pub version: u32,
    pub abis: Vec<Abi>,
    pub screen_densities: Vec<ConfigQualifier>,
    pub locales: Vec<ConfigQualifier>,
    pub android_sdk: Option<AndroidSdk>,
    pub textures: Vec<GlTexture>,
    pub features: Vec<DeviceFeature>,
}
