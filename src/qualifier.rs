//! Resource configuration qualifiers.
//!
//! Covers the slice of the qualifier grammar the split configuration can
//! reference: locale (language plus optional region), screen density, and a
//! trailing SDK version. Parsed values compare against the default
//! configuration to establish which axes an entry varies along.

use bitflags::bitflags;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

bitflags! {
    /// Axes along which two qualifier values differ
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigAxis: u32 {
        const LOCALE = 1 << 0;
        const DENSITY = 1 << 1;
        const VERSION = 1 << 2;
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QualifierError {
    #[error("empty qualifier string")]
    Empty,

    #[error("unknown qualifier token: {0}")]
    UnknownToken(String),
}

/// Screen density buckets, plus exact dpi values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Low,
    Medium,
    Tv,
    High,
    XHigh,
    XXHigh,
    XXXHigh,
    NoDpi,
    AnyDpi,
    Exact(u16),
}

impl Density {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ldpi" => Some(Density::Low),
            "mdpi" => Some(Density::Medium),
            "tvdpi" => Some(Density::Tv),
            "hdpi" => Some(Density::High),
            "xhdpi" => Some(Density::XHigh),
            "xxhdpi" => Some(Density::XXHigh),
            "xxxhdpi" => Some(Density::XXXHigh),
            "nodpi" => Some(Density::NoDpi),
            "anydpi" => Some(Density::AnyDpi),
            _ => token
                .strip_suffix("dpi")
                .and_then(|digits| digits.parse().ok())
                .map(Density::Exact),
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Density::Low => write!(f, "ldpi"),
            Density::Medium => write!(f, "mdpi"),
            Density::Tv => write!(f, "tvdpi"),
            Density::High => write!(f, "hdpi"),
            Density::XHigh => write!(f, "xhdpi"),
            Density::XXHigh => write!(f, "xxhdpi"),
            Density::XXXHigh => write!(f, "xxxhdpi"),
            Density::NoDpi => write!(f, "nodpi"),
            Density::AnyDpi => write!(f, "anydpi"),
            Density::Exact(dpi) => write!(f, "{}dpi", dpi),
        }
    }
}

/// A parsed qualifier value
///
/// `Default` is the default configuration: no locale, no density, no SDK
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigQualifier {
    language: Option<String>,
    region: Option<String>,
    density: Option<Density>,
    sdk_version: Option<u16>,
}

impl ConfigQualifier {
    /// Parse a dash-separated qualifier string such as `fr-rFR`, `xhdpi`,
    /// or `de-v21`.
    pub fn parse(text: &str) -> Result<Self, QualifierError> {
        if text.is_empty() {
            return Err(QualifierError::Empty);
        }
        let mut qualifier = ConfigQualifier::default();
        for token in text.split('-') {
            if qualifier.language.is_none() && is_language(token) {
                qualifier.language = Some(token.to_string());
            } else if qualifier.language.is_some()
                && qualifier.region.is_none()
                && is_region(token)
            {
                qualifier.region = Some(token[1..].to_string());
            } else if let Some(density) = Density::parse(token) {
                qualifier.density = Some(density);
            } else if let Some(version) = parse_version(token) {
                qualifier.sdk_version = Some(version);
            } else {
                return Err(QualifierError::UnknownToken(token.to_string()));
            }
        }
        Ok(qualifier)
    }

    /// Copy of this value with the SDK version qualifier stripped
    pub fn without_sdk_version(&self) -> Self {
        Self {
            sdk_version: None,
            ..self.clone()
        }
    }

    /// The set of axes along which `self` and `other` differ
    pub fn diff(&self, other: &Self) -> ConfigAxis {
        let mut axes = ConfigAxis::empty();
        if self.language != other.language || self.region != other.region {
            axes |= ConfigAxis::LOCALE;
        }
        if self.density != other.density {
            axes |= ConfigAxis::DENSITY;
        }
        if self.sdk_version != other.sdk_version {
            axes |= ConfigAxis::VERSION;
        }
        axes
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn density(&self) -> Option<Density> {
        self.density
    }

    pub fn sdk_version(&self) -> Option<u16> {
        self.sdk_version
    }
}

impl FromStr for ConfigQualifier {
    type Err = QualifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigQualifier::parse(s)
    }
}

impl fmt::Display for ConfigQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens = Vec::new();
        if let Some(language) = &self.language {
            tokens.push(language.clone());
        }
        if let Some(region) = &self.region {
            tokens.push(format!("r{}", region));
        }
        if let Some(density) = &self.density {
            tokens.push(density.to_string());
        }
        if let Some(version) = self.sdk_version {
            tokens.push(format!("v{}", version));
        }
        write!(f, "{}", tokens.join("-"))
    }
}

impl Serialize for ConfigQualifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

fn is_language(token: &str) -> bool {
    (2..=3).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_region(token: &str) -> bool {
    token.len() == 3
        && token.starts_with('r')
        && token[1..].bytes().all(|b| b.is_ascii_alphabetic())
}

fn parse_version(token: &str) -> Option<u16> {
    token.strip_prefix('v').and_then(|digits| digits.parse().ok())
}
