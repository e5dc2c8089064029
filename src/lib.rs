//! splitcfg - split artifact configuration parsing and resolution
//!
//! Reads a declarative XML description of how one packaged application
//! build splits into multiple output artifacts (per ABI, locale, screen
//! density, SDK level, GL texture format, and device feature), validates
//! it, and expands it into fully resolved artifact descriptors with
//! computed file names.
//!
//! # Example
//!
//! ```rust
//! use splitcfg::resolve;
//!
//! let source = r#"
//! <post-process>
//!   <groups>
//!     <abi-group label="arm">
//!       <abi>armeabi-v7a</abi>
//!     </abi-group>
//!   </groups>
//!   <artifacts>
//!     <artifact-format>${basename}.${abi}.${ext}</artifact-format>
//!     <artifact abi-group="arm"/>
//!   </artifacts>
//! </post-process>"#;
//!
//! let artifacts = resolve(source, "app.apk").unwrap();
//! assert_eq!(artifacts[0].name, "app.arm.apk");
//! ```

pub mod diag;
pub mod model;
pub mod name;
pub mod parse;
pub mod qualifier;
pub mod resolve;

pub use diag::{DiagSink, Diagnostic, DiagnosticLog, Level, NoopDiag};
pub use model::{
    Abi, AndroidSdk, ConfiguredArtifact, GlTexture, OutputArtifact, SplitConfig,
};
pub use qualifier::ConfigQualifier;

use thiserror::Error;

/// Errors from the one-shot [`resolve`] entry point
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The configuration was rejected; carries every collected diagnostic
    #[error("configuration errors: {}", format_diagnostics(.0))]
    Config(Vec<Diagnostic>),
}

impl ResolveError {
    /// The diagnostics that caused the failure
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ResolveError::Config(diagnostics) => diagnostics,
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Single-use parser for one configuration document.
///
/// The whole parse-resolve-format sequence is one synchronous call; the
/// configuration being populated is owned by that call alone.
pub struct ConfigurationParser {
    contents: String,
}

impl ConfigurationParser {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }

    /// Parse and resolve, discarding diagnostics.
    pub fn parse(&self, apk_path: &str) -> Option<Vec<OutputArtifact>> {
        self.parse_with(apk_path, &mut NoopDiag)
    }

    /// Parse and resolve, reporting through `diag`.
    ///
    /// Returns the complete ordered artifact list, or `None` after every
    /// problem has been reported. There is no partial success.
    pub fn parse_with(
        &self,
        apk_path: &str,
        diag: &mut dyn DiagSink,
    ) -> Option<Vec<OutputArtifact>> {
        let config = parse::extract_config(&self.contents, diag)?;
        resolve::resolve_artifacts(&config, apk_path, diag)
    }
}

/// Resolve a configuration document against an input artifact name.
///
/// This is the main entry point for the library. On failure the error
/// carries every diagnostic the pass collected.
pub fn resolve(source: &str, apk_path: &str) -> Result<Vec<OutputArtifact>, ResolveError> {
    let mut log = DiagnosticLog::new();
    match ConfigurationParser::new(source).parse_with(apk_path, &mut log) {
        Some(artifacts) => Ok(artifacts),
        None => Err(ResolveError::Config(log.into_diagnostics())),
    }
}
