//! Leveled diagnostics: an explicitly passed sink, an accumulating log,
//! and rendering with source context.
//!
//! Validators push messages into a `&mut dyn DiagSink` and report success
//! or failure through their return value, so one bad element never stops
//! its siblings from being checked.

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;
use std::fmt::Write;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// Named context the message applies to, e.g. a resolved artifact name
    pub context: Option<String>,
    /// Byte range of the offending element in the source document
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(level: Level, message: String) -> Self {
        Self {
            level,
            message,
            context: None,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{}: {}: {}", self.level, ctx, self.message),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

/// Destination for diagnostic messages.
///
/// Passed explicitly to every validator; use [`NoopDiag`] when the messages
/// are not wanted.
pub trait DiagSink {
    fn report(&mut self, diagnostic: Diagnostic);

    fn error(&mut self, message: String) {
        self.report(Diagnostic::new(Level::Error, message));
    }

    fn warn(&mut self, message: String) {
        self.report(Diagnostic::new(Level::Warning, message));
    }

    fn note(&mut self, message: String) {
        self.report(Diagnostic::new(Level::Note, message));
    }

    fn error_at(&mut self, span: Span, message: String) {
        self.report(Diagnostic::new(Level::Error, message).with_span(span));
    }

    fn warn_at(&mut self, span: Span, message: String) {
        self.report(Diagnostic::new(Level::Warning, message).with_span(span));
    }

    fn note_at(&mut self, span: Span, message: String) {
        self.report(Diagnostic::new(Level::Note, message).with_span(span));
    }
}

/// Sink that discards every message
#[derive(Debug, Default)]
pub struct NoopDiag;

impl DiagSink for NoopDiag {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Accumulating sink used by the resolution pipeline
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Format every collected diagnostic against the source document.
    ///
    /// Spanned diagnostics become ariadne reports pointing at the offending
    /// element; unspanned ones are plain `level: message` lines.
    pub fn render(&self, source: &str, filename: &str) -> String {
        let mut out = String::new();
        for diagnostic in &self.diagnostics {
            match &diagnostic.span {
                Some(span) => {
                    let (kind, color) = match diagnostic.level {
                        Level::Error => (ReportKind::Error, Color::Red),
                        Level::Warning => (ReportKind::Warning, Color::Yellow),
                        Level::Note => (ReportKind::Advice, Color::Blue),
                    };
                    let message = match &diagnostic.context {
                        Some(ctx) => format!("{}: {}", ctx, diagnostic.message),
                        None => diagnostic.message.clone(),
                    };
                    let mut buf = Vec::new();
                    Report::build(kind, filename, span.start)
                        .with_message(&message)
                        .with_label(
                            Label::new((filename, span.clone()))
                                .with_message(&message)
                                .with_color(color),
                        )
                        .finish()
                        .write((filename, Source::from(source)), &mut buf)
                        .expect("writing to a Vec cannot fail");
                    out.push_str(&String::from_utf8_lossy(&buf));
                }
                None => {
                    let _ = writeln!(out, "{}", diagnostic);
                }
            }
        }
        out
    }
}

impl DiagSink for DiagnosticLog {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Sink wrapper that attaches a context name to every forwarded message
pub struct ScopedSink<'a> {
    context: String,
    inner: &'a mut dyn DiagSink,
}

impl<'a> ScopedSink<'a> {
    pub fn new(context: impl Into<String>, inner: &'a mut dyn DiagSink) -> Self {
        Self {
            context: context.into(),
            inner,
        }
    }
}

impl DiagSink for ScopedSink<'_> {
    fn report(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.context.is_none() {
            diagnostic.context = Some(self.context.clone());
        }
        self.inner.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_collects_levels() {
        let mut log = DiagnosticLog::new();
        log.warn("suspicious".to_string());
        log.note("informational".to_string());
        assert!(!log.has_errors());
        log.error("broken".to_string());
        assert!(log.has_errors());
        assert_eq!(log.diagnostics().len(), 3);
    }

    #[test]
    fn test_scoped_sink_attaches_context() {
        let mut log = DiagnosticLog::new();
        {
            let mut scoped = ScopedSink::new("app.arm.apk", &mut log);
            scoped.error("could not lookup required ABIs: arm".to_string());
        }
        let diagnostic = &log.diagnostics()[0];
        assert_eq!(diagnostic.context.as_deref(), Some("app.arm.apk"));
        assert_eq!(
            diagnostic.to_string(),
            "error: app.arm.apk: could not lookup required ABIs: arm"
        );
    }

    #[test]
    fn test_scoped_sink_keeps_existing_context() {
        let mut log = DiagnosticLog::new();
        let mut scoped = ScopedSink::new("outer", &mut log);
        scoped.report(Diagnostic {
            level: Level::Error,
            message: "boom".to_string(),
            context: Some("inner".to_string()),
            span: None,
        });
        assert_eq!(log.diagnostics()[0].context.as_deref(), Some("inner"));
    }

    #[test]
    fn test_render_plain_and_spanned() {
        let source = "<post-process><artifacts/></post-process>";
        let mut log = DiagnosticLog::new();
        log.error("configuration has duplicate versions".to_string());
        log.error_at(14..26, "unexpected element".to_string());
        let rendered = log.render(source, "config.xml");
        assert!(rendered.contains("configuration has duplicate versions"));
        assert!(rendered.contains("unexpected element"));
    }
}
