//! Validation results: diagnostics, decorations and lint options.

use std::fmt;

use orderscript_syntax::Span;
use serde::{Deserialize, Serialize};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable category of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingCommandName,
    UndefinedCommand,
    UndefinedNamedParameter,
    ExtraParameter,
    MissingParameter,
    InvalidValue,
    DuplicateNamedParameter,
}

/// An advisory annotation on a span of one line's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity,
            span,
            message: message.into(),
            kind,
        }
    }

    pub fn error(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, span, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.span, self.message)
    }
}

/// Presentational inline widget; carries no severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decoration {
    /// Non-editable `:label` text shown right after a named parameter's name.
    Label { position: usize, text: String },
}

/// Output of validating one line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckResult {
    pub decorations: Vec<Decoration>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    /// Returns `true` when no diagnostic was produced.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Highest severity among the diagnostics.
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }
}

/// Severity choices for the conditions that are not plain errors.
///
/// Deserializes from the `diagnostics` section of a config file:
///
/// ```yaml
/// diagnostics:
///   missing_parameter: error
///   duplicate_named_parameter: null
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintOptions {
    /// Severity of a required parameter with no value.
    pub missing_parameter: Severity,
    /// Severity of a repeated named parameter; `None` accepts repeats silently.
    pub duplicate_named_parameter: Option<Severity>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            missing_parameter: Severity::Warning,
            duplicate_named_parameter: Some(Severity::Warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_result_counts() {
        let result = CheckResult {
            decorations: Vec::new(),
            diagnostics: vec![
                Diagnostic::new(
                    Severity::Warning,
                    DiagnosticKind::MissingParameter,
                    Span::new(0, 1),
                    "missing",
                ),
                Diagnostic::error(DiagnosticKind::ExtraParameter, Span::new(2, 3), "extra"),
            ],
        };

        assert!(!result.is_clean());
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.max_severity(), Some(Severity::Error));
        assert_eq!(CheckResult::default().max_severity(), None);
    }

    #[test]
    fn test_options_from_partial_yaml() {
        let options: LintOptions = serde_yaml::from_str("missing_parameter: error").unwrap();
        assert_eq!(options.missing_parameter, Severity::Error);
        assert_eq!(options.duplicate_named_parameter, Some(Severity::Warning));

        let options: LintOptions =
            serde_yaml::from_str("duplicate_named_parameter: null").unwrap();
        assert_eq!(options.duplicate_named_parameter, None);
    }

    #[test]
    fn test_decoration_json_shape() {
        let decoration = Decoration::Label {
            position: 9,
            text: ":移动速度".into(),
        };
        let json = serde_json::to_value(&decoration).unwrap();
        assert_eq!(json["type"], "label");
        assert_eq!(json["position"], 9);
    }
}
