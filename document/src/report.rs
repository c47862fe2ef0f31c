//! Per-document diagnostic reports.

use orderscript_lint::{Diagnostic, Severity};
use orderscript_syntax::SyntaxError;
use serde::{Deserialize, Serialize};

use crate::{Document, LineId};

/// Findings for one line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineReport {
    pub id: LineId,
    /// Dotted position in the tree, e.g. `2.1`.
    pub path: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syntax_errors: Vec<SyntaxError>,
}

/// Aggregated findings of a whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Where the document was loaded from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub lines: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub syntax_errors: usize,
    /// Only lines with at least one finding, in tree order.
    pub problems: Vec<LineReport>,
}

impl DocumentReport {
    pub fn from_document(document: &Document, source: Option<&str>) -> Self {
        let mut report = Self {
            source: source.map(str::to_string),
            lines: 0,
            errors: 0,
            warnings: 0,
            infos: 0,
            syntax_errors: 0,
            problems: Vec::new(),
        };

        for (id, _) in document.walk() {
            let Some(line) = document.line(id) else {
                continue;
            };
            report.lines += 1;

            let check = line.check();
            report.errors += check.count(Severity::Error);
            report.warnings += check.count(Severity::Warning);
            report.infos += check.count(Severity::Info);
            report.syntax_errors += line.syntax_errors().len();

            if !check.is_clean() || !line.syntax_errors().is_empty() {
                report.problems.push(LineReport {
                    id,
                    path: document.path_of(id).unwrap_or_default(),
                    text: line.text().to_string(),
                    diagnostics: check.diagnostics.clone(),
                    syntax_errors: line.syntax_errors().to_vec(),
                });
            }
        }
        report
    }

    /// Error diagnostics and syntax errors both count.
    pub fn has_errors(&self) -> bool {
        self.errors > 0 || self.syntax_errors > 0
    }

    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use orderscript_core::{LineSeed, OrderRegistry};

    use super::*;

    #[test]
    fn test_report_counts() {
        let seeds = [
            LineSeed::new("@等待 abc"),
            LineSeed::new("@等待"),
            LineSeed::new("@移动 <open"),
            LineSeed::new("// fine"),
        ];
        let doc = Document::from_seeds(Arc::new(OrderRegistry::with_builtin()), &seeds).unwrap();
        let report = doc.report(Some("demo.outline"));

        assert_eq!(report.lines, 4);
        assert_eq!(report.errors, 1);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.syntax_errors, 1);
        assert!(report.has_errors());

        let paths: Vec<&str> = report.problems.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["1", "2", "3"]);
    }
}
