//! Output formatting for reports, trees and order catalogs.

use orderscript_core::{ChildPolicy, OrderDefinition, Param};
use orderscript_syntax::ContentType;
use serde::{Deserialize, Serialize};

use crate::{Document, DocumentReport, LineId};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// One row of a rendered tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: LineId,
    pub path: String,
    pub depth: usize,
    pub content_type: Option<ContentType>,
    pub child_policy: ChildPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_name: Option<String>,
    pub text: String,
}

/// Flattens the attached tree in pre-order.
pub fn tree_entries(document: &Document) -> Vec<TreeEntry> {
    document
        .walk()
        .into_iter()
        .filter_map(|(id, depth)| {
            let line = document.line(id)?;
            Some(TreeEntry {
                id,
                path: document.path_of(id).unwrap_or_default(),
                depth,
                content_type: line.content_type(),
                child_policy: line.child_policy(),
                order_name: document.order_name(id),
                text: line.text().to_string(),
            })
        })
        .collect()
}

/// Formats check reports in the requested output format.
pub fn format_reports(reports: &[DocumentReport], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(reports).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(reports.iter().map(report_to_markdown).collect()),
        OutputFormat::Table => Ok(reports.iter().map(report_to_table).collect()),
    }
}

/// Formats a document's tree in the requested output format.
pub fn format_tree(document: &Document, format: OutputFormat) -> Result<String, String> {
    let entries = tree_entries(document);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&entries)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&entries).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(tree_to_markdown(&entries)),
        OutputFormat::Table => Ok(tree_to_table(&entries)),
    }
}

/// Formats order definitions in the requested output format.
pub fn format_orders(orders: &[&OrderDefinition], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(orders)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(orders).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(orders_to_markdown(orders)),
        OutputFormat::Table => Ok(orders_to_table(orders)),
    }
}

/// One-line usage summary, e.g. `<等待时间: non-negative integer>`.
pub fn signature(order: &OrderDefinition) -> String {
    let mut parts: Vec<String> = order.params.iter().map(param_signature).collect();
    for named in order.named_params.values() {
        let mut part = format!("-{}", named.name);
        for param in &named.params {
            part.push(' ');
            part.push_str(&param_signature(param));
        }
        parts.push(part);
    }
    parts.join(" ")
}

fn param_signature(param: &Param) -> String {
    let inner = match &param.label {
        Some(label) => format!("{label}: {}", param.constraint),
        None => param.constraint.to_string(),
    };
    if param.optional {
        format!("[{inner}]")
    } else {
        format!("<{inner}>")
    }
}

fn policy_name(policy: ChildPolicy) -> &'static str {
    match policy {
        ChildPolicy::NoChild => "no_child",
        ChildPolicy::FreeChild => "free_child",
        ChildPolicy::PreDefinedChild => "pre_defined_child",
        ChildPolicy::TemplateChild => "template_child",
    }
}

fn report_to_markdown(report: &DocumentReport) -> String {
    let mut out = String::new();

    let title = report.source.as_deref().unwrap_or("document");
    out.push_str(&format!("# Check Report: {title}\n\n"));
    out.push_str(&format!("- **Lines:** {}\n", report.lines));
    out.push_str(&format!("- **Errors:** {}\n", report.errors));
    out.push_str(&format!("- **Warnings:** {}\n", report.warnings));
    out.push_str(&format!("- **Syntax Errors:** {}\n", report.syntax_errors));

    if !report.problems.is_empty() {
        out.push_str("\n## Problems\n\n");
        out.push_str("| Line | Severity | Message |\n");
        out.push_str("|------|----------|---------|\n");
        for problem in &report.problems {
            for d in &problem.diagnostics {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    problem.path, d.severity, d.message
                ));
            }
            for e in &problem.syntax_errors {
                out.push_str(&format!("| {} | syntax | {} |\n", problem.path, e.message));
            }
        }
    }
    out.push('\n');

    out
}

fn report_to_table(report: &DocumentReport) -> String {
    let mut out = String::new();
    let title = report.source.as_deref().unwrap_or("document");

    for problem in &report.problems {
        for d in &problem.diagnostics {
            out.push_str(&format!(
                "{title}:{}:{}: {}: {}\n",
                problem.path, d.span.start, d.severity, d.message
            ));
        }
        for e in &problem.syntax_errors {
            out.push_str(&format!(
                "{title}:{}:{}: syntax: {}\n",
                problem.path, e.span.start, e.message
            ));
        }
    }
    out.push_str(&format!(
        "{title}: {} lines, {} errors, {} warnings, {} syntax errors\n",
        report.lines, report.errors, report.warnings, report.syntax_errors
    ));

    out
}

fn tree_to_markdown(entries: &[TreeEntry]) -> String {
    let mut out = String::new();
    out.push_str("| Path | Id | Type | Policy | Text |\n");
    out.push_str("|------|----|------|--------|------|\n");
    for entry in entries {
        let kind = entry.content_type.map_or("", ContentType::as_str);
        out.push_str(&format!(
            "| {} | {} | {kind} | {} | `{}` |\n",
            entry.path,
            entry.id,
            policy_name(entry.child_policy),
            entry.text.replace('\n', "\\n")
        ));
    }
    out
}

fn tree_to_table(entries: &[TreeEntry]) -> String {
    let mut out = String::new();
    let max_path = entries.iter().map(|e| e.path.len()).max().unwrap_or(4);
    let max_id = entries
        .iter()
        .map(|e| e.id.to_string().len())
        .max()
        .unwrap_or(2);

    for entry in entries {
        out.push_str(&format!(
            "{:<pw$}  {:<iw$}  {:<17}  {}{}\n",
            entry.path,
            entry.id.to_string(),
            policy_name(entry.child_policy),
            "    ".repeat(entry.depth),
            entry.text.replace('\n', "\\n"),
            pw = max_path,
            iw = max_id,
        ));
    }
    out
}

fn orders_to_markdown(orders: &[&OrderDefinition]) -> String {
    let mut out = String::new();
    out.push_str("# Orders\n\n");
    out.push_str("| Order | Parameters | Children | Description |\n");
    out.push_str("|-------|------------|----------|-------------|\n");
    for order in orders {
        let desc = order.description.as_deref().unwrap_or("");
        out.push_str(&format!(
            "| `{}` | {} | {} | {desc} |\n",
            order.name,
            signature(order),
            policy_name(order.child_policy)
        ));
    }
    out
}

fn orders_to_table(orders: &[&OrderDefinition]) -> String {
    let mut out = String::new();
    let max_name = orders
        .iter()
        .map(|o| o.name.chars().count())
        .max()
        .unwrap_or(4);

    for order in orders {
        let pad = max_name.saturating_sub(order.name.chars().count());
        out.push_str(&format!(
            "  {}{}  {}\n",
            order.name,
            " ".repeat(pad),
            signature(order)
        ));
        if let Some(desc) = &order.description {
            out.push_str(&format!("  {}  {desc}\n", " ".repeat(max_name)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use orderscript_core::{LineSeed, OrderRegistry};

    use super::*;

    #[test]
    fn test_signature() {
        let registry = OrderRegistry::with_builtin();
        assert_eq!(
            signature(registry.get("等待").unwrap()),
            "<等待时间: non-negative integer>"
        );
        assert_eq!(
            signature(registry.get("移动").unwrap()),
            "[移动对象: free text] -t <integer in [0, 5000]>"
        );
    }

    #[test]
    fn test_tree_entries() {
        let registry = Arc::new(OrderRegistry::with_builtin());
        let doc = Document::from_seeds(registry, &[LineSeed::new("@条件分歧 x")]).unwrap();
        let entries = tree_entries(&doc);

        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["1", "1.1", "1.1.1", "1.2", "1.2.1"]);
        assert_eq!(entries[1].order_name.as_deref(), Some("条件分歧 成立"));
        assert_eq!(entries[2].depth, 2);
    }

    #[test]
    fn test_table_report_lines() {
        let registry = Arc::new(OrderRegistry::with_builtin());
        let doc = Document::from_seeds(registry, &[LineSeed::new("@等待 x")]).unwrap();
        let out = format_reports(&[doc.report(Some("a.outline"))], OutputFormat::Table).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.outline:1:8: error: invalid parameter value «x»"));
        assert_eq!(lines[1], "a.outline: 1 lines, 1 errors, 0 warnings, 0 syntax errors");
    }

    #[test]
    fn test_json_orders() {
        let registry = OrderRegistry::with_builtin();
        let wait = registry.get("等待").unwrap();
        let json = format_orders(&[wait], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "等待");
        assert_eq!(value[0]["params"][0]["constraint"]["type"], "nonnegative_int");
    }
}
