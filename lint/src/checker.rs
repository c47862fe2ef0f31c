//! Checks a parsed line against the order registry.
//!
//! Validation never aborts on a bad value: every parameter group is checked
//! and all findings are collected. Only an unresolvable command stops the
//! walk, since there is no schema left to check against.

use std::collections::HashSet;

use orderscript_core::{OrderDefinition, OrderRegistry, Param, catalog};
use orderscript_syntax::{NodeKind, Span, SyntaxNode, SyntaxTree};
use tracing::debug;

use crate::{CheckResult, Decoration, Diagnostic, DiagnosticKind, LintOptions};

/// Validates lines against the definitions of an [`OrderRegistry`].
///
/// # Examples
///
/// ```
/// use orderscript_core::OrderRegistry;
/// use orderscript_lint::Checker;
///
/// let registry = OrderRegistry::with_builtin();
/// let checker = Checker::new(&registry);
///
/// assert!(checker.check_line("@等待 10", None).is_clean());
///
/// let result = checker.check_line("@等待 abc", None);
/// assert_eq!(result.diagnostics.len(), 1);
/// assert!(result.diagnostics[0].message.contains("non-negative integer"));
/// ```
#[derive(Debug, Clone)]
pub struct Checker<'r> {
    registry: &'r OrderRegistry,
    options: LintOptions,
}

impl<'r> Checker<'r> {
    pub fn new(registry: &'r OrderRegistry) -> Self {
        Self {
            registry,
            options: LintOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LintOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    /// Parses and validates `text` in one step.
    pub fn check_line(&self, text: &str, namespace: Option<&str>) -> CheckResult {
        self.validate(&SyntaxTree::parse(text), namespace)
    }

    /// Validates a parsed line.
    ///
    /// `namespace` is the fully-qualified name of the enclosing order when the
    /// line is a sub-order; the method name is resolved inside it.
    pub fn validate(&self, tree: &SyntaxTree, namespace: Option<&str>) -> CheckResult {
        let mut pass = Pass {
            tree,
            options: &self.options,
            result: CheckResult::default(),
        };

        let Some(line) = tree.root().first_child() else {
            return pass.result;
        };
        match line.kind {
            NodeKind::Order => self.check_order(&mut pass, line, namespace),
            NodeKind::Dialog => {
                if let Some(header) = line.child(NodeKind::Header) {
                    pass.check_header(header, catalog::dialog(), header.span);
                }
            }
            // Comments and scripts are opaque; error lines are not ours to report.
            _ => {}
        }
        pass.result
    }

    fn check_order(&self, pass: &mut Pass<'_>, order: &SyntaxNode, namespace: Option<&str>) {
        let Some(header) = order.child(NodeKind::Header) else {
            return;
        };
        let Some(method) = header.child(NodeKind::Method) else {
            return;
        };

        let Some(name_node) = method.child(NodeKind::MethodName) else {
            pass.push(Diagnostic::error(
                DiagnosticKind::MissingCommandName,
                method.span,
                "missing command name",
            ));
            return;
        };

        let name = pass.tree.slice(name_node);
        let Some(definition) = self.registry.resolve(namespace, name) else {
            debug!(order = name, namespace = ?namespace, "Undefined command");
            pass.push(Diagnostic::error(
                DiagnosticKind::UndefinedCommand,
                name_node.span,
                format!("undefined command «{name}»"),
            ));
            return;
        };

        pass.check_header(header, definition, method.span);
    }
}

/// A parameter value recovered from the tree.
struct Value<'a> {
    span: Span,
    text: &'a str,
    expression: bool,
}

/// State of one validation run.
struct Pass<'a> {
    tree: &'a SyntaxTree,
    options: &'a LintOptions,
    result: CheckResult,
}

impl<'a> Pass<'a> {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.result.diagnostics.push(diagnostic);
    }

    /// Checks the positional group and every named group of a header.
    fn check_header(&mut self, header: &SyntaxNode, definition: &OrderDefinition, anchor: Span) {
        if let Some(values) = header
            .child(NodeKind::DefaultParams)
            .and_then(|group| group.child(NodeKind::ParamValues))
        {
            self.check_values(values, &definition.params, anchor);
        }

        let mut seen = HashSet::new();
        for group in header.children_of(NodeKind::NamedParam) {
            self.check_named(group, definition, &mut seen);
        }
    }

    fn check_named(
        &mut self,
        group: &SyntaxNode,
        definition: &OrderDefinition,
        seen: &mut HashSet<&'a str>,
    ) {
        let Some(name_node) = group.child(NodeKind::ParamName) else {
            return;
        };
        let Some(content) = name_node.child(NodeKind::ParamNameContent) else {
            return;
        };
        let tree = self.tree;
        let name = tree.slice(content);

        let Some(named) = definition.named_param(name) else {
            debug!(order = %definition.name, param = name, "Undefined named parameter");
            self.push(Diagnostic::error(
                DiagnosticKind::UndefinedNamedParameter,
                name_node.span,
                format!("undefined named parameter -{name}"),
            ));
            return;
        };

        if !seen.insert(name)
            && let Some(severity) = self.options.duplicate_named_parameter
        {
            self.push(Diagnostic::new(
                severity,
                DiagnosticKind::DuplicateNamedParameter,
                name_node.span,
                format!("duplicate named parameter -{name}"),
            ));
        }

        if let Some(label) = &named.label {
            self.result.decorations.push(Decoration::Label {
                position: content.span.end,
                text: format!(":{label}"),
            });
        }

        if let Some(values) = group.child(NodeKind::ParamValues) {
            self.check_values(values, &named.params, name_node.span);
        }
    }

    /// Pairs values with parameter definitions by position.
    fn check_values(&mut self, values: &SyntaxNode, params: &[Param], anchor: Span) {
        let values = self.collect_values(values);

        for (index, value) in values.iter().enumerate() {
            let Some(param) = params.get(index) else {
                self.push(Diagnostic::error(
                    DiagnosticKind::ExtraParameter,
                    value.span,
                    "extra parameter",
                ));
                continue;
            };
            if value.expression {
                continue;
            }
            if let Err(rejection) = param.constraint.check(value.text) {
                let label = param.constraint.label();
                let message = match rejection.reason {
                    Some(reason) => format!(
                        "invalid parameter value «{}»: {reason}, expected {label}",
                        value.text
                    ),
                    None => format!("invalid parameter value «{}»: expected {label}", value.text),
                };
                self.push(Diagnostic::error(
                    DiagnosticKind::InvalidValue,
                    value.span,
                    message,
                ));
            }
        }

        for (index, param) in params.iter().enumerate().skip(values.len()) {
            if param.optional {
                continue;
            }
            let what = match &param.label {
                Some(label) => format!("«{label}»"),
                None => format!("#{}", index + 1),
            };
            self.push(Diagnostic::new(
                self.options.missing_parameter,
                DiagnosticKind::MissingParameter,
                anchor,
                format!("missing required parameter {what}"),
            ));
        }
    }

    fn collect_values(&self, values: &SyntaxNode) -> Vec<Value<'a>> {
        let tree = self.tree;
        values
            .children
            .iter()
            .filter_map(|node| match node.kind {
                NodeKind::ParamValue => Some(Value {
                    span: node.span,
                    text: tree.slice(node),
                    expression: false,
                }),
                NodeKind::BorderedParamValue => Some(Value {
                    span: node.span,
                    text: node
                        .child(NodeKind::BorderedContent)
                        .map_or("", |content| tree.slice(content)),
                    expression: false,
                }),
                NodeKind::ExpressionParamValue => Some(Value {
                    span: node.span,
                    text: node
                        .child(NodeKind::EmbeddedExpression)
                        .map_or("", |expr| tree.slice(expr)),
                    expression: true,
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use orderscript_core::{ChildPolicy, Constraint, NamedParamDef};

    use super::*;
    use crate::Severity;

    fn messages(result: &CheckResult) -> Vec<&str> {
        result
            .diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect()
    }

    #[test]
    fn test_wait_scenarios() {
        let registry = OrderRegistry::with_builtin();
        let checker = Checker::new(&registry);

        let result = checker.check_line("@等待 abc", None);
        assert_eq!(
            messages(&result),
            vec!["invalid parameter value «abc»: expected non-negative integer"]
        );
        assert_eq!(result.diagnostics[0].span, Span::new(8, 11));

        assert!(checker.check_line("@等待 10", None).is_clean());
    }

    #[test]
    fn test_move_speed_range() {
        let registry = OrderRegistry::with_builtin();
        let checker = Checker::new(&registry);

        let result = checker.check_line("@移动 -t 9000", None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::InvalidValue);
        assert!(result.diagnostics[0].message.contains("9000"));
        assert_eq!(
            messages(&result),
            vec!["invalid parameter value «9000»: must be at most 5000, expected integer in [0, 5000]"]
        );

        let text = "@移动 -t 10";
        let result = checker.check_line(text, None);
        assert!(result.is_clean());
        let t_end = text.find("-t").unwrap() + 2;
        assert_eq!(
            result.decorations,
            vec![Decoration::Label {
                position: t_end,
                text: ":移动速度".into()
            }]
        );
    }

    #[test]
    fn test_undefined_command_stops() {
        let registry = OrderRegistry::with_builtin();
        let result = Checker::new(&registry).check_line("@未知指令 1 2 -x", None);

        assert_eq!(messages(&result), vec!["undefined command «未知指令»"]);
        assert_eq!(result.diagnostics[0].span, Span::new(1, 13));
        assert!(result.decorations.is_empty());
    }

    #[test]
    fn test_missing_command_name() {
        let registry = OrderRegistry::with_builtin();
        let result = Checker::new(&registry).check_line("@ 10", None);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::MissingCommandName);
        assert_eq!(result.diagnostics[0].span, Span::new(0, 1));
    }

    #[test]
    fn test_missing_and_extra() {
        let registry = OrderRegistry::with_builtin();
        let checker = Checker::new(&registry);

        let result = checker.check_line("@等待", None);
        assert_eq!(messages(&result), vec!["missing required parameter «等待时间»"]);
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
        assert_eq!(result.diagnostics[0].span, Span::new(0, 7));

        let result = checker.check_line("@等待 1 2 3", None);
        assert_eq!(messages(&result), vec!["extra parameter", "extra parameter"]);
    }

    #[test]
    fn test_missing_unlabeled_param_uses_index() {
        let mut registry = OrderRegistry::new();
        registry.register(
            OrderDefinition::builder("跳转")
                .param(Param::required(Constraint::Free))
                .param(Param::required(Constraint::Free))
                .build()
                .unwrap(),
        );
        let result = Checker::new(&registry).check_line("@跳转 a", None);
        assert_eq!(messages(&result), vec!["missing required parameter #2"]);
    }

    #[test]
    fn test_expressions_skip_constraints() {
        let registry = OrderRegistry::with_builtin();
        let result = Checker::new(&registry).check_line("@等待 ${delay * 2}", None);
        assert!(result.is_clean());
    }

    #[test]
    fn test_empty_bordered_is_empty_value() {
        let registry = OrderRegistry::with_builtin();
        let result = Checker::new(&registry).check_line("@条件分歧 <>", None);
        assert_eq!(
            messages(&result),
            vec!["invalid parameter value «»: value is empty, expected free text"]
        );
    }

    #[test]
    fn test_unknown_named_param_skips_values() {
        let registry = OrderRegistry::with_builtin();
        let result = Checker::new(&registry).check_line("@等待 10 -q a b c", None);
        assert_eq!(messages(&result), vec!["undefined named parameter -q"]);
    }

    #[test]
    fn test_named_group_missing_value_anchors_at_name() {
        let registry = OrderRegistry::with_builtin();
        let text = "@移动 -t";
        let result = Checker::new(&registry).check_line(text, None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::MissingParameter);
        assert_eq!(result.diagnostics[0].span, Span::new(text.len() - 2, text.len()));
    }

    #[test]
    fn test_duplicate_named_param_is_configurable() {
        let registry = OrderRegistry::with_builtin();
        let text = "@移动 -t 10 -t 9999";

        let result = Checker::new(&registry).check_line(text, None);
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.decorations.len(), 2);

        let options = LintOptions {
            duplicate_named_parameter: None,
            ..LintOptions::default()
        };
        let result = Checker::new(&registry)
            .with_options(options)
            .check_line(text, None);
        assert_eq!(result.count(Severity::Warning), 0);
        assert_eq!(result.count(Severity::Error), 1);
    }

    #[test]
    fn test_sub_order_namespace() {
        let registry = OrderRegistry::with_builtin();
        let checker = Checker::new(&registry);

        assert!(checker.check_line("&成立", Some("条件分歧")).is_clean());
        assert_eq!(
            messages(&checker.check_line("&成立", None)),
            vec!["undefined command «成立»"]
        );
        assert_eq!(
            messages(&checker.check_line("&成立 x", Some("条件分歧"))),
            vec!["extra parameter"]
        );
    }

    #[test]
    fn test_dialog_header() {
        let registry = OrderRegistry::with_builtin();
        let checker = Checker::new(&registry);

        let result = checker.check_line("爱丽丝 -f 微笑：你好", None);
        assert!(result.is_clean());
        assert_eq!(result.decorations.len(), 1);

        let result = checker.check_line("爱丽丝 鲍勃：你好", None);
        assert_eq!(messages(&result), vec!["extra parameter"]);

        assert!(checker.check_line("没有冒号的旁白 1 2 3", None).is_clean());
    }

    #[test]
    fn test_comment_script_and_errors_are_silent() {
        let registry = OrderRegistry::new();
        let checker = Checker::new(&registry);
        for text in ["// @未知", "$: @未知", "@未知 <open", ""] {
            assert!(checker.check_line(text, None).is_clean(), "{text}");
        }
    }

    #[test]
    fn test_choice_and_options_severity() {
        let mut registry = OrderRegistry::new();
        registry.register(
            OrderDefinition::builder("声道测试")
                .named(
                    NamedParamDef::new("c").with_param(Param::required(Constraint::Choice {
                        options: vec!["bgm".into(), "se".into()],
                    })),
                )
                .named(NamedParamDef::new("v").with_param(Param::required(Constraint::Int)))
                .child_policy(ChildPolicy::NoChild)
                .build()
                .unwrap(),
        );
        let options = LintOptions {
            missing_parameter: Severity::Error,
            ..LintOptions::default()
        };
        let checker = Checker::new(&registry).with_options(options);

        let result = checker.check_line("@声道测试 -c voice -v", None);
        assert_eq!(result.count(Severity::Error), 2);
        assert!(result.decorations.is_empty());
        assert!(messages(&result)[0].contains("one of bgm|se"));
    }
}
