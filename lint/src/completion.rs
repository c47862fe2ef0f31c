//! Completion candidates for order names and named parameters.

use orderscript_core::{NAMESPACE_SEPARATOR, OrderDefinition, OrderRegistry};
use orderscript_syntax::{ORDER_SIGIL, SUB_ORDER_SIGIL};
use serde::{Deserialize, Serialize};

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// Text shown in the list.
    pub label: String,
    /// Text inserted when the item is accepted.
    pub apply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Every registered name, sub-orders included, sorted.
pub fn list_order_names(registry: &OrderRegistry) -> Vec<String> {
    registry.list().into_iter().map(str::to_string).collect()
}

/// Orders whose local name starts with `prefix`.
///
/// At top level (`namespace == None`) only top-level orders are offered;
/// inside a namespace only that order's direct sub-orders are.
///
/// ```
/// use orderscript_core::OrderRegistry;
/// use orderscript_lint::complete_orders;
///
/// let registry = OrderRegistry::with_builtin();
/// let items = complete_orders(&registry, "不", Some("条件分歧"));
/// assert_eq!(items[0].label, "不成立");
/// assert_eq!(items[0].apply, "不成立 ");
/// ```
pub fn complete_orders(
    registry: &OrderRegistry,
    prefix: &str,
    namespace: Option<&str>,
) -> Vec<CompletionItem> {
    let scope = namespace
        .filter(|ns| !ns.is_empty())
        .map(|ns| format!("{ns}{NAMESPACE_SEPARATOR}"));

    registry
        .definitions()
        .into_iter()
        .filter_map(|definition| {
            let local = match &scope {
                Some(scope) => definition.name.strip_prefix(scope.as_str())?,
                None => definition.name.as_str(),
            };
            if local.contains(NAMESPACE_SEPARATOR) || !local.starts_with(prefix) {
                return None;
            }
            Some(CompletionItem {
                label: local.to_string(),
                apply: format!("{local} "),
                detail: definition.description.clone(),
            })
        })
        .collect()
}

/// Named parameters of `definition` whose key starts with `prefix`.
pub fn complete_named_params(definition: &OrderDefinition, prefix: &str) -> Vec<CompletionItem> {
    let prefix = prefix.strip_prefix('-').unwrap_or(prefix);
    definition
        .named_params
        .values()
        .filter(|named| named.name.starts_with(prefix))
        .map(|named| CompletionItem {
            label: format!("-{}", named.name),
            apply: format!("-{} ", named.name),
            detail: named.label.clone(),
        })
        .collect()
}

/// Text of a fresh line for `definition`: sigil, local name and the initial
/// values of its leading required parameters.
///
/// ```
/// use orderscript_core::OrderRegistry;
/// use orderscript_lint::initial_text;
///
/// let registry = OrderRegistry::with_builtin();
/// assert_eq!(initial_text(registry.get("等待").unwrap()), "@等待 500");
/// assert_eq!(initial_text(registry.get("条件分歧 成立").unwrap()), "&成立");
/// ```
pub fn initial_text(definition: &OrderDefinition) -> String {
    let mut text = match definition.name.rsplit_once(NAMESPACE_SEPARATOR) {
        Some((_, local)) => format!("{SUB_ORDER_SIGIL}{local}"),
        None => format!("{ORDER_SIGIL}{}", definition.name),
    };

    for param in definition.params.iter().filter(|p| !p.optional) {
        let Some(value) = &param.init_value else {
            break;
        };
        text.push(' ');
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            text.push('<');
            text.push_str(value);
            text.push('>');
        } else {
            text.push_str(value);
        }
    }
    text
}
