//! Order definition and catalog validation.
//!
//! Catches schema-authoring mistakes before a definition reaches the
//! registry: misplaced optional parameters, broken names, duplicated keys, and
//! child policies that contradict their seeds.
//!
//! # Examples
//!
//! ```
//! use orderscript_core::*;
//!
//! let def = OrderDefinition::builder("等待")
//!     .param(Param::required(Constraint::NonnegativeInt))
//!     .build()
//!     .unwrap();
//! assert!(validate_definition(&def).is_empty());
//!
//! // Invalid: a predefined child set with nothing to seed it
//! let mut bad = def.clone();
//! bad.child_policy = ChildPolicy::PreDefinedChild;
//! assert!(!validate_definition(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{CatalogPackage, ChildPolicy, NamedParamDef, OrderDefinition, Param};

/// Order/catalog validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Catalog version string is empty.
    #[error("catalog version cannot be empty")]
    EmptyCatalogVersion,
    /// Order name is empty or whitespace-only.
    #[error("order name cannot be empty")]
    EmptyOrderName,
    /// Order name contains whitespace or starts with a line sigil.
    #[error("invalid order name: {0}")]
    InvalidOrderName(String),
    /// Two orders in the same catalog share a name.
    #[error("duplicate order in catalog: {0}")]
    DuplicateOrder(String),
    /// A required parameter follows an optional one.
    #[error("order {order}: required parameter #{index} follows an optional parameter")]
    RequiredAfterOptional { order: String, index: usize },
    /// A named parameter key is empty or would not parse as a name.
    #[error("order {order}: invalid named parameter key {name:?}")]
    InvalidNamedParam { order: String, name: String },
    /// Two named parameters share a key.
    #[error("order {order}: duplicate named parameter -{name}")]
    DuplicateNamedParam { order: String, name: String },
    /// Two sub-orders of the same order share a name.
    #[error("order {order}: duplicate sub-order {name}")]
    DuplicateSubOrder { order: String, name: String },
    /// `PreDefinedChild` without any seed children.
    #[error("order {0}: predefined child policy requires init children")]
    MissingInitChildren(String),
    /// Seed children on a policy that never materializes them.
    #[error("order {0}: init children are only allowed with the predefined child policy")]
    UnexpectedInitChildren(String),
    /// A default or initial value that its own constraint rejects.
    #[error("order {order}: init value {value:?} does not match {label}")]
    InvalidInitValue {
        order: String,
        value: String,
        label: String,
    },
}

/// Validates a catalog package.
///
/// Checks for an empty version string and duplicate order names, then
/// validates each definition.
///
/// # Examples
///
/// ```
/// use orderscript_core::*;
///
/// let wait = OrderDefinition::builder("等待").build().unwrap();
/// let mut catalog = CatalogPackage::new("1.0.0");
/// catalog.orders.push(wait.clone());
/// assert!(validate_catalog(&catalog).is_empty());
///
/// catalog.orders.push(wait);
/// let errors = validate_catalog(&catalog);
/// assert!(errors.iter().any(|e| matches!(e, DefinitionError::DuplicateOrder(_))));
/// ```
pub fn validate_catalog(catalog: &CatalogPackage) -> Vec<DefinitionError> {
    let mut errors = Vec::new();

    if catalog.version.trim().is_empty() {
        errors.push(DefinitionError::EmptyCatalogVersion);
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for order in &catalog.orders {
        if !seen.insert(order.name.as_str()) {
            errors.push(DefinitionError::DuplicateOrder(order.name.clone()));
            continue;
        }
        errors.extend(validate_definition(order));
    }

    errors
}

/// Validates one order definition and, recursively, its sub-orders.
pub fn validate_definition(definition: &OrderDefinition) -> Vec<DefinitionError> {
    let mut errors = Vec::new();
    let order = definition.name.trim();

    if order.is_empty() {
        errors.push(DefinitionError::EmptyOrderName);
        return errors;
    }
    if !is_valid_order_name(order) {
        errors.push(DefinitionError::InvalidOrderName(definition.name.clone()));
        return errors;
    }

    errors.extend(validate_params(order, &definition.params));

    for (key, named) in &definition.named_params {
        errors.extend(validate_named_param(order, key, named));
    }

    match definition.child_policy {
        ChildPolicy::PreDefinedChild if definition.init_children.is_empty() => {
            errors.push(DefinitionError::MissingInitChildren(order.to_string()));
        }
        ChildPolicy::PreDefinedChild => {}
        _ if !definition.init_children.is_empty() => {
            errors.push(DefinitionError::UnexpectedInitChildren(order.to_string()));
        }
        _ => {}
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in &definition.sub_orders {
        if !seen.insert(sub.name.as_str()) {
            errors.push(DefinitionError::DuplicateSubOrder {
                order: order.to_string(),
                name: sub.name.clone(),
            });
            continue;
        }
        errors.extend(validate_definition(sub));
    }

    errors
}

fn validate_named_param(order: &str, key: &str, named: &NamedParamDef) -> Vec<DefinitionError> {
    let valid_key = key == named.name
        && key
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && !c.is_ascii_digit())
        && !key.chars().any(char::is_whitespace);
    if !valid_key {
        return vec![DefinitionError::InvalidNamedParam {
            order: order.to_string(),
            name: key.to_string(),
        }];
    }
    validate_params(order, &named.params)
}

fn validate_params(order: &str, params: &[Param]) -> Vec<DefinitionError> {
    let mut errors = Vec::new();
    let mut seen_optional = false;

    for (index, param) in params.iter().enumerate() {
        if param.optional {
            seen_optional = true;
        } else if seen_optional {
            errors.push(DefinitionError::RequiredAfterOptional {
                order: order.to_string(),
                index,
            });
        }

        if let Some(value) = &param.init_value
            && param.constraint.check(value).is_err()
        {
            errors.push(DefinitionError::InvalidInitValue {
                order: order.to_string(),
                value: value.clone(),
                label: param.constraint.label(),
            });
        }
    }

    errors
}

fn is_valid_order_name(name: &str) -> bool {
    const SIGILS: [&str; 4] = ["@", "&", "$:", "//"];
    !name.chars().any(char::is_whitespace) && !SIGILS.iter().any(|s| name.starts_with(s))
}

#[cfg(test)]
mod tests {
    use crate::{Constraint, LineSeed};

    use super::*;

    fn order(name: &str) -> OrderDefinition {
        OrderDefinition {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_required_after_optional() {
        let mut def = order("移动");
        def.params.push(Param::optional(Constraint::Free));
        def.params.push(Param::required(Constraint::Int));

        assert_eq!(
            validate_definition(&def),
            vec![DefinitionError::RequiredAfterOptional {
                order: "移动".into(),
                index: 1
            }]
        );
    }

    #[test]
    fn test_rejects_names_with_sigils_or_spaces() {
        assert_eq!(
            validate_definition(&order("@等待")),
            vec![DefinitionError::InvalidOrderName("@等待".into())]
        );
        assert_eq!(
            validate_definition(&order("条件 分歧")),
            vec![DefinitionError::InvalidOrderName("条件 分歧".into())]
        );
        assert_eq!(
            validate_definition(&order("  ")),
            vec![DefinitionError::EmptyOrderName]
        );
    }

    #[test]
    fn test_rejects_bad_init_value() {
        let mut def = order("等待");
        def.params
            .push(Param::required(Constraint::NonnegativeInt).with_init_value("soon"));

        let errors = validate_definition(&def);
        assert_eq!(
            errors,
            vec![DefinitionError::InvalidInitValue {
                order: "等待".into(),
                value: "soon".into(),
                label: "non-negative integer".into()
            }]
        );
    }

    #[test]
    fn test_child_policy_and_seeds_must_agree() {
        let mut predefined = order("条件分歧");
        predefined.child_policy = ChildPolicy::PreDefinedChild;
        assert_eq!(
            validate_definition(&predefined),
            vec![DefinitionError::MissingInitChildren("条件分歧".into())]
        );

        let mut free = order("循环");
        free.child_policy = ChildPolicy::FreeChild;
        free.init_children.push(LineSeed::new(""));
        assert_eq!(
            validate_definition(&free),
            vec![DefinitionError::UnexpectedInitChildren("循环".into())]
        );
    }

    #[test]
    fn test_named_param_key_must_match_name() {
        let mut def = order("移动");
        def.named_params
            .insert("t".into(), NamedParamDef::new("speed"));
        def.named_params.insert("5".into(), NamedParamDef::new("5"));

        let errors = validate_definition(&def);
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .all(|e| matches!(e, DefinitionError::InvalidNamedParam { .. }))
        );
    }

    #[test]
    fn test_duplicate_sub_orders() {
        let mut def = order("条件分歧");
        def.sub_orders.push(order("成立"));
        def.sub_orders.push(order("成立"));

        assert_eq!(
            validate_definition(&def),
            vec![DefinitionError::DuplicateSubOrder {
                order: "条件分歧".into(),
                name: "成立".into()
            }]
        );
    }

    #[test]
    fn test_catalog_requires_version() {
        let catalog = CatalogPackage::new("");
        assert_eq!(
            validate_catalog(&catalog),
            vec![DefinitionError::EmptyCatalogVersion]
        );
    }
}
