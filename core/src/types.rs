//! Order schema type definitions.
//!
//! An [`OrderDefinition`] describes what one command of the script language
//! accepts: its positional parameters, its named parameters, the sub-orders
//! that may be nested under it, and the [`ChildPolicy`] that shapes the lines
//! beneath it. Definitions are built once through [`OrderBuilder`] and never
//! mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Constraint;
use crate::validate::{DefinitionError, validate_definition};

/// Joins a parent order's name and a sub-order's local name.
pub const NAMESPACE_SEPARATOR: &str = " ";

/// Builds the fully-qualified name of `name` inside `namespace`.
///
/// # Examples
///
/// ```
/// use orderscript_core::qualified_name;
///
/// assert_eq!(qualified_name(None, "等待"), "等待");
/// assert_eq!(qualified_name(Some("条件分歧"), "成立"), "条件分歧 成立");
/// ```
pub fn qualified_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}{NAMESPACE_SEPARATOR}{name}"),
        _ => name.to_string(),
    }
}

/// Rule governing whether and how a line may own child lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChildPolicy {
    /// The line never has children.
    #[default]
    NoChild,
    /// Any number of children, never fewer than one.
    FreeChild,
    /// A fixed child set seeded from the order's `init_children`.
    PreDefinedChild,
    /// Reserved; no built-in order uses it.
    TemplateChild,
}

impl ChildPolicy {
    /// Returns `true` unless the policy is [`ChildPolicy::NoChild`].
    pub fn allows_children(self) -> bool {
        !matches!(self, ChildPolicy::NoChild)
    }
}

/// Seed for one line of a document: its text and, recursively, its children.
///
/// This is both the hydration input of a document and its serialized form.
///
/// ```
/// use orderscript_core::LineSeed;
///
/// let seed = LineSeed::new("@循环").with_child(LineSeed::new("你好"));
/// let json = serde_json::to_string(&seed).unwrap();
/// assert_eq!(json, r#"{"content":"@循环","children":[{"content":"你好"}]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineSeed {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LineSeed>,
}

impl LineSeed {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: LineSeed) -> Self {
        self.children.push(child);
        self
    }
}

/// One positional parameter.
///
/// `init_value` is the default when the parameter is optional, and the value
/// pre-filled by completion when it is required.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Param {
    pub constraint: Constraint,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Param {
    /// Creates a required parameter.
    pub fn required(constraint: Constraint) -> Self {
        Self {
            constraint,
            optional: false,
            ..Default::default()
        }
    }

    /// Creates an optional parameter.
    pub fn optional(constraint: Constraint) -> Self {
        Self {
            constraint,
            optional: true,
            ..Default::default()
        }
    }

    pub fn with_init_value(mut self, value: &str) -> Self {
        self.init_value = Some(value.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// A named parameter (`-t 10`), carrying its own positional list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamedParamDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NamedParamDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// Complete schema of one order.
///
/// Sub-orders keep their local name here; the registry makes them reachable
/// under `parent + NAMESPACE_SEPARATOR + local`.
///
/// # Examples
///
/// ```
/// use orderscript_core::*;
///
/// let wait = OrderDefinition::builder("等待")
///     .param(Param::required(Constraint::NonnegativeInt).with_init_value("500"))
///     .build()
///     .unwrap();
/// assert_eq!(wait.required_count(), 1);
/// assert_eq!(wait.child_policy, ChildPolicy::NoChild);
///
/// // Required parameters may not follow optional ones.
/// let err = OrderDefinition::builder("坏")
///     .param(Param::optional(Constraint::Free))
///     .param(Param::required(Constraint::Free))
///     .build()
///     .unwrap_err();
/// assert!(matches!(err, DefinitionError::RequiredAfterOptional { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub named_params: BTreeMap<String, NamedParamDef>,
    #[serde(default)]
    pub sub_orders: Vec<OrderDefinition>,
    #[serde(default)]
    pub child_policy: ChildPolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init_children: Vec<LineSeed>,
}

impl OrderDefinition {
    pub fn builder(name: &str) -> OrderBuilder {
        OrderBuilder::new(name)
    }

    /// Looks up a named parameter by its key.
    pub fn named_param(&self, name: &str) -> Option<&NamedParamDef> {
        self.named_params.get(name)
    }

    /// Finds a direct sub-order by its local name.
    pub fn find_sub_order(&self, name: &str) -> Option<&OrderDefinition> {
        self.sub_orders.iter().find(|s| s.name == name)
    }

    /// Number of leading required parameters.
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }
}

/// Builder for [`OrderDefinition`] that validates on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    definition: OrderDefinition,
    named: Vec<NamedParamDef>,
}

impl OrderBuilder {
    fn new(name: &str) -> Self {
        Self {
            definition: OrderDefinition {
                name: name.to_string(),
                ..Default::default()
            },
            named: Vec::new(),
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.definition.description = Some(desc.to_string());
        self
    }

    /// Appends one positional parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.definition.params.push(param);
        self
    }

    /// Appends a parameter list: every `required` entry followed by every
    /// `optional` entry, with the `optional` flag forced accordingly.
    pub fn params(
        mut self,
        required: impl IntoIterator<Item = Param>,
        optional: impl IntoIterator<Item = Param>,
    ) -> Self {
        self.definition
            .params
            .extend(required.into_iter().map(|p| Param { optional: false, ..p }));
        self.definition
            .params
            .extend(optional.into_iter().map(|p| Param { optional: true, ..p }));
        self
    }

    pub fn named(mut self, named: NamedParamDef) -> Self {
        self.named.push(named);
        self
    }

    pub fn sub_order(mut self, sub: OrderDefinition) -> Self {
        self.definition.sub_orders.push(sub);
        self
    }

    pub fn child_policy(mut self, policy: ChildPolicy) -> Self {
        self.definition.child_policy = policy;
        self
    }

    pub fn init_child(mut self, seed: LineSeed) -> Self {
        self.definition.init_children.push(seed);
        self
    }

    /// Validates and returns the definition.
    ///
    /// # Errors
    ///
    /// Returns the first [`DefinitionError`] found by
    /// [`validate_definition`], including a duplicated named-parameter key
    /// (which a map would otherwise swallow silently).
    pub fn build(self) -> Result<OrderDefinition, DefinitionError> {
        let OrderBuilder {
            mut definition,
            named,
        } = self;

        for named_param in named {
            let key = named_param.name.clone();
            if definition
                .named_params
                .insert(key.clone(), named_param)
                .is_some()
            {
                return Err(DefinitionError::DuplicateNamedParam {
                    order: definition.name,
                    name: key,
                });
            }
        }

        match validate_definition(&definition).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(definition),
        }
    }
}
