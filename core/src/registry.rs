//! The order registry: fully-qualified order name to definition.
//!
//! A registry is filled during a configuration phase (built-in catalog, then
//! any catalog files) and is read-only afterwards. Registering an order also
//! registers each of its sub-orders, recursively, under
//! `parent + NAMESPACE_SEPARATOR + sub`.
//!
//! ```
//! use orderscript_core::OrderRegistry;
//!
//! let registry = OrderRegistry::with_builtin();
//! assert!(registry.get("等待").is_some());
//! assert!(registry.resolve(Some("条件分歧"), "成立").is_some());
//! assert!(registry.get("成立").is_none());
//! ```

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::{CatalogPackage, DefinitionError, OrderDefinition, catalog, qualified_name, validate_catalog};

static GLOBAL: OnceCell<OrderRegistry> = OnceCell::new();

/// Mapping from fully-qualified order name to [`OrderDefinition`].
///
/// Stored sub-order definitions carry their qualified name in `name`, so
/// `registry.get(q).name == q` for every registered `q`.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    orders: HashMap<String, OrderDefinition>,
}

impl OrderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in catalog.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for definition in catalog::builtin_orders() {
            registry.register(definition);
        }
        registry
    }

    /// Returns the process-wide registry.
    ///
    /// Falls back to [`with_builtin`](Self::with_builtin) when nothing was
    /// installed before the first call.
    pub fn global() -> &'static OrderRegistry {
        GLOBAL.get_or_init(Self::with_builtin)
    }

    /// Installs `self` as the process-wide registry.
    ///
    /// Only the first installation wins; afterwards the global registry is
    /// frozen and the rejected registry is handed back.
    pub fn install_global(self) -> Result<(), OrderRegistry> {
        GLOBAL.set(self)
    }

    /// Inserts or overwrites `definition` and all of its sub-orders.
    pub fn register(&mut self, definition: OrderDefinition) {
        let name = definition.name.clone();
        self.register_under(None, definition);
        debug!(order = %name, total = self.orders.len(), "Registered order");
    }

    fn register_under(&mut self, namespace: Option<&str>, mut definition: OrderDefinition) {
        let full_name = qualified_name(namespace, &definition.name);
        for sub in definition.sub_orders.clone() {
            self.register_under(Some(&full_name), sub);
        }
        definition.name = full_name.clone();
        self.orders.insert(full_name, definition);
    }

    /// Validates and registers every order of a catalog.
    ///
    /// # Errors
    ///
    /// Returns all [`DefinitionError`]s of the catalog; nothing is registered
    /// when any is found.
    pub fn register_catalog(&mut self, catalog: CatalogPackage) -> Result<usize, Vec<DefinitionError>> {
        let errors = validate_catalog(&catalog);
        if !errors.is_empty() {
            return Err(errors);
        }
        let count = catalog.orders.len();
        for definition in catalog.orders {
            self.register(definition);
        }
        Ok(count)
    }

    /// Looks up an order by its fully-qualified name.
    pub fn get(&self, name: &str) -> Option<&OrderDefinition> {
        self.orders.get(name)
    }

    /// Looks up `name` inside `namespace` (top level when `None`).
    pub fn resolve(&self, namespace: Option<&str>, name: &str) -> Option<&OrderDefinition> {
        self.get(&qualified_name(namespace, name))
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.orders.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.orders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All registered definitions, sorted by name.
    pub fn definitions(&self) -> Vec<&OrderDefinition> {
        let mut definitions: Vec<&OrderDefinition> = self.orders.values().collect();
        definitions.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Number of registered names, sub-orders included.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns `true` if no order is registered.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChildPolicy, Constraint, LineSeed, Param};

    use super::*;

    fn branch() -> OrderDefinition {
        let leaf = |name: &str| {
            OrderDefinition::builder(name)
                .child_policy(ChildPolicy::FreeChild)
                .build()
                .unwrap()
        };
        OrderDefinition::builder("分歧")
            .sub_order(
                OrderDefinition::builder("外层")
                    .sub_order(leaf("内层"))
                    .build()
                    .unwrap(),
            )
            .sub_order(leaf("其他"))
            .child_policy(ChildPolicy::PreDefinedChild)
            .init_child(LineSeed::new("&外层"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_walks_sub_orders_recursively() {
        let mut registry = OrderRegistry::new();
        registry.register(branch());

        assert_eq!(registry.list(), vec!["分歧", "分歧 其他", "分歧 外层", "分歧 外层 内层"]);
        assert_eq!(registry.get("分歧 外层 内层").unwrap().name, "分歧 外层 内层");
        assert_eq!(
            registry.resolve(Some("分歧 外层"), "内层").unwrap().child_policy,
            ChildPolicy::FreeChild
        );
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = OrderRegistry::new();
        registry.register(OrderDefinition::builder("等待").build().unwrap());
        registry.register(
            OrderDefinition::builder("等待")
                .param(Param::required(Constraint::NonnegativeInt))
                .build()
                .unwrap(),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("等待").unwrap().params.len(), 1);
    }

    #[test]
    fn test_register_catalog_is_all_or_nothing() {
        let mut registry = OrderRegistry::new();
        let mut catalog = CatalogPackage::new("1.0.0");
        catalog
            .orders
            .push(OrderDefinition::builder("跳转").build().unwrap());
        catalog.orders.push(OrderDefinition {
            name: "坏 名字".into(),
            ..Default::default()
        });

        let errors = registry.register_catalog(catalog).unwrap_err();
        assert_eq!(errors, vec![DefinitionError::InvalidOrderName("坏 名字".into())]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_global_defaults_to_builtin() {
        let global = OrderRegistry::global();
        assert!(global.contains("等待"));
        assert!(global.contains("条件分歧 成立"));
    }
}
