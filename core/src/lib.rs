//! Order schemas for the orderscript dialogue language.
//!
//! This crate defines what each command ("order") of the script language
//! accepts:
//!
//! - [`Constraint`]: validator for one parameter's literal value.
//! - [`Param`] / [`NamedParamDef`]: positional and named parameters.
//! - [`OrderDefinition`]: an order's parameters, sub-orders and
//!   [`ChildPolicy`], built through [`OrderBuilder`].
//! - [`OrderRegistry`]: fully-qualified name to definition, with
//!   sub-orders registered under their parent's namespace.
//! - [`CatalogPackage`]: a versioned bundle of definitions loaded from disk.
//!
//! Validation ([`validate_definition`], [`validate_catalog`]) catches
//! schema-authoring mistakes such as a required parameter after an optional
//! one or a predefined child policy without seeds.
//!
//! # Example
//!
//! ```
//! use orderscript_core::*;
//!
//! let mut registry = OrderRegistry::new();
//! registry.register(
//!     OrderDefinition::builder("跳转")
//!         .param(Param::required(Constraint::Free).with_label("目标"))
//!         .build()
//!         .unwrap(),
//! );
//!
//! let jump = registry.get("跳转").unwrap();
//! assert_eq!(jump.params[0].label.as_deref(), Some("目标"));
//! assert_eq!(registry.list(), vec!["跳转"]);
//! ```

pub mod catalog;
mod constraint;
mod package;
mod registry;
mod types;
mod validate;

pub use constraint::{Constraint, Rejection};
pub use package::CatalogPackage;
pub use registry::OrderRegistry;
pub use types::*;
pub use validate::{DefinitionError, validate_catalog, validate_definition};
