//! The orderscript document model.
//!
//! A [`Document`] is a tree of script lines whose shape follows the schema of
//! the order on each line: an order with a `free_child` policy always owns at
//! least one line, a `pre_defined_child` order owns exactly the lines its
//! definition seeds, and dialog, script and comment lines own none. Every
//! line keeps the diagnostics of its last validation.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use orderscript_document::{Document, ScriptConfig, load_script};
//!
//! let config = ScriptConfig::load(".orderscript.yml").unwrap();
//! let registry = Arc::new(config.build_registry(Path::new(".")).unwrap());
//!
//! let seeds = load_script("chapter1.outline").unwrap();
//! let doc = Document::from_seeds(registry, &seeds)
//!     .unwrap()
//!     .with_lint_options(config.diagnostics.clone());
//!
//! let report = doc.report(Some("chapter1.outline"));
//! println!("{} errors, {} warnings", report.errors, report.warnings);
//! ```
//!
//! # Feature flags
//!
//! - **`clap`** (default): derives `clap::ValueEnum` for [`OutputFormat`].

mod config;
mod document;
mod error;
mod loader;
mod output;
mod report;

pub use config::{DEFAULT_CONFIG_FILE, ScriptConfig};
pub use document::{Document, Line, LineId};
pub use error::{DocumentError, Result};
pub use loader::{
    ScriptFormat, load_catalog, load_script, parse_outline, parse_seeds, render_outline,
    render_seeds, save_catalog, save_script,
};
pub use output::{
    OutputFormat, TreeEntry, format_orders, format_reports, format_tree, signature, tree_entries,
};
pub use report::{DocumentReport, LineReport};
