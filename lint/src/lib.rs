//! Validation of orderscript lines against order schemas.
//!
//! [`Checker::validate`] walks a [`SyntaxTree`](orderscript_syntax::SyntaxTree),
//! resolves the order against an [`OrderRegistry`](orderscript_core::OrderRegistry)
//! and returns a [`CheckResult`]: advisory [`Diagnostic`]s anchored at spans of
//! the line, plus inline [`Decoration`]s naming each recognised named
//! parameter. Completion helpers for editors live alongside.

mod checker;
mod completion;
mod diagnostic;

pub use checker::Checker;
pub use completion::{
    CompletionItem, complete_named_params, complete_orders, initial_text, list_order_names,
};
pub use diagnostic::{CheckResult, Decoration, Diagnostic, DiagnosticKind, LintOptions, Severity};
