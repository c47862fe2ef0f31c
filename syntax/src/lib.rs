//! Line grammar of the orderscript dialogue language.
//!
//! Every line of a script is one of five kinds, told apart by its leading
//! sigil ([`ContentType`]). [`SyntaxTree::parse`] turns a line's text into a
//! span-annotated tree of [`SyntaxNode`]s that the checker and editors walk.
//!
//! ```
//! use orderscript_syntax::{ContentType, NodeKind, SyntaxTree};
//!
//! let tree = SyntaxTree::parse("@等待 500");
//! assert_eq!(ContentType::detect(tree.text()), ContentType::Order);
//! assert_eq!(tree.order_name(), Some("等待"));
//!
//! let values: Vec<&str> = tree
//!     .root()
//!     .descendants()
//!     .filter(|n| n.kind == NodeKind::ParamValue)
//!     .map(|n| tree.slice(n))
//!     .collect();
//! assert_eq!(values, vec!["500"]);
//! ```

mod content;
mod node;
mod parser;

pub use content::{COMMENT_SIGIL, ContentType, ORDER_SIGIL, SCRIPT_SIGIL, SUB_ORDER_SIGIL};
pub use node::{Descendants, NodeKind, Span, SyntaxNode};
pub use parser::{SyntaxError, SyntaxTree};
