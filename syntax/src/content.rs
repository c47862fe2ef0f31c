//! Line content classification by leading sigil.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a line holds, decided by the first line of its text alone.
///
/// | prefix | type |
/// |--------|------|
/// | `@`    | [`Order`](ContentType::Order) |
/// | `$:`   | [`Script`](ContentType::Script) |
/// | `&`    | [`SubOrder`](ContentType::SubOrder) |
/// | `//`   | [`Comment`](ContentType::Comment) |
/// | other  | [`Dialog`](ContentType::Dialog) |
///
/// # Examples
///
/// ```
/// use orderscript_syntax::ContentType;
///
/// assert_eq!(ContentType::detect("@等待 10"), ContentType::Order);
/// assert_eq!(ContentType::detect("&成立"), ContentType::SubOrder);
/// assert_eq!(ContentType::detect("$: let a = 1"), ContentType::Script);
/// assert_eq!(ContentType::detect("// note"), ContentType::Comment);
/// assert_eq!(ContentType::detect("爱丽丝: 你好"), ContentType::Dialog);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Order,
    SubOrder,
    Script,
    Comment,
    Dialog,
}

pub const ORDER_SIGIL: &str = "@";
pub const SUB_ORDER_SIGIL: &str = "&";
pub const SCRIPT_SIGIL: &str = "$:";
pub const COMMENT_SIGIL: &str = "//";

impl ContentType {
    pub fn detect(text: &str) -> Self {
        let first = text.lines().next().unwrap_or_default();
        if first.starts_with(ORDER_SIGIL) {
            ContentType::Order
        } else if first.starts_with(SCRIPT_SIGIL) {
            ContentType::Script
        } else if first.starts_with(SUB_ORDER_SIGIL) {
            ContentType::SubOrder
        } else if first.starts_with(COMMENT_SIGIL) {
            ContentType::Comment
        } else {
            ContentType::Dialog
        }
    }

    /// Returns `true` for orders and sub-orders.
    pub fn is_order(self) -> bool {
        matches!(self, ContentType::Order | ContentType::SubOrder)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Order => "order",
            ContentType::SubOrder => "sub_order",
            ContentType::Script => "script",
            ContentType::Comment => "comment",
            ContentType::Dialog => "dialog",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
