//! Parse tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte range `[start, end)` within a line's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Node taxonomy of the line grammar.
///
/// ```text
/// Line            = Order | Dialog | Comment | Script | Error
/// Order           = Header
/// Header          = Method DefaultParams NamedParam*          (orders)
///                 | DefaultParams NamedParam*                 (dialog)
/// Method          = MethodSymbol MethodName?
/// DefaultParams   = ParamValues
/// NamedParam      = ParamName ParamValues
/// ParamName       = ParamSymbol ParamNameContent
/// ParamValues     = (Space | ParamValue | BorderedParamValue | ExpressionParamValue)*
/// BorderedParamValue   = BorderedStart BorderedContent? BorderedEnd
/// ExpressionParamValue = ExpressionStart EmbeddedExpression? ExpressionEnd
/// Dialog          = (Header DialogSymbol)? DialogText?
/// Comment         = CommentSymbol CommentText?
/// Script          = ScriptSymbol ScriptBody?
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Line,
    Order,
    Dialog,
    Comment,
    Script,
    Error,
    Header,
    Method,
    MethodSymbol,
    MethodName,
    DefaultParams,
    NamedParam,
    ParamName,
    ParamSymbol,
    ParamNameContent,
    ParamValues,
    Space,
    ParamValue,
    BorderedParamValue,
    BorderedStart,
    BorderedContent,
    BorderedEnd,
    ExpressionParamValue,
    ExpressionStart,
    EmbeddedExpression,
    ExpressionEnd,
    DialogSymbol,
    DialogText,
    CommentSymbol,
    CommentText,
    ScriptSymbol,
    ScriptBody,
}

impl NodeKind {
    /// Returns `true` for the three parameter value forms.
    pub fn is_param_value(self) -> bool {
        matches!(
            self,
            NodeKind::ParamValue | NodeKind::BorderedParamValue | NodeKind::ExpressionParamValue
        )
    }
}

/// A node of a line's parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn branch(kind: NodeKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    pub fn first_child(&self) -> Option<&SyntaxNode> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&SyntaxNode> {
        self.children.last()
    }

    /// First direct child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All direct children of the given kind.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Pre-order traversal starting at (and including) `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Iterator returned by [`SyntaxNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
