//! Hand-written parser for one line of script text.
//!
//! Structure is read from the first physical line only; any further lines
//! extend the dialog text or script body. A `<...` or `${...` left open makes
//! the whole line unparseable: its only structural child becomes an
//! [`Error`](NodeKind::Error) node and a [`SyntaxError`] is recorded.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::content::{COMMENT_SIGIL, ContentType, SCRIPT_SIGIL};
use crate::node::{NodeKind, Span, SyntaxNode};

/// A problem that made a line unparseable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
}

/// Parse tree of one line together with the text it was parsed from.
///
/// # Examples
///
/// ```
/// use orderscript_syntax::{NodeKind, SyntaxTree};
///
/// let tree = SyntaxTree::parse("@移动 -t 10");
/// assert_eq!(tree.order_name(), Some("移动"));
///
/// let named = tree
///     .root()
///     .descendants()
///     .find(|n| n.kind == NodeKind::ParamNameContent)
///     .unwrap();
/// assert_eq!(tree.slice(named), "t");
/// ```
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: String,
    root: SyntaxNode,
    errors: Vec<SyntaxError>,
}

impl SyntaxTree {
    pub fn parse(text: &str) -> Self {
        let mut parser = LineParser::new(text);
        let root = parser.line();
        Self {
            text: text.to_string(),
            root,
            errors: parser.errors,
        }
    }

    /// The `Line` node.
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source text covered by `node`.
    pub fn slice(&self, node: &SyntaxNode) -> &str {
        self.slice_span(node.span)
    }

    pub fn slice_span(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or_default()
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Returns `true` when the line's structural child is an error node.
    pub fn is_unparseable(&self) -> bool {
        self.root
            .first_child()
            .is_none_or(|child| child.kind == NodeKind::Error)
    }

    /// The command name of an order or sub-order line, without its sigil.
    pub fn order_name(&self) -> Option<&str> {
        let order = self.root.child(NodeKind::Order)?;
        let name = order
            .child(NodeKind::Header)?
            .child(NodeKind::Method)?
            .child(NodeKind::MethodName)?;
        Some(self.slice(name))
    }

    /// Indented rendering of the tree, one node per line.
    ///
    /// ```
    /// use orderscript_syntax::SyntaxTree;
    ///
    /// let dump = SyntaxTree::parse("// hi").dump();
    /// assert_eq!(dump, "Line 0..5\n  Comment 0..5\n    CommentSymbol 0..2 \"//\"\n    CommentText 2..5 \" hi\"\n");
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(&self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, node: &SyntaxNode, depth: usize, out: &mut String) {
        let _ = write!(out, "{}{:?} {}", "  ".repeat(depth), node.kind, node.span);
        if node.children.is_empty() {
            let _ = write!(out, " {:?}", self.slice(node));
        }
        out.push('\n');
        for child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}

struct LineParser<'a> {
    src: &'a str,
    /// End of the first physical line, `\r` excluded.
    line_end: usize,
    errors: Vec<SyntaxError>,
}

impl<'a> LineParser<'a> {
    fn new(src: &'a str) -> Self {
        let first = src.find('\n').unwrap_or(src.len());
        let line_end = if src[..first].ends_with('\r') {
            first - 1
        } else {
            first
        };
        Self {
            src,
            line_end,
            errors: Vec::new(),
        }
    }

    fn line(&mut self) -> SyntaxNode {
        let all = Span::new(0, self.src.len());
        let parsed = match ContentType::detect(self.src) {
            ContentType::Comment => Ok(self.comment()),
            ContentType::Script => Ok(self.script()),
            ContentType::Order | ContentType::SubOrder => self.order(),
            ContentType::Dialog => self.dialog(),
        };
        let child = match parsed {
            Ok(node) => node,
            Err(err) => {
                self.errors.push(err);
                SyntaxNode::leaf(NodeKind::Error, Span::new(0, self.line_end))
            }
        };
        SyntaxNode::branch(NodeKind::Line, all, vec![child])
    }

    fn comment(&self) -> SyntaxNode {
        let sigil = COMMENT_SIGIL.len();
        let mut children = vec![SyntaxNode::leaf(NodeKind::CommentSymbol, Span::new(0, sigil))];
        if self.line_end > sigil {
            children.push(SyntaxNode::leaf(
                NodeKind::CommentText,
                Span::new(sigil, self.line_end),
            ));
        }
        SyntaxNode::branch(NodeKind::Comment, Span::new(0, self.line_end), children)
    }

    fn script(&self) -> SyntaxNode {
        let sigil = SCRIPT_SIGIL.len();
        let end = self.src.len();
        let mut children = vec![SyntaxNode::leaf(NodeKind::ScriptSymbol, Span::new(0, sigil))];
        if end > sigil {
            children.push(SyntaxNode::leaf(NodeKind::ScriptBody, Span::new(sigil, end)));
        }
        SyntaxNode::branch(NodeKind::Script, Span::new(0, end), children)
    }

    // `@name ...` and `&name ...` share one shape; both sigils are one byte.
    fn order(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let name_end = self.scan_while(1, self.line_end, |c| !c.is_whitespace());
        let mut method = vec![SyntaxNode::leaf(NodeKind::MethodSymbol, Span::new(0, 1))];
        if name_end > 1 {
            method.push(SyntaxNode::leaf(NodeKind::MethodName, Span::new(1, name_end)));
        }

        let mut header = vec![SyntaxNode::branch(
            NodeKind::Method,
            Span::new(0, name_end),
            method,
        )];
        header.extend(self.param_groups(name_end, self.line_end)?);

        let span = Span::new(0, self.line_end);
        Ok(SyntaxNode::branch(
            NodeKind::Order,
            span,
            vec![SyntaxNode::branch(NodeKind::Header, span, header)],
        ))
    }

    fn dialog(&mut self) -> Result<SyntaxNode, SyntaxError> {
        let end = self.src.len();
        let mut children = Vec::new();
        let mut text_start = 0;

        if let Some((colon, colon_end)) = self.find_dialog_colon() {
            let groups = self.param_groups(0, colon)?;
            children.push(SyntaxNode::branch(
                NodeKind::Header,
                Span::new(0, colon),
                groups,
            ));
            children.push(SyntaxNode::leaf(
                NodeKind::DialogSymbol,
                Span::new(colon, colon_end),
            ));
            text_start = colon_end;
        }
        if end > text_start {
            children.push(SyntaxNode::leaf(
                NodeKind::DialogText,
                Span::new(text_start, end),
            ));
        }
        Ok(SyntaxNode::branch(NodeKind::Dialog, Span::new(0, end), children))
    }

    /// First `:`/`：` of the first line outside bordered and expression values.
    fn find_dialog_colon(&self) -> Option<(usize, usize)> {
        let mut pos = 0;
        while pos < self.line_end {
            let rest = &self.src[pos..self.line_end];
            let c = rest.chars().next()?;
            if c == ':' || c == '：' {
                return Some((pos, pos + c.len_utf8()));
            }
            if c == '<' {
                pos = pos + 1 + rest[1..].find('>')? + 1;
            } else if rest.starts_with("${") {
                pos = self.expression_close(pos)? + 1;
            } else {
                pos += c.len_utf8();
            }
        }
        None
    }

    /// `DefaultParams NamedParam*` over `[start, end)`.
    fn param_groups(&self, start: usize, end: usize) -> Result<Vec<SyntaxNode>, SyntaxError> {
        let mut groups = Vec::new();

        let (values, mut pos) = self.param_values(start, end)?;
        groups.push(SyntaxNode::branch(
            NodeKind::DefaultParams,
            Span::new(start, pos),
            vec![values],
        ));

        // `param_values` only stops early at a named-parameter marker.
        while pos < end {
            let name_end = self.scan_while(pos + 1, end, |c| !c.is_whitespace());
            let name = SyntaxNode::branch(
                NodeKind::ParamName,
                Span::new(pos, name_end),
                vec![
                    SyntaxNode::leaf(NodeKind::ParamSymbol, Span::new(pos, pos + 1)),
                    SyntaxNode::leaf(NodeKind::ParamNameContent, Span::new(pos + 1, name_end)),
                ],
            );
            let (values, next) = self.param_values(name_end, end)?;
            groups.push(SyntaxNode::branch(
                NodeKind::NamedParam,
                Span::new(pos, next),
                vec![name, values],
            ));
            pos = next;
        }

        Ok(groups)
    }

    /// Values and spaces from `start` up to `end` or the next named marker.
    fn param_values(&self, start: usize, end: usize) -> Result<(SyntaxNode, usize), SyntaxError> {
        let mut children = Vec::new();
        let mut pos = start;

        while pos < end {
            let rest = &self.src[pos..end];
            let Some(c) = rest.chars().next() else {
                break;
            };

            if c.is_whitespace() {
                let ws_end = self.scan_while(pos, end, char::is_whitespace);
                children.push(SyntaxNode::leaf(NodeKind::Space, Span::new(pos, ws_end)));
                pos = ws_end;
            } else if is_named_marker(rest) {
                break;
            } else if c == '<' {
                let node = self.bordered(pos, end)?;
                pos = node.span.end;
                children.push(node);
            } else if rest.starts_with("${") {
                let node = self.expression(pos, end)?;
                pos = node.span.end;
                children.push(node);
            } else {
                let value_end = self.scan_while(pos, end, |c| !c.is_whitespace());
                children.push(SyntaxNode::leaf(
                    NodeKind::ParamValue,
                    Span::new(pos, value_end),
                ));
                pos = value_end;
            }
        }

        Ok((
            SyntaxNode::branch(NodeKind::ParamValues, Span::new(start, pos), children),
            pos,
        ))
    }

    fn bordered(&self, start: usize, end: usize) -> Result<SyntaxNode, SyntaxError> {
        let close = self.src[start + 1..end]
            .find('>')
            .map(|i| start + 1 + i)
            .ok_or_else(|| SyntaxError {
                span: Span::new(start, end),
                message: "unterminated bordered value, expected `>`".to_string(),
            })?;

        let mut children = vec![SyntaxNode::leaf(
            NodeKind::BorderedStart,
            Span::new(start, start + 1),
        )];
        if close > start + 1 {
            children.push(SyntaxNode::leaf(
                NodeKind::BorderedContent,
                Span::new(start + 1, close),
            ));
        }
        children.push(SyntaxNode::leaf(
            NodeKind::BorderedEnd,
            Span::new(close, close + 1),
        ));
        Ok(SyntaxNode::branch(
            NodeKind::BorderedParamValue,
            Span::new(start, close + 1),
            children,
        ))
    }

    fn expression(&self, start: usize, end: usize) -> Result<SyntaxNode, SyntaxError> {
        let close = self
            .expression_close(start)
            .filter(|close| *close < end)
            .ok_or_else(|| SyntaxError {
                span: Span::new(start, end),
                message: "unterminated expression, expected `}`".to_string(),
            })?;

        let mut children = vec![SyntaxNode::leaf(
            NodeKind::ExpressionStart,
            Span::new(start, start + 2),
        )];
        if close > start + 2 {
            children.push(SyntaxNode::leaf(
                NodeKind::EmbeddedExpression,
                Span::new(start + 2, close),
            ));
        }
        children.push(SyntaxNode::leaf(
            NodeKind::ExpressionEnd,
            Span::new(close, close + 1),
        ));
        Ok(SyntaxNode::branch(
            NodeKind::ExpressionParamValue,
            Span::new(start, close + 1),
            children,
        ))
    }

    /// Offset of the `}` closing the `${` at `start`, braces balanced.
    fn expression_close(&self, start: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, c) in self.src[start + 2..self.line_end].char_indices() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Some(start + 2 + i),
                '}' => depth -= 1,
                _ => {}
            }
        }
        None
    }

    fn scan_while(&self, start: usize, end: usize, pred: impl Fn(char) -> bool) -> usize {
        self.src[start..end]
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map_or(end, |(i, _)| start + i)
    }
}

/// `-` followed by a character that is neither whitespace nor an ASCII digit.
fn is_named_marker(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('-')
        && chars
            .next()
            .is_some_and(|c| !c.is_whitespace() && !c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tree: &SyntaxTree) -> Vec<(NodeKind, &str)> {
        tree.root()
            .descendants()
            .filter(|n| n.kind.is_param_value())
            .map(|n| (n.kind, tree.slice(n)))
            .collect()
    }

    #[test]
    fn test_named_marker() {
        assert!(is_named_marker("-t 10"));
        assert!(is_named_marker("-速度"));
        assert!(!is_named_marker("-5"));
        assert!(!is_named_marker("- x"));
        assert!(!is_named_marker("-"));
        assert!(!is_named_marker("t"));
    }

    #[test]
    fn test_value_forms() {
        let tree = SyntaxTree::parse("@移动 a <b c> ${ {x:1}.x } <> -5");
        assert!(tree.errors().is_empty());
        assert_eq!(
            values(&tree),
            vec![
                (NodeKind::ParamValue, "a"),
                (NodeKind::BorderedParamValue, "<b c>"),
                (NodeKind::ExpressionParamValue, "${ {x:1}.x }"),
                (NodeKind::BorderedParamValue, "<>"),
                (NodeKind::ParamValue, "-5"),
            ]
        );
    }

    #[test]
    fn test_empty_bordered_has_no_content_node() {
        let tree = SyntaxTree::parse("@等待 <>");
        let bordered = tree
            .root()
            .descendants()
            .find(|n| n.kind == NodeKind::BorderedParamValue)
            .unwrap();
        assert!(bordered.child(NodeKind::BorderedContent).is_none());
        assert_eq!(bordered.children.len(), 2);
    }

    #[test]
    fn test_named_groups_split_values() {
        let tree = SyntaxTree::parse("@移动 hero -t 10 -x");
        let header = tree
            .root()
            .child(NodeKind::Order)
            .unwrap()
            .child(NodeKind::Header)
            .unwrap();

        let kinds: Vec<NodeKind> = header.children.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Method,
                NodeKind::DefaultParams,
                NodeKind::NamedParam,
                NodeKind::NamedParam
            ]
        );
        let named: Vec<&str> = header
            .children_of(NodeKind::NamedParam)
            .map(|n| tree.slice(n.child(NodeKind::ParamName).unwrap()))
            .collect();
        assert_eq!(named, vec!["-t", "-x"]);
    }

    #[test]
    fn test_missing_order_name() {
        for text in ["@", "@ 10", "&"] {
            let tree = SyntaxTree::parse(text);
            assert!(!tree.is_unparseable(), "{text}");
            assert_eq!(tree.order_name(), None, "{text}");
        }
    }

    #[test]
    fn test_unterminated_values_are_errors() {
        for text in ["@等待 <10", "@等待 ${a", "@等待 ${ {a }"] {
            let tree = SyntaxTree::parse(text);
            assert!(tree.is_unparseable(), "{text}");
            assert_eq!(tree.errors().len(), 1, "{text}");
            assert_eq!(tree.root().first_child().unwrap().span, Span::new(0, text.len()));
        }
    }

    #[test]
    fn test_dialog_header() {
        let tree = SyntaxTree::parse("爱丽丝 -f <微笑 脸>：今天天气不错");
        let dialog = tree.root().child(NodeKind::Dialog).unwrap();
        let header = dialog.child(NodeKind::Header).unwrap();
        assert_eq!(tree.slice(header), "爱丽丝 -f <微笑 脸>");
        assert_eq!(
            tree.slice(dialog.child(NodeKind::DialogText).unwrap()),
            "今天天气不错"
        );
        assert_eq!(
            values(&tree),
            vec![
                (NodeKind::ParamValue, "爱丽丝"),
                (NodeKind::BorderedParamValue, "<微笑 脸>"),
            ]
        );
    }

    #[test]
    fn test_colon_inside_bordered_is_not_a_header() {
        let tree = SyntaxTree::parse("<a:b> 还有话");
        let dialog = tree.root().child(NodeKind::Dialog).unwrap();
        assert!(dialog.child(NodeKind::Header).is_none());
        assert_eq!(dialog.children.len(), 1);
    }

    #[test]
    fn test_multiline_dialog_and_order() {
        let tree = SyntaxTree::parse("旁白的第一行\r\n第二行");
        let text = tree
            .root()
            .child(NodeKind::Dialog)
            .unwrap()
            .child(NodeKind::DialogText)
            .unwrap();
        assert_eq!(tree.slice(text), "旁白的第一行\r\n第二行");

        let tree = SyntaxTree::parse("@等待 10\r\nignored <");
        assert!(tree.errors().is_empty());
        assert_eq!(values(&tree), vec![(NodeKind::ParamValue, "10")]);
    }

    #[test]
    fn test_full_width_space_separates_values() {
        let tree = SyntaxTree::parse("@移动　a　b");
        assert_eq!(
            values(&tree),
            vec![(NodeKind::ParamValue, "a"), (NodeKind::ParamValue, "b")]
        );
    }
}
