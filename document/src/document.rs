//! The line tree.
//!
//! A [`Document`] is an arena of [`Line`]s keyed by [`LineId`]. Ownership runs
//! from a parent's `children` list downward; `parent` is a plain id used for
//! navigation. Ids are never reused: a removed line stays in the arena,
//! detached, and can be attached again later together with its subtree.
//!
//! Every change to a line's text runs the same cycle on that line:
//!
//! 1. detect the content type from the first line of text;
//! 2. derive the child policy from the resolved order definition;
//! 3. reconcile children (a blank child for `free_child`, the init seeds for
//!    `pre_defined_child`);
//! 4. validate the text and store the [`CheckResult`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use orderscript_core::{ChildPolicy, LineSeed, OrderDefinition, OrderRegistry, qualified_name};
use orderscript_lint::{CheckResult, Checker, LintOptions};
use orderscript_syntax::{ContentType, SyntaxError, SyntaxTree};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DocumentError, Result};
use crate::report::DocumentReport;

/// Stable identifier of a line within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(u64);

impl LineId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the document tree.
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    text: String,
    parent: Option<LineId>,
    children: Vec<LineId>,
    content_type: Option<ContentType>,
    child_policy: ChildPolicy,
    /// Method name as written, for order and sub-order lines.
    local_name: Option<String>,
    check: CheckResult,
    syntax_errors: Vec<SyntaxError>,
}

impl Line {
    fn new(id: LineId, text: String) -> Self {
        Self {
            id,
            text,
            parent: None,
            children: Vec::new(),
            content_type: None,
            child_policy: ChildPolicy::NoChild,
            local_name: None,
            check: CheckResult::default(),
            syntax_errors: Vec::new(),
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<LineId> {
        self.parent
    }

    pub fn children(&self) -> &[LineId] {
        &self.children
    }

    /// `None` only for the root.
    pub fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    pub fn child_policy(&self) -> ChildPolicy {
        self.child_policy
    }

    /// Result of the last validation of this line.
    pub fn check(&self) -> &CheckResult {
        &self.check
    }

    pub fn syntax_errors(&self) -> &[SyntaxError] {
        &self.syntax_errors
    }

    /// Returns `true` when the line holds no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A forest of script lines under a textless root.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use orderscript_core::{ChildPolicy, LineSeed, OrderRegistry};
/// use orderscript_document::Document;
///
/// let registry = Arc::new(OrderRegistry::with_builtin());
/// let doc = Document::from_seeds(registry, &[LineSeed::new("@条件分歧 ${hp > 0}")]).unwrap();
///
/// let branch = doc.children(doc.root())[0];
/// assert_eq!(doc.child_policy(branch), Some(ChildPolicy::PreDefinedChild));
///
/// let arms: Vec<&str> = doc
///     .children(branch)
///     .iter()
///     .filter_map(|id| doc.text(*id))
///     .collect();
/// assert_eq!(arms, vec!["&成立", "&不成立"]);
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    registry: Arc<OrderRegistry>,
    options: LintOptions,
    lines: HashMap<LineId, Line>,
    root: LineId,
    next_id: u64,
}

impl Document {
    /// Creates a document holding one blank line.
    pub fn new(registry: Arc<OrderRegistry>) -> Self {
        let mut doc = Self::empty(registry);
        // The root is `free_child` and childless, so this only appends.
        let root = doc.root;
        doc.append_blank(root);
        doc
    }

    /// Builds a document from seed trees, top-down.
    ///
    /// Each line is attached before its own children are built, so sub-order
    /// lines resolve against their parent's order name during hydration.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnresolvedPredefinedOrder`] when a
    /// `pre_defined_child` order cannot be resolved while its children are
    /// materialized.
    pub fn from_seeds(registry: Arc<OrderRegistry>, seeds: &[LineSeed]) -> Result<Self> {
        let mut doc = Self::empty(registry);
        let root = doc.root;
        for seed in seeds {
            doc.hydrate(root, seed)?;
        }
        doc.reconcile(root)?;
        Ok(doc)
    }

    fn empty(registry: Arc<OrderRegistry>) -> Self {
        let root = LineId(0);
        let mut root_line = Line::new(root, String::new());
        root_line.child_policy = ChildPolicy::FreeChild;

        let mut lines = HashMap::new();
        lines.insert(root, root_line);
        Self {
            registry,
            options: LintOptions::default(),
            lines,
            root,
            next_id: 1,
        }
    }

    /// Replaces the lint options and revalidates every line.
    pub fn with_lint_options(mut self, options: LintOptions) -> Self {
        self.options = options;
        let ids: Vec<LineId> = self.lines.keys().copied().collect();
        for id in ids {
            self.validate_line(id);
        }
        self
    }

    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    pub fn root(&self) -> LineId {
        self.root
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    fn get(&self, id: LineId) -> Result<&Line> {
        self.lines.get(&id).ok_or(DocumentError::UnknownLine(id))
    }

    fn get_mut(&mut self, id: LineId) -> Result<&mut Line> {
        self.lines.get_mut(&id).ok_or(DocumentError::UnknownLine(id))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn text(&self, id: LineId) -> Option<&str> {
        self.line(id).map(Line::text)
    }

    pub fn parent(&self, id: LineId) -> Option<LineId> {
        self.line(id)?.parent
    }

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: LineId) -> &[LineId] {
        self.line(id).map(Line::children).unwrap_or(&[])
    }

    pub fn content_type(&self, id: LineId) -> Option<ContentType> {
        self.line(id)?.content_type
    }

    pub fn child_policy(&self, id: LineId) -> Option<ChildPolicy> {
        self.line(id).map(Line::child_policy)
    }

    pub fn check(&self, id: LineId) -> Option<&CheckResult> {
        self.line(id).map(Line::check)
    }

    pub fn is_empty(&self, id: LineId) -> bool {
        self.line(id).is_some_and(Line::is_empty)
    }

    pub fn previous_sibling(&self, id: LineId) -> Option<LineId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|c| *c == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_sibling(&self, id: LineId) -> Option<LineId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|c| *c == id)?;
        siblings.get(index + 1).copied()
    }

    /// Effective order name of a line.
    ///
    /// An order line's name is its method name; a sub-order line's is its
    /// parent's name joined with its own. `None` for every other line, and
    /// for a sub-order whose parent does not resolve to a definition.
    pub fn order_name(&self, id: LineId) -> Option<String> {
        let line = self.line(id)?;
        let local = line.local_name.as_deref()?;
        match line.content_type? {
            ContentType::Order => Some(local.to_string()),
            ContentType::SubOrder => {
                let parent = line.parent?;
                self.definition(parent)?;
                let namespace = self.order_name(parent)?;
                Some(qualified_name(Some(&namespace), local))
            }
            _ => None,
        }
    }

    /// Definition the line's order name resolves to.
    pub fn definition(&self, id: LineId) -> Option<&OrderDefinition> {
        self.registry.get(&self.order_name(id)?)
    }

    /// Attached lines in pre-order with their depth (top-level lines are 0).
    pub fn walk(&self) -> Vec<(LineId, usize)> {
        let mut out = Vec::new();
        let mut stack: Vec<(LineId, usize)> = self
            .children(self.root)
            .iter()
            .rev()
            .map(|id| (*id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            stack.extend(self.children(id).iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }

    /// Number of lines attached under the root.
    pub fn line_count(&self) -> usize {
        self.walk().len()
    }

    /// 1-based dotted position of an attached line, e.g. `2.1`.
    pub fn path_of(&self, id: LineId) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = id;
        while current != self.root {
            let parent = self.parent(current)?;
            let index = self.children(parent).iter().position(|c| *c == current)?;
            parts.push((index + 1).to_string());
            current = parent;
        }
        if parts.is_empty() {
            return None;
        }
        parts.reverse();
        Some(parts.join("."))
    }

    /// Serializes the attached tree back into seeds.
    pub fn to_seeds(&self) -> Vec<LineSeed> {
        self.children(self.root)
            .iter()
            .map(|id| self.seed_of(*id))
            .collect()
    }

    fn seed_of(&self, id: LineId) -> LineSeed {
        LineSeed {
            content: self.text(id).unwrap_or_default().to_string(),
            children: self.children(id).iter().map(|c| self.seed_of(*c)).collect(),
        }
    }

    /// Aggregated diagnostics of every attached line.
    pub fn report(&self, source: Option<&str>) -> DocumentReport {
        DocumentReport::from_document(self, source)
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Creates a detached line and runs its cycle.
    pub fn create_line(&mut self, text: impl Into<String>) -> Result<LineId> {
        let id = self.alloc(text.into());
        self.refresh(id)?;
        Ok(id)
    }

    /// Replaces a line's text and re-runs its cycle.
    ///
    /// Sub-order lines below it are refreshed too, since their effective
    /// names are composed from this line's name. Existing children are kept
    /// even when the new policy no longer admits them.
    pub fn set_text(&mut self, id: LineId, text: impl Into<String>) -> Result<()> {
        if id == self.root {
            return Err(DocumentError::RootLine);
        }
        self.get_mut(id)?.text = text.into();
        self.refresh(id)?;
        self.refresh_sub_orders(id)
    }

    /// Re-runs detect, derive, reconcile and validate on one line.
    ///
    /// Calling it again without a text change is a no-op for the tree and
    /// reproduces the same check result.
    pub fn refresh(&mut self, id: LineId) -> Result<()> {
        self.derive(id)?;
        self.reconcile(id)?;
        self.validate_line(id);
        Ok(())
    }

    /// Appends `child` to `parent`, detaching it from its old parent first.
    ///
    /// # Errors
    ///
    /// Fails for unknown ids, when `child` is the root, when `parent` is
    /// `no_child`, or when `parent` lies inside `child`'s subtree.
    pub fn append_child(&mut self, parent: LineId, child: LineId) -> Result<()> {
        self.check_move(parent, child)?;
        let old_parent = self.detach(child);
        self.attach(parent, child, None);
        self.after_move(parent, child, old_parent)
    }

    /// Inserts `new` right after `reference`, which must be a child of `parent`.
    pub fn insert_after(&mut self, parent: LineId, new: LineId, reference: LineId) -> Result<()> {
        self.check_move(parent, new)?;
        if new == reference || self.get(reference)?.parent != Some(parent) {
            return Err(DocumentError::NotAChild {
                parent,
                child: reference,
            });
        }

        let old_parent = self.detach(new);
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == reference)
            .map_or(0, |i| i + 1);
        self.attach(parent, new, Some(index));
        self.after_move(parent, new, old_parent)
    }

    /// Detaches `child` from `parent`, keeping its own subtree intact.
    ///
    /// The parent is reconciled afterwards, so a `free_child` parent left
    /// without children gets a fresh blank line.
    pub fn remove_child(&mut self, parent: LineId, child: LineId) -> Result<()> {
        if self.get(child)?.parent != Some(parent) {
            return Err(DocumentError::NotAChild { parent, child });
        }
        self.detach(child);
        self.refresh(parent)
    }

    /// Whether the deletion rules allow removing `id`.
    pub fn is_deletable(&self, id: LineId) -> bool {
        let Some(line) = self.line(id) else {
            return false;
        };
        let Some(parent) = line.parent.and_then(|p| self.line(p)) else {
            return false;
        };
        if !line.children.is_empty() {
            return false;
        }
        match parent.child_policy {
            ChildPolicy::PreDefinedChild => false,
            ChildPolicy::FreeChild => parent.children.len() > 1,
            _ => true,
        }
    }

    /// Inserts a blank line after `id` and returns it as the new focus.
    ///
    /// Refused under a `pre_defined_child` parent, whose lines could never
    /// be deleted again.
    pub fn append_new_line_after(&mut self, id: LineId) -> Result<LineId> {
        let parent = self.get(id)?.parent.ok_or(DocumentError::NoParent(id))?;
        if self.get(parent)?.child_policy == ChildPolicy::PreDefinedChild {
            return Err(DocumentError::FixedChildren(parent));
        }
        let new = self.create_line("")?;
        self.insert_after(parent, new, id)?;
        Ok(new)
    }

    /// Deletes `id` and returns the line that should take focus: the
    /// previous sibling, or the parent when there is none.
    pub fn delete_line(&mut self, id: LineId) -> Result<LineId> {
        if !self.is_deletable(id) {
            return Err(DocumentError::NotDeletable(id));
        }
        let parent = self.get(id)?.parent.ok_or(DocumentError::NoParent(id))?;
        let focus = self.previous_sibling(id).unwrap_or(parent);
        self.remove_child(parent, id)?;
        Ok(focus)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn alloc(&mut self, text: String) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        self.lines.insert(id, Line::new(id, text));
        id
    }

    fn hydrate(&mut self, parent: LineId, seed: &LineSeed) -> Result<LineId> {
        let id = self.alloc(seed.content.clone());
        self.attach(parent, id, None);
        self.derive(id)?;

        if !seed.children.is_empty() && !self.get(id)?.child_policy.allows_children() {
            warn!(
                line = %id,
                children = seed.children.len(),
                "Seeded children kept under a line that accepts none"
            );
        }
        for child in &seed.children {
            self.hydrate(id, child)?;
        }

        self.reconcile(id)?;
        self.validate_line(id);
        Ok(id)
    }

    fn derive(&mut self, id: LineId) -> Result<()> {
        if id == self.root {
            return Ok(());
        }

        let line = self.get(id)?;
        let content_type = ContentType::detect(&line.text);
        let local_name = if content_type.is_order() {
            SyntaxTree::parse(&line.text)
                .order_name()
                .map(str::to_string)
        } else {
            None
        };

        let line = self.get_mut(id)?;
        line.content_type = Some(content_type);
        line.local_name = local_name;

        let policy = self
            .definition(id)
            .map_or(ChildPolicy::NoChild, |d| d.child_policy);
        self.get_mut(id)?.child_policy = policy;
        Ok(())
    }

    fn reconcile(&mut self, id: LineId) -> Result<()> {
        let line = self.get(id)?;
        if !line.children.is_empty() {
            return Ok(());
        }

        let policy = line.child_policy;
        match policy {
            ChildPolicy::FreeChild => {
                self.append_blank(id);
                debug!(line = %id, "Added blank child");
            }
            ChildPolicy::PreDefinedChild => {
                let seeds = match self.definition(id) {
                    Some(definition) => definition.init_children.clone(),
                    None => {
                        return Err(DocumentError::UnresolvedPredefinedOrder {
                            line: id,
                            name: self.order_name(id).unwrap_or_default(),
                        });
                    }
                };
                for seed in &seeds {
                    self.hydrate(id, seed)?;
                }
                debug!(line = %id, children = seeds.len(), "Materialized predefined children");
            }
            _ => {}
        }
        Ok(())
    }

    // A blank line is a childless dialog line; its cycle cannot fail.
    fn append_blank(&mut self, parent: LineId) {
        let id = self.alloc(String::new());
        self.attach(parent, id, None);
        if let Some(line) = self.lines.get_mut(&id) {
            line.content_type = Some(ContentType::Dialog);
        }
        self.validate_line(id);
    }

    fn validate_line(&mut self, id: LineId) {
        if id == self.root {
            return;
        }
        let Some(line) = self.lines.get(&id) else {
            return;
        };

        let tree = SyntaxTree::parse(&line.text);
        let check = match line.content_type {
            Some(ContentType::SubOrder) => {
                let namespace = line
                    .parent
                    .filter(|parent| self.definition(*parent).is_some())
                    .and_then(|parent| self.order_name(parent));
                match namespace {
                    Some(namespace) => self.checker().validate(&tree, Some(&namespace)),
                    None => CheckResult::default(),
                }
            }
            _ => self.checker().validate(&tree, None),
        };

        if let Some(line) = self.lines.get_mut(&id) {
            line.check = check;
            line.syntax_errors = tree.errors().to_vec();
        }
    }

    fn checker(&self) -> Checker<'_> {
        Checker::new(&self.registry).with_options(self.options.clone())
    }

    fn refresh_sub_orders(&mut self, id: LineId) -> Result<()> {
        for child in self.children(id).to_vec() {
            if self.content_type(child) == Some(ContentType::SubOrder) {
                self.refresh(child)?;
                self.refresh_sub_orders(child)?;
            }
        }
        Ok(())
    }

    fn check_move(&self, parent: LineId, child: LineId) -> Result<()> {
        if child == self.root {
            return Err(DocumentError::RootLine);
        }
        self.get(child)?;
        if !self.get(parent)?.child_policy.allows_children() {
            return Err(DocumentError::ChildrenNotAllowed(parent));
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(DocumentError::Cycle { parent, child });
            }
            ancestor = self.parent(current);
        }
        Ok(())
    }

    fn after_move(&mut self, parent: LineId, child: LineId, old_parent: Option<LineId>) -> Result<()> {
        if let Some(old) = old_parent
            && old != parent
        {
            self.refresh(old)?;
        }
        self.refresh(child)?;
        self.refresh_sub_orders(child)?;
        self.refresh(parent)
    }

    fn attach(&mut self, parent: LineId, child: LineId, index: Option<usize>) {
        if let Some(line) = self.lines.get_mut(&parent) {
            let index = index.unwrap_or(line.children.len()).min(line.children.len());
            line.children.insert(index, child);
        }
        if let Some(line) = self.lines.get_mut(&child) {
            line.parent = Some(parent);
        }
    }

    fn detach(&mut self, child: LineId) -> Option<LineId> {
        let parent = self.lines.get_mut(&child)?.parent.take()?;
        if let Some(line) = self.lines.get_mut(&parent) {
            line.children.retain(|c| *c != child);
        }
        Some(parent)
    }
}
