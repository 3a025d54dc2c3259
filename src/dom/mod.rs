//! Document tree for storefront pages.
//!
//! An arena of nodes addressed by [`NodeId`]. Ids stay valid for the whole
//! session: detaching a node removes it from its parent but never frees the
//! slot, so registries keyed by `NodeId` (observers, fades, upload fields)
//! can never alias a different element.
//!
//! # Module Structure
//!
//! - `element` - tag, attributes, class list, inline style
//! - `select` - compound selector matching
//! - `parse` - HTML input via `tl`
//! - `serialize` - HTML output

mod element;
mod parse;
mod select;
mod serialize;

pub use element::Element;
pub use select::Selector;

use thiserror::Error;

use crate::utils::html::escape_text;

/// Document model errors.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("HTML parsing error: {0}")]
    Parse(String),

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Stable identity of a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(index: usize) -> Self {
        Self(index)
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    /// Text stored HTML-escaped, exactly as it will be written out.
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A page: one `<html>` root element plus its subtree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    /// Whether to emit `<!DOCTYPE html>` on serialization.
    doctype: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Self::with_root();
        let head = doc.create_element(Element::new("head"));
        let body = doc.create_element(Element::new("body"));
        doc.append_child(doc.root, head);
        doc.append_child(doc.root, body);
        doc.doctype = true;
        doc
    }

    /// Create a document holding only an empty `<html>` element.
    fn with_root() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element(Element::new("html")),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            doctype: false,
        }
    }

    /// Parse an HTML page.
    pub fn parse(html: &str) -> Result<Self, DomError> {
        parse::parse_document(html)
    }

    /// Serialize back to HTML.
    pub fn to_html(&self) -> String {
        serialize::to_html(self)
    }

    // =========================================================================
    // Tree access
    // =========================================================================

    /// The document root element (`<html>`).
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn root_element_mut(&mut self) -> &mut Element {
        let root = self.root;
        match &mut self.nodes[root.0].data {
            NodeData::Element(el) => el,
            _ => unreachable!("document root is always an element"),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All nodes below `scope` in document order (excluding `scope`).
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every attached element matching `selector`, in document order.
    /// The root element itself is included when it matches.
    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.element(self.root).is_some_and(|el| selector.matches(el)) {
            out.push(self.root);
        }
        out.extend(self.select_within(self.root, selector));
        out
    }

    /// Elements below `scope` matching `selector`.
    pub fn select_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|el| selector.matches(el)))
            .collect()
    }

    /// First attached element with the given `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&node| self.element(node).and_then(|el| el.attr("id")) == Some(id))
    }

    /// First attached element with the given tag name.
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&node| self.element(node).is_some_and(|el| el.is(tag)))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_by_tag("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag("body")
    }

    /// Concatenated text of a subtree (still escaped).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeData::Text(text)) = self.data(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(NodeData::Text(text)) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Allocate a detached element node.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push_node(NodeData::Element(element))
    }

    /// Allocate a detached text node from unescaped text.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(escape_text(text).into_owned()))
    }

    pub(crate) fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` as last child of `parent`, detaching it first.
    ///
    /// Appending a node below itself is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() || child == self.root {
            return;
        }
        let mut ancestor = Some(parent);
        while let Some(node) = ancestor {
            if node == child {
                return;
            }
            ancestor = self.parent(node);
        }

        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` as first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.append_child(parent, child);
        if self.parent(child) == Some(parent) {
            let children = &mut self.nodes[parent.0].children;
            if let Some(last) = children.pop() {
                children.insert(0, last);
            }
        }
    }

    /// Remove a node from its parent. The subtree stays addressable.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.nodes[id.0].parent = None;
    }

    /// Replace all children with a single text node.
    ///
    /// A lone text child is rewritten in place, so repeated updates of a
    /// counter or notice do not grow the arena.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if self.element(id).is_none() {
            return;
        }
        if let &[only] = self.children(id)
            && let Some(NodeData::Text(existing)) = self.nodes.get_mut(only.0).map(|n| &mut n.data)
        {
            *existing = escape_text(text).into_owned();
            return;
        }
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        let text = self.create_text(text);
        self.append_child(id, text);
    }

    /// Emit `<!DOCTYPE html>` on serialization.
    pub(crate) fn set_doctype(&mut self, doctype: bool) {
        self.doctype = doctype;
    }

    pub(crate) fn has_doctype(&self) -> bool {
        self.doctype
    }

    /// Root-level constructor used by the parser.
    pub(crate) fn empty() -> Self {
        Self::with_root()
    }
}
