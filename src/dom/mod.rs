//! In-memory document model
//!
//! A flat-arena DOM: nodes live in a `Vec` and reference each other by
//! index, so handles stay `Copy` and tree edits never touch more than the
//! affected parent/child slots. Queries hand out snapshots, not live
//! collections — mutating the tree never invalidates an in-flight
//! iteration result.

mod parser;
mod serialize;

pub use parser::parse;

use std::collections::HashMap;

use smallvec::SmallVec;

/// Handle to a node in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Attribute list; filter markup rarely carries more than a few per element
pub type AttrList = SmallVec<[(String, String); 4]>;

/// What a node is
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (also used for template content fragments)
    Document,
    /// An element with a lowercase tag name and its attributes
    Element { name: String, attrs: AttrList },
    /// A text run
    Text(String),
    /// A comment
    Comment(String),
    /// A doctype declaration
    Doctype(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

/// A parsed HTML document
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    // First entry per id wins, matching getElementById on duplicate ids
    id_index: HashMap<String, Vec<NodeId>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (a bare root node)
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    /// The document root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes in the arena (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the document holds nothing but the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Check that a handle points into this arena
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a detached element node
    pub fn create_element<I>(&mut self, name: &str, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let attrs: AttrList = attrs.into_iter().collect();
        let id = self.push_node(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attrs,
        });
        if let Some(value) = self.attribute(id, "id").map(str::to_owned) {
            self.index_id(&value, id);
        }
        id
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment(text.to_string()))
    }

    /// Create a detached fragment node (template contents)
    pub fn create_fragment(&mut self) -> NodeId {
        self.push_node(NodeKind::Document)
    }

    /// Append a doctype declaration to the document root
    pub fn append_doctype(&mut self, name: &str) {
        let id = self.push_node(NodeKind::Doctype(name.to_string()));
        self.append_child(self.root, id);
    }

    /// Attach a node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Append text, merging into a trailing text child when present
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.node(parent).children.last() {
            if let NodeKind::Text(existing) = &mut self.node_mut(last).kind {
                existing.push_str(text);
                return;
            }
        }
        let id = self.create_text(text);
        self.append_child(parent, id);
    }

    /// Insert a node immediately before `sibling`
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        let Some(parent) = self.node(sibling).parent else {
            return;
        };
        self.detach(node);
        self.node_mut(node).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        let pos = children
            .iter()
            .position(|&c| c == sibling)
            .unwrap_or(children.len());
        children.insert(pos, node);
    }

    /// Insert text before `sibling`, merging into a preceding text node
    pub fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        if let Some(parent) = self.node(sibling).parent {
            let children = &self.node(parent).children;
            if let Some(pos) = children.iter().position(|&c| c == sibling) {
                if pos > 0 {
                    let prev = children[pos - 1];
                    if let NodeKind::Text(existing) = &mut self.node_mut(prev).kind {
                        existing.push_str(text);
                        return;
                    }
                }
            }
        }
        let id = self.create_text(text);
        self.insert_before(sibling, id);
    }

    /// Remove a node from its parent (the node itself stays in the arena)
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    /// Move every child of `from` to the end of `to`'s children
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.node_mut(from).children);
        for &child in &children {
            self.node_mut(child).parent = Some(to);
        }
        self.node_mut(to).children.extend(children);
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Lowercase tag name, if the node is an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// True if `id` sits somewhere below `ancestor`
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    /// Descendants of `scope` in document order, excluding `scope` itself
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.node(scope).children.to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Snapshot of all descendant elements of `scope` with the given tag,
    /// in document order
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|&id| {
                self.tag_name(id)
                    .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    /// Look up an element by its `id` attribute
    ///
    /// Returns `None` when no such element exists; callers decide whether
    /// that is an error.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).and_then(|ids| ids.first()).copied()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Attribute value, if present
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// True if the element carries the attribute, whatever its value
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "id" {
            if let Some(old) = self.attribute(id, "id").map(str::to_owned) {
                self.unindex_id(&old, id);
            }
            self.index_id(value, id);
        }
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            if let Some(slot) = attrs.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = value.to_string();
            } else {
                attrs.push((name, value.to_string()));
            }
        }
    }

    /// Remove an attribute; returns true if it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        if name.eq_ignore_ascii_case("id") {
            if let Some(old) = self.attribute(id, "id").map(str::to_owned) {
                self.unindex_id(&old, id);
            }
        }
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            let before = attrs.len();
            attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            attrs.len() != before
        } else {
            false
        }
    }

    fn index_id(&mut self, value: &str, id: NodeId) {
        self.id_index.entry(value.to_string()).or_default().push(id);
    }

    fn unindex_id(&mut self, value: &str, id: NodeId) {
        if let Some(ids) = self.id_index.get_mut(value) {
            ids.retain(|&n| n != id);
            if ids.is_empty() {
                self.id_index.remove(value);
            }
        }
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Concatenated text of a node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(text) = &self.node(id).kind {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeKind::Text(text) = &self.node(node).kind {
                out.push_str(text);
            }
        }
        out
    }

    /// Serialize a node and its subtree to HTML
    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::serialize(self, id)
    }

    /// Serialize the whole document to HTML
    pub fn to_html(&self) -> String {
        serialize::serialize(self, self.root)
    }
}

/// Document-order iterator over a node's descendants
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = &self.doc.node(id).children;
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &mut Document, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        doc.create_element(
            name,
            attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_append_and_traverse_in_document_order() {
        let mut doc = Document::new();
        let body = element(&mut doc, "body", &[]);
        doc.append_child(doc.root(), body);
        let nav = element(&mut doc, "nav", &[("id", "filters")]);
        doc.append_child(body, nav);
        let first = element(&mut doc, "details", &[("open", "")]);
        doc.append_child(nav, first);
        let second = element(&mut doc, "details", &[]);
        doc.append_child(nav, second);
        let nested = element(&mut doc, "details", &[]);
        doc.append_child(first, nested);

        let order: Vec<NodeId> = doc.elements_by_tag(nav, "details");
        assert_eq!(order, vec![first, nested, second]);
    }

    #[test]
    fn test_get_element_by_id() {
        let mut doc = Document::new();
        let div = element(&mut doc, "div", &[("id", "target")]);
        doc.append_child(doc.root(), div);

        assert_eq!(doc.get_element_by_id("target"), Some(div));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let mut doc = Document::new();
        let first = element(&mut doc, "div", &[("id", "dup")]);
        doc.append_child(doc.root(), first);
        let second = element(&mut doc, "div", &[("id", "dup")]);
        doc.append_child(doc.root(), second);

        assert_eq!(doc.get_element_by_id("dup"), Some(first));
    }

    #[test]
    fn test_remove_attribute_reports_presence() {
        let mut doc = Document::new();
        let widget = element(&mut doc, "details", &[("open", "")]);
        doc.append_child(doc.root(), widget);

        assert!(doc.has_attribute(widget, "open"));
        assert!(doc.remove_attribute(widget, "open"));
        assert!(!doc.has_attribute(widget, "open"));
        // Removing again is a no-op
        assert!(!doc.remove_attribute(widget, "open"));
    }

    #[test]
    fn test_set_attribute_updates_id_index() {
        let mut doc = Document::new();
        let div = element(&mut doc, "div", &[("id", "before")]);
        doc.append_child(doc.root(), div);

        doc.set_attribute(div, "id", "after");
        assert_eq!(doc.get_element_by_id("before"), None);
        assert_eq!(doc.get_element_by_id("after"), Some(div));
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let p = element(&mut doc, "p", &[]);
        doc.append_child(doc.root(), p);
        doc.append_text(p, "Hello");
        let em = element(&mut doc, "em", &[]);
        doc.append_child(p, em);
        doc.append_text(em, ", ");
        doc.append_text(p, "world");

        assert_eq!(doc.text_content(p), "Hello, world");
    }

    #[test]
    fn test_append_text_merges_runs() {
        let mut doc = Document::new();
        let p = element(&mut doc, "p", &[]);
        doc.append_child(doc.root(), p);
        doc.append_text(p, "a");
        doc.append_text(p, "b");

        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "ab");
    }

    #[test]
    fn test_is_descendant_of() {
        let mut doc = Document::new();
        let outer = element(&mut doc, "div", &[]);
        doc.append_child(doc.root(), outer);
        let inner = element(&mut doc, "span", &[]);
        doc.append_child(outer, inner);
        let sibling = element(&mut doc, "div", &[]);
        doc.append_child(doc.root(), sibling);

        assert!(doc.is_descendant_of(inner, outer));
        assert!(!doc.is_descendant_of(sibling, outer));
    }
}
