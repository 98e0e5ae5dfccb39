//! HTML ingestion via html5ever
//!
//! A `TreeSink` that builds straight into the arena [`Document`]. html5ever
//! handles tag soup, implied elements and attribute parsing; the sink only
//! records structure. Namespace and quirks-mode details are dropped — the
//! crate queries by tag name and id and needs neither.

use std::borrow::Cow;
use std::collections::HashMap;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_document, Attribute, ExpandedName, ParseOpts, QualName};

use super::{Document, NodeId};

/// Parse an HTML string into a [`Document`]
///
/// Never fails: html5ever recovers from malformed markup the way a browser
/// does, so the worst input still yields a well-formed tree.
pub fn parse(html: &str) -> Document {
    let sink = DocumentSink::new();
    parse_document(sink, ParseOpts::default()).one(html)
}

struct DocumentSink {
    doc: Document,
    // html5ever needs the original qualified name back for tree building
    names: HashMap<NodeId, QualName>,
    template_contents: HashMap<NodeId, NodeId>,
    fallback_name: QualName,
}

impl DocumentSink {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            names: HashMap::new(),
            template_contents: HashMap::new(),
            fallback_name: QualName::new(None, "".into(), "".into()),
        }
    }
}

impl TreeSink for DocumentSink {
    type Handle = NodeId;
    type Output = Document;

    fn finish(self) -> Document {
        self.doc
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        tracing::trace!("HTML parse error (recovered): {}", msg);
    }

    fn get_document(&mut self) -> NodeId {
        self.doc.root()
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> ExpandedName<'a> {
        self.names
            .get(target)
            .unwrap_or(&self.fallback_name)
            .expanded()
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> NodeId {
        let id = self.doc.create_element(
            &name.local,
            attrs
                .into_iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect::<Vec<_>>(),
        );
        if flags.template {
            let contents = self.doc.create_fragment();
            self.template_contents.insert(id, contents);
        }
        self.names.insert(id, name);
        id
    }

    fn create_comment(&mut self, text: StrTendril) -> NodeId {
        self.doc.create_comment(&text)
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> NodeId {
        // HTML never yields processing instructions; keep them as comments
        self.doc.create_comment(&format!("?{} {}", target, data))
    }

    fn append(&mut self, parent: &NodeId, child: NodeOrText<NodeId>) {
        match child {
            NodeOrText::AppendNode(node) => self.doc.append_child(*parent, node),
            NodeOrText::AppendText(text) => self.doc.append_text(*parent, &text),
        }
    }

    fn append_before_sibling(&mut self, sibling: &NodeId, new_node: NodeOrText<NodeId>) {
        match new_node {
            NodeOrText::AppendNode(node) => self.doc.insert_before(*sibling, node),
            NodeOrText::AppendText(text) => self.doc.insert_text_before(*sibling, &text),
        }
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &NodeId,
        prev_element: &NodeId,
        child: NodeOrText<NodeId>,
    ) {
        if self.doc.parent(*element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        self.doc.append_doctype(&name);
    }

    fn get_template_contents(&mut self, target: &NodeId) -> NodeId {
        self.template_contents
            .get(target)
            .copied()
            .unwrap_or_else(|| self.doc.root())
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}

    fn add_attrs_if_missing(&mut self, target: &NodeId, attrs: Vec<Attribute>) {
        for attr in attrs {
            let name = attr.name.local.to_string();
            if !self.doc.has_attribute(*target, &name) {
                self.doc.set_attribute(*target, &name, &attr.value);
            }
        }
    }

    fn remove_from_parent(&mut self, target: &NodeId) {
        self.doc.detach(*target);
    }

    fn reparent_children(&mut self, node: &NodeId, new_parent: &NodeId) {
        self.doc.reparent_children(*node, *new_parent);
    }

    fn mark_script_already_started(&mut self, _node: &NodeId) {}
}
