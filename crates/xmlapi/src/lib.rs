//! Parse, address and re-serialize libvirt XML using quick-xml.
//!
//! A [`Document`] owns every node in an arena; callers hold [`NodeId`]
//! handles and address content below a context element with the XPath
//! subset implemented in [`xpath`].

mod write;
pub mod xpath;

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

pub use xpath::{Predicate, Step, XPath};

const FRAGMENT_RADIUS: usize = 24;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("xml syntax error at byte {position}: {message} (near `{fragment}`)")]
    Syntax {
        position: usize,
        message: String,
        fragment: String,
    },
    #[error("invalid xpath: {0}")]
    InvalidXPath(String),
    #[error("expected root element <{expected}>, found <{found}>")]
    RootMismatch { expected: String, found: String },
}

/// Handle to a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Ranking hint used when new elements or attributes are created.
pub trait SiblingOrder {
    /// Rank of `name` (or `@attr` for attributes) below the element found at
    /// `parent_path`, which is `.` for the context element itself. Lower
    /// ranks are written first; `None` appends.
    fn rank(&self, parent_path: &str, name: &str) -> Option<usize>;
}

/// Append new content after existing siblings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unordered;

impl SiblingOrder for Unordered {
    fn rank(&self, _parent_path: &str, _name: &str) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    prolog: Vec<NodeId>,
    epilog: Vec<NodeId>,
}

impl Document {
    /// Create a document holding a single empty root element.
    pub fn new(root: &str) -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            prolog: Vec::new(),
            epilog: Vec::new(),
        };
        doc.root = doc.new_element(root);
        doc
    }

    /// Parse UTF-8 XML text, keeping everything but whitespace-only text.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        let mut buf = Vec::new();
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            prolog: Vec::new(),
            epilog: Vec::new(),
        };
        let mut root = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|err| syntax_error(text, reader.buffer_position(), err.to_string()))?;
            match event {
                Event::Start(e) => {
                    let id = doc.element_from(&e, text, position)?;
                    doc.place_element(id, &stack, &mut root, text, position)?;
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let id = doc.element_from(&e, text, position)?;
                    doc.place_element(id, &stack, &mut root, text, position)?;
                }
                Event::End(_) => {
                    if stack.pop().is_none() {
                        return Err(syntax_error(text, position, "unexpected closing tag"));
                    }
                }
                Event::Text(e) => {
                    let value = e
                        .unescape()
                        .map_err(|err| syntax_error(text, position, err.to_string()))?;
                    if !value.trim().is_empty() {
                        let Some(&parent) = stack.last() else {
                            return Err(syntax_error(
                                text,
                                position,
                                "text outside the root element",
                            ));
                        };
                        let id = doc.alloc(NodeKind::Text(value.into_owned()));
                        doc.append_child(parent, id);
                    }
                }
                Event::CData(e) => {
                    let value = utf8(&e, text, position)?;
                    let Some(&parent) = stack.last() else {
                        return Err(syntax_error(text, position, "CDATA outside the root element"));
                    };
                    let id = doc.alloc(NodeKind::CData(value));
                    doc.append_child(parent, id);
                }
                Event::Comment(e) => {
                    let kind = NodeKind::Comment(utf8(&e, text, position)?);
                    doc.place_misc(kind, &stack, root);
                }
                Event::PI(e) => {
                    let kind = NodeKind::ProcessingInstruction(utf8(&e, text, position)?);
                    doc.place_misc(kind, &stack, root);
                }
                Event::Decl(_) => {
                    let raw = text
                        .get(position..reader.buffer_position())
                        .unwrap_or_default()
                        .trim();
                    let inner = raw
                        .strip_prefix("<?")
                        .and_then(|rest| rest.strip_suffix("?>"))
                        .ok_or_else(|| syntax_error(text, position, "malformed declaration"))?;
                    let kind = NodeKind::Declaration(inner.to_string());
                    doc.place_misc(kind, &stack, root);
                }
                Event::DocType(e) => {
                    let kind = NodeKind::DocType(utf8(&e, text, position)?.trim().to_string());
                    doc.place_misc(kind, &stack, root);
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        if let Some(&open) = stack.last() {
            let name = doc.name(open).unwrap_or_default().to_string();
            return Err(syntax_error(
                text,
                text.len(),
                format!("unclosed element <{name}>"),
            ));
        }
        doc.root = root.ok_or_else(|| syntax_error(text, 0, "document has no root element"))?;
        debug!(root = doc.root_name(), nodes = doc.nodes.len(), "parsed xml document");
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_name(&self) -> &str {
        self.name(self.root).unwrap_or_default()
    }

    /// Fail unless the root element is named `expected`.
    pub fn validate_root(&self, expected: &str) -> Result<(), XmlError> {
        if self.root_name() == expected {
            Ok(())
        } else {
            Err(XmlError::RootMismatch {
                expected: expected.to_string(),
                found: self.root_name().to_string(),
            })
        }
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    /// Element name, `None` for non-element nodes.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// All child nodes in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(move |&child| self.name(child).is_some())
    }

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace or append an attribute.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.set_attribute_ordered(node, name, value, ".", &Unordered);
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            if let Some(pos) = attributes.iter().position(|(key, _)| key == name) {
                attributes.remove(pos);
                return true;
            }
        }
        false
    }

    /// Concatenated text and CDATA content of an element, `None` if it has none.
    pub fn text(&self, node: NodeId) -> Option<String> {
        let mut out: Option<String> = None;
        for &child in self.children(node) {
            if let NodeKind::Text(value) | NodeKind::CData(value) = self.kind(child) {
                out.get_or_insert_with(String::new).push_str(value);
            }
        }
        out
    }

    /// Replace the text content of an element; empty text removes it.
    pub fn set_text(&mut self, node: NodeId, value: &str) {
        let texts: Vec<NodeId> = self
            .children(node)
            .iter()
            .copied()
            .filter(|&child| matches!(self.kind(child), NodeKind::Text(_) | NodeKind::CData(_)))
            .collect();
        for child in texts {
            self.detach(child);
        }
        if !value.is_empty() {
            let id = self.alloc(NodeKind::Text(value.to_string()));
            self.nodes[id.0].parent = Some(node);
            self.nodes[node.0].children.insert(0, id);
        }
    }

    /// Every element selected by `xpath` from `node`, in document order.
    pub fn find_all(&self, node: NodeId, xpath: &str) -> Result<Vec<NodeId>, XmlError> {
        let path = XPath::parse(xpath)?;
        Ok(self.select(node, &path.element_path()))
    }

    pub fn find(&self, node: NodeId, xpath: &str) -> Result<Option<NodeId>, XmlError> {
        Ok(self.find_all(node, xpath)?.into_iter().next())
    }

    pub fn count(&self, node: NodeId, xpath: &str) -> Result<usize, XmlError> {
        Ok(self.find_all(node, xpath)?.len())
    }

    /// Value at `xpath`: an attribute value or element text.
    pub fn get(&self, node: NodeId, xpath: &str) -> Result<Option<String>, XmlError> {
        let path = XPath::parse(xpath)?;
        let Some(element) = self.select(node, &path.element_path()).into_iter().next() else {
            return Ok(None);
        };
        Ok(match path.attribute() {
            Some(attr) => self.attribute(element, attr).map(str::to_string),
            None => self.text(element),
        })
    }

    pub fn exists(&self, node: NodeId, xpath: &str) -> Result<bool, XmlError> {
        let path = XPath::parse(xpath)?;
        let Some(element) = self.select(node, &path.element_path()).into_iter().next() else {
            return Ok(false);
        };
        Ok(match path.attribute() {
            Some(attr) => self.attribute(element, attr).is_some(),
            None => true,
        })
    }

    pub fn set(&mut self, node: NodeId, xpath: &str, value: &str) -> Result<(), XmlError> {
        self.set_ordered(node, xpath, value, &Unordered)
    }

    /// Write `value` at `xpath`, creating missing elements along the way.
    pub fn set_ordered(
        &mut self,
        node: NodeId,
        xpath: &str,
        value: &str,
        order: &dyn SiblingOrder,
    ) -> Result<(), XmlError> {
        let path = XPath::parse(xpath)?;
        let (element, element_path) = self.make_stub(node, &path, order)?;
        match path.attribute() {
            Some(attr) => self.set_attribute_ordered(element, attr, value, &element_path, order),
            None => self.set_text(element, value),
        }
        Ok(())
    }

    /// Make sure the element at `xpath` exists and return it.
    pub fn ensure(
        &mut self,
        node: NodeId,
        xpath: &str,
        order: &dyn SiblingOrder,
    ) -> Result<NodeId, XmlError> {
        let path = XPath::parse(xpath)?;
        if path.attribute().is_some() {
            return Err(XmlError::InvalidXPath(format!(
                "{xpath} addresses an attribute, not an element"
            )));
        }
        Ok(self.make_stub(node, &path, order)?.0)
    }

    /// Remove the attribute or element at `xpath`, then drop ancestors below
    /// `node` that were left without attributes or children.
    pub fn delete(&mut self, node: NodeId, xpath: &str) -> Result<bool, XmlError> {
        let path = XPath::parse(xpath)?;
        let Some(element) = self.select(node, &path.element_path()).into_iter().next() else {
            return Ok(false);
        };
        let cursor = match path.attribute() {
            Some(attr) => {
                if !self.remove_attribute(element, attr) {
                    return Ok(false);
                }
                element
            }
            None if element == node => {
                self.clear(node);
                return Ok(true);
            }
            None => {
                let parent = self.parent(element);
                self.detach(element);
                match parent {
                    Some(parent) => parent,
                    None => return Ok(true),
                }
            }
        };
        self.prune_empty(cursor, node);
        Ok(true)
    }

    /// Drop every attribute and child of `node`.
    pub fn clear(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            attributes.clear();
        }
    }

    /// Unlink `node` from its parent. The root cannot be detached.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != node);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` directly before `reference`, under the same parent.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(child);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos, child);
    }

    /// Insert element `child` under `parent`: after the last sibling of the
    /// same name, else after the last sibling ranked before it, else before
    /// the first sibling ranked after it.
    pub fn insert_ordered(
        &mut self,
        parent: NodeId,
        child: NodeId,
        parent_path: &str,
        order: &dyn SiblingOrder,
    ) {
        self.detach(child);
        let name = self.name(child).unwrap_or_default().to_string();
        let siblings = &self.nodes[parent.0].children;
        let rank_of = |c: NodeId| self.name(c).and_then(|n| order.rank(parent_path, n));
        let pos = if let Some(last) = siblings
            .iter()
            .rposition(|&c| self.name(c) == Some(name.as_str()))
        {
            last + 1
        } else if let Some(rank) = order.rank(parent_path, &name) {
            if let Some(lower) = siblings
                .iter()
                .rposition(|&c| rank_of(c).is_some_and(|r| r < rank))
            {
                lower + 1
            } else {
                siblings
                    .iter()
                    .position(|&c| rank_of(c).is_some_and(|r| r > rank))
                    .unwrap_or(siblings.len())
            }
        } else {
            siblings.len()
        };
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos, child);
    }

    /// Put `replacement[i]` where `slots[i]` sits. `replacement` must be a
    /// permutation of `slots`.
    pub fn reorder_children(&mut self, slots: &[NodeId], replacement: &[NodeId]) {
        let places: Vec<Option<(NodeId, usize)>> = slots
            .iter()
            .map(|&slot| {
                let parent = self.parent(slot)?;
                let pos = self.children(parent).iter().position(|&c| c == slot)?;
                Some((parent, pos))
            })
            .collect();
        for (place, &node) in places.into_iter().zip(replacement) {
            if let Some((parent, pos)) = place {
                self.nodes[parent.0].children[pos] = node;
                self.nodes[node.0].parent = Some(parent);
            }
        }
    }

    /// Create a detached element.
    pub fn new_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    /// Deep-copy `node` of `source` into this arena, returning the detached copy.
    pub fn import_subtree(&mut self, source: &Document, node: NodeId) -> NodeId {
        let id = self.alloc(source.kind(node).clone());
        for &child in source.children(node) {
            let copy = self.import_subtree(source, child);
            self.nodes[copy.0].parent = Some(id);
            self.nodes[id.0].children.push(copy);
        }
        id
    }

    /// Copy the subtree at `node` into a standalone document, carrying
    /// `xmlns` declarations inherited from its ancestors.
    pub fn extract(&self, node: NodeId) -> Document {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            prolog: Vec::new(),
            epilog: Vec::new(),
        };
        doc.root = doc.import_subtree(self, node);
        let mut ancestor = self.parent(node);
        while let Some(current) = ancestor {
            for (key, value) in self.attributes(current) {
                if key.starts_with("xmlns") && doc.attribute(doc.root, key).is_none() {
                    doc.set_attribute(doc.root, key, value);
                }
            }
            ancestor = self.parent(current);
        }
        doc
    }

    /// Whether `node` is `ancestor` or lies below it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Compare the trees below `node` and `other_node` structurally.
    pub fn same_tree(&self, node: NodeId, other: &Document, other_node: NodeId) -> bool {
        let ours = self.children(node);
        let theirs = other.children(other_node);
        self.kind(node) == other.kind(other_node)
            && ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs)
                .all(|(&a, &b)| self.same_tree(a, other, b))
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn element_from(
        &mut self,
        event: &BytesStart<'_>,
        text: &str,
        position: usize,
    ) -> Result<NodeId, XmlError> {
        let name = utf8(event.name().as_ref(), text, position)?;
        let mut attributes = Vec::new();
        for attr in event.attributes() {
            let attr = attr.map_err(|err| syntax_error(text, position, err.to_string()))?;
            let key = utf8(attr.key.as_ref(), text, position)?;
            let value = attr
                .unescape_value()
                .map_err(|err| syntax_error(text, position, err.to_string()))?;
            attributes.push((key, value.into_owned()));
        }
        Ok(self.alloc(NodeKind::Element { name, attributes }))
    }

    fn place_element(
        &mut self,
        id: NodeId,
        stack: &[NodeId],
        root: &mut Option<NodeId>,
        text: &str,
        position: usize,
    ) -> Result<(), XmlError> {
        match stack.last() {
            Some(&parent) => self.append_child(parent, id),
            None if root.is_some() => {
                return Err(syntax_error(text, position, "multiple root elements"));
            }
            None => *root = Some(id),
        }
        Ok(())
    }

    fn place_misc(&mut self, kind: NodeKind, stack: &[NodeId], root: Option<NodeId>) {
        let id = self.alloc(kind);
        match (stack.last(), root) {
            (Some(&parent), _) => self.append_child(parent, id),
            (None, None) => self.prolog.push(id),
            (None, Some(_)) => self.epilog.push(id),
        }
    }

    fn select(&self, context: NodeId, path: &XPath) -> Vec<NodeId> {
        let mut current = vec![context];
        for step in path.steps() {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for &node in &current {
                let matches: Vec<NodeId> = match step {
                    Step::Parent => self.parent(node).into_iter().collect(),
                    Step::Element { name, predicate } => {
                        let named = self
                            .element_children(node)
                            .filter(|&child| self.name(child) == Some(name.as_str()));
                        match predicate {
                            None => named.collect(),
                            Some(Predicate::Position(n)) => named.skip(n - 1).take(1).collect(),
                            Some(Predicate::AttrEquals { name, value }) => named
                                .filter(|&child| self.attribute(child, name) == Some(value.as_str()))
                                .collect(),
                        }
                    }
                };
                next.extend(matches.into_iter().filter(|id| seen.insert(*id)));
            }
            current = next;
        }
        current
    }

    fn make_stub(
        &mut self,
        node: NodeId,
        path: &XPath,
        order: &dyn SiblingOrder,
    ) -> Result<(NodeId, String), XmlError> {
        let mut current = node;
        let mut rel = String::from(".");
        for step in path.steps() {
            match step {
                Step::Parent => {
                    current = self
                        .parent(current)
                        .ok_or_else(|| XmlError::InvalidXPath(path.to_string()))?;
                    rel = match rel.rfind('/') {
                        Some(cut) => rel[..cut].to_string(),
                        None => "..".to_string(),
                    };
                }
                Step::Element { name, predicate } => {
                    let single = XPath::single(step);
                    let existing = self.select(current, &single).into_iter().next();
                    let child = match existing {
                        Some(child) => child,
                        None => {
                            let id = self.new_element(name);
                            if let Some(Predicate::AttrEquals { name, value }) = predicate {
                                self.set_attribute(id, name, value);
                            }
                            self.insert_ordered(current, id, &rel, order);
                            debug!(element = %name, parent = %rel, "created xml stub");
                            id
                        }
                    };
                    rel = format!("{rel}/{name}");
                    current = child;
                }
            }
        }
        Ok((current, rel))
    }

    fn set_attribute_ordered(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
        element_path: &str,
        order: &dyn SiblingOrder,
    ) {
        let key = format!("@{name}");
        let rank = order.rank(element_path, &key);
        let ranks: Vec<Option<usize>> = self
            .attributes(node)
            .iter()
            .map(|(existing, _)| order.rank(element_path, &format!("@{existing}")))
            .collect();
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            if let Some(slot) = attributes.iter_mut().find(|(existing, _)| existing == name) {
                slot.1 = value.to_string();
                return;
            }
            let pos = rank
                .and_then(|rank| ranks.iter().position(|r| r.is_some_and(|r| r > rank)))
                .unwrap_or(attributes.len());
            attributes.insert(pos, (name.to_string(), value.to_string()));
        }
    }

    fn prune_empty(&mut self, start: NodeId, stop: NodeId) {
        let mut cursor = start;
        while cursor != stop
            && self.is_within(cursor, stop)
            && self.attributes(cursor).is_empty()
            && self.children(cursor).is_empty()
        {
            let Some(parent) = self.parent(cursor) else {
                break;
            };
            debug!(element = self.name(cursor).unwrap_or_default(), "pruned empty element");
            self.detach(cursor);
            cursor = parent;
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        let misc_eq = |a: &[NodeId], b: &[NodeId]| {
            a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.kind(x) == other.kind(y))
        };
        misc_eq(&self.prolog, &other.prolog)
            && misc_eq(&self.epilog, &other.epilog)
            && self.same_tree(self.root, other, other.root)
    }
}

fn utf8(bytes: &[u8], text: &str, position: usize) -> Result<String, XmlError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|err| syntax_error(text, position, format!("invalid UTF-8: {err}")))
}

fn syntax_error(text: &str, position: usize, message: impl Into<String>) -> XmlError {
    let position = position.min(text.len());
    let mut start = position.saturating_sub(FRAGMENT_RADIUS);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (position + FRAGMENT_RADIUS).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    XmlError::Syntax {
        position,
        message: message.into(),
        fragment: text[start..end].replace('\n', " ").trim().to_string(),
    }
}
