// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: structure, attributes, queries.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::error::DomError;
use crate::event::NativeEntry;
use crate::selector::SelectorList;
use crate::types::{Namespace, NodeId, NodeKind};

const DISABLEABLE_CONTROLS: [&str; 4] = ["button", "input", "select", "textarea"];

#[derive(Clone, Debug)]
pub(crate) struct ElementData {
    namespace: Namespace,
    local_name: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    fn new(namespace: Namespace, local_name: &str) -> Self {
        let local_name = match namespace {
            Namespace::Html => local_name.to_ascii_lowercase(),
            Namespace::Svg => local_name.to_string(),
        };
        Self {
            namespace,
            local_name,
            attrs: Vec::new(),
        }
    }

    pub(crate) fn tag_name(&self) -> String {
        match self.namespace {
            Namespace::Html => self.local_name.to_ascii_uppercase(),
            Namespace::Svg => self.local_name.clone(),
        }
    }

    /// Type selector comparison.
    pub(crate) fn matches_type(&self, tag: &str) -> bool {
        match self.namespace {
            Namespace::Html => self.local_name.eq_ignore_ascii_case(tag),
            Namespace::Svg => self.local_name == tag,
        }
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    fn attribute_name(&self, name: &str) -> String {
        match self.namespace {
            Namespace::Html => name.to_ascii_lowercase(),
            Namespace::Svg => name.to_string(),
        }
    }

    fn is_disabled_control(&self) -> bool {
        self.namespace == Namespace::Html
            && DISABLEABLE_CONTROLS.contains(&self.local_name.as_str())
            && self.attribute("disabled").is_some()
    }
}

#[derive(Clone, Debug)]
enum Payload {
    Window,
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    payload: Payload,
}

/// Shared document state. Borrowed only for short, non-reentrant sections.
pub(crate) struct State {
    nodes: Vec<Option<Node>>,   // slots
    generations: Vec<u32>,      // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    window: NodeId,
    document: NodeId,
    document_element: NodeId,
    body: NodeId,
    pub(crate) listeners: Vec<NativeEntry>,
    pub(crate) next_listener: u64,
    pub(crate) active: Option<NodeId>,
}

impl State {
    fn new() -> Self {
        let placeholder = NodeId::new(0, 0);
        let mut state = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            window: placeholder,
            document: placeholder,
            document_element: placeholder,
            body: placeholder,
            listeners: Vec::new(),
            next_listener: 0,
            active: None,
        };
        state.window = state.insert(Payload::Window);
        state.document = state.insert(Payload::Document);
        state.document_element = state.insert(Payload::Element(ElementData::new(
            Namespace::Html,
            "html",
        )));
        state.body = state.insert(Payload::Element(ElementData::new(Namespace::Html, "body")));
        state.link(state.document, state.document_element);
        state.link(state.document_element, state.body);
        state
    }

    fn insert(&mut self, payload: Payload) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        self.nodes[idx] = Some(Node {
            generation,
            parent: None,
            children: Vec::new(),
            payload,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Node slots are addressed with 32-bit indices."
        )]
        let idx = idx as u32;
        NodeId::new(idx, generation)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.1)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
    }

    pub(crate) fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| match n.payload {
            Payload::Window => NodeKind::Window,
            Payload::Document => NodeKind::Document,
            Payload::Element(_) => NodeKind::Element,
            Payload::Text(_) => NodeKind::Text,
        })
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.payload {
            Payload::Element(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub(crate) fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.element(p).is_some())
    }

    pub(crate) fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = &self.node(self.parent(id)?)?.children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|&s| self.element(s).is_some())
    }

    /// Nodes from `target` outwards, ending with the window when the target
    /// is connected to the document.
    pub(crate) fn event_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = self.is_alive(target).then_some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.parent(node);
        }
        if path.last() == Some(&self.document) {
            path.push(self.window);
        }
        path
    }

    pub(crate) fn is_disabled_control(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(ElementData::is_disabled_control)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            if n == ancestor {
                return true;
            }
            cursor = self.parent(n);
        }
        false
    }

    /// Connected elements in document order.
    fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = Vec::from([self.document]);
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if matches!(node.payload, Payload::Element(_)) {
                out.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let children = self.node(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }
        self.listeners.retain(|entry| entry.node != id);
        if self.active == Some(id) {
            self.active = None;
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }
}

/// An in-memory document.
///
/// `Document` is a cheap handle: clones share one tree, so event listeners
/// can capture a clone and mutate the document while an event is delivered.
///
/// [`Document::new`] builds the usual skeleton: a window, the document node,
/// `<html>` and `<body>`.
#[derive(Clone)]
pub struct Document {
    pub(crate) state: Rc<RefCell<State>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        let total = state.nodes.len();
        let alive = state.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &state.free_list.len())
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create a document with a window, `<html>` and `<body>`.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new())),
        }
    }

    /// The window at the top of every event path.
    pub fn window(&self) -> NodeId {
        self.state.borrow().window
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        self.state.borrow().document
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> NodeId {
        self.state.borrow().document_element
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    /// Create a detached HTML element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.create_element_ns(Namespace::Html, tag)
    }

    /// Create a detached element in `namespace`.
    pub fn create_element_ns(&self, namespace: Namespace, tag: &str) -> NodeId {
        self.state
            .borrow_mut()
            .insert(Payload::Element(ElementData::new(namespace, tag)))
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> NodeId {
        self.state
            .borrow_mut()
            .insert(Payload::Text(text.to_string()))
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        for id in [parent, child] {
            if !state.is_alive(id) {
                return Err(DomError::StaleNode(id));
            }
        }
        if !matches!(
            state.kind(parent),
            Some(NodeKind::Element | NodeKind::Document)
        ) {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if !matches!(state.kind(child), Some(NodeKind::Element | NodeKind::Text)) {
            return Err(DomError::HierarchyRequest("node cannot be inserted"));
        }
        if state.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of the parent"));
        }
        state.unlink(child);
        state.link(parent, child);
        Ok(())
    }

    /// Create an HTML element and append it to `parent`.
    pub fn append_element(&self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Remove `id` and its subtree. Their ids become stale and their
    /// listeners are dropped. The window, document, `<html>` and `<body>`
    /// cannot be removed.
    pub fn remove(&self, id: NodeId) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        if !state.is_alive(id) {
            return Err(DomError::StaleNode(id));
        }
        if [state.window, state.document, state.document_element, state.body].contains(&id) {
            return Err(DomError::HierarchyRequest("document skeleton cannot be removed"));
        }
        state.unlink(id);
        state.remove_subtree(id);
        Ok(())
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.state.borrow().is_alive(id)
    }

    /// Node kind, `None` for stale ids.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.state.borrow().kind(id)
    }

    /// Parent node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.state.borrow().parent(id)
    }

    /// Parent, if it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.state.borrow().parent_element(id)
    }

    /// Children in order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Tag name: upper-case for HTML elements, as created otherwise.
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.state.borrow().element(id).map(ElementData::tag_name)
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<String> {
        match &self.state.borrow().node(id)?.payload {
            Payload::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Set an attribute. HTML attribute names are lower-cased.
    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut state = self.state.borrow_mut();
        if !state.is_alive(id) {
            return Err(DomError::StaleNode(id));
        }
        let Some(Node {
            payload: Payload::Element(element),
            ..
        }) = state.node_mut(id)
        else {
            return Err(DomError::NotAnElement(id));
        };
        let name = element.attribute_name(name);
        match element.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element.attrs.push((name, value.to_string())),
        }
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let mut state = self.state.borrow_mut();
        let Some(Node {
            payload: Payload::Element(element),
            ..
        }) = state.node_mut(id)
        else {
            return None;
        };
        let name = element.attribute_name(name);
        let pos = element.attrs.iter().position(|(k, _)| *k == name)?;
        Some(element.attrs.remove(pos).1)
    }

    /// Attribute value.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let state = self.state.borrow();
        let element = state.element(id)?;
        element
            .attribute(&element.attribute_name(name))
            .map(ToString::to_string)
    }

    /// Whether the `class` attribute lists `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.state
            .borrow()
            .element(id)
            .is_some_and(|e| e.has_class(class))
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let state = self.state.borrow();
        state
            .elements()
            .into_iter()
            .find(|&n| state.element(n).and_then(|e| e.attribute("id")) == Some(id))
    }

    /// Whether `id` matches `selector`. Non-elements never match.
    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(&self.state.borrow(), id))
    }

    /// First connected element matching `selector`, in document order.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        let state = self.state.borrow();
        Ok(state.elements().into_iter().find(|&n| list.matches(&state, n)))
    }

    /// Every connected element matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        let state = self.state.borrow();
        Ok(state
            .elements()
            .into_iter()
            .filter(|&n| list.matches(&state, n))
            .collect())
    }

    /// Whether `id` is a `button`, `input`, `select` or `textarea` carrying
    /// the `disabled` attribute.
    pub fn is_disabled_control(&self, id: NodeId) -> bool {
        self.state.borrow().is_disabled_control(id)
    }
}
