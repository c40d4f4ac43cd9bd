// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal host used by the unit tests of this crate.
//!
//! Nodes are `u32` indices. Delivery runs every capture listener from the
//! outermost ancestor inwards, then every bubble listener from the target
//! outwards; all events bubble.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::delegate::NativeListener;
use crate::host::{Host, NativeEvent};
use crate::types::EventData;

#[derive(Debug)]
pub(crate) struct TestEvent {
    pub(crate) event_type: String,
    pub(crate) target: u32,
    pub(crate) handled: bool,
    pub(crate) prevented: bool,
    pub(crate) data: Option<EventData>,
}

impl TestEvent {
    pub(crate) fn new(event_type: &str, target: u32) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            handled: false,
            prevented: false,
            data: None,
        }
    }
}

impl NativeEvent<u32> for TestEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn target(&self) -> Option<u32> {
        Some(self.target)
    }

    fn is_handled(&self) -> bool {
        self.handled
    }

    fn set_handled(&mut self) {
        self.handled = true;
    }

    fn prevent_default(&mut self) {
        self.prevented = true;
    }

    fn replace_data(&mut self, data: Option<EventData>) -> Option<EventData> {
        core::mem::replace(&mut self.data, data)
    }
}

#[derive(Default)]
struct NodeData {
    parent: Option<u32>,
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: bool,
    disabled: bool,
}

struct Attached {
    id: u64,
    node: u32,
    event_type: String,
    use_capture: bool,
    listener: NativeListener<TestHost>,
}

#[derive(Default)]
struct State {
    nodes: Vec<NodeData>,
    attached: Vec<Attached>,
    next_id: u64,
    probes: usize,
}

#[derive(Clone, Default)]
pub(crate) struct TestHost(Rc<RefCell<State>>);

impl core::fmt::Debug for TestHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TestHost").finish_non_exhaustive()
    }
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&self, data: NodeData) -> u32 {
        let mut s = self.0.borrow_mut();
        s.nodes.push(data);
        u32::try_from(s.nodes.len() - 1).expect("test trees stay small")
    }

    pub(crate) fn element(&self, parent: Option<u32>, tag: &str, id: Option<&str>) -> u32 {
        self.push(NodeData {
            parent,
            tag: tag.to_string(),
            id: id.map(ToString::to_string),
            ..NodeData::default()
        })
    }

    pub(crate) fn text(&self, parent: u32) -> u32 {
        self.push(NodeData {
            parent: Some(parent),
            text: true,
            ..NodeData::default()
        })
    }

    pub(crate) fn add_class(&self, node: u32, class: &str) {
        self.0.borrow_mut().nodes[node as usize]
            .classes
            .push(class.to_string());
    }

    pub(crate) fn set_disabled(&self, node: u32) {
        self.0.borrow_mut().nodes[node as usize].disabled = true;
    }

    pub(crate) fn probe_count(&self) -> usize {
        self.0.borrow().probes
    }

    /// Number of attached native listeners.
    pub(crate) fn attached(&self) -> usize {
        self.0.borrow().attached.len()
    }

    /// `(node, event_type, use_capture)` of every attached native listener.
    pub(crate) fn attachments(&self) -> Vec<(u32, String, bool)> {
        self.0
            .borrow()
            .attached
            .iter()
            .map(|a| (a.node, a.event_type.clone(), a.use_capture))
            .collect()
    }

    fn path(&self, target: u32) -> Vec<u32> {
        let s = self.0.borrow();
        let mut out = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            out.push(node);
            cursor = s.nodes[node as usize].parent;
        }
        out
    }

    fn snapshot(
        &self,
        node: u32,
        event_type: &str,
        use_capture: bool,
    ) -> Vec<(u64, NativeListener<Self>)> {
        self.0
            .borrow()
            .attached
            .iter()
            .filter(|a| {
                a.node == node && a.event_type == event_type && a.use_capture == use_capture
            })
            .map(|a| (a.id, a.listener.clone()))
            .collect()
    }

    fn still_attached(&self, id: u64) -> bool {
        self.0.borrow().attached.iter().any(|a| a.id == id)
    }

    fn invoke(&self, node: u32, event: &mut TestEvent, use_capture: bool) {
        let event_type = event.event_type.clone();
        for (id, listener) in self.snapshot(node, &event_type, use_capture) {
            if self.still_attached(id) {
                listener.handle_event(event);
            }
        }
    }

    /// Deliver `event` to its target: capture listeners outermost first,
    /// then bubble listeners innermost first.
    pub(crate) fn deliver(&self, event: &mut TestEvent) {
        let path = self.path(event.target);
        for &node in path.iter().rev() {
            self.invoke(node, event, true);
        }
        for &node in &path {
            self.invoke(node, event, false);
        }
    }

    pub(crate) fn dispatch(&self, target: u32, event_type: &str) -> TestEvent {
        let mut event = TestEvent::new(event_type, target);
        self.deliver(&mut event);
        event
    }
}

impl Host for TestHost {
    type Node = u32;
    type Event = TestEvent;
    type Subscription = u64;

    fn is_text(&self, node: &u32) -> bool {
        self.0.borrow().nodes[*node as usize].text
    }

    fn parent_node(&self, node: &u32) -> Option<u32> {
        self.0.borrow().nodes[*node as usize].parent
    }

    fn parent_element(&self, node: &u32) -> Option<u32> {
        self.parent_node(node)
    }

    fn tag_name(&self, node: &u32) -> Option<String> {
        let s = self.0.borrow();
        let n = &s.nodes[*node as usize];
        (!n.text).then(|| n.tag.clone())
    }

    fn id(&self, node: &u32) -> Option<String> {
        self.0.borrow().nodes[*node as usize].id.clone()
    }

    fn matches_selector(&self, node: &u32, selector: &str) -> bool {
        let s = self.0.borrow();
        let classes = &s.nodes[*node as usize].classes;
        selector
            .strip_prefix('.')
            .is_some_and(|class| classes.iter().any(|c| c == class))
    }

    fn tag_names_case_sensitive(&self) -> bool {
        self.0.borrow_mut().probes += 1;
        false
    }

    fn is_valid_selector(&self, selector: &str) -> bool {
        !selector.contains("!!")
    }

    fn is_disabled_control(&self, node: &u32) -> bool {
        self.0.borrow().nodes[*node as usize].disabled
    }

    fn query_selector(&self, selector: &str) -> Option<u32> {
        let id = selector.strip_prefix('#')?;
        let s = self.0.borrow();
        let idx = s.nodes.iter().position(|n| n.id.as_deref() == Some(id))?;
        u32::try_from(idx).ok()
    }

    fn attach(
        &self,
        node: &u32,
        event_type: &str,
        use_capture: bool,
        listener: NativeListener<Self>,
    ) -> u64 {
        let mut s = self.0.borrow_mut();
        s.next_id += 1;
        let id = s.next_id;
        s.attached.push(Attached {
            id,
            node: *node,
            event_type: event_type.to_string(),
            use_capture,
            listener,
        });
        id
    }

    fn detach(&self, subscription: u64) {
        self.0.borrow_mut().attached.retain(|a| a.id != subscription);
    }
}
