// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native events: listener table and capture → target → bubble delivery.
//!
//! ## Delivery
//!
//! The propagation path runs from the target up to the window (the window is
//! included when the target is connected to the document).
//!
//! 1. Capturing: capture listeners on each ancestor, outermost first.
//! 2. At target: the target's capture listeners, then its bubble listeners.
//! 3. Bubbling: bubble listeners on each ancestor, innermost first, only for
//!    events created with [`EventFlags::BUBBLES`].
//!
//! Listeners on one node run in registration order. The set of listeners for
//! a node is snapshotted before they run; a listener removed by an earlier one
//! is skipped, one added during delivery waits for the next event.
//! `stop_propagation` finishes the current node, `stop_immediate_propagation`
//! also skips the rest of the current node's listeners.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use understory_delegate::{EventData, NativeEvent};

use crate::tree::Document;
use crate::types::{EventFlags, EventPhase, ListenerId, NodeId, NodeKind};

type Callback = Rc<dyn Fn(&mut DomEvent)>;

pub(crate) struct NativeEntry {
    id: ListenerId,
    pub(crate) node: NodeId,
    event_type: String,
    capture: bool,
    callback: Callback,
}

/// An event being delivered through a [`Document`].
pub struct DomEvent {
    event_type: String,
    target: NodeId,
    current_target: Option<NodeId>,
    phase: EventPhase,
    flags: EventFlags,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    handled: bool,
    data: Option<EventData>,
}

impl core::fmt::Debug for DomEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomEvent")
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("current_target", &self.current_target)
            .field("phase", &self.phase)
            .field("flags", &self.flags)
            .field("default_prevented", &self.default_prevented)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("handled", &self.handled)
            .field("has_data", &self.data.is_some())
            .finish_non_exhaustive()
    }
}

impl DomEvent {
    /// Create an undispatched event.
    pub fn new(event_type: &str, target: NodeId, flags: EventFlags) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: None,
            phase: EventPhase::None,
            flags,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            handled: false,
            data: None,
        }
    }

    /// The event type.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node the event was dispatched to.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose listeners are running, `None` outside delivery.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    /// Current phase.
    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Whether the event has a bubbling phase.
    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    /// Whether [`DomEvent::prevent_default`] has an effect.
    pub fn cancelable(&self) -> bool {
        self.flags.contains(EventFlags::CANCELABLE)
    }

    /// Cancel the default action, if the event is cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable() {
            self.default_prevented = true;
        }
    }

    /// Whether the default action was cancelled.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop after the listeners of the current node.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop now, skipping the remaining listeners of the current node too.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Data attached by a delegated listener, while that listener runs.
    pub fn data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    /// Data downcast to `T`.
    pub fn data_as<T: 'static>(&self) -> Option<&T> {
        self.data.as_ref()?.downcast_ref()
    }

    /// Whether a delegate stopped this occurrence.
    pub fn handled(&self) -> bool {
        self.handled
    }
}

impl NativeEvent<NodeId> for DomEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn target(&self) -> Option<NodeId> {
        Some(self.target)
    }

    fn is_handled(&self) -> bool {
        self.handled
    }

    fn set_handled(&mut self) {
        self.handled = true;
    }

    fn prevent_default(&mut self) {
        Self::prevent_default(self);
    }

    fn replace_data(&mut self, data: Option<EventData>) -> Option<EventData> {
        core::mem::replace(&mut self.data, data)
    }
}

impl Document {
    /// Register a native listener on `node`.
    pub fn add_event_listener<F>(
        &self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&mut DomEvent) + 'static,
    {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push(NativeEntry {
            id,
            node,
            event_type: event_type.to_string(),
            capture,
            callback: Rc::new(callback),
        });
        id
    }

    /// Remove a native listener. Returns `false` if it was already gone.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|entry| entry.id != id);
        state.listeners.len() != before
    }

    /// Number of registered native listeners.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// `(event_type, capture)` of every native listener on `node`, in
    /// registration order.
    pub fn listeners_on(&self, node: NodeId) -> Vec<(String, bool)> {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.node == node)
            .map(|entry| (entry.event_type.clone(), entry.capture))
            .collect()
    }

    /// Create and deliver an event to `target`.
    pub fn dispatch(&self, target: NodeId, event_type: &str, flags: EventFlags) -> DomEvent {
        let mut event = DomEvent::new(event_type, target, flags);
        self.dispatch_event(&mut event);
        event
    }

    /// Deliver a prepared event.
    pub fn dispatch_event(&self, event: &mut DomEvent) {
        let path = self.state.borrow().event_path(event.target);
        let outcome = self.deliver(&path, event);
        event.phase = EventPhase::None;
        event.current_target = None;
        tracing::trace!(
            event_type = %event.event_type,
            target = ?event.target,
            outcome,
            default_prevented = event.default_prevented,
            "event delivered"
        );
    }

    fn deliver(&self, path: &[NodeId], event: &mut DomEvent) -> &'static str {
        let Some((&target, ancestors)) = path.split_first() else {
            return "empty_path";
        };
        event.phase = EventPhase::Capturing;
        for &node in ancestors.iter().rev() {
            if self.invoke(node, event, true) {
                return "propagation_stopped";
            }
        }
        event.phase = EventPhase::AtTarget;
        if self.invoke(target, event, true) || self.invoke(target, event, false) {
            return "propagation_stopped";
        }
        if event.bubbles() {
            event.phase = EventPhase::Bubbling;
            for &node in ancestors {
                if self.invoke(node, event, false) {
                    return "propagation_stopped";
                }
            }
        }
        "completed"
    }

    /// Run the listeners of `node` for one phase. Returns `true` once
    /// propagation is stopped.
    fn invoke(&self, node: NodeId, event: &mut DomEvent, capture: bool) -> bool {
        event.current_target = Some(node);
        let snapshot: Vec<(ListenerId, Callback)> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|e| e.node == node && e.capture == capture && e.event_type == event.event_type)
            .map(|e| (e.id, Rc::clone(&e.callback)))
            .collect();
        for (id, callback) in snapshot {
            let live = self.state.borrow().listeners.iter().any(|e| e.id == id);
            if !live {
                continue;
            }
            callback(event);
            if event.immediate_propagation_stopped {
                break;
            }
        }
        event.propagation_stopped
    }

    /// Activate `target` with a bubbling, cancelable `click`.
    ///
    /// Returns `None` without dispatching when `target` is a disabled form
    /// control or lies inside one.
    pub fn click(&self, target: NodeId) -> Option<DomEvent> {
        {
            let state = self.state.borrow();
            let mut cursor = Some(target);
            while let Some(node) = cursor {
                if state.is_disabled_control(node) {
                    return None;
                }
                cursor = state.parent(node);
            }
        }
        Some(self.dispatch(
            target,
            "click",
            EventFlags::BUBBLES | EventFlags::CANCELABLE,
        ))
    }

    /// Focus `target`: blur the focused element, then deliver a non-bubbling
    /// `focus`. Disabled controls and non-elements cannot be focused.
    pub fn focus(&self, target: NodeId) -> Option<DomEvent> {
        {
            let state = self.state.borrow();
            if state.kind(target) != Some(NodeKind::Element)
                || state.is_disabled_control(target)
                || state.active == Some(target)
            {
                return None;
            }
        }
        if let Some(current) = self.active_element() {
            self.blur(current);
        }
        self.state.borrow_mut().active = Some(target);
        Some(self.dispatch(target, "focus", EventFlags::empty()))
    }

    /// Deliver a non-bubbling `blur` to `target` if it is focused.
    pub fn blur(&self, target: NodeId) -> Option<DomEvent> {
        if self.active_element() != Some(target) {
            return None;
        }
        let event = self.dispatch(target, "blur", EventFlags::empty());
        self.state.borrow_mut().active = None;
        Some(event)
    }

    /// The focused element.
    pub fn active_element(&self) -> Option<NodeId> {
        self.state.borrow().active
    }
}
