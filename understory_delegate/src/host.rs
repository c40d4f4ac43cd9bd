// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host environment a delegate runs in.
//!
//! ## Overview
//!
//! A delegate never owns a tree. Everything it needs from the environment
//! (tree navigation, node inspection, selector matching, native listener
//! management) comes through [`Host`], and everything it needs from a native
//! event comes through [`NativeEvent`].
//!
//! Hosts are expected to be cheap handles (`Clone` of an `Rc` or similar): a
//! delegate keeps its own clone and hands clones to every walk.

use alloc::string::String;
use core::fmt::Debug;

use crate::delegate::NativeListener;
use crate::types::EventData;

/// The view of a native event the dispatch engine needs.
pub trait NativeEvent<N> {
    /// The single event type, e.g. `"click"`.
    fn event_type(&self) -> &str;

    /// The node the native event was dispatched to, if any.
    fn target(&self) -> Option<N>;

    /// Whether some delegate already stopped this event occurrence.
    ///
    /// The marker lives on the event so it is shared by every delegate that
    /// observes the same occurrence.
    fn is_handled(&self) -> bool;

    /// Set the marker read by [`NativeEvent::is_handled`].
    fn set_handled(&mut self);

    /// Cancel the event's default action.
    fn prevent_default(&mut self);

    /// Replace the event's data slot, returning the previous value.
    fn replace_data(&mut self, data: Option<EventData>) -> Option<EventData>;
}

/// Capabilities consumed from the host environment.
pub trait Host: Clone + 'static {
    /// Node handle. Compared with `==` to detect the root.
    type Node: Clone + PartialEq + Debug + 'static;
    /// Native event type delivered to [`NativeListener::handle_event`].
    type Event: NativeEvent<Self::Node> + 'static;
    /// Token returned by [`Host::attach`] and consumed by [`Host::detach`].
    type Subscription: Debug;

    /// Returns `true` if `node` is a text node.
    fn is_text(&self, node: &Self::Node) -> bool;

    /// Parent of any node, including text nodes.
    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Parent element; `None` once the walk leaves the element tree.
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Tag name as the environment reports it, `None` for non-elements.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    /// Identifier attribute, `None` when absent.
    fn id(&self, node: &Self::Node) -> Option<String>;

    /// Generic selector matching.
    fn matches_selector(&self, node: &Self::Node, selector: &str) -> bool;

    /// Whether tag names are reported case-sensitively (XML-like documents).
    ///
    /// Consulted at most once per process; see
    /// [`tags_case_sensitive`](crate::matcher::tags_case_sensitive).
    fn tag_names_case_sensitive(&self) -> bool;

    /// Whether `selector` can be matched at all.
    fn is_valid_selector(&self, _selector: &str) -> bool {
        true
    }

    /// Whether `node` counts as the delegate root for root-only listeners.
    fn matches_root(&self, root: &Self::Node, node: &Self::Node) -> bool {
        root == node
    }

    /// Resolve a root given as a selector.
    fn query_selector(&self, _selector: &str) -> Option<Self::Node> {
        None
    }

    /// Whether `node` is a disabled form control.
    fn is_disabled_control(&self, _node: &Self::Node) -> bool {
        false
    }

    /// Attach a native listener for `event_type` to `node`.
    fn attach(
        &self,
        node: &Self::Node,
        event_type: &str,
        use_capture: bool,
        listener: NativeListener<Self>,
    ) -> Self::Subscription;

    /// Detach a listener previously returned by [`Host::attach`].
    fn detach(&self, subscription: Self::Subscription);
}
