// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Host`] implementation: lets a [`Delegate`](understory_delegate::Delegate)
//! run against a [`Document`].
//!
//! - A window root also matches the document node and the document element
//!   for root-only listeners.
//! - Tag names are probed from the document element: an HTML document reports
//!   upper-case names, so tag selectors compare case-insensitively.
//! - Selectors outside the supported subset are rejected at registration.

use alloc::string::String;

use understory_delegate::{Host, NativeListener};

use crate::event::DomEvent;
use crate::selector::SelectorList;
use crate::tree::Document;
use crate::types::{ListenerId, NodeId, NodeKind};

impl Host for Document {
    type Node = NodeId;
    type Event = DomEvent;
    type Subscription = ListenerId;

    fn is_text(&self, node: &NodeId) -> bool {
        self.kind(*node) == Some(NodeKind::Text)
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.parent(*node)
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        Self::parent_element(self, *node)
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        Self::tag_name(self, *node)
    }

    fn id(&self, node: &NodeId) -> Option<String> {
        self.get_attribute(*node, "id")
    }

    fn matches_selector(&self, node: &NodeId, selector: &str) -> bool {
        self.matches(*node, selector).unwrap_or(false)
    }

    fn tag_names_case_sensitive(&self) -> bool {
        Self::tag_name(self, self.document_element()).as_deref() != Some("HTML")
    }

    fn is_valid_selector(&self, selector: &str) -> bool {
        SelectorList::parse(selector).is_ok()
    }

    fn matches_root(&self, root: &NodeId, node: &NodeId) -> bool {
        root == node
            || (*root == self.window()
                && (*node == self.document() || *node == self.document_element()))
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        Self::query_selector(self, selector).ok().flatten()
    }

    fn is_disabled_control(&self, node: &NodeId) -> bool {
        Self::is_disabled_control(self, *node)
    }

    fn attach(
        &self,
        node: &NodeId,
        event_type: &str,
        use_capture: bool,
        listener: NativeListener<Self>,
    ) -> ListenerId {
        self.add_event_listener(*node, event_type, use_capture, move |event| {
            listener.handle_event(event);
        })
    }

    fn detach(&self, subscription: ListenerId) {
        self.remove_event_listener(subscription);
    }
}
