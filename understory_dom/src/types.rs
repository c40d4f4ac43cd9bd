// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the document: node identifiers, node kinds, namespaces,
//! event phases and flags.

/// Identifier for a node in a [`Document`](crate::Document).
///
/// A slot index and a generation counter. Removing a node frees its slot; any
/// `NodeId` that pointed to it is then stale, and reusing the slot bumps the
/// generation, so a stale id never aliases a different live node.
///
/// Use [`Document::is_alive`](crate::Document::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// What a node is.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// The window object at the top of every event path.
    Window,
    /// The document node.
    Document,
    /// An element.
    Element,
    /// A text node.
    Text,
}

/// Element namespace.
///
/// HTML elements report upper-case tag names and match type selectors
/// case-insensitively; other namespaces keep the case they were created with.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Namespace {
    /// `http://www.w3.org/1999/xhtml`
    #[default]
    Html,
    /// `http://www.w3.org/2000/svg`
    Svg,
}

/// Where an event currently is in its propagation path.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum EventPhase {
    /// Not being dispatched.
    #[default]
    None = 0,
    /// Travelling from the window towards the target's parent.
    Capturing = 1,
    /// At the target.
    AtTarget = 2,
    /// Travelling from the target's parent back to the window.
    Bubbling = 3,
}

bitflags::bitflags! {
    /// Event construction flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// The event has a bubbling phase.
        const BUBBLES    = 0b0000_0001;
        /// `prevent_default` has an effect.
        const CANCELABLE = 0b0000_0010;
    }
}

/// Handle of a native listener returned by
/// [`Document::add_event_listener`](crate::Document::add_event_listener).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ListenerId(pub(crate) u64);
