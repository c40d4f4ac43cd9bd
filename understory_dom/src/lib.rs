// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom --heading-base-level=0

//! Understory DOM: a deterministic, in-memory document with DOM-style event delivery.
//!
//! ## Overview
//!
//! [`Document`] is a small node tree (window, document, elements, text) with
//! attributes, a selector subset, and native event listeners delivered in
//! capture → target → bubble order.
//! It implements [`understory_delegate::Host`], so a
//! [`Delegate`](understory_delegate::Delegate) can run against it without a
//! browser.
//!
//! ## Nodes
//!
//! Nodes are addressed by generational [`NodeId`]s. Removing a node frees
//! its subtree; stale ids are rejected with [`DomError::StaleNode`].
//! HTML elements report upper-case tag names, SVG elements keep their case.
//!
//! ## Events
//!
//! [`Document::dispatch`] delivers an event built from [`EventFlags`].
//! [`Document::click`], [`Document::focus`] and [`Document::blur`] mimic user
//! activation: clicks never reach disabled form controls or their contents,
//! focus and blur do not bubble.
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_delegate::{Delegate, Handler};
//! use understory_dom::{Document, DomEvent, NodeId};
//!
//! let doc = Document::new();
//! let list = doc.append_element(doc.body(), "ul").unwrap();
//! let delegate = Delegate::new(doc.clone(), Some(list));
//!
//! let clicks = Rc::new(Cell::new(0));
//! let counter = clicks.clone();
//! let on_item = Handler::new(move |_event: &mut DomEvent, _item: &NodeId| {
//!     counter.set(counter.get() + 1);
//! });
//! delegate.on("click", Some("li"), &on_item).unwrap();
//!
//! // Items added after registration are covered too.
//! let item = doc.append_element(list, "li").unwrap();
//! let label = doc.append_child(item, doc.create_text("first"));
//! assert!(label.is_ok());
//! doc.click(item);
//! assert_eq!(clicks.get(), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod event;
mod host;
mod selector;
mod tree;
mod types;

pub use error::DomError;
pub use event::DomEvent;
pub use tree::Document;
pub use types::{EventFlags, EventPhase, ListenerId, Namespace, NodeId, NodeKind};
