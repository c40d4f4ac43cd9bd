// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_delegate --heading-base-level=0

//! Understory Delegate: deterministic, `no_std` event delegation.
//!
//! ## Overview
//!
//! A [`Delegate`](crate::delegate::Delegate) lets you register handlers for events on nodes matching a selector, anywhere under a root node, without attaching a listener to each matching node.
//! It attaches one native listener per (event type, [`Phase`](crate::types::Phase)) to the root and, when the native event arrives there, re-runs bubbling over its own listener lists: from the event's effective target up to the root, firing every listener whose selector matches the node being visited.
//! Nodes created after registration are covered automatically.
//!
//! ## Host
//!
//! The crate owns no tree. Tree navigation, node inspection, selector matching and native listener management come from a [`Host`](crate::host::Host) implementation; the event is seen through [`NativeEvent`](crate::host::NativeEvent).
//! `understory_dom` provides an in-memory document implementing both.
//!
//! ## Matching
//!
//! Each registration compiles its selector once into a [`Matcher`](crate::matcher::Matcher):
//! root-only for `None`, a tag comparison for a bare tag name, an id comparison for a bare `#id`, and the host's generic matcher otherwise.
//!
//! ## Stopping
//!
//! Handlers return anything implementing [`IntoOutcome`](crate::types::IntoOutcome).
//! `false` (or [`Outcome::Stop`](crate::types::Outcome::Stop)) ends the walk, prevents the native default action, and marks the event handled so every other delegate observing the same occurrence ignores it.
//!
//! ```
//! use understory_delegate::types::{Handler, Outcome};
//!
//! // Handlers receive the event and the node that matched their selector.
//! let only_small: Handler<u32, u32> = Handler::new(|event: &mut u32, node: &u32| *event + *node < 10);
//! let mut event = 3;
//! assert_eq!(only_small.call(&mut event, &4), Outcome::Continue);
//! assert_eq!(only_small.call(&mut event, &7), Outcome::Stop);
//! ```
//!
//! ## Reentrancy
//!
//! Handlers may register and unregister listeners, or destroy the delegate, while it dispatches.
//! See [`delegate`](crate::delegate) for the exact rules.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod delegate;
pub mod error;
pub mod host;
pub mod matcher;
pub mod options;
mod registry;
pub mod types;

#[cfg(test)]
mod test_host;

pub use delegate::{Delegate, HostHandler, NativeListener, WeakDelegate};
pub use error::DelegateError;
pub use host::{Host, NativeEvent};
pub use options::DelegateOptions;
pub use types::{EventData, Handler, IntoOutcome, ListenerKey, ListenerOptions, Outcome, Phase};
