// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by [`Delegate`](crate::delegate::Delegate).

use alloc::string::String;
use thiserror::Error;

/// Programmer errors surfaced synchronously by registration and binding.
///
/// Removal never fails: [`Delegate::off`](crate::delegate::Delegate::off) with
/// criteria that match nothing is a no-op.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DelegateError {
    /// The event type list was empty or contained only whitespace.
    #[error("invalid event type: {0:?}")]
    InvalidEventType(String),

    /// The selector was empty or rejected by the host.
    ///
    /// Pass `None` instead of an empty string for root-only delegation.
    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),

    /// A root given as a selector did not resolve to a node.
    #[error("root node not found for selector {0:?}")]
    RootNotFound(String),
}
