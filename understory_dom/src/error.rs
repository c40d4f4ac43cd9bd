// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document errors.

use alloc::string::String;
use thiserror::Error;

use crate::types::NodeId;

/// Errors reported by [`Document`](crate::Document) operations.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DomError {
    /// The selector is outside the supported subset or malformed.
    #[error("unsupported selector: {0:?}")]
    UnsupportedSelector(String),

    /// The node was removed from the document.
    #[error("stale node id {0:?}")]
    StaleNode(NodeId),

    /// The operation needs an element.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// The insertion would produce an invalid tree.
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),
}
