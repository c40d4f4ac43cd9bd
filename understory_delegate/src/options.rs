// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-delegate configuration.

use alloc::string::String;
use alloc::vec::Vec;

/// Event types observed in the capturing phase regardless of the requested
/// phase, because they do not bubble in some environments.
pub const DEFAULT_CAPTURE_TYPES: [&str; 6] = ["blur", "error", "focus", "load", "resize", "scroll"];

/// Options fixed when a [`Delegate`](crate::delegate::Delegate) is created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelegateOptions {
    capture_types: Vec<String>,
    skip_disabled_controls: bool,
}

impl Default for DelegateOptions {
    fn default() -> Self {
        Self {
            capture_types: DEFAULT_CAPTURE_TYPES.iter().map(|&t| t.into()).collect(),
            skip_disabled_controls: false,
        }
    }
}

impl DelegateOptions {
    /// Replace the always-capture list.
    pub fn with_capture_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capture_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Start walks above the outermost disabled form control on the path, so
    /// the control and its descendants never receive delegated handlers.
    pub fn skip_disabled_controls(mut self, skip: bool) -> Self {
        self.skip_disabled_controls = skip;
        self
    }

    /// Whether `event_type` is always attached with `use_capture = true`.
    pub fn captures(&self, event_type: &str) -> bool {
        self.capture_types.iter().any(|t| t == event_type)
    }

    /// Whether disabled form controls are skipped.
    pub fn skips_disabled_controls(&self) -> bool {
        self.skip_disabled_controls
    }
}
