// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector matchers compiled once at registration.
//!
//! ## Strategies
//!
//! - No selector: matches the delegate root only (see [`Host::matches_root`]).
//! - Bare alphabetic tag name (`div`): tag comparison, case-insensitive unless
//!   the environment reports case-sensitive tag names.
//! - Bare `#id` (letters, digits, `-`, `_`): exact identifier comparison.
//! - Anything else: [`Host::matches_selector`].
//!
//! The fast paths are an optimisation only; each agrees with what the generic
//! matcher would answer for the same selector.

use alloc::string::{String, ToString};
use core::sync::atomic::{AtomicU8, Ordering};

use crate::host::Host;

const UNPROBED: u8 = 0;
const INSENSITIVE: u8 = 1;
const SENSITIVE: u8 = 2;

static TAGS_CASE_SENSITIVE: AtomicU8 = AtomicU8::new(UNPROBED);

/// Process-wide tag case-sensitivity.
///
/// The first call probes `host` and caches the answer; later calls, from any
/// host, read the cache. Concurrent first calls race benignly: the first
/// stored answer wins and every caller returns it.
pub fn tags_case_sensitive<H: Host>(host: &H) -> bool {
    match TAGS_CASE_SENSITIVE.load(Ordering::Acquire) {
        INSENSITIVE => false,
        SENSITIVE => true,
        _ => {
            let probed = if host.tag_names_case_sensitive() {
                SENSITIVE
            } else {
                INSENSITIVE
            };
            match TAGS_CASE_SENSITIVE.compare_exchange(
                UNPROBED,
                probed,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => probed == SENSITIVE,
                Err(stored) => stored == SENSITIVE,
            }
        }
    }
}

/// A matching strategy derived from a selector's textual shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Matcher {
    /// Matches the delegate root only.
    Root,
    /// Tag name comparison.
    Tag {
        /// Tag name, upper-cased when comparison is case-insensitive.
        name: String,
        /// Whether comparison is exact.
        case_sensitive: bool,
    },
    /// Identifier comparison.
    Id(String),
    /// Anything else, handed to the host.
    Selector(String),
}

impl Matcher {
    /// Pick the strategy for `selector`.
    ///
    /// Probes tag case-sensitivity lazily, the first time a tag selector is
    /// compiled in this process.
    pub fn compile<H: Host>(host: &H, selector: Option<&str>) -> Self {
        let Some(selector) = selector else {
            return Self::Root;
        };
        if is_tag_selector(selector) {
            let case_sensitive = tags_case_sensitive(host);
            let name = if case_sensitive {
                selector.to_string()
            } else {
                selector.to_ascii_uppercase()
            };
            return Self::Tag {
                name,
                case_sensitive,
            };
        }
        if let Some(id) = id_selector(selector) {
            return Self::Id(id.to_string());
        }
        Self::Selector(selector.to_string())
    }

    /// Whether `node` satisfies this matcher for a delegate bound to `root`.
    pub fn matches<H: Host>(&self, host: &H, root: &H::Node, node: &H::Node) -> bool {
        match self {
            Self::Root => host.matches_root(root, node),
            Self::Tag {
                name,
                case_sensitive,
            } => host.tag_name(node).is_some_and(|tag| {
                if *case_sensitive {
                    tag == *name
                } else {
                    tag.eq_ignore_ascii_case(name)
                }
            }),
            Self::Id(id) => host.id(node).is_some_and(|own| own == *id),
            Self::Selector(selector) => host.matches_selector(node, selector),
        }
    }
}

fn is_tag_selector(selector: &str) -> bool {
    !selector.is_empty() && selector.bytes().all(|b| b.is_ascii_alphabetic())
}

fn id_selector(selector: &str) -> Option<&str> {
    let id = selector.strip_prefix('#')?;
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    valid.then_some(id)
}
