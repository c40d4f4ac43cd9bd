// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener storage.
//!
//! ## Layout
//!
//! One [`ListenerList`] per [`ListenerKey`], kept in insertion order. A list is
//! a slot vector: removing a record while a walk is in progress leaves a hole
//! (`None`) so indices held by the walk stay valid; holes are compacted away
//! once no walk is running. A key is present only while its list holds at
//! least one live record.
//!
//! Every list carries a generation, unique within its registry. A list that
//! is torn down and recreated under the same key gets a new generation, so a
//! walk can tell it apart from the list it started on.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::host::Host;
use crate::matcher::Matcher;
use crate::types::{EventData, Handler, ListenerKey};

/// One registration.
pub(crate) struct Listener<H: Host> {
    pub(crate) selector: Option<String>,
    pub(crate) handler: Handler<H::Event, H::Node>,
    pub(crate) data: Option<EventData>,
    pub(crate) matcher: Matcher,
}

impl<H: Host> Listener<H> {
    fn is_match(
        &self,
        selector: Option<&str>,
        handler: Option<&Handler<H::Event, H::Node>>,
    ) -> bool {
        selector.is_none_or(|s| self.selector.as_deref() == Some(s))
            && handler.is_none_or(|h| self.handler.ptr_eq(h))
    }
}

/// Ordered records for one key, plus the native hookup for that key.
pub(crate) struct ListenerList<H: Host> {
    slots: Vec<Option<Rc<Listener<H>>>>,
    live: usize,
    generation: u64,
    pub(crate) subscription: Option<H::Subscription>,
}

impl<H: Host> ListenerList<H> {
    fn new(generation: u64) -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            generation,
            subscription: None,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn push(&mut self, listener: Listener<H>) {
        self.slots.push(Some(Rc::new(listener)));
        self.live += 1;
    }

    /// Slot count, holes included.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Live record count.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Record at `index`; `None` for holes and out-of-range indices.
    pub(crate) fn get(&self, index: usize) -> Option<Rc<Listener<H>>> {
        self.slots.get(index).cloned().flatten()
    }

    /// Remove every record matching the supplied criteria (absent criteria
    /// are wildcards). With `in_walk`, removed records become holes.
    pub(crate) fn remove_matching(
        &mut self,
        selector: Option<&str>,
        handler: Option<&Handler<H::Event, H::Node>>,
        in_walk: bool,
    ) -> usize {
        let before = self.live;
        if in_walk {
            for slot in &mut self.slots {
                if slot.as_ref().is_some_and(|l| l.is_match(selector, handler)) {
                    *slot = None;
                    self.live -= 1;
                }
            }
        } else {
            self.slots.retain(|slot| {
                slot.as_ref()
                    .is_some_and(|l| !l.is_match(selector, handler))
            });
            self.live = self.slots.len();
        }
        before - self.live
    }

    /// Drop holes left by removals during a walk.
    pub(crate) fn compact(&mut self) {
        self.slots.retain(Option::is_some);
    }
}

/// The listener map of one delegate.
pub(crate) struct Registry<H: Host> {
    lists: BTreeMap<ListenerKey, ListenerList<H>>,
    next_generation: u64,
}

impl<H: Host> Registry<H> {
    pub(crate) fn new() -> Self {
        Self {
            lists: BTreeMap::new(),
            next_generation: 0,
        }
    }

    pub(crate) fn get(&self, key: &ListenerKey) -> Option<&ListenerList<H>> {
        self.lists.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ListenerKey) -> Option<&mut ListenerList<H>> {
        self.lists.get_mut(key)
    }

    /// The list for `key`, created empty if missing. The flag reports creation.
    pub(crate) fn entry(&mut self, key: ListenerKey) -> (&mut ListenerList<H>, bool) {
        let created = !self.lists.contains_key(&key);
        if created {
            self.next_generation += 1;
        }
        let generation = self.next_generation;
        (
            self.lists
                .entry(key)
                .or_insert_with(|| ListenerList::new(generation)),
            created,
        )
    }

    pub(crate) fn remove(&mut self, key: &ListenerKey) -> Option<ListenerList<H>> {
        self.lists.remove(key)
    }

    pub(crate) fn keys(&self) -> Vec<ListenerKey> {
        self.lists.keys().cloned().collect()
    }

    /// Distinct registered event types, in key order.
    pub(crate) fn event_types(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for key in self.lists.keys() {
            if out.last() != Some(&key.event_type) {
                out.push(key.event_type.clone());
            }
        }
        out
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ListenerKey, &mut ListenerList<H>)> {
        self.lists.iter_mut()
    }

    /// Drop every list. Generations keep counting.
    pub(crate) fn clear(&mut self) {
        self.lists.clear();
    }

    pub(crate) fn compact(&mut self) {
        for list in self.lists.values_mut() {
            list.compact();
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}
