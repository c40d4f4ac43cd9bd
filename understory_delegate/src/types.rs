// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for delegation: phases, outcomes, handlers, listener keys, and event data.
//!
//! ## Overview
//!
//! These types describe the delegation protocol shared by the
//! [`Delegate`](crate::delegate::Delegate) and the host environment.

use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;

/// Registration phase of a delegated listener.
///
/// Each phase gets its own native listener on the root and its own listener
/// list; the host's native delivery order decides which one runs first.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Phase {
    /// Observed while the native event travels root→target.
    Capture,
    /// Observed while the native event travels target→root.
    #[default]
    Bubble,
}

impl Phase {
    /// Both phases, capture first.
    pub const ALL: [Self; 2] = [Self::Capture, Self::Bubble];

    /// Returns `true` for [`Phase::Capture`].
    #[inline]
    pub const fn is_capture(self) -> bool {
        matches!(self, Self::Capture)
    }
}

/// Handler outcome controlling propagation.
///
/// Returning [`Outcome::Stop`] ends the current walk, marks the native event
/// as handled so no other delegate processes it, and prevents its default
/// action.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Outcome {
    /// Keep calling matching handlers.
    #[default]
    Continue,
    /// Stop this walk and every other delegate observing the same event.
    Stop,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Stop`].
    #[inline]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Conversion of a handler's return value into an [`Outcome`].
///
/// - `()` → [`Outcome::Continue`]
/// - `bool` → `false` stops, `true` continues
/// - `Option<bool>` → only `Some(false)` stops
/// - [`Outcome`] → as is
pub trait IntoOutcome {
    /// Convert the returned value into a continuation signal.
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    #[inline]
    fn into_outcome(self) -> Outcome {
        Outcome::Continue
    }
}

impl IntoOutcome for bool {
    #[inline]
    fn into_outcome(self) -> Outcome {
        if self {
            Outcome::Continue
        } else {
            Outcome::Stop
        }
    }
}

impl IntoOutcome for Option<bool> {
    #[inline]
    fn into_outcome(self) -> Outcome {
        match self {
            Some(false) => Outcome::Stop,
            Some(true) | None => Outcome::Continue,
        }
    }
}

impl IntoOutcome for Outcome {
    #[inline]
    fn into_outcome(self) -> Outcome {
        self
    }
}

/// Opaque per-listener payload exposed on the event while that listener runs.
pub type EventData = Rc<dyn Any>;

type HandlerFn<E, N> = dyn Fn(&mut E, &N) -> Outcome;

/// A shared event handler.
///
/// The second argument is the node that matched the listener's selector (the
/// element the handler is "about"), not necessarily the native event target.
///
/// Handlers are compared by identity: clones of one `Handler` are the same
/// handler for [`Delegate::off`](crate::delegate::Delegate::off), two handlers
/// built from identical closures are not.
pub struct Handler<E, N>(Rc<HandlerFn<E, N>>);

impl<E: 'static, N: 'static> Handler<E, N> {
    /// Wrap a closure. Its return value is converted with [`IntoOutcome`].
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&mut E, &N) -> R + 'static,
        R: IntoOutcome,
    {
        Self(Rc::new(move |event: &mut E, target: &N| {
            f(event, target).into_outcome()
        }))
    }
}

impl<E, N> Handler<E, N> {
    /// Invoke the handler.
    #[inline]
    pub fn call(&self, event: &mut E, target: &N) -> Outcome {
        (self.0)(event, target)
    }

    /// Returns `true` if both handles refer to the same handler.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl<E, N> Clone for Handler<E, N> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E, N> PartialEq for Handler<E, N> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<E, N> Eq for Handler<E, N> {}

impl<E, N> core::fmt::Debug for Handler<E, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Handler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Key of a listener list: one native listener exists per key while the list
/// is non-empty and a root is bound.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ListenerKey {
    /// Single event type, e.g. `"click"`.
    pub event_type: String,
    /// Registration phase.
    pub phase: Phase,
}

impl ListenerKey {
    /// Create a key.
    pub fn new(event_type: impl Into<String>, phase: Phase) -> Self {
        Self {
            event_type: event_type.into(),
            phase,
        }
    }
}

/// Per-registration options for [`Delegate::on_with`](crate::delegate::Delegate::on_with).
#[derive(Clone, Default)]
pub struct ListenerOptions {
    /// Phase to register in.
    pub phase: Phase,
    /// Payload exposed through [`NativeEvent::replace_data`](crate::host::NativeEvent::replace_data)
    /// while the handler runs.
    pub data: Option<EventData>,
}

impl ListenerOptions {
    /// Bubble-phase registration without data.
    pub fn bubble() -> Self {
        Self::default()
    }

    /// Capture-phase registration without data.
    pub fn capture() -> Self {
        Self {
            phase: Phase::Capture,
            data: None,
        }
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = Some(data);
        self
    }
}

impl core::fmt::Debug for ListenerOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("phase", &self.phase)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
