// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegate implementation: registration, binding, and the dispatch walk.
//!
//! ## Overview
//!
//! A [`Delegate`] keeps one listener list per (event type, [`Phase`]) and one
//! native listener on its root per non-empty list. When the host delivers a
//! native event to that listener, the delegate walks from the event's
//! effective target up to the root and fires every listener whose selector
//! matches the node being visited.
//!
//! ## Walk
//!
//! 1. An event already marked handled (by this or any other delegate) is ignored.
//! 2. A text-node target is replaced by its parent.
//! 3. At each node, the list length is read once and slots `0..len` are
//!    visited in order. A hole left by a removal is skipped and the pass
//!    goes on with the next slot; only running past the end of the list ends
//!    the pass early.
//! 4. A handler returning [`Outcome::Stop`] marks the event handled, prevents
//!    its default action, and ends the walk.
//! 5. The root is the last node visited; otherwise the walk moves to the
//!    parent element and re-reads the list length.
//!
//! ## Reentrancy
//!
//! Handlers may call [`Delegate::on`], [`Delegate::off`] or
//! [`Delegate::destroy`] on the delegate that is dispatching. While any walk
//! is in progress removals leave holes instead of shifting records, so a
//! record removed mid-walk never fires again and a record that is still
//! present is neither skipped nor fired twice. Holes are compacted when the
//! outermost walk finishes.
//!
//! A walk stays on the list it started with. If a handler empties that list
//! (for example with `off(None, None, None)`) the walk ends, and records
//! registered afterwards under the same key first fire for the next event.
//!
//! Rebinding the root from inside a handler of the same delegate is not
//! supported.

use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::error::DelegateError;
use crate::host::{Host, NativeEvent};
use crate::matcher::Matcher;
use crate::options::DelegateOptions;
use crate::registry::{Listener, ListenerList, Registry};
use crate::types::{Handler, ListenerKey, ListenerOptions, Outcome, Phase};

/// Handler type accepted by a [`Delegate`] over host `H`.
pub type HostHandler<H> = Handler<<H as Host>::Event, <H as Host>::Node>;

struct Inner<H: Host> {
    this: Weak<RefCell<Self>>,
    host: H,
    root: Option<H::Node>,
    registry: Registry<H>,
    options: DelegateOptions,
    walking: usize,
}

impl<H: Host> Inner<H> {
    fn attach_all(&mut self) {
        let Self {
            this,
            host,
            root,
            registry,
            options,
            ..
        } = self;
        let Some(root) = root.as_ref() else {
            return;
        };
        for (key, list) in registry.iter_mut() {
            attach(host, root, options, this, key, list);
        }
    }

    fn detach_all(&mut self) {
        let Self { host, registry, .. } = self;
        for (key, list) in registry.iter_mut() {
            detach(host, key, list);
        }
    }

    fn add(&mut self, key: ListenerKey, listener: Listener<H>) {
        let Self {
            this,
            host,
            root,
            registry,
            options,
            ..
        } = self;
        let (list, _) = registry.entry(key.clone());
        list.push(listener);
        if let Some(root) = root.as_ref() {
            attach(host, root, options, this, &key, list);
        }
    }

    fn remove(
        &mut self,
        key: &ListenerKey,
        selector: Option<&str>,
        handler: Option<&HostHandler<H>>,
    ) {
        let in_walk = self.walking > 0;
        let Some(list) = self.registry.get_mut(key) else {
            return;
        };
        list.remove_matching(selector, handler, in_walk);
        if !list.is_empty() {
            return;
        }
        if let Some(mut list) = self.registry.remove(key) {
            detach(&self.host, key, &mut list);
        }
    }
}

impl<H: Host> Drop for Inner<H> {
    fn drop(&mut self) {
        self.detach_all();
    }
}

fn attach<H: Host>(
    host: &H,
    root: &H::Node,
    options: &DelegateOptions,
    this: &Weak<RefCell<Inner<H>>>,
    key: &ListenerKey,
    list: &mut ListenerList<H>,
) {
    if list.subscription.is_some() {
        return;
    }
    let use_capture = key.phase.is_capture() || options.captures(&key.event_type);
    let listener = NativeListener {
        inner: this.clone(),
        key: key.clone(),
    };
    list.subscription = Some(host.attach(root, &key.event_type, use_capture, listener));
    tracing::debug!(
        event_type = %key.event_type,
        phase = ?key.phase,
        use_capture,
        "attached native listener"
    );
}

fn detach<H: Host>(host: &H, key: &ListenerKey, list: &mut ListenerList<H>) {
    if let Some(subscription) = list.subscription.take() {
        host.detach(subscription);
        tracing::debug!(
            event_type = %key.event_type,
            phase = ?key.phase,
            "detached native listener"
        );
    }
}

fn split_event_types(event_types: &str) -> Result<Vec<&str>, DelegateError> {
    let types: Vec<&str> = event_types.split_ascii_whitespace().collect();
    if types.is_empty() {
        return Err(DelegateError::InvalidEventType(event_types.to_string()));
    }
    Ok(types)
}

/// The native listener a delegate attaches to its root, one per
/// [`ListenerKey`].
///
/// Hosts store it and call [`NativeListener::handle_event`] when the native
/// event reaches the root. It holds the delegate weakly: once every
/// [`Delegate`] handle is dropped it does nothing.
pub struct NativeListener<H: Host> {
    inner: Weak<RefCell<Inner<H>>>,
    key: ListenerKey,
}

impl<H: Host> NativeListener<H> {
    /// The list this listener walks.
    pub fn key(&self) -> &ListenerKey {
        &self.key
    }

    /// Run the delegated walk for `event`.
    pub fn handle_event(&self, event: &mut H::Event) {
        if let Some(inner) = self.inner.upgrade() {
            Delegate { inner }.handle(&self.key, event);
        }
    }
}

impl<H: Host> Clone for NativeListener<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            key: self.key.clone(),
        }
    }
}

impl<H: Host> core::fmt::Debug for NativeListener<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeListener")
            .field("key", &self.key)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Counts a walk in progress; compacts the registry when the outermost walk
/// ends, including by unwinding out of a handler.
struct WalkGuard<'a, H: Host>(&'a RefCell<Inner<H>>);

impl<'a, H: Host> WalkGuard<'a, H> {
    fn enter(inner: &'a RefCell<Inner<H>>) -> Self {
        inner.borrow_mut().walking += 1;
        Self(inner)
    }
}

impl<H: Host> Drop for WalkGuard<'_, H> {
    fn drop(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.walking -= 1;
        if inner.walking == 0 {
            inner.registry.compact();
        }
    }
}

/// Event delegator.
///
/// ## Usage
///
/// - Create with [`Delegate::new`] (optionally unbound) or
///   [`Delegate::with_options`].
/// - Register with [`Delegate::on`], [`Delegate::on_capture`] or
///   [`Delegate::on_with`]; remove with [`Delegate::off`] /
///   [`Delegate::off_phase`].
/// - Move between roots with [`Delegate::set_root`]; tear everything down
///   with [`Delegate::destroy`].
///
/// `Delegate` is a shared handle: clones refer to the same registry, which
/// lets handlers unregister themselves. A handler that captures a strong
/// clone keeps the delegate alive; capture a [`WeakDelegate`] to avoid that.
pub struct Delegate<H: Host> {
    inner: Rc<RefCell<Inner<H>>>,
}

impl<H: Host> Clone for Delegate<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host> core::fmt::Debug for Delegate<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Delegate")
            .field("root", &inner.root)
            .field("keys", &inner.registry.keys())
            .field("walking", &inner.walking)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Delegate<H> {
    /// Create a delegate with default options, bound to `root` if given.
    pub fn new(host: H, root: Option<H::Node>) -> Self {
        Self::with_options(host, root, DelegateOptions::default())
    }

    /// Create a delegate with explicit options.
    pub fn with_options(host: H, root: Option<H::Node>, options: DelegateOptions) -> Self {
        let inner = Rc::new_cyclic(|this| {
            RefCell::new(Inner {
                this: this.clone(),
                host,
                root,
                registry: Registry::new(),
                options,
                walking: 0,
            })
        });
        Self { inner }
    }

    /// A weak handle, for handlers that need to reach their own delegate.
    pub fn downgrade(&self) -> WeakDelegate<H> {
        WeakDelegate {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The host this delegate runs in.
    pub fn host(&self) -> H {
        self.inner.borrow().host.clone()
    }

    /// The current root, `None` while unbound.
    pub fn root(&self) -> Option<H::Node> {
        self.inner.borrow().root.clone()
    }

    /// Register `handler` in the bubble phase for every type in the
    /// space-separated `event_types`, on nodes matching `selector`.
    ///
    /// `None` as selector means the root itself.
    pub fn on(
        &self,
        event_types: &str,
        selector: Option<&str>,
        handler: &HostHandler<H>,
    ) -> Result<&Self, DelegateError> {
        self.on_with(event_types, selector, handler, ListenerOptions::bubble())
    }

    /// Like [`Delegate::on`], in the capture phase.
    pub fn on_capture(
        &self,
        event_types: &str,
        selector: Option<&str>,
        handler: &HostHandler<H>,
    ) -> Result<&Self, DelegateError> {
        self.on_with(event_types, selector, handler, ListenerOptions::capture())
    }

    /// Register with explicit phase and data.
    ///
    /// The first registration for an (event type, phase) attaches a native
    /// listener to the root, if one is bound; otherwise attachment waits for
    /// [`Delegate::set_root`]. Duplicate registrations are kept and fire
    /// independently.
    pub fn on_with(
        &self,
        event_types: &str,
        selector: Option<&str>,
        handler: &HostHandler<H>,
        options: ListenerOptions,
    ) -> Result<&Self, DelegateError> {
        let types = split_event_types(event_types)?;
        let mut inner = self.inner.borrow_mut();
        if let Some(selector) = selector
            && (selector.trim().is_empty() || !inner.host.is_valid_selector(selector))
        {
            return Err(DelegateError::InvalidSelector(selector.to_string()));
        }
        let matcher = Matcher::compile(&inner.host, selector);
        for event_type in types {
            inner.add(
                ListenerKey::new(event_type, options.phase),
                Listener {
                    selector: selector.map(ToString::to_string),
                    handler: handler.clone(),
                    data: options.data.clone(),
                    matcher: matcher.clone(),
                },
            );
        }
        Ok(self)
    }

    /// Remove matching registrations from both phases.
    ///
    /// `event_types` is space-separated, `None` meaning every registered type.
    /// `selector` and `handler` narrow the removal when given. Never fails;
    /// criteria that match nothing leave the delegate unchanged. Emptied lists
    /// detach their native listener.
    pub fn off(
        &self,
        event_types: Option<&str>,
        selector: Option<&str>,
        handler: Option<&HostHandler<H>>,
    ) -> &Self {
        self.remove(event_types, selector, handler, &Phase::ALL)
    }

    /// Like [`Delegate::off`], restricted to one phase.
    pub fn off_phase(
        &self,
        event_types: Option<&str>,
        selector: Option<&str>,
        handler: Option<&HostHandler<H>>,
        phase: Phase,
    ) -> &Self {
        self.remove(event_types, selector, handler, &[phase])
    }

    fn remove(
        &self,
        event_types: Option<&str>,
        selector: Option<&str>,
        handler: Option<&HostHandler<H>>,
        phases: &[Phase],
    ) -> &Self {
        let mut inner = self.inner.borrow_mut();
        let types: Vec<String> = match event_types {
            Some(types) => types.split_ascii_whitespace().map(String::from).collect(),
            None => inner.registry.event_types(),
        };
        for event_type in types {
            for &phase in phases {
                inner.remove(&ListenerKey::new(event_type.clone(), phase), selector, handler);
            }
        }
        self
    }

    /// Move every native listener to `root`, or detach them all with `None`.
    ///
    /// Registrations are untouched; an unbound delegate keeps them until it
    /// is bound again.
    pub fn set_root(&self, root: Option<H::Node>) -> &Self {
        let mut inner = self.inner.borrow_mut();
        inner.detach_all();
        inner.root = root;
        inner.attach_all();
        tracing::debug!(bound = inner.root.is_some(), "delegate root changed");
        self
    }

    /// Bind to the node `selector` resolves to through the host.
    ///
    /// Leaves the current binding in place when nothing matches.
    pub fn set_root_selector(&self, selector: &str) -> Result<&Self, DelegateError> {
        let root = self.host().query_selector(selector);
        match root {
            Some(root) => Ok(self.set_root(Some(root))),
            None => Err(DelegateError::RootNotFound(selector.to_string())),
        }
    }

    /// Remove every registration and unbind. Safe to call repeatedly.
    pub fn destroy(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.detach_all();
        inner.registry.clear();
        inner.root = None;
        tracing::debug!("delegate destroyed");
    }

    /// Live registrations for one event type and phase.
    pub fn listener_count(&self, event_type: &str, phase: Phase) -> usize {
        self.inner
            .borrow()
            .registry
            .get(&ListenerKey::new(event_type, phase))
            .map_or(0, ListenerList::live)
    }

    /// Whether a native listener is attached for one event type and phase.
    pub fn is_attached(&self, event_type: &str, phase: Phase) -> bool {
        self.inner
            .borrow()
            .registry
            .get(&ListenerKey::new(event_type, phase))
            .is_some_and(|list| list.subscription.is_some())
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().registry.is_empty()
    }

    /// Generation and slot count of the list for `key`.
    fn list_state(&self, key: &ListenerKey) -> Option<(u64, usize)> {
        self.inner
            .borrow()
            .registry
            .get(key)
            .map(|list| (list.generation(), list.len()))
    }

    /// `None` once `index` is past the end of the list, or the list is gone or
    /// was recreated since `generation`; `Some(None)` for a hole.
    fn slot(
        &self,
        key: &ListenerKey,
        generation: u64,
        index: usize,
    ) -> Option<Option<Rc<Listener<H>>>> {
        let inner = self.inner.borrow();
        let list = inner
            .registry
            .get(key)
            .filter(|list| list.generation() == generation)?;
        (index < list.len()).then(|| list.get(index))
    }

    fn handle(&self, key: &ListenerKey, event: &mut H::Event) {
        if event.is_handled() {
            tracing::trace!(event_type = %key.event_type, "event already handled");
            return;
        }
        let (host, root, skip_disabled) = {
            let inner = self.inner.borrow();
            let Some(root) = inner.root.clone() else {
                return;
            };
            (
                inner.host.clone(),
                root,
                inner.options.skips_disabled_controls(),
            )
        };
        let Some(target) = event.target() else {
            return;
        };
        let mut target = if host.is_text(&target) {
            host.parent_node(&target)
        } else {
            Some(target)
        };
        if skip_disabled {
            target = target.and_then(|t| start_above_disabled_controls(&host, &root, t));
        }

        let Some((generation, mut len)) = self.list_state(key) else {
            return;
        };
        let _walk = WalkGuard::enter(&self.inner);
        while let Some(node) = target {
            if len == 0 {
                break;
            }
            for index in 0..len {
                let Some(slot) = self.slot(key, generation, index) else {
                    break;
                };
                let Some(listener) = slot else {
                    continue;
                };
                if !listener.matcher.matches(&host, &root, &node) {
                    continue;
                }
                tracing::trace!(
                    event_type = %key.event_type,
                    phase = ?key.phase,
                    selector = ?listener.selector,
                    "firing delegated handler"
                );
                if fire::<H>(event, &node, &listener).is_stop() {
                    event.set_handled();
                    event.prevent_default();
                    tracing::trace!(event_type = %key.event_type, "walk stopped by handler");
                    return;
                }
            }
            if node == root {
                break;
            }
            len = match self.list_state(key) {
                Some((current, len)) if current == generation => len,
                _ => break,
            };
            target = host.parent_element(&node);
        }
    }
}

/// Call `listener` with its data, if any, exposed on `event` for the
/// duration of the call.
fn fire<H: Host>(event: &mut H::Event, target: &H::Node, listener: &Listener<H>) -> Outcome {
    match &listener.data {
        Some(data) => {
            let previous = event.replace_data(Some(Rc::clone(data)));
            let outcome = listener.handler.call(event, target);
            event.replace_data(previous);
            outcome
        }
        None => listener.handler.call(event, target),
    }
}

/// Where the walk starts once disabled form controls are skipped: the parent
/// of the outermost disabled control between `target` and `root`, `target`
/// itself when there is none, and nowhere when the root is disabled.
fn start_above_disabled_controls<H: Host>(
    host: &H,
    root: &H::Node,
    target: H::Node,
) -> Option<H::Node> {
    let mut start = Some(target.clone());
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        if host.is_disabled_control(&node) {
            if node == *root {
                return None;
            }
            start = host.parent_element(&node);
        }
        if node == *root {
            break;
        }
        cursor = host.parent_element(&node);
    }
    start
}

/// Weak counterpart of [`Delegate`].
pub struct WeakDelegate<H: Host> {
    inner: Weak<RefCell<Inner<H>>>,
}

impl<H: Host> WeakDelegate<H> {
    /// The delegate, if any strong handle is still alive.
    pub fn upgrade(&self) -> Option<Delegate<H>> {
        self.inner.upgrade().map(|inner| Delegate { inner })
    }
}

impl<H: Host> Clone for WeakDelegate<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host> core::fmt::Debug for WeakDelegate<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakDelegate")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::{TestEvent, TestHost};
    use alloc::vec;

    type Log = Rc<RefCell<Vec<&'static str>>>;
    type TestHandler = Handler<TestEvent, u32>;

    /// body(root) > div#x > span.item > "text"; body > p#y
    struct Fixture {
        host: TestHost,
        body: u32,
        x: u32,
        span: u32,
        text: u32,
        y: u32,
    }

    fn fixture() -> Fixture {
        let host = TestHost::new();
        let body = host.element(None, "body", Some("app"));
        let x = host.element(Some(body), "div", Some("x"));
        let span = host.element(Some(x), "span", None);
        host.add_class(span, "item");
        let text = host.text(span);
        let y = host.element(Some(body), "p", Some("y"));
        Fixture {
            host,
            body,
            x,
            span,
            text,
            y,
        }
    }

    fn record(log: &Log, name: &'static str) -> TestHandler {
        let log = log.clone();
        Handler::new(move |_e: &mut TestEvent, _t: &u32| log.borrow_mut().push(name))
    }

    fn stopper(log: &Log, name: &'static str) -> TestHandler {
        let log = log.clone();
        Handler::new(move |_e: &mut TestEvent, _t: &u32| {
            log.borrow_mut().push(name);
            false
        })
    }

    #[test]
    fn selectors_do_not_cross_fire() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("click", Some("#x"), &record(&log, "x"))
            .and_then(|d| d.on("click", Some("#y"), &record(&log, "y")))
            .unwrap();

        f.host.dispatch(f.y, "click");
        assert_eq!(*log.borrow(), vec!["y"]);
        log.borrow_mut().clear();

        f.host.dispatch(f.span, "click");
        assert_eq!(*log.borrow(), vec!["x"]);
    }

    #[test]
    fn matched_target_is_the_visited_ancestor() {
        let f = fixture();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let s = seen.clone();
        let h = Handler::new(move |e: &mut TestEvent, t: &u32| s.borrow_mut().push((e.target, *t)));
        d.on("click", Some("div"), &h).unwrap();
        d.on("click", Some(".item"), &h).unwrap();
        d.on("click", None, &h).unwrap();

        f.host.dispatch(f.span, "click");
        assert_eq!(
            *seen.borrow(),
            vec![(f.span, f.span), (f.span, f.x), (f.span, f.body)]
        );
    }

    #[test]
    fn stop_ends_the_walk_at_the_current_target() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("click", Some("#x"), &stopper(&log, "first")).unwrap();
        d.on("click", Some("#x"), &record(&log, "second")).unwrap();
        d.on("click", None, &record(&log, "root")).unwrap();

        let event = f.host.dispatch(f.x, "click");
        assert_eq!(*log.borrow(), vec!["first"]);
        assert!(event.handled);
        assert!(event.prevented);
    }

    #[test]
    fn stop_is_seen_by_other_delegates() {
        let f = fixture();
        let log = Log::default();
        let a = Delegate::new(f.host.clone(), Some(f.body));
        let b = Delegate::new(f.host.clone(), Some(f.body));
        a.on("click", Some("#x"), &stopper(&log, "a")).unwrap();
        b.on("click", Some("#x"), &record(&log, "b")).unwrap();

        f.host.dispatch(f.x, "click");
        assert_eq!(*log.borrow(), vec!["a"]);

        let mut handled = TestEvent::new("click", f.x);
        handled.handled = true;
        f.host.deliver(&mut handled);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn handler_can_remove_itself_mid_walk() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let weak = d.downgrade();
        let slot: Rc<RefCell<Option<TestHandler>>> = Rc::default();
        let (l, s) = (log.clone(), slot.clone());
        let once = Handler::new(move |_e: &mut TestEvent, _t: &u32| {
            l.borrow_mut().push("once");
            if let (Some(d), Some(me)) = (weak.upgrade(), s.borrow().as_ref()) {
                d.off(Some("click"), None, Some(me));
            }
        });
        *slot.borrow_mut() = Some(once.clone());
        d.on("click", Some("span"), &once).unwrap();
        d.on("click", Some("span"), &record(&log, "after")).unwrap();
        d.on("click", Some("div"), &once).unwrap();

        f.host.dispatch(f.span, "click");
        assert_eq!(*log.borrow(), vec!["once", "after"]);
        assert_eq!(d.listener_count("click", Phase::Bubble), 1);

        let key = ListenerKey::new("click", Phase::Bubble);
        assert_eq!(
            d.list_state(&key).map(|(_, len)| len),
            Some(1),
            "holes are compacted after the walk"
        );

        f.host.dispatch(f.span, "click");
        assert_eq!(*log.borrow(), vec!["once", "after", "after"]);
    }

    #[test]
    fn removing_a_later_listener_keeps_it_from_firing() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let victim = record(&log, "victim");
        let weak = d.downgrade();
        let (l, v) = (log.clone(), victim.clone());
        let remover = Handler::new(move |_e: &mut TestEvent, _t: &u32| {
            l.borrow_mut().push("remover");
            if let Some(d) = weak.upgrade() {
                d.off(None, None, Some(&v));
            }
        });
        d.on("click", Some("#x"), &remover).unwrap();
        d.on("click", Some("#x"), &victim).unwrap();
        d.on("click", None, &victim).unwrap();

        f.host.dispatch(f.x, "click");
        assert_eq!(*log.borrow(), vec!["remover"]);
    }

    #[test]
    fn removing_everything_mid_walk_detaches() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let weak = d.downgrade();
        let l = log.clone();
        let nuke = Handler::new(move |_e: &mut TestEvent, _t: &u32| {
            l.borrow_mut().push("nuke");
            if let Some(d) = weak.upgrade() {
                d.off(None, None, None);
            }
        });
        d.on("click", Some("#x"), &nuke).unwrap();
        d.on("click", None, &record(&log, "root")).unwrap();

        f.host.dispatch(f.x, "click");
        assert_eq!(*log.borrow(), vec!["nuke"]);
        assert_eq!(f.host.attached(), 0);
        assert!(d.is_empty());
    }

    #[test]
    fn lists_recreated_mid_walk_wait_for_the_next_event() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let weak = d.downgrade();
        let l = log.clone();
        let fresh = record(&log, "fresh");
        let reset = Handler::new(move |_e: &mut TestEvent, _t: &u32| {
            l.borrow_mut().push("reset");
            if let Some(d) = weak.upgrade() {
                d.off(None, None, None);
                for _ in 0..3 {
                    d.on("click", Some("span"), &fresh).unwrap();
                }
            }
        });
        d.on("click", Some("span"), &reset).unwrap();

        f.host.dispatch(f.span, "click");
        assert_eq!(
            *log.borrow(),
            vec!["reset"],
            "the walk ends with the list it started on"
        );
        assert_eq!(d.listener_count("click", Phase::Bubble), 3);
        assert_eq!(f.host.attached(), 1, "one native listener for the new list");

        log.borrow_mut().clear();
        f.host.dispatch(f.span, "click");
        assert_eq!(
            *log.borrow(),
            vec!["fresh", "fresh", "fresh"],
            "every new record fires for the next event"
        );
    }

    #[test]
    fn destroy_then_register_mid_walk_waits_for_the_next_event() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let weak = d.downgrade();
        let l = log.clone();
        let fresh = record(&log, "fresh");
        let rebuild = Handler::new(move |_e: &mut TestEvent, _t: &u32| {
            l.borrow_mut().push("rebuild");
            if let Some(d) = weak.upgrade() {
                d.destroy();
                d.on("click", None, &fresh).unwrap();
            }
        });
        d.on("click", Some("#x"), &rebuild).unwrap();
        d.on("click", None, &record(&log, "old root")).unwrap();

        f.host.dispatch(f.x, "click");
        assert_eq!(
            *log.borrow(),
            vec!["rebuild"],
            "records registered after destroy do not join the walk"
        );
        assert_eq!(d.listener_count("click", Phase::Bubble), 1);
        assert_eq!(f.host.attached(), 0, "destroy leaves the delegate unbound");
    }

    #[test]
    fn rebinding_moves_native_listeners() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), None);
        d.on("click", Some("span"), &record(&log, "span")).unwrap();
        assert_eq!(f.host.attached(), 0);
        f.host.dispatch(f.span, "click");
        assert!(log.borrow().is_empty());

        d.set_root(Some(f.body));
        f.host.dispatch(f.span, "click");
        assert_eq!(log.borrow().len(), 1);

        d.set_root(None);
        assert_eq!(f.host.attached(), 0);
        f.host.dispatch(f.span, "click");
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(d.listener_count("click", Phase::Bubble), 1);

        d.set_root(Some(f.x));
        assert_eq!(f.host.attachments(), vec![(f.x, String::from("click"), false)]);
        f.host.dispatch(f.span, "click");
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn root_is_the_last_node_visited() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.x));
        d.on("click", Some("body"), &record(&log, "body")).unwrap();
        d.on("click", None, &record(&log, "root")).unwrap();
        f.host.dispatch(f.span, "click");
        assert_eq!(*log.borrow(), vec!["root"]);
    }

    #[test]
    fn destroy_is_idempotent() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("click keydown", Some("#x"), &record(&log, "x"))
            .unwrap();
        d.on_capture("click", None, &record(&log, "root")).unwrap();
        assert_eq!(f.host.attached(), 3);

        d.off(None, None, None).off(None, None, None);
        assert_eq!(f.host.attached(), 0);
        d.on("click", Some("#x"), &record(&log, "x")).unwrap();
        assert_eq!(f.host.attached(), 1);

        d.destroy();
        d.destroy();
        assert_eq!(f.host.attached(), 0);
        assert!(d.is_empty());
        assert_eq!(d.root(), None);
        f.host.dispatch(f.x, "click");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn text_targets_resolve_to_their_parent() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("click", Some("#x"), &record(&log, "x")).unwrap();
        d.on("click", Some("span"), &record(&log, "span")).unwrap();
        f.host.dispatch(f.text, "click");
        assert_eq!(*log.borrow(), vec!["span", "x"]);
    }

    #[test]
    fn capture_runs_before_bubble() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("click", Some("#x"), &record(&log, "bubble")).unwrap();
        d.on_capture("click", Some("#x"), &record(&log, "capture"))
            .unwrap();
        f.host.dispatch(f.x, "click");
        assert_eq!(*log.borrow(), vec!["capture", "bubble"]);
        assert_eq!(d.listener_count("click", Phase::Capture), 1);
        assert!(d.is_attached("click", Phase::Capture));
    }

    #[test]
    fn off_can_target_one_phase() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let h = record(&log, "h");
        d.on("click", None, &h).unwrap();
        d.on_capture("click", None, &h).unwrap();
        d.off_phase(Some("click"), None, Some(&h), Phase::Capture);
        assert_eq!(d.listener_count("click", Phase::Capture), 0);
        assert!(!d.is_attached("click", Phase::Capture));
        assert_eq!(d.listener_count("click", Phase::Bubble), 1);
        d.off(Some("click"), Some("#nope"), None);
        assert_eq!(d.listener_count("click", Phase::Bubble), 1);
        d.off(Some("click"), None, Some(&h));
        assert_eq!(f.host.attached(), 0);
    }

    #[test]
    fn always_capture_types_attach_with_capture() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("focus blur click", Some("#x"), &record(&log, "x"))
            .unwrap();
        let mut attachments = f.host.attachments();
        attachments.sort();
        assert_eq!(
            attachments,
            vec![
                (f.body, String::from("blur"), true),
                (f.body, String::from("click"), false),
                (f.body, String::from("focus"), true),
            ]
        );
        f.host.dispatch(f.x, "focus");
        assert_eq!(*log.borrow(), vec!["x"]);

        let plain = Delegate::with_options(
            f.host.clone(),
            Some(f.y),
            DelegateOptions::default().with_capture_types(["load"]),
        );
        plain.on("focus", None, &record(&log, "y")).unwrap();
        assert!(f.host.attachments().contains(&(f.y, "focus".into(), false)));
    }

    #[test]
    fn data_is_scoped_to_its_handler() {
        let f = fixture();
        let seen: Rc<RefCell<Vec<Option<u32>>>> = Rc::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let s = seen.clone();
        let h = Handler::new(move |e: &mut TestEvent, _t: &u32| {
            let value = e.data.as_ref().and_then(|d| d.downcast_ref::<u32>().copied());
            s.borrow_mut().push(value);
        });
        d.on_with(
            "click",
            Some("#x"),
            &h,
            ListenerOptions::bubble().with_data(Rc::new(7_u32)),
        )
        .unwrap();
        d.on("click", None, &h).unwrap();

        let event = f.host.dispatch(f.x, "click");
        assert_eq!(*seen.borrow(), vec![Some(7), None]);
        assert!(event.data.is_none());
    }

    #[test]
    fn invalid_registrations_are_rejected() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        let h = record(&log, "h");
        assert_eq!(
            d.on("  ", None, &h).err(),
            Some(DelegateError::InvalidEventType("  ".into()))
        );
        assert_eq!(
            d.on("click", Some(" "), &h).err(),
            Some(DelegateError::InvalidSelector(" ".into()))
        );
        assert_eq!(
            d.on("click", Some("a!!b"), &h).err(),
            Some(DelegateError::InvalidSelector("a!!b".into()))
        );
        assert!(d.is_empty());
        assert_eq!(f.host.attached(), 0);
    }

    #[test]
    fn root_can_be_given_as_a_selector() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), None);
        d.on("click", Some("span"), &record(&log, "span")).unwrap();
        assert_eq!(
            d.set_root_selector("#missing").err(),
            Some(DelegateError::RootNotFound("#missing".into()))
        );
        assert_eq!(d.root(), None);
        d.set_root_selector("#x").unwrap();
        assert_eq!(d.root(), Some(f.x));
        f.host.dispatch(f.span, "click");
        assert_eq!(*log.borrow(), vec!["span"]);
    }

    #[test]
    fn disabled_controls_can_be_skipped() {
        let f = fixture();
        f.host.set_disabled(f.x);
        let log = Log::default();
        let d = Delegate::with_options(
            f.host.clone(),
            Some(f.body),
            DelegateOptions::default().skip_disabled_controls(true),
        );
        d.on("click", Some("span"), &record(&log, "span")).unwrap();
        d.on("click", Some("#x"), &record(&log, "x")).unwrap();
        d.on("click", None, &record(&log, "root")).unwrap();
        f.host.dispatch(f.text, "click");
        assert_eq!(*log.borrow(), vec!["root"]);

        log.borrow_mut().clear();
        let lenient = Delegate::new(f.host.clone(), Some(f.x));
        lenient.on("click", Some("span"), &record(&log, "span")).unwrap();
        d.destroy();
        f.host.dispatch(f.span, "click");
        assert_eq!(*log.borrow(), vec!["span"]);
    }

    #[test]
    fn dropping_the_last_handle_detaches() {
        let f = fixture();
        let log = Log::default();
        let d = Delegate::new(f.host.clone(), Some(f.body));
        d.on("click", None, &record(&log, "root")).unwrap();
        let weak = d.downgrade();
        assert_eq!(f.host.attached(), 1);
        drop(d);
        assert!(weak.upgrade().is_none());
        assert_eq!(f.host.attached(), 0);
    }
}
