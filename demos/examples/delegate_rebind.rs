// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegate rebinding.
//!
//! Register handlers while unbound, bind to a root found by selector, move to
//! another root, unbind, and let a handler unregister itself.
//!
//! Run:
//! - `cargo run -p understory_demos --example delegate_rebind`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_delegate::{Delegate, Handler, HostHandler};
use understory_dom::{Document, DomEvent, NodeId};

fn main() {
    let doc = Document::new();
    let left = doc.append_element(doc.body(), "section").unwrap();
    doc.set_attribute(left, "id", "left").unwrap();
    let right = doc.append_element(doc.body(), "section").unwrap();
    doc.set_attribute(right, "id", "right").unwrap();
    let left_button = doc.append_element(left, "button").unwrap();
    let right_button = doc.append_element(right, "button").unwrap();

    let delegate = Delegate::new(doc.clone(), None);
    let clicks = Rc::new(Cell::new(0));
    let c = clicks.clone();
    let on_button = Handler::new(move |_event: &mut DomEvent, _button: &NodeId| {
        c.set(c.get() + 1);
    });
    delegate.on("click", Some("button"), &on_button).unwrap();

    doc.click(left_button);
    println!("unbound: {} clicks", clicks.get());

    delegate.set_root_selector("#left").unwrap();
    doc.click(left_button);
    doc.click(right_button);
    println!("bound to #left: {} clicks", clicks.get());

    delegate.set_root(Some(right));
    doc.click(left_button);
    doc.click(right_button);
    println!("bound to #right: {} clicks", clicks.get());

    delegate.set_root(None);
    doc.click(right_button);
    println!("unbound again: {} clicks", clicks.get());
    assert_eq!(clicks.get(), 2, "only bound clicks are counted");

    // A one-shot handler: removes itself on its first call.
    delegate.set_root(Some(doc.body()));
    let weak = delegate.downgrade();
    let fired = Rc::new(Cell::new(0));
    let me: Rc<RefCell<Option<HostHandler<Document>>>> = Rc::default();
    let (f, m) = (fired.clone(), me.clone());
    let once = Handler::new(move |_event: &mut DomEvent, _section: &NodeId| {
        f.set(f.get() + 1);
        if let (Some(delegate), Some(me)) = (weak.upgrade(), m.borrow().as_ref()) {
            delegate.off(Some("click"), None, Some(me));
        }
    });
    *me.borrow_mut() = Some(once.clone());
    delegate.on("click", Some("section"), &once).unwrap();

    doc.click(left_button);
    doc.click(right_button);
    println!("one-shot fired {} time(s)", fired.get());
    assert_eq!(fired.get(), 1, "one-shot handler fires once");

    delegate.destroy();
    println!("native listeners left: {}", doc.listener_count());
}
