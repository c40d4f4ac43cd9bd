// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capture and bubble delegation.
//!
//! Capture-phase handlers run before bubble-phase ones; `focus` and `blur`
//! do not bubble, yet delegated handlers still see them because they are
//! always attached in the capturing phase.
//!
//! Run:
//! - `cargo run -p understory_demos --example delegate_capture`

use std::rc::Rc;

use understory_delegate::{Delegate, Handler, ListenerOptions};
use understory_dom::{Document, DomEvent, NodeId};

fn describe(label: &'static str) -> Handler<DomEvent, NodeId> {
    Handler::new(move |event: &mut DomEvent, node: &NodeId| {
        let note = event.data_as::<&str>().copied().unwrap_or("-");
        println!(
            "{label:<8} {:<6} phase={:?} matched={node:?} note={note}",
            event.event_type(),
            event.phase()
        );
    })
}

fn main() {
    let doc = Document::new();
    let form = doc.append_element(doc.body(), "form").unwrap();
    let name = doc.append_element(form, "input").unwrap();
    doc.set_attribute(name, "name", "name").unwrap();
    let submit = doc.append_element(form, "button").unwrap();

    let delegate = Delegate::new(doc.clone(), Some(doc.body()));
    delegate.on("click", Some("button"), &describe("bubble")).unwrap();
    delegate
        .on_capture("click", Some("form"), &describe("capture"))
        .unwrap();
    delegate
        .on_with(
            "focus blur",
            Some("input[name=name]"),
            &describe("field"),
            ListenerOptions::bubble().with_data(Rc::new("name field")),
        )
        .unwrap();

    for (event_type, capture) in doc.listeners_on(doc.body()) {
        println!("native listener: {event_type} capture={capture}");
    }

    doc.click(submit);
    doc.focus(name);
    doc.focus(submit);
}
