// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegate basics.
//!
//! Register one handler for every list item, add items afterwards, click them,
//! and stop the walk from a handler.
//!
//! Run:
//! - `cargo run -p understory_demos --example delegate_basics`

use std::cell::RefCell;
use std::rc::Rc;

use understory_delegate::{Delegate, Handler};
use understory_dom::{Document, DomEvent, NodeId};

fn main() {
    let doc = Document::new();
    let list = doc.append_element(doc.body(), "ul").unwrap();
    doc.set_attribute(list, "id", "todo").unwrap();

    let delegate = Delegate::new(doc.clone(), Some(list));
    let log = Rc::new(RefCell::new(Vec::new()));

    // One handler for every <li>, including ones created later.
    let l = log.clone();
    let d = doc.clone();
    let on_item = Handler::new(move |_event: &mut DomEvent, item: &NodeId| {
        let label = d.get_attribute(*item, "data-label").unwrap_or_default();
        l.borrow_mut().push(format!("item {label}"));
    });
    delegate.on("click", Some("li"), &on_item).unwrap();

    // Done items swallow the click: returning false stops the walk.
    let l = log.clone();
    let on_done = Handler::new(move |_event: &mut DomEvent, _item: &NodeId| {
        l.borrow_mut().push("done item, stopping".to_string());
        false
    });
    delegate.on("click", Some("li.done"), &on_done).unwrap();

    // Root-only handler sees every click that gets that far.
    let l = log.clone();
    let on_list = Handler::new(move |_event: &mut DomEvent, _list: &NodeId| {
        l.borrow_mut().push("list".to_string());
    });
    delegate.on("click", None, &on_list).unwrap();

    let mut items = Vec::new();
    for label in ["milk", "eggs", "bread"] {
        let item = doc.append_element(list, "li").unwrap();
        doc.set_attribute(item, "data-label", label).unwrap();
        doc.append_child(item, doc.create_text(label)).unwrap();
        items.push(item);
    }
    doc.set_attribute(items[1], "class", "done").unwrap();

    for &item in &items {
        let event = doc.click(item).unwrap();
        println!(
            "clicked {:?}: handled={} default_prevented={}",
            doc.get_attribute(item, "data-label"),
            event.handled(),
            event.default_prevented()
        );
    }

    for line in log.borrow().iter() {
        println!("{line}");
    }
    assert_eq!(
        *log.borrow(),
        [
            "item milk",
            "list",
            "item eggs",
            "done item, stopping",
            "item bread",
            "list",
        ],
        "the done item stops before the list handler"
    );
}
