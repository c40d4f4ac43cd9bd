// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegated dispatch costs against the in-memory document.
//!
//! Run:
//! - `cargo bench -p understory_benches --bench dispatch`

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_delegate::{Delegate, DelegateOptions, Handler, HostHandler};
use understory_dom::{Document, DomEvent, EventFlags, NodeId};

fn counting_handler(hits: &Rc<Cell<u64>>) -> HostHandler<Document> {
    let hits = hits.clone();
    Handler::new(move |_event: &mut DomEvent, _node: &NodeId| {
        hits.set(hits.get() + 1);
    })
}

/// A chain of `depth` nested `div`s under body; returns the innermost one.
fn deep_chain(doc: &Document, depth: usize) -> NodeId {
    let mut node = doc.body();
    for i in 0..depth {
        let Ok(child) = doc.append_element(node, "div") else {
            break;
        };
        if i % 2 == 0 {
            let _ = doc.set_attribute(child, "class", "even");
        }
        node = child;
    }
    node
}

fn bench_walk_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_depth");
    for &depth in &[4_usize, 32, 128] {
        let doc = Document::new();
        let leaf = deep_chain(&doc, depth);
        let hits = Rc::new(Cell::new(0));
        let delegate = Delegate::new(doc.clone(), Some(doc.body()));
        delegate
            .on("click", Some("div"), &counting_handler(&hits))
            .ok();
        delegate
            .on("keydown", Some("div.even > div"), &counting_handler(&hits))
            .ok();
        group.bench_function(format!("tag_matcher_depth{}", depth), |b| {
            b.iter(|| black_box(doc.click(leaf)));
        });
        group.bench_function(format!("selector_matcher_depth{}", depth), |b| {
            b.iter(|| {
                black_box(doc.dispatch(
                    leaf,
                    "keydown",
                    EventFlags::BUBBLES | EventFlags::CANCELABLE,
                ))
            });
        });
        black_box(hits.get());
    }
    group.finish();
}

fn bench_many_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_listeners");
    for &count in &[1_usize, 16, 256] {
        let doc = Document::new();
        let leaf = deep_chain(&doc, 8);
        let _ = doc.set_attribute(leaf, "id", "leaf");
        let hits = Rc::new(Cell::new(0));
        let delegate = Delegate::new(doc.clone(), Some(doc.body()));
        for i in 0..count {
            let selector = if i % 2 == 0 { "#leaf" } else { "span" };
            delegate
                .on("click", Some(selector), &counting_handler(&hits))
                .ok();
        }
        group.bench_function(format!("id_and_tag_n{}", count), |b| {
            b.iter(|| black_box(doc.click(leaf)));
        });
    }
    group.finish();
}

fn bench_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("register");
    let hits = Rc::new(Cell::new(0));
    let handler = counting_handler(&hits);
    group.bench_function("on_off_256", |b| {
        b.iter_batched(
            || {
                let doc = Document::new();
                let delegate = Delegate::with_options(
                    doc.clone(),
                    Some(doc.body()),
                    DelegateOptions::default(),
                );
                (doc, delegate)
            },
            |(doc, delegate)| {
                for _ in 0..256 {
                    delegate.on("click focus", Some("li"), &handler).ok();
                }
                delegate.off(Some("click"), Some("li"), Some(&handler));
                black_box(doc.listener_count());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_walk_depth,
    bench_many_listeners,
    bench_register
);
criterion_main!(benches);
