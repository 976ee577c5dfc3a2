// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dom::{Document, Event, ListenerOptions, MouseDetail, NodeId};
use understory_event_order::{
    Bindings, Delivery, Resumables, after, after_all, before, before_all,
};

/// A chain `root > n1 > ... > n_depth` with one listener per phase on every node.
fn gen_chain(depth: usize) -> (Document, NodeId) {
    let doc = Document::new();
    let mut parent = doc.root();
    for _ in 0..depth {
        let n = doc.create_element("div");
        doc.append_child(parent, n).unwrap();
        for options in [ListenerOptions::CAPTURE, ListenerOptions::BUBBLE] {
            doc.add_event_listener(n, "click", options, |e| {
                black_box(e.event_phase());
            })
            .unwrap();
        }
        parent = n;
    }
    (doc, parent)
}

fn click() -> Event {
    Event::mouse("click", MouseDetail::default())
}

fn probe(e: &Event) {
    black_box(e.target());
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for &depth in &[8usize, 32, 128] {
        let (doc, leaf) = gen_chain(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_function(format!("plain_depth{}", depth), |b| {
            b.iter(|| black_box(doc.fire(leaf, &click())))
        });

        let (doc, leaf) = gen_chain(depth);
        let mut bindings = Bindings::new();
        bindings.extend(before_all(&doc, "click", probe));
        bindings.extend(after_all(&doc, "click", probe, Delivery::Sync));
        group.bench_function(format!("ordered_sync_depth{}", depth), |b| {
            b.iter(|| black_box(doc.fire(leaf, &click())))
        });
        bindings.unbind_all();

        let (doc, leaf) = gen_chain(depth);
        let mut bindings = Bindings::new();
        bindings.extend(after_all(&doc, "click", probe, Delivery::Deferred));
        group.bench_function(format!("ordered_deferred_depth{}", depth), |b| {
            b.iter(|| {
                black_box(doc.fire(leaf, &click()));
                doc.run_until_idle()
            })
        });
        bindings.unbind_all();
    }
    group.finish();
}

fn bench_scoped(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoped");
    let (doc, leaf) = gen_chain(32);
    // Many scoped registrations that reject the origin, plus one that admits it.
    let mut bindings = Bindings::new();
    for _ in 0..64 {
        let other = doc.create_element("span");
        doc.append_child(doc.root(), other).unwrap();
        bindings.extend(before(&doc, other, "click", |_| {}));
        bindings.extend(after(&doc, other, "click", |_| {}, Delivery::Sync));
    }
    bindings.extend(before(&doc, leaf, "click", probe));
    group.throughput(Throughput::Elements(bindings.len() as u64));
    group.bench_function("filter_128_registrations", |b| {
        b.iter(|| black_box(doc.fire(leaf, &click())))
    });
    bindings.unbind_all();
    group.finish();
}

fn bench_pause_resume(c: &mut Criterion) {
    let mut group = c.benchmark_group("resumable");
    let (doc, leaf) = gen_chain(32);
    let resumables = Resumables::new(&doc);
    group.bench_function("pause_resume_depth32", |b| {
        b.iter_batched(
            || {
                let e = click();
                doc.fire(leaf, &e).unwrap();
                e
            },
            |e| {
                let w = resumables.wrap(&e);
                w.pause();
                black_box(w.resume())
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_scoped, bench_pause_resume);
criterion_main!(benches);
