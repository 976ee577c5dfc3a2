// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end ordering checks across the primitives and resumable events.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use understory_dom::{Event, EventPhase, ListenerOptions};

use crate::fixtures::{click, log, page, push};
use crate::ordering::{Delivery, after_all, after_all_once, before};
use crate::resumable::{ResumableEvent, Resumables, ResumeState};

#[test]
fn before_precedes_plain_listener_on_target() {
    let p = page();
    let log = log();
    before(&p.doc, p.trigger, "click", push(&log, "cbB")).unwrap();
    p.listen(p.trigger, false, &log, "cbP");
    p.doc.fire(p.trigger, &click()).unwrap();
    assert_eq!(*log.borrow(), ["cbB", "cbP"]);
}

#[test]
fn before_completes_before_other_listener_begins() {
    let p = page();
    let state = Rc::new(RefCell::new(Vec::new()));
    let s = state.clone();
    before(&p.doc, p.trigger, "click", move |_| {
        s.borrow_mut().push("enter before");
        s.borrow_mut().push("leave before");
    })
    .unwrap();
    let s = state.clone();
    p.doc
        .add_event_listener(p.trigger, "click", ListenerOptions::BUBBLE, move |_| {
            s.borrow_mut().push("plain");
        })
        .unwrap();
    for _ in 0..3 {
        state.borrow_mut().clear();
        p.doc.fire(p.trigger, &click()).unwrap();
        assert_eq!(*state.borrow(), ["enter before", "leave before", "plain"]);
    }
}

#[test]
fn after_all_waits_for_the_macrotask_boundary() {
    let p = page();
    let log = log();
    after_all(&p.doc, "click", push(&log, "cbA"), Delivery::Deferred).unwrap();
    p.listen(p.trigger, false, &log, "cbX");
    p.listen(p.other, false, &log, "cbY");

    p.doc.fire(p.trigger, &click()).unwrap();
    assert_eq!(*log.borrow(), ["cbX"]);
    assert!(p.doc.run_next_task());
    assert_eq!(*log.borrow(), ["cbX", "cbA"]);
}

#[test]
fn after_all_sees_listeners_added_elsewhere_later() {
    let p = page();
    let log = log();
    after_all(&p.doc, "click", push(&log, "after"), Delivery::Deferred).unwrap();
    for (node, capture) in [(p.body, true), (p.ancestor, false), (p.trigger, true)] {
        p.listen(node, capture, &log, "plain");
    }
    p.doc.fire(p.trigger, &click()).unwrap();
    p.doc.run_until_idle();
    assert_eq!(*log.borrow(), ["plain", "plain", "plain", "after"]);
}

#[test]
fn once_variant_fires_on_exactly_one_occurrence() {
    let p = page();
    let log = log();
    let reg = after_all_once(&p.doc, "click", push(&log, "once"), Delivery::Sync).unwrap();
    for _ in 0..3 {
        p.doc.fire(p.trigger, &click()).unwrap();
    }
    assert_eq!(*log.borrow(), ["once"]);
    assert!(!reg.unbind());
    assert!(!reg.unbind());
}

#[test]
fn pause_then_resume_after_confirmation() {
    let p = page();
    let log = log();
    let r = Resumables::new(&p.doc);
    let held: Rc<RefCell<Option<ResumableEvent>>> = Rc::new(RefCell::new(None));
    {
        let held = held.clone();
        let log = log.clone();
        p.doc
            .add_event_listener(p.ancestor, "click", ListenerOptions::BUBBLE, move |e| {
                let w = r.wrap(e);
                if w.state() == ResumeState::Fresh {
                    log.borrow_mut().push("pausing".into());
                    w.pause();
                    *held.borrow_mut() = Some(w);
                }
            })
            .unwrap();
    }
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = seen.clone();
        p.doc
            .add_event_listener(p.body, "click", ListenerOptions::BUBBLE, move |e: &Event| {
                seen.borrow_mut().push((e.id(), String::from(e.event_type()), e.target()));
            })
            .unwrap();
    }
    p.listen(p.trigger, false, &log, "trigger");

    let evt = click();
    p.doc.fire(p.trigger, &evt).unwrap();
    assert!(evt.default_prevented());
    assert_eq!(evt.event_phase(), EventPhase::None);
    assert_eq!(*log.borrow(), ["trigger", "pausing"]);
    assert!(seen.borrow().is_empty());

    // A second click while the first is paused gets its own wrapper and is held on its own.
    let first = held.borrow().clone().unwrap();
    assert_eq!(first.original(), evt.id());
    let second = click();
    p.doc.fire(p.trigger, &second).unwrap();
    let other = held.borrow().clone().unwrap();
    assert_eq!(other.original(), second.id());
    assert_ne!(other.original(), first.original());
    assert_eq!(first.state(), ResumeState::Paused);
    assert_eq!(other.state(), ResumeState::Paused);
    assert!(seen.borrow().is_empty());
    assert_eq!(*log.borrow(), ["trigger", "pausing", "trigger", "pausing"]);

    assert!(first.resume());
    assert!(!first.resume());
    assert_eq!(other.state(), ResumeState::Paused);
    let seen = seen.borrow().clone();
    assert_eq!(seen.len(), 1);
    assert_ne!(seen[0].0, evt.id());
    assert_eq!(seen[0].1, "click");
    assert_eq!(seen[0].2, Some(p.trigger));
    assert_eq!(
        *log.borrow(),
        ["trigger", "pausing", "trigger", "pausing", "trigger"]
    );
}
