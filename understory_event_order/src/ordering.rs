// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordering primitives: run a callback before or after every other listener.
//!
//! ## How the guarantees arise
//!
//! Every primitive installs exactly one listener on the document node.
//!
//! - `before*` listens in the capture phase at the root. Nothing is reached earlier in a
//!   dispatch, so the callback precedes every bubble listener anywhere and every capture
//!   listener below the root.
//! - `after*` listens in the bubble phase at the root, which is reached last. With
//!   [`Delivery::Deferred`] (the default) the callback additionally moves to the next task, so
//!   it also follows everything the dispatch did synchronously, including nested dispatches.
//!
//! [`Delivery::Sync`] trades the stronger guarantee for running inside the dispatch, which is
//! the only way to still cancel the default action.
//!
//! | Primitive | Phase | Delivery | Admits |
//! |---|---|---|---|
//! | [`before`] | capture | sync | origin in scope |
//! | [`before_all`] / [`before_all_once`] | capture | sync | everything |
//! | [`after`] | bubble | deferred or sync | origin in scope |
//! | [`after_all`] / [`after_all_once`] | bubble | deferred or sync | everything |
//!
//! ## Limits
//!
//! Capture listeners already on the document node and registered earlier still run first.
//! A root bubble listener never sees events that do not bubble, unless they are dispatched
//! at the document node itself.
//!
//! ## Minimal example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_dom::{Document, Event, ListenerOptions, MouseDetail};
//! use understory_event_order::{after_all, before, Delivery};
//!
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! doc.append_child(doc.root(), button).unwrap();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let l = log.clone();
//! doc.add_event_listener(button, "click", ListenerOptions::BUBBLE, move |_| {
//!     l.borrow_mut().push("plain");
//! })
//! .unwrap();
//! let l = log.clone();
//! before(&doc, button, "click", move |_| l.borrow_mut().push("before")).unwrap();
//! let l = log.clone();
//! after_all(&doc, "click", move |_| l.borrow_mut().push("after"), Delivery::Deferred).unwrap();
//!
//! doc.fire(button, &Event::mouse("click", MouseDetail::default())).unwrap();
//! doc.run_until_idle();
//! assert_eq!(*log.borrow(), ["before", "plain", "after"]);
//! ```

use alloc::rc::Rc;

use understory_dom::{Document, Event};

use crate::bind::{BindOptions, BindRejected, Delay, EventMatch, Registration, bind};
use crate::scope::Scope;

/// How an `after*` callback is delivered.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Delivery {
    /// On the next task, after all synchronous work of the dispatch.
    #[default]
    Deferred,
    /// Inside the dispatch, at the root's bubble step.
    Sync,
}

impl Delivery {
    fn delay(self) -> Delay {
        match self {
            Self::Deferred => Delay::Deferred(0),
            Self::Sync => Delay::Immediate,
        }
    }
}

fn scoped(options: BindOptions, scope: Scope) -> BindOptions {
    options.filter(move |_, origin| scope.contains(origin))
}

/// Run `callback` before the bubble listeners of events whose origin is in `scope`.
pub fn before(
    doc: &Document,
    scope: impl Into<Scope>,
    event_type: &str,
    callback: impl Fn(&Event) + 'static,
) -> Result<Registration, BindRejected> {
    bind(
        doc,
        doc.root(),
        event_type,
        Some(Rc::new(callback)),
        scoped(BindOptions::default().capture(), scope.into()),
    )
}

/// Run `callback` before the bubble listeners of every matching event in the document.
pub fn before_all(
    doc: &Document,
    matcher: impl Into<EventMatch>,
    callback: impl Fn(&Event) + 'static,
) -> Result<Registration, BindRejected> {
    bind(
        doc,
        doc.root(),
        matcher,
        Some(Rc::new(callback)),
        BindOptions::default().capture(),
    )
}

/// [`before_all`] for a single occurrence; detaches afterwards.
pub fn before_all_once(
    doc: &Document,
    matcher: impl Into<EventMatch>,
    callback: impl Fn(&Event) + 'static,
) -> Result<Registration, BindRejected> {
    bind(
        doc,
        doc.root(),
        matcher,
        Some(Rc::new(callback)),
        BindOptions::default().capture().once(),
    )
}

/// Run `callback` after every other listener for events whose origin is in `scope`.
pub fn after(
    doc: &Document,
    scope: impl Into<Scope>,
    event_type: &str,
    callback: impl Fn(&Event) + 'static,
    delivery: Delivery,
) -> Result<Registration, BindRejected> {
    let options = BindOptions {
        delay: delivery.delay(),
        ..BindOptions::default()
    };
    bind(
        doc,
        doc.root(),
        event_type,
        Some(Rc::new(callback)),
        scoped(options, scope.into()),
    )
}

/// Run `callback` after every other listener for every matching event in the document.
pub fn after_all(
    doc: &Document,
    matcher: impl Into<EventMatch>,
    callback: impl Fn(&Event) + 'static,
    delivery: Delivery,
) -> Result<Registration, BindRejected> {
    let options = BindOptions {
        delay: delivery.delay(),
        ..BindOptions::default()
    };
    bind(doc, doc.root(), matcher, Some(Rc::new(callback)), options)
}

/// [`after_all`] for a single occurrence; detaches afterwards.
pub fn after_all_once(
    doc: &Document,
    matcher: impl Into<EventMatch>,
    callback: impl Fn(&Event) + 'static,
    delivery: Delivery,
) -> Result<Registration, BindRejected> {
    let options = BindOptions {
        delay: delivery.delay(),
        once: true,
        ..BindOptions::default()
    };
    bind(doc, doc.root(), matcher, Some(Rc::new(callback)), options)
}
