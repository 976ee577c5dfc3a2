// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_event_order --heading-base-level=0

//! Understory Event Order: run a DOM event handler strictly before or after everyone else.
//!
//! ## Overview
//!
//! The host's listener lists give no ordering control beyond registration order. This crate
//! turns two properties the host does guarantee (the document node is reached first in capture
//! and last in bubble, and a queued task runs after all synchronous work) into ordering
//! guarantees that need no cooperation from other listeners.
//!
//! ## Layers
//!
//! - [`bind`](mod@crate::bind): the registration core. One native listener per call, with phase,
//!   optional deferral, one-shot detachment and an admission filter over the event's origin.
//!   Returns a [`Registration`] whose `unbind` is idempotent.
//! - [`ordering`](crate::ordering): [`before`], [`before_all`], [`before_all_once`], [`after`],
//!   [`after_all`], [`after_all_once`], all built on `bind` at the document node.
//! - [`scope`](crate::scope): [`Scope`], the target set a scoped primitive admits.
//! - [`bindings`](crate::bindings): [`Bindings`], an owned group of registrations for
//!   callers that install and tear down a set together.
//! - [`resumable`](crate::resumable): [`Resumables::wrap`] turns an in-flight event into a
//!   [`ResumableEvent`] that can be paused now and replayed at the same target later.
//!
//! ## Failure model
//!
//! Nothing panics across a dispatch. Invalid or redundant calls (double unbind, double pause,
//! resume without pause) are no-ops that report `false`. A registration that cannot be
//! installed returns [`BindRejected`] carrying the caller's argument back.
//!
//! ## Minimal usage
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_dom::{Document, Event, ListenerOptions, MouseDetail};
//! use understory_event_order::{Bindings, Delivery, Resumables, after_all, before_all};
//!
//! let doc = Document::new();
//! let link = doc.create_element("a");
//! doc.append_child(doc.root(), link).unwrap();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let mut bindings = Bindings::new();
//! let l = log.clone();
//! bindings.push(before_all(&doc, "click", move |_| l.borrow_mut().push("first")).unwrap());
//! let l = log.clone();
//! bindings.push(
//!     after_all(&doc, "click", move |_| l.borrow_mut().push("last"), Delivery::Deferred).unwrap(),
//! );
//!
//! // Hold every click on the link until someone confirms.
//! let resumables = Resumables::new(&doc);
//! let held = Rc::new(RefCell::new(None));
//! let (h, l) = (held.clone(), log.clone());
//! doc.add_event_listener(link, "click", ListenerOptions::BUBBLE, move |e| {
//!     l.borrow_mut().push("link");
//!     let w = resumables.wrap(e);
//!     if w.pause() {
//!         *h.borrow_mut() = Some(w);
//!     }
//! })
//! .unwrap();
//!
//! doc.fire(link, &Event::mouse("click", MouseDetail::default())).unwrap();
//! doc.run_until_idle();
//! assert_eq!(*log.borrow(), ["first", "link"]);
//!
//! // Confirmed: the replay runs the whole pipeline, and this time nothing holds it.
//! let paused = held.borrow_mut().take().unwrap();
//! assert!(paused.resume());
//! doc.run_until_idle();
//! assert_eq!(*log.borrow(), ["first", "link", "first", "link", "last"]);
//!
//! assert_eq!(bindings.unbind_all(), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod bind;
pub mod bindings;
pub mod ordering;
pub mod resumable;
pub mod scope;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod scenarios;

pub use bind::{
    BindOptions, BindRejected, Callback, Delay, EventMatch, Filter, Phase, Registration,
    RejectReason, bind, bind_once,
};
pub use bindings::Bindings;
pub use ordering::{
    Delivery, after, after_all, after_all_once, before, before_all, before_all_once,
};
pub use resumable::{EventCloner, ResumableEvent, ResumeState, Resumables};
pub use scope::Scope;
