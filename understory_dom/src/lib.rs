// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom --heading-base-level=0

//! Understory DOM: a deterministic, `no_std` host for DOM-style events.
//!
//! ## Overview
//!
//! This crate models the part of a browser that event code talks to: a node tree under a
//! document root, event objects, listener lists per node, two-phase dispatch, default actions,
//! and a macrotask queue driven by a virtual clock. It does not parse HTML or do layout.
//!
//! It exists so that code which depends on exact dispatch semantics (who runs before whom,
//! what survives a `stop_propagation`, when a deferred task runs) can be written and tested
//! against a host whose behavior is fully specified and reproducible.
//!
//! ## Model
//!
//! - [`Document`]: a cheap handle to the tree, listeners, and task queue.
//!   [`WeakDocument`] is the non-owning form for callbacks the document itself stores.
//! - [`NodeId`]: generational node handle; stale handles never alias live nodes.
//! - [`Event`]: a handle to one occurrence. Clones share flags; equality is occurrence identity.
//! - [`HostFeatures`]: capabilities an embedder can switch off to emulate older hosts.
//! - [`Selector`]: a compound selector subset for [`Document::query_all`].
//!
//! ## Dispatch
//!
//! Capture listeners run root → parent, then the origin's capture and bubble listeners, then
//! bubble listeners parent → root if the event bubbles. `stop_propagation` finishes the current
//! node; `stop_immediate_propagation` stops at once. If nothing canceled the event, the innermost
//! default action on the path runs afterwards. See [`document`] for the complete rules.
//!
//! ## Tasks
//!
//! [`Document::set_timeout`] queues work for a later turn. The embedder decides when turns
//! happen with [`Document::run_next_task`], [`Document::advance`] or
//! [`Document::run_until_idle`].
//!
//! ## Minimal usage
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_dom::{Document, Event, ListenerOptions, MouseDetail};
//!
//! let doc = Document::new();
//! let button = doc.create_element("button");
//! doc.append_child(doc.root(), button).unwrap();
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let l = log.clone();
//! doc.add_event_listener(doc.root(), "click", ListenerOptions::CAPTURE, move |_| {
//!     l.borrow_mut().push("document capture");
//! })
//! .unwrap();
//! let l = log.clone();
//! let d = doc.clone();
//! doc.add_event_listener(button, "click", ListenerOptions::BUBBLE, move |_| {
//!     l.borrow_mut().push("button");
//!     let l = l.clone();
//!     d.set_timeout(0, move || l.borrow_mut().push("next turn"));
//! })
//! .unwrap();
//!
//! doc.fire(button, &Event::mouse("click", MouseDetail::default())).unwrap();
//! assert_eq!(*log.borrow(), ["document capture", "button"]);
//! doc.run_until_idle();
//! assert_eq!(*log.borrow(), ["document capture", "button", "next turn"]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod document;
pub mod error;
pub mod event;
pub mod selector;
mod tasks;
pub mod types;

pub use document::{Document, ListenerFn, WeakDocument};
pub use error::DomError;
pub use event::{Event, EventDetail, EventInit, Extensions, KeyboardDetail, MouseDetail};
pub use selector::Selector;
pub use types::{
    EventId, EventPhase, HostFeatures, ListenerId, ListenerOptions, Modifiers, NodeId, TimerId,
};
