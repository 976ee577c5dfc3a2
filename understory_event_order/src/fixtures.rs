// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared test page and call log.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use understory_dom::{Document, Event, ListenerOptions, MouseDetail, NodeId};

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// A callback that appends `msg` to `log`.
pub(crate) fn push(log: &Log, msg: &str) -> impl Fn(&Event) + 'static {
    let log = log.clone();
    let msg = msg.to_string();
    move |_| log.borrow_mut().push(msg.clone())
}

pub(crate) fn click() -> Event {
    Event::mouse("click", MouseDetail::default())
}

/// `document > body > ancestor > trigger`, plus `body > other`.
pub(crate) struct Page {
    pub(crate) doc: Document,
    pub(crate) body: NodeId,
    pub(crate) ancestor: NodeId,
    pub(crate) trigger: NodeId,
    pub(crate) other: NodeId,
}

pub(crate) fn page() -> Page {
    let doc = Document::new();
    let body = doc.create_element("body");
    let ancestor = doc.create_element("div");
    let trigger = doc.create_element("a");
    let other = doc.create_element("a");
    doc.append_child(doc.root(), body).unwrap();
    doc.append_child(body, ancestor).unwrap();
    doc.append_child(ancestor, trigger).unwrap();
    doc.append_child(body, other).unwrap();
    doc.set_id(trigger, "trigger").unwrap();
    doc.set_id(other, "other").unwrap();
    Page {
        doc,
        body,
        ancestor,
        trigger,
        other,
    }
}

impl Page {
    /// Plain listener that logs `msg`.
    pub(crate) fn listen(&self, node: NodeId, capture: bool, log: &Log, msg: &str) {
        self.doc
            .add_event_listener(node, "click", ListenerOptions::capture(capture), push(log, msg))
            .unwrap();
    }
}
