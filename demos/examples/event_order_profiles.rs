// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordering profiles.
//!
//! Builds a small page with capture and bubble loggers on the body, an ancestor and a link,
//! then clicks the link once per profile. Each profile adds one ordering primitive on top of
//! the loggers, so the printed call order shows exactly where it lands.
//!
//! Run:
//! - `cargo run -p understory_demos --example event_order_profiles`
//! - `RUST_LOG` is not consulted; library debug events are always shown.

use std::cell::RefCell;
use std::rc::Rc;

use tracing_subscriber::filter::LevelFilter;
use understory_dom::{Document, Event, MouseDetail, NodeId};
use understory_event_order::{
    BindOptions, Bindings, Delivery, after, after_all, before, before_all_once, bind,
};

type Log = Rc<RefCell<Vec<String>>>;

struct Page {
    doc: Document,
    body: NodeId,
    trigger: NodeId,
    log: Log,
    handlers: Bindings,
}

impl Page {
    fn new() -> Self {
        let doc = Document::new();
        let body = doc.create_element("body");
        let ancestor = doc.create_element("div");
        let trigger = doc.create_element("a");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, ancestor).unwrap();
        doc.append_child(ancestor, trigger).unwrap();
        doc.set_attribute(ancestor, "data-type", "ancestor").unwrap();
        doc.set_attribute(trigger, "data-type", "local").unwrap();
        doc.set_attribute(trigger, "data-inscope", "").unwrap();
        doc.set_id(trigger, "trigger").unwrap();

        let log: Log = Rc::default();
        let l = log.clone();
        doc.set_default_action(trigger, "click", move |_| {
            l.borrow_mut().push("(default) follow link".into());
        })
        .unwrap();

        Self {
            doc,
            body,
            trigger,
            log,
            handlers: Bindings::new(),
        }
    }

    fn say(&self, msg: impl Into<String>) -> impl Fn(&Event) + 'static {
        let log = self.log.clone();
        let msg = msg.into();
        move |_| log.borrow_mut().push(msg.clone())
    }

    /// Capture and bubble loggers that only report clicks on in-scope elements.
    fn install_loggers(&mut self) {
        let mut targets = vec![(self.body, "body".to_string())];
        for node in self.doc.query_selector_all("[data-type^=ancestor]").unwrap() {
            targets.push((node, self.doc.attribute(node, "data-type").unwrap_or_default()));
        }
        for node in self.doc.query_selector_all("a[data-type]").unwrap() {
            targets.push((node, self.doc.attribute(node, "data-type").unwrap_or_default()));
        }

        for (node, name) in targets {
            for (options, arrow) in [
                (BindOptions::default().bubble(), '↑'),
                (BindOptions::default().capture(), '↓'),
            ] {
                let doc = self.doc.downgrade();
                let say = self.say(format!("[{arrow}] {name}"));
                let options = options.filter(move |_, origin| {
                    doc.upgrade()
                        .is_some_and(|d| d.has_attribute(origin, "data-inscope"))
                });
                let reg = bind(&self.doc, node, "click", Some(Rc::new(say)), options).unwrap();
                self.handlers.push(reg);
            }
        }
    }

    fn reset(&mut self) {
        self.handlers.unbind_all();
        self.log.borrow_mut().clear();
    }

    fn click(&self) {
        let e = Event::mouse("click", MouseDetail::default());
        self.doc.fire(self.trigger, &e).unwrap();
        self.doc.run_until_idle();
    }
}

type Profile = fn(&Page) -> Bindings;

const PROFILES: &[(&str, Profile)] = &[
    ("default", |_| Bindings::new()),
    ("before", |p| {
        Bindings::from_iter(before(&p.doc, p.trigger, "click", p.say("[before] trigger")))
    }),
    ("beforeAllOnce", |p| {
        Bindings::from_iter(before_all_once(&p.doc, "click", p.say("[beforeAllOnce] *")))
    }),
    ("after", |p| {
        let say = p.say("[after] trigger");
        Bindings::from_iter(after(&p.doc, p.trigger, "click", say, Delivery::Deferred))
    }),
    ("afterAll", |p| {
        let say = p.say("[afterAll] *");
        Bindings::from_iter(after_all(&p.doc, "click", say, Delivery::Deferred))
    }),
    ("afterAll sync, cancels default", |p| {
        let say = p.say("[afterAll sync] * (prevent default)");
        let cb = move |e: &Event| {
            say(e);
            e.prevent_default();
        };
        Bindings::from_iter(after_all(&p.doc, "click", cb, Delivery::Sync))
    }),
];

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    let mut page = Page::new();
    for (name, profile) in PROFILES {
        page.reset();
        page.install_loggers();
        let mut extra = profile(&page);

        // Click twice so one-shot profiles show their second occurrence.
        for round in 1..=2 {
            page.click();
            println!("== {name}, click {round} ==");
            for line in page.log.borrow_mut().drain(..) {
                println!("  {line}");
            }
        }
        extra.unbind_all();
    }
}
