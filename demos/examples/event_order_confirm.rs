// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pause a click until the user confirms, then let it continue.
//!
//! A guard listener pauses every fresh click on a "delete" link and opens a pretend dialog.
//! The dialog answers on a later task. On "yes" the click is resumed and the link's default
//! action runs; on "no" the paused click is simply dropped.
//!
//! Run:
//! - `cargo run -p understory_demos --example event_order_confirm`

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Point;
use understory_dom::{Document, Event, ListenerOptions, MouseDetail};
use understory_event_order::{Delivery, ResumeState, Resumables, after_all, before_all};

fn main() {
    tracing_subscriber::fmt().with_target(false).without_time().init();

    let doc = Document::new();
    let body = doc.create_element("body");
    let link = doc.create_element("a");
    doc.append_child(doc.root(), body).unwrap();
    doc.append_child(body, link).unwrap();
    doc.set_attribute(link, "href", "/items/7/delete").unwrap();

    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let say = |msg: &'static str| {
        let log = log.clone();
        move |_: &Event| log.borrow_mut().push(msg.to_string())
    };

    doc.set_default_action(link, "click", say("(default) DELETE /items/7")).unwrap();
    doc.add_event_listener(body, "click", ListenerOptions::BUBBLE, say("body saw click"))
        .unwrap();
    let _first = before_all(&doc, "click", say("before all")).unwrap();
    let _last = after_all(&doc, "click", say("after all"), Delivery::Deferred).unwrap();

    // Dialog answers, popped from the back: decline first, then confirm.
    let answers = Rc::new(RefCell::new(vec![true, false]));
    let resumables = Resumables::new(&doc);
    {
        let d = doc.downgrade();
        let log = log.clone();
        doc.add_event_listener(link, "click", ListenerOptions::BUBBLE, move |e| {
            let held = resumables.wrap(e);
            if held.state() != ResumeState::Fresh {
                return;
            }
            held.pause_then(|_| log.borrow_mut().push("paused, asking".into()));
            let Some(doc) = d.upgrade() else {
                return;
            };
            let answer = answers.borrow_mut().pop().unwrap_or(false);
            let log = log.clone();
            doc.set_timeout(300, move || {
                if answer {
                    log.borrow_mut().push("confirmed".into());
                    held.resume();
                } else {
                    log.borrow_mut().push("declined".into());
                }
            });
        })
        .unwrap();
    }

    let click = || {
        Event::mouse(
            "click",
            MouseDetail {
                client: Point::new(12.0, 8.0),
                ..MouseDetail::default()
            },
        )
    };
    for attempt in 1..=2 {
        doc.fire(link, &click()).unwrap();
        doc.run_until_idle();
        println!("== attempt {attempt} (t = {} ms) ==", doc.now());
        for line in log.borrow_mut().drain(..) {
            println!("  {line}");
        }
    }
}
