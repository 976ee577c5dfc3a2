// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration core: one native listener per call, with phase, delay, one-shot and filter.
//!
//! ## Firing
//!
//! Each time the host invokes the installed listener:
//!
//! 1. The origin (the node the event was dispatched at, not the node the listener sits on)
//!    is read from the event.
//! 2. The admission filter sees `(event, origin)`; a `false` ends processing.
//! 3. The event must match: same type, or for [`EventMatch::Instance`] the very same occurrence.
//! 4. The callback runs now ([`Delay::Immediate`]) or on a later task ([`Delay::Deferred`]).
//!
//! A one-shot registration admits only its first matching occurrence and detaches itself after
//! the callback returns, so the callback still sees [`Registration::is_bound`] as `true`.
//!
//! ## Failure
//!
//! Nothing here panics or unwinds through dispatch. Calls that cannot install a listener
//! return [`BindRejected`], which hands the type or instance argument back unchanged.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use understory_dom::{
    Document, Event, ListenerId, ListenerOptions, NodeId, TimerId, WeakDocument,
};

/// Caller callback.
pub type Callback = Rc<dyn Fn(&Event)>;

/// Admission filter over `(event, origin)`.
pub type Filter = Rc<dyn Fn(&Event, NodeId) -> bool>;

/// Dispatch phase a registration listens in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    /// On the way down to the origin.
    Capture,
    /// On the way back up from the origin.
    #[default]
    Bubble,
}

/// When the callback runs relative to the listener invocation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Delay {
    /// Inside the listener, during dispatch.
    #[default]
    Immediate,
    /// On a later macrotask, after at least this many milliseconds. `0` means the next turn.
    Deferred(u32),
}

/// What a registration matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventMatch {
    /// Any occurrence with this type name.
    Type(String),
    /// Only this exact occurrence.
    Instance(Event),
}

impl EventMatch {
    /// Type name the native listener is installed for.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Type(t) => t,
            Self::Instance(e) => e.event_type(),
        }
    }

    /// Whether `event` satisfies this matcher.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Type(t) => event.event_type() == t,
            Self::Instance(e) => e == event,
        }
    }
}

impl From<&str> for EventMatch {
    fn from(t: &str) -> Self {
        Self::Type(t.into())
    }
}

impl From<String> for EventMatch {
    fn from(t: String) -> Self {
        Self::Type(t)
    }
}

impl From<&Event> for EventMatch {
    fn from(e: &Event) -> Self {
        Self::Instance(e.clone())
    }
}

impl From<Event> for EventMatch {
    fn from(e: Event) -> Self {
        Self::Instance(e)
    }
}

/// Configuration for [`bind`].
///
/// The default is a bubble-phase, immediate, repeating registration that admits everything.
#[derive(Clone, Default)]
pub struct BindOptions {
    /// Phase to listen in.
    pub phase: Phase,
    /// When to run the callback.
    pub delay: Delay,
    /// Detach after the first admitted occurrence.
    pub once: bool,
    /// Admission filter; `None` admits every occurrence.
    pub filter: Option<Filter>,
}

impl core::fmt::Debug for BindOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BindOptions")
            .field("phase", &self.phase)
            .field("delay", &self.delay)
            .field("once", &self.once)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl BindOptions {
    /// Listen in the capture phase.
    pub fn capture(mut self) -> Self {
        self.phase = Phase::Capture;
        self
    }

    /// Listen in the bubble phase.
    pub fn bubble(mut self) -> Self {
        self.phase = Phase::Bubble;
        self
    }

    /// Defer the callback by `ms` milliseconds.
    pub fn deferred(mut self, ms: u32) -> Self {
        self.delay = Delay::Deferred(ms);
        self
    }

    /// Run the callback during dispatch.
    pub fn immediate(mut self) -> Self {
        self.delay = Delay::Immediate;
        self
    }

    /// Detach after the first admitted occurrence.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Admit only occurrences for which `filter(event, origin)` holds.
    pub fn filter(mut self, filter: impl Fn(&Event, NodeId) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }
}

/// Why [`bind`] declined to install a listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RejectReason {
    /// No callback was supplied.
    #[error("no callback supplied")]
    MissingCallback,
    /// The target node is not alive.
    #[error("target node is not alive")]
    StaleTarget,
}

/// A declined [`bind`] call. Carries the type or instance argument back unchanged.
#[derive(Clone, Debug, thiserror::Error)]
#[error("binding for `{}` rejected: {reason}", .matcher.event_type())]
pub struct BindRejected {
    /// The argument the caller passed.
    pub matcher: EventMatch,
    /// What was wrong.
    pub reason: RejectReason,
}

struct Inner {
    doc: WeakDocument,
    target: NodeId,
    matcher: EventMatch,
    phase: Phase,
    delay: Delay,
    once: bool,
    callback: Callback,
    filter: Option<Filter>,
    listener: Cell<Option<ListenerId>>,
    pending: RefCell<Vec<TimerId>>,
    // One-shot registrations admit a single occurrence, even if its callback is still queued.
    armed: Cell<bool>,
}

impl Inner {
    fn admit(&self, event: &Event) -> bool {
        if self.listener.get().is_none() || (self.once && !self.armed.get()) {
            return false;
        }
        let Some(origin) = event.target() else {
            return false;
        };
        if let Some(filter) = &self.filter
            && !filter(event, origin)
        {
            return false;
        }
        self.matcher.matches(event)
    }

    fn fire(&self, event: &Event) {
        (self.callback)(event);
        if self.once {
            self.detach();
        }
    }

    fn detach(&self) -> bool {
        let Some(id) = self.listener.take() else {
            return false;
        };
        let pending = core::mem::take(&mut *self.pending.borrow_mut());
        if let Some(doc) = self.doc.upgrade() {
            doc.remove_event_listener(id);
            for timer in pending {
                doc.clear_timeout(timer);
            }
        }
        tracing::debug!(
            listener = ?id,
            node = ?self.target,
            event_type = self.matcher.event_type(),
            "event_order.unbind"
        );
        true
    }

    fn on_event(self: &Rc<Self>, event: &Event) {
        if !self.admit(event) {
            return;
        }
        if self.once {
            self.armed.set(false);
        }
        match self.delay {
            Delay::Immediate => self.fire(event),
            Delay::Deferred(ms) => {
                let Some(doc) = self.doc.upgrade() else {
                    return;
                };
                let me = Rc::clone(self);
                let event = event.clone();
                let own_id = Rc::new(Cell::new(None));
                let slot = Rc::clone(&own_id);
                let timer = doc.set_timeout(ms, move || {
                    if let Some(id) = slot.get() {
                        me.pending.borrow_mut().retain(|t| *t != id);
                    }
                    me.fire(&event);
                });
                own_id.set(Some(timer));
                self.pending.borrow_mut().push(timer);
            }
        }
    }
}

/// Handle to one installed listener.
///
/// Cloning yields another handle to the same registration.
#[derive(Clone)]
pub struct Registration {
    inner: Rc<Inner>,
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("target", &self.inner.target)
            .field("matcher", &self.inner.matcher)
            .field("phase", &self.inner.phase)
            .field("delay", &self.inner.delay)
            .field("once", &self.inner.once)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

impl Registration {
    /// Remove the native listener and cancel queued deferred callbacks.
    ///
    /// Returns `true` only for the call that actually detached; later calls are no-ops.
    pub fn unbind(&self) -> bool {
        self.inner.detach()
    }

    /// Whether the native listener is still installed.
    pub fn is_bound(&self) -> bool {
        self.inner.listener.get().is_some()
    }

    /// Node the listener is installed on.
    pub fn target(&self) -> NodeId {
        self.inner.target
    }

    /// Type name the listener is installed for.
    pub fn event_type(&self) -> &str {
        self.inner.matcher.event_type()
    }

    /// The occurrence this registration is pinned to, if any.
    pub fn event_instance(&self) -> Option<&Event> {
        match &self.inner.matcher {
            EventMatch::Instance(e) => Some(e),
            EventMatch::Type(_) => None,
        }
    }

    /// Phase the listener runs in.
    pub fn phase(&self) -> Phase {
        self.inner.phase
    }

    /// When the callback runs.
    pub fn delay(&self) -> Delay {
        self.inner.delay
    }

    /// Whether the registration detaches after one occurrence.
    pub fn runs_once(&self) -> bool {
        self.inner.once
    }

    /// Deferred callbacks queued but not yet run.
    pub fn pending(&self) -> usize {
        self.inner.pending.borrow().len()
    }
}

/// Install a listener on `target` according to `options`.
///
/// `matcher` is an event type name or a specific [`Event`]. A missing `callback` or a stale
/// `target` installs nothing and returns the matcher inside [`BindRejected`].
pub fn bind(
    doc: &Document,
    target: NodeId,
    matcher: impl Into<EventMatch>,
    callback: Option<Callback>,
    options: BindOptions,
) -> Result<Registration, BindRejected> {
    let matcher = matcher.into();
    let Some(callback) = callback else {
        return Err(BindRejected {
            matcher,
            reason: RejectReason::MissingCallback,
        });
    };
    if !doc.is_alive(target) {
        return Err(BindRejected {
            matcher,
            reason: RejectReason::StaleTarget,
        });
    }

    let inner = Rc::new(Inner {
        doc: doc.downgrade(),
        target,
        matcher,
        phase: options.phase,
        delay: options.delay,
        once: options.once,
        callback,
        filter: options.filter,
        listener: Cell::new(None),
        pending: RefCell::new(Vec::new()),
        armed: Cell::new(true),
    });

    let handler = Rc::clone(&inner);
    let id = doc
        .add_event_listener(
            target,
            inner.matcher.event_type(),
            ListenerOptions::capture(inner.phase == Phase::Capture),
            move |event| handler.on_event(event),
        )
        .map_err(|_| BindRejected {
            matcher: inner.matcher.clone(),
            reason: RejectReason::StaleTarget,
        })?;
    inner.listener.set(Some(id));

    tracing::debug!(
        listener = ?id,
        node = ?target,
        event_type = inner.matcher.event_type(),
        phase = ?inner.phase,
        delay = ?inner.delay,
        once = inner.once,
        "event_order.bind"
    );
    Ok(Registration { inner })
}

/// [`bind`] with [`BindOptions::once`] set.
pub fn bind_once(
    doc: &Document,
    target: NodeId,
    matcher: impl Into<EventMatch>,
    callback: Option<Callback>,
    options: BindOptions,
) -> Result<Registration, BindRejected> {
    bind(doc, target, matcher, callback, options.once())
}
