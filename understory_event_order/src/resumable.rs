// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pause an in-flight event and replay an equivalent one later.
//!
//! ## Lifecycle
//!
//! A [`ResumableEvent`] moves through [`ResumeState`] in one direction only:
//!
//! - `Fresh` → `Paused` by [`ResumableEvent::pause`]. The event's observable fields are copied
//!   into a new event first. Then propagation and the default action of the original are
//!   stopped for good.
//! - `Paused` → `Resumed` by [`ResumableEvent::resume`]. The copy is dispatched at the original
//!   target and runs the full capture and bubble pipeline again.
//!
//! Any other call is a no-op that returns `false`. Nothing bounds the gap between pause and
//! resume; an event that is never resumed simply never finishes delivery.
//!
//! ## Identity
//!
//! [`Resumables::wrap`] returns the same wrapper for the same occurrence every time. The
//! replayed copy is linked to the wrapper that produced it, so a listener that wraps and pauses
//! every event sees the replay as already `Resumed` and lets it through.
//!
//! ## Older hosts
//!
//! [`EventCloner`] is chosen once from [`HostFeatures`]. When the host cannot construct
//! events with their full field set, fields it cannot initialize are left at their defaults
//! instead of failing the pause.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use understory_dom::{
    Document, Event, EventDetail, EventId, EventInit, HostFeatures, KeyboardDetail, MouseDetail,
    NodeId, WeakDocument,
};

/// Where a [`ResumableEvent`] is in its lifecycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ResumeState {
    /// Wrapped, not yet paused.
    #[default]
    Fresh,
    /// Halted; a replay is prepared.
    Paused,
    /// Replayed. Terminal.
    Resumed,
}

/// How a paused event's fields are copied into its replay.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventCloner {
    /// Copy every construction parameter.
    Full,
    /// Legacy initialization: bubbling, cancelability and the category fields the host can set.
    Reduced {
        /// Mouse coordinates, button and modifiers can be set.
        mouse: bool,
        /// Keyboard key and modifiers can be set.
        keyboard: bool,
    },
}

impl EventCloner {
    /// Best strategy the host supports.
    pub fn detect(features: HostFeatures) -> Self {
        if features.contains(HostFeatures::EVENT_CONSTRUCTORS) {
            Self::Full
        } else {
            Self::Reduced {
                mouse: features.contains(HostFeatures::MOUSE_EVENT_INIT),
                keyboard: features.contains(HostFeatures::KEYBOARD_EVENT_INIT),
            }
        }
    }

    /// A new, undispatched event equivalent to `event`.
    ///
    /// A canceled default action carries over.
    pub fn clone_event(&self, event: &Event) -> Event {
        let init = match *self {
            Self::Full => event.init().clone(),
            Self::Reduced { mouse, keyboard } => EventInit {
                bubbles: event.bubbles(),
                cancelable: event.cancelable(),
                composed: false,
                detail: match event.detail() {
                    EventDetail::Mouse(m) if mouse => EventDetail::Mouse(MouseDetail {
                        client: m.client,
                        screen: m.screen,
                        button: m.button,
                        modifiers: m.modifiers,
                        ..MouseDetail::default()
                    }),
                    EventDetail::Keyboard(k) if keyboard => EventDetail::Keyboard(KeyboardDetail {
                        key: k.key.clone(),
                        modifiers: k.modifiers,
                        ..KeyboardDetail::default()
                    }),
                    _ => EventDetail::Basic,
                },
            },
        };
        let copy = Event::new(event.event_type(), init);
        if event.default_prevented() {
            copy.prevent_default();
        }
        copy
    }
}

/// Per-document context for [`ResumableEvent`]s.
#[derive(Clone, Debug)]
pub struct Resumables {
    doc: WeakDocument,
    cloner: EventCloner,
}

impl Resumables {
    /// Context for `doc`, with the clone strategy detected from its features.
    pub fn new(doc: &Document) -> Self {
        Self::with_cloner(doc, EventCloner::detect(doc.features()))
    }

    /// Context for `doc` with an explicit clone strategy.
    pub fn with_cloner(doc: &Document, cloner: EventCloner) -> Self {
        Self {
            doc: doc.downgrade(),
            cloner,
        }
    }

    /// The clone strategy in use.
    pub fn cloner(&self) -> EventCloner {
        self.cloner
    }

    /// The wrapper for `event`'s occurrence, created on first request.
    pub fn wrap(&self, event: &Event) -> ResumableEvent {
        let inner = match event.extensions().get::<Inner>() {
            Some(inner) => inner,
            None => {
                let inner = Rc::new(Inner {
                    doc: self.doc.clone(),
                    cloner: self.cloner,
                    original: event.id(),
                    state: Cell::new(ResumeState::Fresh),
                    target: Cell::new(None),
                    replay: RefCell::new(None),
                });
                event.extensions().insert(Rc::clone(&inner));
                inner
            }
        };
        ResumableEvent {
            source: event.clone(),
            inner,
        }
    }
}

// Shared by every handle for one occurrence and reachable from the occurrence itself, and
// later from its replay. Holds the replay only until it is dispatched, so no cycle outlives it.
struct Inner {
    doc: WeakDocument,
    cloner: EventCloner,
    original: EventId,
    state: Cell<ResumeState>,
    target: Cell<Option<NodeId>>,
    replay: RefCell<Option<Event>>,
}

/// A pausable view of one event occurrence. Obtain one with [`Resumables::wrap`].
///
/// Handles compare equal when they belong to the same wrapper.
#[derive(Clone)]
pub struct ResumableEvent {
    source: Event,
    inner: Rc<Inner>,
}

impl PartialEq for ResumableEvent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ResumableEvent {}

impl core::fmt::Debug for ResumableEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResumableEvent")
            .field("source", &self.source.id())
            .field("original", &self.inner.original)
            .field("state", &self.inner.state.get())
            .field("target", &self.inner.target.get())
            .finish_non_exhaustive()
    }
}

impl ResumableEvent {
    /// Current lifecycle state.
    pub fn state(&self) -> ResumeState {
        self.inner.state.get()
    }

    /// The event this handle was obtained from.
    pub fn source(&self) -> &Event {
        &self.source
    }

    /// The occurrence that was paused.
    pub fn original(&self) -> EventId {
        self.inner.original
    }

    /// Where the replay will be dispatched.
    ///
    /// Recorded by [`pause`](Self::pause). An event paused before its dispatch learns its
    /// target when that dispatch is attempted.
    pub fn target(&self) -> Option<NodeId> {
        if self.inner.target.get().is_none() && self.inner.original == self.source.id() {
            self.inner.target.set(self.source.target());
        }
        self.inner.target.get()
    }

    /// The prepared replay, from pause until resume has dispatched it.
    pub fn replay(&self) -> Option<Event> {
        self.inner.replay.borrow().clone()
    }

    /// Halt the event. Only effective when `Fresh`.
    pub fn pause(&self) -> bool {
        self.pause_then(|_| {})
    }

    /// [`pause`](Self::pause), then run `paused` if the transition happened.
    pub fn pause_then(&self, paused: impl FnOnce(&Self)) -> bool {
        if self.state() != ResumeState::Fresh {
            return false;
        }
        let replay = self.inner.cloner.clone_event(&self.source);
        self.source.stop_propagation();
        self.source.stop_immediate_propagation();
        self.source.prevent_default();

        self.inner.target.set(self.source.target());
        *self.inner.replay.borrow_mut() = Some(replay);
        self.inner.state.set(ResumeState::Paused);
        tracing::debug!(
            event = ?self.inner.original,
            event_type = self.source.event_type(),
            target = ?self.inner.target.get(),
            "event_order.pause"
        );
        paused(self);
        true
    }

    /// Dispatch the replay at the original target. Only effective when `Paused`.
    ///
    /// Returns `false` and stays `Paused` if the document is gone, the event never had a
    /// target, or the target has since been removed.
    pub fn resume(&self) -> bool {
        self.resume_then(|_| {})
    }

    /// [`resume`](Self::resume), then run `resumed` after the replay's dispatch returns.
    pub fn resume_then(&self, resumed: impl FnOnce(&Self)) -> bool {
        if self.state() != ResumeState::Paused {
            return false;
        }
        let Some(doc) = self.inner.doc.upgrade() else {
            tracing::warn!(event = ?self.inner.original, "event_order.resume: document dropped");
            return false;
        };
        let Some(target) = self.target().filter(|t| doc.is_alive(*t)) else {
            tracing::warn!(
                event = ?self.inner.original,
                target = ?self.inner.target.get(),
                "event_order.resume: no live target"
            );
            return false;
        };
        let Some(replay) = self.replay() else {
            return false;
        };

        replay.mark_replay_of(self.inner.original);
        replay.extensions().insert(Rc::clone(&self.inner));
        self.inner.state.set(ResumeState::Resumed);
        if let Err(err) = doc.dispatch_event(target, &replay) {
            tracing::warn!(
                event = ?self.inner.original,
                %err,
                "event_order.resume: dispatch failed"
            );
            replay.extensions().remove::<Inner>();
            self.inner.state.set(ResumeState::Paused);
            return false;
        }
        self.inner.replay.borrow_mut().take();
        tracing::debug!(
            event = ?self.inner.original,
            replay = ?replay.id(),
            ?target,
            "event_order.resume"
        );
        resumed(self);
        true
    }
}
