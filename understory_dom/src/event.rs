// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event objects: one [`Event`] per occurrence, with the dispatch state the host mutates.
//!
//! ## Identity
//!
//! [`Event`] is a cheap handle. Cloning it does not create a new occurrence; all clones observe
//! the same flags and the same [`Extensions`]. Equality compares occurrences by [`EventId`],
//! never by field values. To create an *equivalent* occurrence, construct a new event from the
//! observable fields of an old one.
//!
//! ## Minimal example
//!
//! ```
//! use understory_dom::{Event, EventInit};
//!
//! let e = Event::new("submit", EventInit { bubbles: true, cancelable: true, ..Default::default() });
//! let same = e.clone();
//! same.prevent_default();
//! assert!(e.default_prevented());
//! assert_ne!(e, Event::new("submit", EventInit::default()));
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU64, Ordering};

use kurbo::Point;

use crate::types::{EventId, EventPhase, Modifiers, NodeId};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Fields for a pointer/mouse event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MouseDetail {
    /// Position relative to the viewport.
    pub client: Point,
    /// Position relative to the screen.
    pub screen: Point,
    /// Button that changed state (0 = primary).
    pub button: i16,
    /// Buttons held down, as a bit set.
    pub buttons: u16,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

/// Fields for a keyboard event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardDetail {
    /// Logical key value, e.g. `"Enter"`.
    pub key: String,
    /// Physical key code, e.g. `"KeyA"`.
    pub code: String,
    /// Whether this is an auto-repeat.
    pub repeat: bool,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

/// Category-specific payload of an event.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventDetail {
    /// Plain event without extra fields.
    #[default]
    Basic,
    /// Mouse or pointer event.
    Mouse(MouseDetail),
    /// Keyboard event.
    Keyboard(KeyboardDetail),
}

impl EventDetail {
    /// Modifier keys carried by this payload, if the category has any.
    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::Basic => Modifiers::empty(),
            Self::Mouse(m) => m.modifiers,
            Self::Keyboard(k) => k.modifiers,
        }
    }
}

/// Construction parameters for [`Event::new`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventInit {
    /// Whether the event runs a bubble phase.
    pub bubbles: bool,
    /// Whether `prevent_default` has any effect.
    pub cancelable: bool,
    /// Whether the event crosses shadow boundaries (carried, not interpreted).
    pub composed: bool,
    /// Category-specific payload.
    pub detail: EventDetail,
}

/// Typed side storage attached to an event occurrence.
///
/// Hosts traditionally let scripts hang arbitrary properties off an event object; this is the
/// typed equivalent. At most one value per type is stored.
#[derive(Default)]
pub struct Extensions {
    slots: RefCell<Vec<(TypeId, Rc<dyn Any>)>>,
}

impl core::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.slots.borrow().len())
            .finish()
    }
}

impl Extensions {
    /// Store `value`, returning the previous value of the same type.
    pub fn insert<T: 'static>(&self, value: Rc<T>) -> Option<Rc<T>> {
        let mut slots = self.slots.borrow_mut();
        let key = TypeId::of::<T>();
        let old = slots
            .iter()
            .position(|(k, _)| *k == key)
            .map(|i| slots.swap_remove(i).1);
        let value: Rc<dyn Any> = value;
        slots.push((key, value));
        old.and_then(|v| v.downcast::<T>().ok())
    }

    /// Fetch the value of type `T`, if any.
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        let key = TypeId::of::<T>();
        let v = self
            .slots
            .borrow()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| Rc::clone(v))?;
        v.downcast::<T>().ok()
    }

    /// Remove and return the value of type `T`, if any.
    pub fn remove<T: 'static>(&self) -> Option<Rc<T>> {
        let mut slots = self.slots.borrow_mut();
        let key = TypeId::of::<T>();
        let i = slots.iter().position(|(k, _)| *k == key)?;
        slots.swap_remove(i).1.downcast::<T>().ok()
    }
}

#[derive(Debug)]
struct EventInner {
    id: EventId,
    event_type: String,
    init: EventInit,
    is_trusted: Cell<bool>,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    phase: Cell<EventPhase>,
    canceled: Cell<bool>,
    stop_propagation: Cell<bool>,
    stop_immediate: Cell<bool>,
    dispatching: Cell<bool>,
    in_passive_listener: Cell<bool>,
    replayed_from: Cell<Option<EventId>>,
    extensions: Extensions,
}

/// Handle to one event occurrence.
///
/// See the [module docs](self) for identity rules.
#[derive(Clone, Debug)]
pub struct Event {
    inner: Rc<EventInner>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Event {}

impl Event {
    /// Create a new, undispatched occurrence.
    pub fn new(event_type: impl Into<String>, init: EventInit) -> Self {
        let id = EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Rc::new(EventInner {
                id,
                event_type: event_type.into(),
                init,
                is_trusted: Cell::new(false),
                target: Cell::new(None),
                current_target: Cell::new(None),
                phase: Cell::new(EventPhase::None),
                canceled: Cell::new(false),
                stop_propagation: Cell::new(false),
                stop_immediate: Cell::new(false),
                dispatching: Cell::new(false),
                in_passive_listener: Cell::new(false),
                replayed_from: Cell::new(None),
                extensions: Extensions::default(),
            }),
        }
    }

    /// A bubbling, cancelable, composed mouse event.
    pub fn mouse(event_type: impl Into<String>, detail: MouseDetail) -> Self {
        Self::new(
            event_type,
            EventInit {
                bubbles: true,
                cancelable: true,
                composed: true,
                detail: EventDetail::Mouse(detail),
            },
        )
    }

    /// A bubbling, cancelable, composed keyboard event.
    pub fn keyboard(event_type: impl Into<String>, detail: KeyboardDetail) -> Self {
        Self::new(
            event_type,
            EventInit {
                bubbles: true,
                cancelable: true,
                composed: true,
                detail: EventDetail::Keyboard(detail),
            },
        )
    }

    /// Occurrence identity.
    pub fn id(&self) -> EventId {
        self.inner.id
    }

    /// Event type name, e.g. `"click"`.
    pub fn event_type(&self) -> &str {
        &self.inner.event_type
    }

    /// Whether the event runs a bubble phase.
    pub fn bubbles(&self) -> bool {
        self.inner.init.bubbles
    }

    /// Whether `prevent_default` has any effect.
    pub fn cancelable(&self) -> bool {
        self.inner.init.cancelable
    }

    /// Whether the event crosses shadow boundaries.
    pub fn composed(&self) -> bool {
        self.inner.init.composed
    }

    /// Category-specific payload.
    pub fn detail(&self) -> &EventDetail {
        &self.inner.init.detail
    }

    /// Mouse fields, if this is a mouse event.
    pub fn mouse_detail(&self) -> Option<&MouseDetail> {
        match &self.inner.init.detail {
            EventDetail::Mouse(m) => Some(m),
            _ => None,
        }
    }

    /// Keyboard fields, if this is a keyboard event.
    pub fn keyboard_detail(&self) -> Option<&KeyboardDetail> {
        match &self.inner.init.detail {
            EventDetail::Keyboard(k) => Some(k),
            _ => None,
        }
    }

    /// Construction parameters; the observable, immutable part of the event.
    pub fn init(&self) -> &EventInit {
        &self.inner.init
    }

    /// Whether the host produced this event (as opposed to a script dispatch).
    pub fn is_trusted(&self) -> bool {
        self.inner.is_trusted.get()
    }

    /// The origin node: where the event was dispatched. Persists after dispatch.
    pub fn target(&self) -> Option<NodeId> {
        self.inner.target.get()
    }

    /// The node whose listeners are currently running; `None` outside dispatch.
    pub fn current_target(&self) -> Option<NodeId> {
        self.inner.current_target.get()
    }

    /// Current dispatch phase.
    pub fn event_phase(&self) -> EventPhase {
        self.inner.phase.get()
    }

    /// Whether the default action has been canceled.
    pub fn default_prevented(&self) -> bool {
        self.inner.canceled.get()
    }

    /// Cancel the default action.
    ///
    /// Has no effect when the event is not cancelable or while a passive listener runs.
    pub fn prevent_default(&self) {
        if self.cancelable() && !self.inner.in_passive_listener.get() {
            self.inner.canceled.set(true);
        }
    }

    /// Stop delivery to further nodes once the current node's listeners finish.
    pub fn stop_propagation(&self) {
        self.inner.stop_propagation.set(true);
    }

    /// Stop delivery immediately, including remaining listeners on the current node.
    pub fn stop_immediate_propagation(&self) {
        self.inner.stop_propagation.set(true);
        self.inner.stop_immediate.set(true);
    }

    /// Whether propagation to further nodes has been stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.inner.stop_propagation.get()
    }

    /// Whether delivery to remaining listeners has been stopped.
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.inner.stop_immediate.get()
    }

    /// Whether the event is mid-dispatch.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    /// The occurrence this event was synthesized to stand in for, if any.
    pub fn replayed_from(&self) -> Option<EventId> {
        self.inner.replayed_from.get()
    }

    /// Mark this event as a stand-in for `original`.
    pub fn mark_replay_of(&self, original: EventId) {
        self.inner.replayed_from.set(Some(original));
    }

    /// Typed side storage for this occurrence.
    pub fn extensions(&self) -> &Extensions {
        &self.inner.extensions
    }

    // --- dispatch bookkeeping, driven by `Document` ---

    pub(crate) fn begin_dispatch(&self, target: NodeId, trusted: bool) {
        self.inner.dispatching.set(true);
        self.inner.is_trusted.set(trusted);
        self.inner.target.set(Some(target));
    }

    pub(crate) fn enter(&self, node: NodeId, phase: EventPhase) {
        self.inner.current_target.set(Some(node));
        self.inner.phase.set(phase);
    }

    pub(crate) fn set_in_passive_listener(&self, passive: bool) {
        self.inner.in_passive_listener.set(passive);
    }

    pub(crate) fn end_dispatch(&self) {
        self.inner.phase.set(EventPhase::None);
        self.inner.current_target.set(None);
        self.inner.stop_propagation.set(false);
        self.inner.stop_immediate.set(false);
        self.inner.in_passive_listener.set(false);
        self.inner.dispatching.set(false);
    }
}
