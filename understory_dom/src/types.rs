// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the host: handles, phases, listener options, and capability flags.

/// Identifier for a node in a [`Document`](crate::Document).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On removal, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Use [`Document::is_alive`](crate::Document::is_alive) to check liveness.
/// Stale `NodeId`s never alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identity of one event occurrence.
///
/// Two [`Event`](crate::Event) handles are the same occurrence exactly when their ids match.
/// Ids are unique for the lifetime of the process.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EventId(pub(crate) u64);

/// Handle returned by [`Document::add_event_listener`](crate::Document::add_event_listener).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(pub(crate) u64);

/// Handle returned by [`Document::set_timeout`](crate::Document::set_timeout).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TimerId(pub(crate) u64);

/// Where an event currently is in its dispatch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EventPhase {
    /// Not being dispatched.
    #[default]
    None,
    /// Travelling from the root toward the origin's parent.
    Capturing,
    /// Being delivered to the origin itself.
    AtTarget,
    /// Travelling from the origin's parent back up to the root.
    Bubbling,
}

/// Options for [`Document::add_event_listener`](crate::Document::add_event_listener).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove the listener right before its first invocation.
    pub once: bool,
    /// Ignore `prevent_default` calls made by this listener.
    pub passive: bool,
}

impl ListenerOptions {
    /// Bubble-phase listener with no other options.
    pub const BUBBLE: Self = Self {
        capture: false,
        once: false,
        passive: false,
    };

    /// Capture-phase listener with no other options.
    pub const CAPTURE: Self = Self {
        capture: true,
        once: false,
        passive: false,
    };

    /// Shorthand for a listener in the given phase.
    pub const fn capture(capture: bool) -> Self {
        Self {
            capture,
            once: false,
            passive: false,
        }
    }
}

bitflags::bitflags! {
    /// Modifier keys held while an input event was produced.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Control key.
        const CTRL  = 0b0000_0001;
        /// Shift key.
        const SHIFT = 0b0000_0010;
        /// Alt / Option key.
        const ALT   = 0b0000_0100;
        /// Meta / Command / Windows key.
        const META  = 0b0000_1000;
    }
}

bitflags::bitflags! {
    /// Capabilities a host exposes to scripts.
    ///
    /// Older hosts lack constructors for some event categories; code that synthesizes
    /// events checks these once and picks a strategy that the host can honor.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct HostFeatures: u8 {
        /// Events can be constructed with their full field set.
        const EVENT_CONSTRUCTORS  = 0b0000_0001;
        /// Legacy mouse initialization (coordinates and modifiers) is available.
        const MOUSE_EVENT_INIT    = 0b0000_0010;
        /// Legacy keyboard initialization (key and modifiers) is available.
        const KEYBOARD_EVENT_INIT = 0b0000_0100;
    }
}

impl HostFeatures {
    /// A current host: everything is available.
    pub const MODERN: Self = Self::all();
    /// An old host that can only create plain events.
    pub const LEGACY: Self = Self::empty();
}

impl Default for HostFeatures {
    fn default() -> Self {
        Self::MODERN
    }
}
