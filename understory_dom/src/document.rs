// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host: node tree, listener lists, dispatch, default actions, and the task queue.
//!
//! ## Dispatch
//!
//! [`Document::dispatch_event`] builds the propagation path from the origin up to its root and
//! then walks it in three steps:
//!
//! 1. Capture: capture listeners on every ancestor, root first.
//! 2. Target: capture listeners on the origin, then its bubble listeners.
//! 3. Bubble: bubble listeners on every ancestor, nearest first, only if the event bubbles.
//!
//! Within a node, listeners run in registration order. The listener list of a node is
//! snapshotted when the dispatch reaches that node: listeners removed before their turn are
//! skipped, listeners added to that node during its turn wait for the next occurrence.
//!
//! After the walk, the innermost node on the path with a default action for the event type
//! runs it, unless the event was canceled.
//!
//! ## Re-entrancy
//!
//! Listeners and tasks receive no borrow of host state; they may freely add or remove
//! listeners, mutate the tree, schedule tasks, or dispatch other events.
//!
//! ## Tasks
//!
//! [`Document::set_timeout`] enqueues a macrotask. Nothing runs tasks implicitly: the embedder
//! drives the loop with [`Document::run_next_task`], [`Document::advance`] or
//! [`Document::run_until_idle`], so a task never runs inside the dispatch that scheduled it.

use alloc::collections::BTreeMap;
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::error::DomError;
use crate::event::Event;
use crate::selector::Selector;
use crate::tasks::TaskQueue;
use crate::types::{EventPhase, HostFeatures, ListenerId, ListenerOptions, NodeId, TimerId};

/// Shared listener callback.
pub type ListenerFn = Rc<dyn Fn(&Event)>;

struct Listener {
    id: ListenerId,
    event_type: String,
    options: ListenerOptions,
    callback: ListenerFn,
    removed: Cell<bool>,
}

struct DefaultAction {
    event_type: String,
    action: ListenerFn,
}

struct NodeData {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tag: String,
    attrs: Vec<(String, String)>,
    listeners: Vec<Rc<Listener>>,
    default_actions: Vec<DefaultAction>,
}

impl NodeData {
    fn new(generation: u32, tag: String) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            tag,
            attrs: Vec::new(),
            listeners: Vec::new(),
            default_actions: Vec::new(),
        }
    }
}

struct Tree {
    nodes: Vec<Option<NodeData>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    next_listener: u64,
    listener_owner: BTreeMap<ListenerId, NodeId>,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 1),
            next_listener: 1,
            listener_owner: BTreeMap::new(),
        };
        tree.root = tree.alloc("#document".to_string());
        tree
    }

    fn alloc(&mut self, tag: String) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(NodeData::new(generation, tag));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(NodeData::new(generation, tag)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.1).then_some(n)
    }

    fn live(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.node(id).ok_or(DomError::StaleNode(id))
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.node_mut(id).ok_or(DomError::StaleNode(id))
    }

    /// Origin first, then each ancestor up to the origin's root.
    fn path_to_root(&self, mut id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        loop {
            out.push(id);
            match self.node(id).and_then(|n| n.parent) {
                Some(p) => id = p,
                None => break,
            }
        }
        out
    }

    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(from) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            if let Some(n) = self.node(id) {
                out.push(id);
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = alloc::vec![id];
        while let Some(id) = stack.pop() {
            let Some(n) = self.nodes.get_mut(id.idx()).and_then(Option::take) else {
                continue;
            };
            for l in &n.listeners {
                l.removed.set(true);
                self.listener_owner.remove(&l.id);
            }
            self.free_list.push(id.idx());
            stack.extend(n.children);
        }
    }
}

struct Shared {
    features: HostFeatures,
    tree: RefCell<Tree>,
    tasks: RefCell<TaskQueue>,
}

/// Handle to a document: the root of a node tree plus its event loop.
///
/// Cloning is cheap and yields another handle to the same document.
#[derive(Clone)]
pub struct Document {
    shared: Rc<Shared>,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tree = self.shared.tree.borrow();
        let alive = tree.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("features", &self.shared.features)
            .field("nodes_alive", &alive)
            .field("listeners", &tree.listener_owner.len())
            .field("tasks", &*self.shared.tasks.borrow())
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to a [`Document`].
///
/// Held by callbacks that the document itself owns, so no reference cycle keeps it alive.
#[derive(Clone)]
pub struct WeakDocument {
    shared: Weak<Shared>,
}

impl core::fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakDocument")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl WeakDocument {
    /// Upgrade to a strong handle if the document still exists.
    pub fn upgrade(&self) -> Option<Document> {
        self.shared.upgrade().map(|shared| Document { shared })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document on a modern host.
    pub fn new() -> Self {
        Self::with_features(HostFeatures::MODERN)
    }

    /// Create an empty document on a host with the given capabilities.
    pub fn with_features(features: HostFeatures) -> Self {
        Self {
            shared: Rc::new(Shared {
                features,
                tree: RefCell::new(Tree::new()),
                tasks: RefCell::new(TaskQueue::default()),
            }),
        }
    }

    /// Capabilities of this host.
    pub fn features(&self) -> HostFeatures {
        self.shared.features
    }

    /// Create a non-owning handle.
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // --- tree ---

    /// The document node; the root of every connected tree.
    pub fn root(&self) -> NodeId {
        self.shared.tree.borrow().root
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.shared
            .tree
            .borrow_mut()
            .alloc(tag.to_ascii_lowercase())
    }

    /// Move `child` (and its subtree) to the end of `parent`'s children.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut tree = self.shared.tree.borrow_mut();
        tree.live(parent)?;
        tree.live(child)?;
        if child == tree.root {
            return Err(DomError::HierarchyRequest(
                "the document node cannot be a child",
            ));
        }
        if tree.path_to_root(parent).contains(&child) {
            return Err(DomError::HierarchyRequest(
                "a node cannot be inserted into its own subtree",
            ));
        }
        let old_parent = tree.live(child)?.parent;
        if let Some(old) = old_parent {
            tree.live_mut(old)?.children.retain(|c| *c != child);
        }
        tree.live_mut(parent)?.children.push(child);
        tree.live_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove a node and its subtree; their handles become stale and their listeners are dropped.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        let mut tree = self.shared.tree.borrow_mut();
        if node == tree.root {
            return Err(DomError::HierarchyRequest(
                "the document node cannot be removed",
            ));
        }
        let parent = tree.live(node)?.parent;
        if let Some(parent) = parent {
            tree.live_mut(parent)?.children.retain(|c| *c != node);
        }
        tree.free_subtree(node);
        Ok(())
    }

    /// Returns true if `node` refers to a live node.
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.shared.tree.borrow().node(node).is_some()
    }

    /// Parent of `node`, if it is alive and attached.
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.shared.tree.borrow().node(node)?.parent
    }

    /// Children of `node` in order.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.shared
            .tree
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether `node` is the document node or one of its descendants.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let tree = self.shared.tree.borrow();
        tree.node(node).is_some() && tree.path_to_root(node).last() == Some(&tree.root)
    }

    /// Lowercase tag name of `node`.
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.shared.tree.borrow().node(node).map(|n| n.tag.clone())
    }

    /// Set (or replace) an attribute.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.shared.tree.borrow_mut();
        let n = tree.live_mut(node)?;
        let name = name.to_ascii_lowercase();
        match n.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => n.attrs.push((name, value.to_string())),
        }
        Ok(())
    }

    /// Value of an attribute.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let tree = self.shared.tree.borrow();
        let name = name.to_ascii_lowercase();
        tree.node(node)?
            .attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
    }

    /// Whether an attribute is present.
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Remove an attribute; returns whether it was present.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        let mut tree = self.shared.tree.borrow_mut();
        let name = name.to_ascii_lowercase();
        let Some(n) = tree.node_mut(node) else {
            return false;
        };
        let before = n.attrs.len();
        n.attrs.retain(|(k, _)| *k != name);
        n.attrs.len() != before
    }

    /// Set the `id` attribute.
    pub fn set_id(&self, node: NodeId, id: &str) -> Result<(), DomError> {
        self.set_attribute(node, "id", id)
    }

    /// First connected element, in document order, whose `id` is `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.shared.tree.borrow();
        tree.descendants(tree.root).into_iter().find(|&n| {
            tree.node(n)
                .is_some_and(|d| d.attrs.iter().any(|(k, v)| k == "id" && v == id))
        })
    }

    /// Connected elements matching `selector`, in document order.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        let tree = self.shared.tree.borrow();
        tree.descendants(tree.root)
            .into_iter()
            .filter(|&n| {
                tree.node(n)
                    .is_some_and(|d| selector.matches(&d.tag, &d.attrs))
            })
            .collect()
    }

    /// Parse `selector` and run [`Document::query_all`].
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self.query_all(&Selector::parse(selector)?))
    }

    // --- listeners ---

    /// Append a listener to `node`'s list for `event_type`.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        options: ListenerOptions,
        callback: impl Fn(&Event) + 'static,
    ) -> Result<ListenerId, DomError> {
        let mut tree = self.shared.tree.borrow_mut();
        tree.live(node)?;
        let id = ListenerId(tree.next_listener);
        tree.next_listener += 1;
        tree.live_mut(node)?.listeners.push(Rc::new(Listener {
            id,
            event_type: event_type.to_string(),
            options,
            callback: Rc::new(callback),
            removed: Cell::new(false),
        }));
        tree.listener_owner.insert(id, node);
        tracing::trace!(
            listener = ?id,
            ?node,
            event_type,
            capture = options.capture,
            "dom.listener.add"
        );
        Ok(id)
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut tree = self.shared.tree.borrow_mut();
        let Some(node) = tree.listener_owner.remove(&id) else {
            return false;
        };
        if let Some(n) = tree.node_mut(node)
            && let Some(i) = n.listeners.iter().position(|l| l.id == id)
        {
            n.listeners.remove(i).removed.set(true);
        }
        tracing::trace!(listener = ?id, ?node, "dom.listener.remove");
        true
    }

    /// Number of listeners on `node` for `event_type` in the given phase.
    pub fn listener_count(&self, node: NodeId, event_type: &str, capture: bool) -> usize {
        self.shared.tree.borrow().node(node).map_or(0, |n| {
            n.listeners
                .iter()
                .filter(|l| l.event_type == event_type && l.options.capture == capture)
                .count()
        })
    }

    /// Install the host's default action for `event_type` on `node`, replacing any previous one.
    pub fn set_default_action(
        &self,
        node: NodeId,
        event_type: &str,
        action: impl Fn(&Event) + 'static,
    ) -> Result<(), DomError> {
        let mut tree = self.shared.tree.borrow_mut();
        let n = tree.live_mut(node)?;
        n.default_actions.retain(|d| d.event_type != event_type);
        n.default_actions.push(DefaultAction {
            event_type: event_type.to_string(),
            action: Rc::new(action),
        });
        Ok(())
    }

    // --- dispatch ---

    /// Dispatch a script-created event at `node`.
    ///
    /// Returns `Ok(false)` if the default action was canceled.
    pub fn dispatch_event(&self, node: NodeId, event: &Event) -> Result<bool, DomError> {
        self.dispatch(node, event, false)
    }

    /// Dispatch an event the way the host does for real input: the event is trusted.
    pub fn fire(&self, node: NodeId, event: &Event) -> Result<bool, DomError> {
        self.dispatch(node, event, true)
    }

    fn dispatch(&self, origin: NodeId, event: &Event, trusted: bool) -> Result<bool, DomError> {
        if event.is_dispatching() {
            return Err(DomError::AlreadyDispatching(event.id()));
        }
        let path = {
            let tree = self.shared.tree.borrow();
            tree.live(origin)?;
            tree.path_to_root(origin)
        };
        tracing::trace!(
            event = ?event.id(),
            event_type = event.event_type(),
            ?origin,
            trusted,
            "dom.dispatch.begin"
        );

        event.begin_dispatch(origin, trusted);
        // A stop flag set before dispatch (or by the previous node) ends the walk here.
        'walk: {
            for &node in path[1..].iter().rev() {
                if event.propagation_stopped() {
                    break 'walk;
                }
                self.invoke(node, event, EventPhase::Capturing);
            }
            if event.propagation_stopped() {
                break 'walk;
            }
            self.invoke(origin, event, EventPhase::AtTarget);
            if !event.bubbles() {
                break 'walk;
            }
            for &node in &path[1..] {
                if event.propagation_stopped() {
                    break 'walk;
                }
                self.invoke(node, event, EventPhase::Bubbling);
            }
        }
        event.end_dispatch();

        if !event.default_prevented() {
            let action = {
                let tree = self.shared.tree.borrow();
                path.iter().find_map(|&n| {
                    tree.node(n)?
                        .default_actions
                        .iter()
                        .find(|d| d.event_type == event.event_type())
                        .map(|d| d.action.clone())
                })
            };
            if let Some(action) = action {
                action(event);
            }
        }
        Ok(!event.default_prevented())
    }

    fn invoke(&self, node: NodeId, event: &Event, phase: EventPhase) {
        let mut listeners: Vec<Rc<Listener>> = {
            let tree = self.shared.tree.borrow();
            let Some(n) = tree.node(node) else {
                return;
            };
            n.listeners
                .iter()
                .filter(|l| l.event_type == event.event_type())
                .filter(|l| match phase {
                    EventPhase::Capturing => l.options.capture,
                    EventPhase::Bubbling => !l.options.capture,
                    EventPhase::AtTarget => true,
                    EventPhase::None => false,
                })
                .cloned()
                .collect()
        };
        if phase == EventPhase::AtTarget {
            // Capture listeners first; stable, so registration order holds within each group.
            listeners.sort_by_key(|l| !l.options.capture);
        }

        event.enter(node, phase);
        for l in listeners {
            if event.immediate_propagation_stopped() {
                break;
            }
            if l.removed.get() {
                continue;
            }
            if l.options.once {
                self.remove_event_listener(l.id);
            }
            tracing::trace!(listener = ?l.id, ?node, ?phase, "dom.dispatch.invoke");
            event.set_in_passive_listener(l.options.passive);
            (l.callback)(event);
            event.set_in_passive_listener(false);
        }
    }

    // --- tasks ---

    /// Enqueue `task` to run once `delay_ms` of virtual time has passed.
    pub fn set_timeout(&self, delay_ms: u32, task: impl FnOnce() + 'static) -> TimerId {
        self.shared
            .tasks
            .borrow_mut()
            .schedule(delay_ms, Box::new(task))
    }

    /// Cancel a task that has not run yet. Returns `false` if it already ran or was canceled.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.shared.tasks.borrow_mut().cancel(id)
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.shared.tasks.borrow().now()
    }

    /// Number of queued tasks.
    pub fn pending_tasks(&self) -> usize {
        self.shared.tasks.borrow().len()
    }

    /// Run the next task, advancing the clock to its due time.
    pub fn run_next_task(&self) -> bool {
        let next = self.shared.tasks.borrow_mut().pop();
        let Some((id, task)) = next else {
            return false;
        };
        tracing::trace!(timer = ?id, now = self.now(), "dom.tasks.run");
        task();
        true
    }

    /// Let `ms` of virtual time pass, running every task that falls due. Returns tasks run.
    pub fn advance(&self, ms: u64) -> usize {
        let until = self.now().saturating_add(ms);
        let mut ran = 0;
        loop {
            let due = self.shared.tasks.borrow().next_due();
            match due {
                Some(d) if d <= until => {
                    self.run_next_task();
                    ran += 1;
                }
                _ => break,
            }
        }
        self.shared.tasks.borrow_mut().advance_to(until);
        ran
    }

    /// Run tasks until the queue is empty, including tasks scheduled by tasks. Returns tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next_task() {
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventInit;
    use alloc::vec;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn record(log: &Log, msg: &str) -> impl Fn(&Event) + 'static {
        let log = log.clone();
        let msg = msg.to_string();
        move |_| log.borrow_mut().push(msg.clone())
    }

    fn click() -> Event {
        Event::new(
            "click",
            EventInit {
                bubbles: true,
                cancelable: true,
                ..Default::default()
            },
        )
    }

    /// document > body > div > a
    fn tree() -> (Document, NodeId, NodeId, NodeId) {
        let doc = Document::new();
        let body = doc.create_element("body");
        let div = doc.create_element("div");
        let a = doc.create_element("a");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, div).unwrap();
        doc.append_child(div, a).unwrap();
        (doc, body, div, a)
    }

    #[test]
    fn generational_ids_do_not_alias() {
        let doc = Document::new();
        let a = doc.create_element("a");
        doc.remove(a).unwrap();
        assert!(!doc.is_alive(a));
        let b = doc.create_element("b");
        assert_ne!(a, b);
        assert!(doc.is_alive(b));
        assert_eq!(doc.remove(a), Err(DomError::StaleNode(a)));
    }

    #[test]
    fn hierarchy_rules() {
        let (doc, body, div, a) = tree();
        assert!(matches!(
            doc.append_child(a, div),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(div, div),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(body, doc.root()),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(doc.remove(doc.root()), Err(DomError::HierarchyRequest(_))));

        doc.append_child(body, a).unwrap();
        assert_eq!(doc.children_of(body), vec![div, a]);
        assert!(doc.children_of(div).is_empty());
        assert_eq!(doc.parent_of(a), Some(body));
    }

    #[test]
    fn remove_frees_subtree_and_listeners() {
        let (doc, body, div, a) = tree();
        let l = doc
            .add_event_listener(a, "click", ListenerOptions::BUBBLE, |_| {})
            .unwrap();
        doc.remove(div).unwrap();
        assert!(!doc.is_alive(a));
        assert!(doc.children_of(body).is_empty());
        assert!(!doc.remove_event_listener(l));
    }

    #[test]
    fn connected_and_queries() {
        let (doc, _body, div, a) = tree();
        doc.set_id(a, "trigger").unwrap();
        doc.set_attribute(div, "data-type", "ancestor-1").unwrap();
        doc.set_attribute(a, "data-type", "ancestor-1-link").unwrap();
        let loose = doc.create_element("a");
        doc.set_id(loose, "trigger").unwrap();

        assert!(doc.is_connected(a));
        assert!(!doc.is_connected(loose));
        assert_eq!(doc.element_by_id("trigger"), Some(a));
        assert_eq!(
            doc.query_selector_all("[data-type^=ancestor]").unwrap(),
            vec![div, a]
        );
        assert_eq!(doc.query_selector_all("a").unwrap(), vec![a]);
        assert!(doc.query_selector_all("div > a").is_err());

        assert!(doc.remove_attribute(div, "DATA-TYPE"));
        assert!(!doc.remove_attribute(div, "data-type"));
        assert_eq!(doc.attribute(a, "id").as_deref(), Some("trigger"));
        assert_eq!(doc.tag_name(a).as_deref(), Some("a"));
    }

    #[test]
    fn two_phase_order() {
        let (doc, body, div, a) = tree();
        let log = log();
        let root = doc.root();
        for (node, name) in [(root, "doc"), (body, "body"), (div, "div"), (a, "a")] {
            let bubble = record(&log, &alloc::format!("{name}:bubble"));
            let capture = record(&log, &alloc::format!("{name}:capture"));
            doc.add_event_listener(node, "click", ListenerOptions::BUBBLE, bubble)
                .unwrap();
            doc.add_event_listener(node, "click", ListenerOptions::CAPTURE, capture)
                .unwrap();
        }
        let e = click();
        assert_eq!(doc.dispatch_event(a, &e), Ok(true));
        assert_eq!(
            *log.borrow(),
            [
                "doc:capture",
                "body:capture",
                "div:capture",
                "a:capture",
                "a:bubble",
                "div:bubble",
                "body:bubble",
                "doc:bubble",
            ]
        );
        assert_eq!(e.target(), Some(a));
        assert_eq!(e.event_phase(), EventPhase::None);
        assert!(!e.is_trusted());
    }

    #[test]
    fn non_bubbling_skips_bubble_phase() {
        let (doc, body, _div, a) = tree();
        let log = log();
        let (bubble, capture) = (record(&log, "body:bubble"), record(&log, "body:capture"));
        doc.add_event_listener(body, "focus", ListenerOptions::BUBBLE, bubble)
            .unwrap();
        doc.add_event_listener(body, "focus", ListenerOptions::CAPTURE, capture)
            .unwrap();
        doc.add_event_listener(a, "focus", ListenerOptions::BUBBLE, record(&log, "a"))
            .unwrap();
        doc.fire(a, &Event::new("focus", EventInit::default())).unwrap();
        assert_eq!(*log.borrow(), ["body:capture", "a"]);
    }

    #[test]
    fn stop_propagation_finishes_current_node() {
        let (doc, _body, div, a) = tree();
        let log = log();
        doc.add_event_listener(div, "click", ListenerOptions::CAPTURE, |e| e.stop_propagation())
            .unwrap();
        doc.add_event_listener(div, "click", ListenerOptions::CAPTURE, record(&log, "div:2"))
            .unwrap();
        doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, record(&log, "a"))
            .unwrap();
        let e = click();
        doc.dispatch_event(a, &e).unwrap();
        assert_eq!(*log.borrow(), ["div:2"]);
        assert!(!e.propagation_stopped(), "flags reset after dispatch");
    }

    #[test]
    fn stop_immediate_propagation_skips_siblings() {
        let (doc, _body, div, a) = tree();
        let log = log();
        doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, |e| {
            e.stop_immediate_propagation();
        })
        .unwrap();
        doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, record(&log, "a:2"))
            .unwrap();
        doc.add_event_listener(div, "click", ListenerOptions::BUBBLE, record(&log, "div"))
            .unwrap();
        doc.dispatch_event(a, &click()).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn stop_flags_set_before_dispatch_block_every_listener() {
        let (doc, body, div, a) = tree();
        let log = log();
        for node in [doc.root(), body, div, a] {
            for options in [ListenerOptions::CAPTURE, ListenerOptions::BUBBLE] {
                doc.add_event_listener(node, "click", options, record(&log, "ran"))
                    .unwrap();
            }
        }

        let e = click();
        e.stop_propagation();
        doc.dispatch_event(a, &e).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(e.target(), Some(a));

        let e = click();
        e.stop_immediate_propagation();
        doc.dispatch_event(a, &e).unwrap();
        assert!(log.borrow().is_empty());

        // Flags are cleared by the dispatch, so the next dispatch of the same event runs.
        doc.dispatch_event(a, &e).unwrap();
        assert_eq!(log.borrow().len(), 8);
    }

    #[test]
    fn removing_a_deep_chain_does_not_recurse() {
        let doc = Document::new();
        // Built bottom-up so each insertion only walks a detached parent.
        let mut top = doc.create_element("div");
        let bottom = top;
        for _ in 0..200_000 {
            let parent = doc.create_element("div");
            doc.append_child(parent, top).unwrap();
            top = parent;
        }
        doc.append_child(doc.root(), top).unwrap();
        doc.remove(top).unwrap();
        assert!(!doc.is_alive(bottom));
        assert!(doc.children_of(doc.root()).is_empty());
    }

    #[test]
    fn removal_during_dispatch_skips_listener() {
        let (doc, _body, _div, a) = tree();
        let log = log();
        let victim = Rc::new(Cell::new(None));
        {
            let doc2 = doc.clone();
            let victim = victim.clone();
            doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, move |_| {
                if let Some(id) = victim.get() {
                    doc2.remove_event_listener(id);
                }
            })
            .unwrap();
        }
        victim.set(Some(
            doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, record(&log, "victim"))
                .unwrap(),
        ));
        doc.dispatch_event(a, &click()).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn additions_during_dispatch_wait_for_next_occurrence() {
        let (doc, body, _div, a) = tree();
        let log = log();
        {
            let doc2 = doc.clone();
            let log = log.clone();
            doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, move |_| {
                let (late_a, late_body) = (record(&log, "late-a"), record(&log, "late-body"));
                doc2.add_event_listener(a, "click", ListenerOptions::BUBBLE, late_a)
                    .unwrap();
                doc2.add_event_listener(body, "click", ListenerOptions::BUBBLE, late_body)
                    .unwrap();
            })
            .unwrap();
        }
        doc.dispatch_event(a, &click()).unwrap();
        // Lists are snapshotted per node: `body` had not been reached yet.
        assert_eq!(*log.borrow(), ["late-body"]);
    }

    #[test]
    fn once_and_passive_options() {
        let (doc, _body, _div, a) = tree();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            doc.add_event_listener(
                a,
                "click",
                ListenerOptions {
                    once: true,
                    ..ListenerOptions::BUBBLE
                },
                move |_| hits.set(hits.get() + 1),
            )
            .unwrap();
        }
        doc.add_event_listener(
            a,
            "click",
            ListenerOptions {
                passive: true,
                ..ListenerOptions::BUBBLE
            },
            Event::prevent_default,
        )
        .unwrap();
        assert_eq!(doc.dispatch_event(a, &click()), Ok(true));
        assert_eq!(doc.dispatch_event(a, &click()), Ok(true));
        assert_eq!(hits.get(), 1);
        assert_eq!(doc.listener_count(a, "click", false), 1);
    }

    #[test]
    fn default_action_runs_unless_canceled() {
        let (doc, body, div, a) = tree();
        let log = log();
        doc.set_default_action(div, "click", record(&log, "navigate")).unwrap();
        doc.set_default_action(body, "click", record(&log, "outer")).unwrap();
        assert_eq!(doc.fire(a, &click()), Ok(true));
        assert_eq!(*log.borrow(), ["navigate"]);

        doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, Event::prevent_default)
            .unwrap();
        let e = click();
        assert_eq!(doc.fire(a, &e), Ok(false));
        assert!(e.default_prevented());
        assert!(e.is_trusted());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn redispatch_mid_dispatch_is_rejected() {
        let (doc, _body, div, a) = tree();
        let seen = Rc::new(RefCell::new(None));
        {
            let doc2 = doc.clone();
            let seen = seen.clone();
            doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, move |e| {
                *seen.borrow_mut() = Some(doc2.dispatch_event(div, e));
            })
            .unwrap();
        }
        let e = click();
        doc.dispatch_event(a, &e).unwrap();
        assert_eq!(
            *seen.borrow(),
            Some(Err(DomError::AlreadyDispatching(e.id())))
        );
        // Once finished, the same occurrence may be dispatched again.
        assert!(doc.dispatch_event(div, &e).is_ok());
    }

    #[test]
    fn nested_dispatch_of_another_event() {
        let (doc, _body, div, a) = tree();
        let log = log();
        {
            let doc2 = doc.clone();
            let log = log.clone();
            doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, move |_| {
                log.borrow_mut().push("a:click".to_string());
                doc2.dispatch_event(div, &Event::new("ping", EventInit::default()))
                    .unwrap();
            })
            .unwrap();
        }
        doc.add_event_listener(div, "ping", ListenerOptions::BUBBLE, record(&log, "div:ping"))
            .unwrap();
        doc.add_event_listener(div, "click", ListenerOptions::BUBBLE, record(&log, "div:click"))
            .unwrap();
        doc.dispatch_event(a, &click()).unwrap();
        assert_eq!(*log.borrow(), ["a:click", "div:ping", "div:click"]);
    }

    #[test]
    fn dispatch_to_stale_node_fails() {
        let (doc, _body, _div, a) = tree();
        doc.remove(a).unwrap();
        assert_eq!(doc.dispatch_event(a, &click()), Err(DomError::StaleNode(a)));
        assert!(doc
            .add_event_listener(a, "click", ListenerOptions::BUBBLE, |_| {})
            .is_err());
    }

    #[test]
    fn tasks_run_only_when_driven() {
        let (doc, _body, _div, a) = tree();
        let log = log();
        {
            let doc2 = doc.clone();
            let log = log.clone();
            doc.add_event_listener(a, "click", ListenerOptions::BUBBLE, move |_| {
                let log = log.clone();
                doc2.set_timeout(0, move || log.borrow_mut().push("task".to_string()));
            })
            .unwrap();
        }
        doc.add_event_listener(doc.root(), "click", ListenerOptions::BUBBLE, record(&log, "root"))
            .unwrap();
        doc.dispatch_event(a, &click()).unwrap();
        assert_eq!(*log.borrow(), ["root"]);
        assert_eq!(doc.pending_tasks(), 1);
        assert_eq!(doc.run_until_idle(), 1);
        assert_eq!(*log.borrow(), ["root", "task"]);
    }

    #[test]
    fn advance_runs_due_tasks_only() {
        let doc = Document::new();
        let log = log();
        for (delay, name) in [(30_u32, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            doc.set_timeout(delay, move || log.borrow_mut().push(name.to_string()));
        }
        let cancel = {
            let log = log.clone();
            doc.set_timeout(15, move || log.borrow_mut().push("x".to_string()))
        };
        assert!(doc.clear_timeout(cancel));
        assert!(!doc.clear_timeout(cancel));
        assert_eq!(doc.advance(20), 2);
        assert_eq!(doc.now(), 20);
        assert_eq!(*log.borrow(), ["a", "b"]);
        assert_eq!(doc.advance(5), 0);
        assert_eq!(doc.now(), 25);
        assert!(doc.run_next_task());
        assert_eq!(doc.now(), 30);
        assert!(!doc.run_next_task());
    }

    #[test]
    fn weak_handle_does_not_keep_document_alive() {
        let doc = Document::new();
        let weak = doc.downgrade();
        assert!(weak.upgrade().is_some_and(|d| d.ptr_eq(&doc)));
        drop(doc);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn host_features_are_reported() {
        assert_eq!(Document::new().features(), HostFeatures::MODERN);
        let old = Document::with_features(HostFeatures::LEGACY);
        assert!(!old.features().contains(HostFeatures::EVENT_CONSTRUCTORS));
    }
}
