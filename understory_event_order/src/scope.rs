// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target sets for the scoped ordering primitives.

use alloc::vec::Vec;

use understory_dom::{Document, DomError, NodeId};

/// One node or a set of nodes. An event is in scope when its origin is a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// A single node.
    Node(NodeId),
    /// Any of these nodes.
    Nodes(Vec<NodeId>),
}

impl Scope {
    /// Resolve `selector` against the connected tree, as it is now.
    ///
    /// Nodes that start matching later are not picked up.
    pub fn select(doc: &Document, selector: &str) -> Result<Self, DomError> {
        doc.query_selector_all(selector).map(Self::Nodes)
    }

    /// Whether `node` is a member.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes().contains(&node)
    }

    /// Members as a slice.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Self::Node(n) => core::slice::from_ref(n),
            Self::Nodes(ns) => ns,
        }
    }

    /// Whether the scope has no members.
    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }
}

impl From<NodeId> for Scope {
    fn from(n: NodeId) -> Self {
        Self::Node(n)
    }
}

impl From<Vec<NodeId>> for Scope {
    fn from(ns: Vec<NodeId>) -> Self {
        Self::Nodes(ns)
    }
}

impl From<&[NodeId]> for Scope {
    fn from(ns: &[NodeId]) -> Self {
        Self::Nodes(ns.to_vec())
    }
}

impl FromIterator<NodeId> for Scope {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self::Nodes(iter.into_iter().collect())
    }
}
