// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by host operations.

use alloc::string::String;

use crate::types::{EventId, NodeId};

/// Error type for [`Document`](crate::Document) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node handle is stale or belongs to a freed slot.
    #[error("node {0:?} is not alive")]
    StaleNode(NodeId),
    /// The requested tree mutation would break the hierarchy.
    #[error("hierarchy request rejected: {0}")]
    HierarchyRequest(&'static str),
    /// The event is already being dispatched.
    #[error("event {0:?} is already being dispatched")]
    AlreadyDispatching(EventId),
    /// The selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// The selector text as given.
        selector: String,
        /// What went wrong.
        reason: &'static str,
    },
}
