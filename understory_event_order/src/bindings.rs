// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A collection of registrations torn down together.

use alloc::vec::Vec;

use crate::bind::Registration;

/// Registrations owned as a group, e.g. everything one configuration installed.
///
/// Dropping the collection does not unbind anything; call [`Bindings::unbind_all`].
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    regs: Vec<Registration>,
}

impl Bindings {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration.
    pub fn push(&mut self, reg: Registration) {
        self.regs.push(reg);
    }

    /// Number of registrations held, bound or not.
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Registrations in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, Registration> {
        self.regs.iter()
    }

    /// Unbind every registration and empty the collection.
    ///
    /// Returns how many were still bound.
    pub fn unbind_all(&mut self) -> usize {
        self.regs.drain(..).filter(Registration::unbind).count()
    }

    /// Forget registrations that are no longer bound, such as spent one-shots.
    pub fn retain_bound(&mut self) {
        self.regs.retain(Registration::is_bound);
    }
}

impl Extend<Registration> for Bindings {
    fn extend<I: IntoIterator<Item = Registration>>(&mut self, iter: I) {
        self.regs.extend(iter);
    }
}

impl FromIterator<Registration> for Bindings {
    fn from_iter<I: IntoIterator<Item = Registration>>(iter: I) -> Self {
        Self {
            regs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a Registration;
    type IntoIter = core::slice::Iter<'a, Registration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
