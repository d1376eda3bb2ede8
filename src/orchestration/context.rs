//! # Shared Context Fields
//!
//! The orchestration context is shared as `Arc<C>` between every task in a
//! batch, and the coordinator never locks it. Each field a task writes therefore
//! needs its own interior mutability. [`Slot`] is the cell intended for that: a
//! field that one task fills and the caller reads back after the join.
//!
//! Sibling tasks should write disjoint slots. Nothing stops two tasks from
//! writing the same slot, in which case the last write wins.

use parking_lot::Mutex;
use std::fmt;

/// A single context field filled in by a task
pub struct Slot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Slot<T> {
    pub fn empty() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }

    /// Store a value, dropping any previous one
    pub fn set(&self, value: T) {
        *self.value.lock() = Some(value);
    }

    /// Store a value and return the previous one
    pub fn replace(&self, value: T) -> Option<T> {
        self.value.lock().replace(value)
    }

    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }

    /// Run `f` against the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.value.lock().as_ref())
    }

    pub fn into_inner(self) -> Option<T> {
        self.value.into_inner()
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> Option<T> {
        self.value.lock().clone()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.value.lock()).finish()
    }
}
