//! Observable state container
//!
//! [`StateContainer`] owns one state tree and notifies its subscribers
//! synchronously after every top-level mutation. Two mutation styles exist:
//!
//! - [`StateContainer::set_state`] merges a patch into the tree. Keys the
//!   patch does not name are kept, `Null` deletes a key.
//! - [`StateContainer::replace_state`] swaps the whole tree.
//!
//! # Example
//!
//! ```
//! use libtether::{StateContainer, Value};
//! use serde_json::json;
//!
//! # fn main() -> libtether::Result<()> {
//! let mut store = StateContainer::new(Some(json!({ "a": { "x": 1, "y": 2 } }).into()));
//! store.subscribe(|state| println!("state is now {}", state));
//!
//! store.set_state(json!({ "a": { "x": 10 } }).into())?;
//! assert_eq!(store.state(), &Value::from(json!({ "a": { "x": 10, "y": 2 } })));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, TetherError};
use crate::subscribers::{Subscribers, Subscription};
use crate::value::{merge_into, Mapping, Value};

/// Callback invoked with the new state after each mutation
pub type StateListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Mutable state tree with synchronous change notification
pub struct StateContainer {
    state: Value,
    subscribers: Subscribers<dyn Fn(&Value) + Send + Sync>,
}

impl StateContainer {
    /// Create a container holding `initial`, or an empty mapping
    ///
    /// The initial tree is not validated.
    pub fn new(initial: Option<Value>) -> Self {
        Self {
            state: initial.unwrap_or_else(Value::empty_mapping),
            subscribers: Subscribers::new(),
        }
    }

    /// Current state tree
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Merge `patch` into the state, then notify subscribers once
    ///
    /// `patch` must be a mapping. For each of its keys, in order: `Null`
    /// removes the key, a mapping over a mapping merges recursively, and any
    /// other value (sequences included) overwrites. Keys absent from the
    /// patch are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::InvalidArgument`] if `patch` is not a mapping.
    /// Nothing is mutated and nobody is notified in that case.
    pub fn set_state(&mut self, patch: Value) -> Result<()> {
        let patch = match patch {
            Value::Mapping(map) => map,
            other => {
                return Err(TetherError::InvalidArgument(format!(
                    "set_state expects a mapping, got {}",
                    other.kind()
                )));
            }
        };

        if !self.state.is_mapping() {
            debug!(
                previous = self.state.kind(),
                "state root is not a mapping, merging into an empty one"
            );
            self.state = Value::empty_mapping();
        }
        if let Value::Mapping(stem) = &mut self.state {
            debug!(keys = patch.len(), "merging state patch");
            merge_into(stem, patch);
        }

        self.notify();
        Ok(())
    }

    /// Replace the whole state tree, then notify subscribers
    ///
    /// Accepts mappings and sequences. Any other value is ignored without
    /// error: the state stays as it was and nobody is notified.
    pub fn replace_state(&mut self, new_state: Value) {
        match new_state {
            Value::Mapping(_) | Value::Sequence(_) => {
                debug!(kind = new_state.kind(), "replacing state");
                self.state = new_state;
                self.notify();
            }
            other => {
                debug!(kind = other.kind(), "ignoring replace_state with a non-object value");
            }
        }
    }

    /// Subscribe `listener` to state changes
    ///
    /// Returns `None` if this exact listener (same `Arc`) is already
    /// subscribed; it stays subscribed once.
    pub fn on_state_changed(&mut self, listener: StateListener) -> Option<Subscription> {
        self.subscribers.add(listener)
    }

    /// Subscribe a closure to state changes
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        // a fresh Arc can never be a duplicate
        self.subscribers.push(Arc::new(listener))
    }

    /// Remove a subscriber; returns `false` if it was not subscribed
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.subscribers.remove(subscription)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&self) {
        for listener in self.subscribers.iter() {
            listener(&self.state);
        }
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl From<Mapping> for StateContainer {
    fn from(initial: Mapping) -> Self {
        Self::new(Some(Value::Mapping(initial)))
    }
}

impl fmt::Debug for StateContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateContainer")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
