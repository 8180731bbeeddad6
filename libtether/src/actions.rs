//! Observable actions
//!
//! An [`ActionRegistry`] holds a fixed set of named actions declared at
//! construction. Each action has a list of subscribers and at most one
//! handler, bound once with [`ActionRegistry::register`].
//!
//! # Completion
//!
//! [`ActionRegistry::call`] runs the action's handler with a [`Done`]
//! completion handle. Subscribers hear nothing until the handler completes
//! that handle, which it may do right away, from another thread after
//! arbitrary work, or never. An action without a handler publishes
//! immediately with no data.
//!
//! # Example
//!
//! ```
//! use libtether::{ActionRegistry, Value};
//! use std::sync::{Arc, Mutex};
//!
//! # fn main() -> libtether::Result<()> {
//! let actions = ActionRegistry::new(["login", "logout"]);
//!
//! actions.register("login", |done, args| {
//!     let user = args.and_then(|v| v.as_str().map(str::to_string));
//!     done.complete(user.map(Value::from));
//! })?;
//!
//! let last = Arc::new(Mutex::new(None));
//! let sink = last.clone();
//! actions.subscribe("login", move |data| *sink.lock().unwrap() = data.cloned())?;
//!
//! actions.call("login", Some(Value::from("ada")));
//! assert_eq!(*last.lock().unwrap(), Some(Value::from("ada")));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{Result, TetherError};
use crate::subscribers::{Subscribers, Subscription};
use crate::value::{Mapping, Value};

/// Callback invoked with the completion data of an action
pub type ActionListener = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// Function bound to an action; receives the completion handle and call arguments
pub type ActionHandler = Arc<dyn Fn(Done, Option<Value>) + Send + Sync>;

type ListenerFn = dyn Fn(Option<&Value>) + Send + Sync;

struct Action {
    subscribers: Mutex<Subscribers<ListenerFn>>,
    handler: OnceLock<ActionHandler>,
}

impl Action {
    fn new() -> Self {
        Self {
            subscribers: Mutex::new(Subscribers::new()),
            handler: OnceLock::new(),
        }
    }

    // the list is never left half-updated, so a poisoned lock is still usable
    fn subscribers(&self) -> MutexGuard<'_, Subscribers<ListenerFn>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of named actions with completion subscribers
///
/// Cloning is cheap and every clone shares the same actions, handlers and
/// subscribers.
#[derive(Clone)]
pub struct ActionRegistry {
    actions: Arc<IndexMap<String, Action>>,
}

impl ActionRegistry {
    /// Declare the actions this registry supports
    ///
    /// The set of names is fixed from here on. Repeated names collapse into
    /// one action.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = names
            .into_iter()
            .map(|name| (name.into(), Action::new()))
            .collect();
        Self {
            actions: Arc::new(actions),
        }
    }

    /// Declare one action per key of `spec`; the values are ignored
    pub fn from_spec(spec: &Mapping) -> Self {
        Self::new(spec.keys().cloned())
    }

    /// Bind `handler` to the action `name`
    ///
    /// # Errors
    ///
    /// - [`TetherError::NotFound`] if `name` was not declared
    /// - [`TetherError::AlreadyRegistered`] if the action already has a
    ///   handler; the first handler stays bound
    pub fn register<F>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(Done, Option<Value>) + Send + Sync + 'static,
    {
        self.register_handler(name, Arc::new(handler))
    }

    /// Bind an already shared `handler` to the action `name`
    ///
    /// The same handler may back several actions; [`Done::action`] tells it
    /// which one it is completing.
    ///
    /// # Errors
    ///
    /// Same as [`ActionRegistry::register`].
    pub fn register_handler(&self, name: &str, handler: ActionHandler) -> Result<()> {
        let action = self.action(name)?;
        action
            .handler
            .set(handler)
            .map_err(|_| TetherError::AlreadyRegistered(name.to_string()))?;

        debug!(action = name, "registered action handler");
        Ok(())
    }

    /// Trigger the action `name`
    ///
    /// With a handler bound, the handler runs with a [`Done`] handle and
    /// `args`; subscribers are notified when that handle completes. Without
    /// one, subscribers are notified right away with no data. Undeclared
    /// names are ignored.
    pub fn call(&self, name: &str, args: Option<Value>) {
        let Some(action) = self.actions.get(name) else {
            trace!(action = name, "ignoring call to undeclared action");
            return;
        };

        match action.handler.get() {
            Some(handler) => {
                debug!(action = name, "invoking action handler");
                handler(Done::new(self, name), args);
            }
            None => self.publish(name, None),
        }
    }

    /// Notify every subscriber of `name`, in subscription order, with `data`
    ///
    /// Undeclared names and empty subscriber lists are not an error.
    /// Subscribers are snapshotted first, so a subscriber may subscribe or
    /// unsubscribe while being notified; the change applies from the next
    /// publish.
    pub fn publish(&self, name: &str, data: Option<Value>) {
        let Some(action) = self.actions.get(name) else {
            return;
        };

        let listeners = action.subscribers().snapshot();
        debug!(action = name, subscribers = listeners.len(), "publishing action");
        for listener in listeners {
            listener(data.as_ref());
        }
    }

    /// Subscribe `listener` to completions of `name`
    ///
    /// Returns `Ok(None)` if this exact listener (same `Arc`) is already
    /// subscribed to the action.
    ///
    /// # Errors
    ///
    /// [`TetherError::NotFound`] if `name` was not declared.
    pub fn on(&self, name: &str, listener: ActionListener) -> Result<Option<Subscription>> {
        Ok(self.action(name)?.subscribers().add(listener))
    }

    /// Subscribe a closure to completions of `name`
    ///
    /// # Errors
    ///
    /// [`TetherError::NotFound`] if `name` was not declared.
    pub fn subscribe<F>(&self, name: &str, listener: F) -> Result<Subscription>
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        Ok(self.action(name)?.subscribers().push(Arc::new(listener)))
    }

    /// Remove one subscriber from `name`; returns `false` if either is unknown
    pub fn unsubscribe(&self, name: &str, subscription: Subscription) -> bool {
        self.actions
            .get(name)
            .is_some_and(|action| action.subscribers().remove(subscription))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Declared action names, in declaration order
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.actions
            .get(name)
            .is_some_and(|action| action.handler.get().is_some())
    }

    /// Number of subscribers of `name`, zero for undeclared names
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.actions
            .get(name)
            .map_or(0, |action| action.subscribers().len())
    }

    fn action(&self, name: &str) -> Result<&Action> {
        self.actions
            .get(name)
            .ok_or_else(|| TetherError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, action) in self.actions.iter() {
            map.entry(
                name,
                &format_args!(
                    "{{ handler: {}, subscribers: {} }}",
                    action.handler.get().is_some(),
                    action.subscribers().len()
                ),
            );
        }
        map.finish()
    }
}

/// Completion handle passed to an action handler
///
/// Completing it publishes to the action's subscribers. The handle can be
/// cloned and moved to another thread or task; each completion publishes
/// once.
///
/// The handle only holds a weak reference to the registry. A handle parked
/// in a task or stored inside a handler does not keep the registry alive,
/// and completing it after every [`ActionRegistry`] clone has been dropped
/// does nothing.
#[derive(Clone)]
pub struct Done {
    actions: Weak<IndexMap<String, Action>>,
    action: String,
}

impl Done {
    fn new(registry: &ActionRegistry, action: &str) -> Self {
        Self {
            actions: Arc::downgrade(&registry.actions),
            action: action.to_string(),
        }
    }

    /// Name of the action this handle completes
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Publish `data` to the action's subscribers
    pub fn complete(&self, data: Option<Value>) {
        match self.actions.upgrade() {
            Some(actions) => ActionRegistry { actions }.publish(&self.action, data),
            None => trace!(action = %self.action, "dropping completion, registry is gone"),
        }
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done").field("action", &self.action).finish()
    }
}
