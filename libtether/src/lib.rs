//! Tether - observable state and observable actions
//!
//! Two independent primitives for small application architectures:
//!
//! - [`StateContainer`]: a mutable state tree with merge-style and
//!   replace-style mutation, notifying subscribers synchronously after each
//!   change.
//! - [`ActionRegistry`]: a fixed set of named actions, each with at most one
//!   handler that signals completion through a [`Done`] handle, and
//!   subscribers notified with the completion data.
//!
//! Neither type is a global. Create the instances your application needs and
//! pass them to the code that subscribes or mutates.

pub mod actions;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
mod subscribers;
pub mod value;

// Re-export commonly used types
pub use actions::{ActionHandler, ActionListener, ActionRegistry, Done};
pub use config::Config;
pub use error::{ConfigError, Result, TetherError};
pub use state::{StateContainer, StateListener};
pub use subscribers::Subscription;
pub use value::{Mapping, Value};
