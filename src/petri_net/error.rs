//! Typed errors for the parts of the engine that are domain-legal
//! failures rather than programming errors.
//!
//! Failures fall into three categories: programming errors (precondition
//! violations, which panic and are deliberately not represented here),
//! domain-legal non-enablement (silent; produces queueing, not an
//! `Err`), and action failures (typed, propagated to the caller of
//! `queue_fire` unchanged). This module is the typed half: action
//! failures.

use thiserror::Error;

/// An error raised by a user-supplied transition action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action declined to run under the given token/arguments.
    #[error("action failed: {0}")]
    Failed(String),
    /// The action expected a different shape of opaque argument than the
    /// one it was called with.
    #[error("action argument mismatch: {0}")]
    ArgumentMismatch(String),
}

/// An error raised while firing a transition.
#[derive(Debug, Error)]
pub enum FireError {
    /// The transition's action returned an error. Propagates unchanged;
    /// the fire that raised it has not moved its input/output tokens,
    /// but earlier fires in the same cascade are not rolled back.
    #[error(transparent)]
    Action(#[from] ActionError),
}
