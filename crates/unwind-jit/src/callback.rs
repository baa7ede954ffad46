//! Host callbacks invoked from generated code.

use thiserror::Error;

/// Native callback reachable from a trampoline: `int (*)(int)` with an abrupt exit.
///
/// Returning `Err` unwinds through every generated frame between the host caller and the
/// callback; the trampoline never observes a value in that case.
pub type Callback = fn(i32) -> Result<i32, Abort>;

/// Payload carried by an abrupt termination raised from a [`Callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("callback aborted on input {value}")]
pub struct Abort {
    pub value: i32,
}
