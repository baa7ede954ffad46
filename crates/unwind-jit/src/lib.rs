//! Dynamically generated code units used to stress unwinding out of JIT code.
//!
//! The crate is split along the boundary the benchmark cares about:
//! - [`wasm`]: the fixed trampoline description (ABI names + module encoder).
//! - [`backend`]: the `wasmtime`-powered code generator that turns the description into
//!   independently compiled, loaded and registered [`DynamicUnit`]s.
//! - [`callback`]: the host callback signature and its abrupt-termination payload.
//!
//! A trampoline is the native equivalent of `int foo(int (*cb)(int), int v) { return cb(v); }`.
//! Every unit is a separate compilation, so creating and dropping units churns the runtime's
//! global code and unwind registration, which is the path under measurement.

pub mod callback;
pub mod wasm;

// Native (non-wasm32) code generation backend.
#[cfg(not(target_arch = "wasm32"))]
pub mod backend;

pub use callback::{Abort, Callback};

#[cfg(not(target_arch = "wasm32"))]
pub use backend::{BackendError, DynamicUnit, InvokeError, JitBackend};
