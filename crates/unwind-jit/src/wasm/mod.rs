//! WASM surface of the trampoline.
//!
//! [`abi`] holds the stable import/export names shared by the encoder and the backend;
//! [`trampoline`] emits the module itself.

pub mod abi;
pub mod trampoline;

pub use abi::*;
pub use trampoline::encode_trampoline;
