//! Call/create machinery (C10) and the top-level transaction entry point
//! (§6) for the EVM execution engine: the layer above `evmcore-interpreter`
//! that owns the frame stack, folds a finished frame's outcome back into
//! its caller, and turns the whole thing into one [`ExecutionResult`].
//!
//! Everything else in this workspace is a library the interpreter or the
//! host call into; this crate is the one piece meant to be driven directly
//! by a transaction executor.

pub mod address;
pub mod frame_stack;
pub mod result;

pub use address::{address_to_word, create2_address, create_address, word_to_address};
pub use frame_stack::{run_exec_loop, VmError};
pub use result::ExecutionResult;
