//! The execution engine's core: bytecode analysis (C7), the threaded
//! interpreter dispatch loop (C8), the ~140 opcode handlers (C9), and the
//! stack/memory/return-data primitives they operate on (C2/C3/C5).
//!
//! This crate knows nothing about call/create dispatch across frames
//! (that is `evmcore-vm`, C10) beyond exposing the handful of
//! [`ExecutionOutcome`] variants a frame boundary needs to react to.

pub mod bytecode;
pub mod frame;
pub mod instructions;
pub mod interpreter;
pub mod memory;
pub mod return_data;
pub mod stack;

pub use bytecode::{AnalysisError, AnalyzedBytecode, Instruction};
pub use frame::{CallKind, Frame, FrameInput};
pub use interpreter::{ExecutionOutcome, HaltReason, Interpreter, InterpreterError};
pub use memory::Memory;
pub use return_data::ReturnDataBuffer;
pub use stack::{Stack, StackError};
