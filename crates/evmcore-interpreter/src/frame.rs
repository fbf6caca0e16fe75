//! Frame lifecycle (C11): the state one call/create execution context
//! carries for its lifetime — its analyzed code, its own stack/memory/
//! return-data, its remaining gas, and the inputs the host handed it.
//!
//! A [`Frame`] does not know how to perform a nested call or create; it
//! only runs until it halts or needs one, at which point the interpreter
//! (C8) surfaces an [`crate::interpreter::ExecutionOutcome`] request and
//! the frame-stack owner (`evmcore-vm`, C10) is responsible for pushing a
//! child frame and resuming this one with the result.

use std::sync::Arc;

use evmcore_primitives::{Address, Word};

use crate::bytecode::AnalyzedBytecode;
use crate::memory::Memory;
use crate::return_data::ReturnDataBuffer;
use crate::stack::Stack;

/// What kind of message call or contract creation produced this frame;
/// governs `ADDRESS`/`CALLER`/`CALLVALUE`'s answers and whether state
/// mutation is permitted (§5/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
}

impl CallKind {
    /// `true` for `STATICCALL` and any frame nested inside one (§5's
    /// "staticness is sticky": a state-mutating opcode inside a static
    /// context is an exceptional halt regardless of which opcode entered
    /// it).
    #[must_use]
    pub fn is_create(self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// The inputs a frame is constructed from, supplied by whoever is
/// dispatching the call/create (`evmcore-vm`).
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub kind: CallKind,
    /// The account whose storage/balance this frame acts on behalf of
    /// (`ADDRESS`). For `DELEGATECALL`/`CALLCODE` this differs from
    /// `code_address`.
    pub address: Address,
    /// The account whose code is actually executing (`EXTCODE*` of self
    /// would still read `address`'s code except under `CALLCODE`/
    /// `DELEGATECALL`, where code and storage accounts diverge).
    pub code_address: Address,
    pub caller: Address,
    pub value: Word,
    pub calldata: Vec<u8>,
    pub gas_limit: u64,
    /// `true` once inside a `STATICCALL`, forbidding `SSTORE`, `LOG*`,
    /// `CREATE*`, `SELFDESTRUCT`, and value-transferring `CALL`.
    pub is_static: bool,
}

/// One call/create's execution context.
#[derive(Debug, Clone)]
pub struct Frame {
    pub input: FrameInput,
    pub analyzed: Arc<AnalyzedBytecode>,
    pub stack: Stack,
    pub memory: Memory,
    pub return_data: ReturnDataBuffer,
    /// Index into `analyzed.instructions()`, not a raw byte offset.
    pub instr_index: usize,
    pub gas_remaining: u64,
    /// Nesting depth, checked against the 1024 call-depth limit by the
    /// frame-stack owner before this frame is even constructed.
    pub depth: usize,
}

impl Frame {
    #[must_use]
    pub fn new(input: FrameInput, analyzed: Arc<AnalyzedBytecode>, depth: usize) -> Self {
        let gas_remaining = input.gas_limit;
        Self {
            input,
            analyzed,
            stack: Stack::new(),
            memory: Memory::new(),
            return_data: ReturnDataBuffer::new(),
            instr_index: 0,
            gas_remaining,
            depth,
        }
    }

    /// Deducts `amount` from the frame's remaining gas, returning `false`
    /// (without underflowing) if that would go negative — callers treat
    /// that as an out-of-gas halt.
    #[must_use]
    pub fn charge_gas(&mut self, amount: u64) -> bool {
        match self.gas_remaining.checked_sub(amount) {
            Some(remaining) => {
                self.gas_remaining = remaining;
                true
            }
            None => false,
        }
    }
}
