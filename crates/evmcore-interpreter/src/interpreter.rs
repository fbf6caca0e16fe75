//! The threaded interpreter dispatch loop (C8). Each call to
//! [`Interpreter::step`] executes exactly one analyzed instruction and
//! returns either [`StepOutcome::Continue`] or a terminal
//! [`ExecutionOutcome`] — a halt, or a call/create request the
//! frame-stack owner (`evmcore-vm`, C10) must service before resuming
//! this frame.
//!
//! Entering a new basic block charges that block's aggregated static gas
//! and validates its minimum stack depth in one shot (the "block
//! prologue" the analyzer, C7, precomputed), so individual handlers for
//! opcodes with a purely static cost never touch the gas meter at all.

use evmcore_host::Host;
use evmcore_primitives::{gas, SpecId, Word};
use thiserror::Error;

use crate::frame::Frame;
use crate::instructions;
use crate::stack::StackError;

/// Why a frame stopped running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// `STOP`, or falling off the end of the code.
    Stop,
    /// `RETURN`.
    Return,
    /// `REVERT`: output is the revert reason, state changes unwind.
    Revert,
    /// `SELFDESTRUCT` completed.
    SelfDestruct,
    /// Gas was exhausted, by a block prologue or a dynamic charge.
    OutOfGas,
    StackOverflow,
    StackUnderflow,
    /// A `JUMP`/`JUMPI` target was not a valid `JUMPDEST`.
    InvalidJump,
    /// `INVALID`, or a byte that is not a defined opcode.
    InvalidOpcode,
    /// A state-mutating opcode ran inside a `STATICCALL` context.
    StaticStateChange,
    /// `RETURNDATACOPY` addressed past the end of the return-data buffer.
    ReturnDataOutOfBounds,
    /// Deployed code begins with the EIP-3541 reserved byte, or exceeds
    /// the EIP-170/3860 size limit.
    InvalidCode,
    /// A memory/calldata offset or length popped off the stack does not
    /// fit in the addressable range (> 2^32), per §7's `OutOfOffset`.
    InvalidMemoryAccess,
}

/// The terminal result of running a frame to completion (from the
/// interpreter's point of view — `evmcore-vm` may still need to persist
/// or roll back database effects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub reason: HaltReason,
    pub output: Vec<u8>,
    pub gas_remaining: u64,
}

/// One step either continues, yields a terminal outcome, or yields a
/// request for a nested call/create that only the frame-stack owner can
/// service (it alone can push a child frame).
#[derive(Debug)]
pub enum StepOutcome {
    Continue,
    Exit(ExecutionOutcome),
    Call(instructions::system::CallRequest),
    Create(instructions::system::CreateRequest),
}

/// Errors surfaced by the host while a step runs; anything from `Host`
/// propagates as this rather than being swallowed into a halt, since a
/// database error is an engine bug, not EVM-defined behavior.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("host error: {0}")]
    Host(#[from] evmcore_host::DatabaseError),
}

/// Drives a single [`Frame`] one instruction at a time.
pub struct Interpreter<'a> {
    pub frame: &'a mut Frame,
    pub spec: SpecId,
}

impl<'a> Interpreter<'a> {
    #[must_use]
    pub fn new(frame: &'a mut Frame, spec: SpecId) -> Self {
        Self { frame, spec }
    }

    /// Runs the frame until it halts or requests a nested call/create.
    pub fn run(&mut self, host: &mut dyn Host) -> Result<StepOutcome, InterpreterError> {
        loop {
            match self.step(host)? {
                StepOutcome::Continue => continue,
                other => return Ok(other),
            }
        }
    }

    fn halt(&self, reason: HaltReason, output: Vec<u8>) -> StepOutcome {
        StepOutcome::Exit(ExecutionOutcome {
            reason,
            output,
            gas_remaining: self.frame.gas_remaining,
        })
    }

    /// Executes exactly one instruction.
    pub fn step(&mut self, host: &mut dyn Host) -> Result<StepOutcome, InterpreterError> {
        if self.frame.instr_index >= self.frame.analyzed.instructions().len() {
            return Ok(self.halt(HaltReason::Stop, Vec::new()));
        }

        let instr = self.frame.analyzed.instructions()[self.frame.instr_index].clone();
        let block = *self.frame.analyzed.block(instr.block);

        // Block prologue: charge the block's aggregated static gas and
        // validate its minimum stack depth exactly once, on entry.
        if self.frame.instr_index == block.start {
            if !self.frame.charge_gas(block.total_static_gas) {
                return Ok(self.halt(HaltReason::OutOfGas, Vec::new()));
            }
            if (self.frame.stack.len() as u16) < block.stack_min_required {
                return Ok(self.halt(HaltReason::StackUnderflow, Vec::new()));
            }
            let projected_max = self.frame.stack.len() as i64 + i64::from(block.stack_max_growth);
            if projected_max > crate::stack::STACK_LIMIT as i64 {
                return Ok(self.halt(HaltReason::StackOverflow, Vec::new()));
            }
        }

        let op = instr.opcode;

        if !self.spec.opcode_enabled(op) {
            return Ok(self.halt(HaltReason::InvalidOpcode, Vec::new()));
        }

        let outcome = instructions::dispatch(self, host, &instr)?;
        match outcome {
            instructions::DispatchResult::Advance => {
                self.frame.instr_index += 1;
                Ok(StepOutcome::Continue)
            }
            instructions::DispatchResult::Jump(target) => {
                self.frame.instr_index = target;
                Ok(StepOutcome::Continue)
            }
            instructions::DispatchResult::Halt(reason, output) => Ok(self.halt(reason, output)),
            instructions::DispatchResult::Call(req) => Ok(StepOutcome::Call(req)),
            instructions::DispatchResult::Create(req) => Ok(StepOutcome::Create(req)),
        }
    }

    /// Charges `amount` gas, returning a ready-to-propagate halt on
    /// exhaustion; the common path for every handler's dynamic charge.
    #[must_use]
    pub(crate) fn charge(&mut self, amount: u64) -> Option<instructions::DispatchResult> {
        if self.frame.charge_gas(amount) {
            None
        } else {
            Some(instructions::DispatchResult::Halt(HaltReason::OutOfGas, Vec::new()))
        }
    }

    /// Charges whatever memory expansion is needed to address
    /// `[offset, offset+size)`, growing memory if the charge succeeds.
    #[must_use]
    pub(crate) fn charge_memory_expansion(
        &mut self,
        offset: u64,
        size: u64,
    ) -> Option<instructions::DispatchResult> {
        let new_words = crate::memory::Memory::words_for(offset, size);
        let cost = gas::memory_expansion_cost(self.frame.memory.num_words(), new_words);
        let halt = self.charge(cost);
        if halt.is_none() {
            self.frame.memory.resize_words(new_words);
        }
        halt
    }

    pub(crate) fn pop(&mut self) -> Result<Word, StackError> {
        self.frame.stack.pop()
    }
}
