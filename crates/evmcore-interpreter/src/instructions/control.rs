//! Control flow: `JUMP`/`JUMPI`, and the two ways a frame halts with
//! output data, `RETURN`/`REVERT` (C9). Jump-target validation falls
//! back to a runtime lookup only when the analyzer (C7) could not
//! resolve the target statically.

use super::DispatchResult;
use crate::bytecode::Instruction;
use crate::interpreter::{HaltReason, Interpreter};

fn resolve_jump(interp: &mut Interpreter<'_>, instr: &Instruction, target: evmcore_primitives::Word) -> Option<usize> {
    if let Some(static_target) = instr.static_target {
        return Some(static_target);
    }
    if target.bit_len() > 32 {
        return None;
    }
    let pc = target.as_limbs()[0] as usize;
    if !interp.frame.analyzed.is_valid_jumpdest(pc) {
        return None;
    }
    interp.frame.analyzed.instruction_index_at(pc)
}

pub fn jump(interp: &mut Interpreter<'_>, instr: &Instruction) -> DispatchResult {
    let target = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    match resolve_jump(interp, instr, target) {
        Some(idx) => DispatchResult::Jump(idx),
        None => DispatchResult::Halt(HaltReason::InvalidJump, Vec::new()),
    }
}

pub fn jumpi(interp: &mut Interpreter<'_>, instr: &Instruction) -> DispatchResult {
    let (target, cond) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };
    if cond.is_zero() {
        return DispatchResult::Advance;
    }
    match resolve_jump(interp, instr, target) {
        Some(idx) => DispatchResult::Jump(idx),
        None => DispatchResult::Halt(HaltReason::InvalidJump, Vec::new()),
    }
}

enum OutputBytes {
    Ready(Vec<u8>),
    Halt(DispatchResult),
}

fn output_bytes(interp: &mut Interpreter<'_>) -> OutputBytes {
    let (offset, size) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return OutputBytes::Halt(e.into()),
    };
    if offset.bit_len() > 32 || size.bit_len() > 32 {
        return OutputBytes::Halt(DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new()));
    }
    let offset = offset.as_limbs()[0] as u64;
    let size = size.as_limbs()[0] as u64;
    if let Some(halt) = interp.charge_memory_expansion(offset, size) {
        return OutputBytes::Halt(halt);
    }
    OutputBytes::Ready(interp.frame.memory.slice(offset as usize, size as usize).to_vec())
}

pub fn ret(interp: &mut Interpreter<'_>) -> DispatchResult {
    match output_bytes(interp) {
        OutputBytes::Ready(data) => DispatchResult::Halt(HaltReason::Return, data),
        OutputBytes::Halt(result) => result,
    }
}

pub fn revert(interp: &mut Interpreter<'_>) -> DispatchResult {
    match output_bytes(interp) {
        OutputBytes::Ready(data) => DispatchResult::Halt(HaltReason::Revert, data),
        OutputBytes::Halt(result) => result,
    }
}
