//! Stack manipulation (`PUSHn`/`DUPn`/`SWAPn`/`POP`) and memory access
//! (`MLOAD`/`MSTORE`/`MSTORE8`/`MCOPY`) opcodes (C9). `PUSHn`'s immediate
//! was already decoded by the analyzer (C7); the handler just pushes it.

use evmcore_primitives::{gas, opcode, Word};

use super::DispatchResult;
use crate::bytecode::Instruction;
use crate::interpreter::Interpreter;

pub fn push(interp: &mut Interpreter<'_>, instr: &Instruction) -> DispatchResult {
    let value = instr.push_value.unwrap_or(Word::ZERO);
    match interp.frame.stack.push(value) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn push0(interp: &mut Interpreter<'_>) -> DispatchResult {
    match interp.frame.stack.push(Word::ZERO) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn dup(interp: &mut Interpreter<'_>, op: u8) -> DispatchResult {
    let n = opcode::dup_n(op) as usize;
    match interp.frame.stack.dup(n) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn swap(interp: &mut Interpreter<'_>, op: u8) -> DispatchResult {
    let n = opcode::swap_n(op) as usize;
    match interp.frame.stack.swap(n) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn pop(interp: &mut Interpreter<'_>) -> DispatchResult {
    match interp.frame.stack.pop() {
        Ok(_) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

/// Reads a stack item as a memory offset, halting on values too large
/// to ever be a sane offset rather than attempting a 256-bit allocation.
fn as_offset(value: Word) -> Option<usize> {
    if value.bit_len() > 32 {
        return None;
    }
    Some(value.as_limbs()[0] as usize)
}

pub fn mload(interp: &mut Interpreter<'_>) -> DispatchResult {
    let offset = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let Some(offset) = as_offset(offset) else {
        return DispatchResult::Halt(crate::interpreter::HaltReason::InvalidMemoryAccess, Vec::new());
    };
    if let Some(halt) = interp.charge_memory_expansion(offset as u64, 32) {
        return halt;
    }
    let value = interp.frame.memory.load_word(offset);
    match interp.frame.stack.push(value) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn mstore(interp: &mut Interpreter<'_>) -> DispatchResult {
    let (offset, value) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };
    let Some(offset) = as_offset(offset) else {
        return DispatchResult::Halt(crate::interpreter::HaltReason::InvalidMemoryAccess, Vec::new());
    };
    if let Some(halt) = interp.charge_memory_expansion(offset as u64, 32) {
        return halt;
    }
    interp.frame.memory.store_word(offset, value);
    DispatchResult::Advance
}

pub fn mstore8(interp: &mut Interpreter<'_>) -> DispatchResult {
    let (offset, value) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };
    let Some(offset) = as_offset(offset) else {
        return DispatchResult::Halt(crate::interpreter::HaltReason::InvalidMemoryAccess, Vec::new());
    };
    if let Some(halt) = interp.charge_memory_expansion(offset as u64, 1) {
        return halt;
    }
    interp.frame.memory.store_byte(offset, value.as_limbs()[0] as u8);
    DispatchResult::Advance
}

pub fn mcopy(interp: &mut Interpreter<'_>) -> DispatchResult {
    let (dst, src, len) = match interp.frame.stack.pop3() {
        Ok(triple) => triple,
        Err(e) => return e.into(),
    };
    let (Some(dst), Some(src), Some(len)) = (as_offset(dst), as_offset(src), as_offset(len)) else {
        return DispatchResult::Halt(crate::interpreter::HaltReason::InvalidMemoryAccess, Vec::new());
    };
    let max_offset = dst.max(src) as u64;
    if let Some(halt) = interp.charge_memory_expansion(max_offset, len as u64) {
        return halt;
    }
    if let Some(halt) = interp.charge(gas::copy_word_cost(len as u64)) {
        return halt;
    }
    interp.frame.memory.copy_within(dst, src, len);
    DispatchResult::Advance
}
