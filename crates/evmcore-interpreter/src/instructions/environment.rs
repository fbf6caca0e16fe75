//! Environment and block-context opcodes (C9): everything that reads
//! `ADDRESS`/`CALLER`/`CALLDATA*`/`CODE*`/block fields, plus `KECCAK256`
//! and the access-list-gated `BALANCE`/`EXTCODE*` family that has to go
//! through [`Host`].

use evmcore_host::Host;
use evmcore_primitives::{gas, opcode, Word};

use super::DispatchResult;
use crate::bytecode::Instruction;
use crate::interpreter::{HaltReason, Interpreter, InterpreterError};

fn push(interp: &mut Interpreter<'_>, value: Word) -> DispatchResult {
    match interp.frame.stack.push(value) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

fn address_to_word(addr: evmcore_primitives::Address) -> Word {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(addr.as_slice());
    Word::from_be_bytes(bytes)
}

/// The context fields answerable from the frame alone — no `Host`
/// round-trip needed.
pub fn context_push(interp: &mut Interpreter<'_>, op: u8, instr: &Instruction) -> DispatchResult {
    let value = match op {
        opcode::ADDRESS => address_to_word(interp.frame.input.address),
        opcode::CALLER => address_to_word(interp.frame.input.caller),
        opcode::CALLVALUE => interp.frame.input.value,
        opcode::CALLDATASIZE => Word::from(interp.frame.input.calldata.len() as u64),
        opcode::CODESIZE => Word::from(interp.frame.analyzed.code().len() as u64),
        opcode::RETURNDATASIZE => Word::from(interp.frame.return_data.size() as u64),
        opcode::PC => Word::from(instr.pc as u64),
        opcode::MSIZE => Word::from(interp.frame.memory.len() as u64),
        opcode::GAS => Word::from(interp.frame.gas_remaining),
        _ => unreachable!("context_push is only dispatched for frame-local fields"),
    };
    push(interp, value)
}

/// The context fields that read the block/transaction environment
/// through [`Host`] (§6). `SELFBALANCE` is grouped here since it is a
/// database round-trip, even though it is not technically "context".
pub fn context_push_host(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
    op: u8,
) -> Result<DispatchResult, InterpreterError> {
    let value = match op {
        opcode::ORIGIN => address_to_word(host.tx().origin),
        opcode::GASPRICE => host.tx().gas_price,
        opcode::COINBASE => address_to_word(host.block().coinbase),
        opcode::TIMESTAMP => Word::from(host.block().timestamp),
        opcode::NUMBER => Word::from(host.block().number),
        opcode::PREVRANDAO => Word::from_be_bytes(host.block().prevrandao.0),
        opcode::GASLIMIT => Word::from(host.block().gas_limit),
        opcode::CHAINID => Word::from(host.block().chain_id),
        opcode::BASEFEE => host.block().base_fee,
        opcode::BLOBBASEFEE => host.block().blob_base_fee,
        opcode::SELFBALANCE => {
            let addr = interp.frame.input.address;
            host.balance(addr)?.0
        }
        _ => unreachable!("context_push_host is only dispatched for host-backed fields"),
    };
    Ok(push(interp, value))
}

/// `BLOCKHASH` needs a fallible host round-trip; the dispatcher routes
/// it separately from the infallible [`context_push`] family.
pub fn blockhash(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    let number = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    if number.bit_len() > 64 {
        return Ok(push(interp, Word::ZERO));
    }
    let hash = host.block_hash(number.as_limbs()[0])?;
    Ok(push(interp, Word::from_be_bytes(hash.0)))
}

pub fn blobhash(interp: &mut Interpreter<'_>, host: &dyn Host) -> DispatchResult {
    let index = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let hashes = &host.tx().blob_hashes;
    let value = if index.bit_len() <= 32 {
        let index = index.as_limbs()[0] as usize;
        hashes.get(index).map_or(Word::ZERO, |h| Word::from_be_bytes(h.0))
    } else {
        Word::ZERO
    };
    push(interp, value)
}

pub fn calldataload(interp: &mut Interpreter<'_>) -> DispatchResult {
    let offset = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let mut buf = [0u8; 32];
    if offset.bit_len() <= 32 {
        let offset = offset.as_limbs()[0] as usize;
        let data = &interp.frame.input.calldata;
        for i in 0..32 {
            if let Some(&b) = data.get(offset + i) {
                buf[i] = b;
            }
        }
    }
    push(interp, Word::from_be_bytes(buf))
}

fn copy_opcode(
    interp: &mut Interpreter<'_>,
    source: &[u8],
    extra_static_words_cost: bool,
) -> DispatchResult {
    let (dst, src, len) = match interp.frame.stack.pop3() {
        Ok(triple) => triple,
        Err(e) => return e.into(),
    };
    if dst.bit_len() > 32 || src.bit_len() > 32 || len.bit_len() > 32 {
        return DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new());
    }
    let dst = dst.as_limbs()[0] as u64;
    let src = src.as_limbs()[0] as u64;
    let len = len.as_limbs()[0] as u64;

    if let Some(halt) = interp.charge_memory_expansion(dst, len) {
        return halt;
    }
    if extra_static_words_cost {
        if let Some(halt) = interp.charge(gas::copy_word_cost(len)) {
            return halt;
        }
    }
    interp.frame.memory.store_data(dst as usize, source, src as usize, len as usize);
    DispatchResult::Advance
}

pub fn calldatacopy(interp: &mut Interpreter<'_>) -> DispatchResult {
    let data = interp.frame.input.calldata.clone();
    copy_opcode(interp, &data, true)
}

pub fn codecopy(interp: &mut Interpreter<'_>) -> DispatchResult {
    let code = interp.frame.analyzed.code().to_vec();
    copy_opcode(interp, &code, true)
}

pub fn returndatacopy(interp: &mut Interpreter<'_>) -> DispatchResult {
    let (dst, src, len) = match interp.frame.stack.pop3() {
        Ok(triple) => triple,
        Err(e) => return e.into(),
    };
    if dst.bit_len() > 32 || src.bit_len() > 32 || len.bit_len() > 32 {
        return DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new());
    }
    let dst = dst.as_limbs()[0] as u64;
    let src = src.as_limbs()[0] as usize;
    let len = len.as_limbs()[0] as usize;

    let data = match interp.frame.return_data.slice(src, len) {
        Ok(slice) => slice.to_vec(),
        Err(_) => return DispatchResult::Halt(HaltReason::ReturnDataOutOfBounds, Vec::new()),
    };
    if let Some(halt) = interp.charge_memory_expansion(dst, len as u64) {
        return halt;
    }
    if let Some(halt) = interp.charge(gas::copy_word_cost(len as u64)) {
        return halt;
    }
    interp.frame.memory.store_data(dst as usize, &data, 0, len);
    DispatchResult::Advance
}

/// `RETURNDATALOAD`: reads 32 bytes from the return-data buffer at
/// `offset`, zero-padded past the buffer's end (unlike `RETURNDATACOPY`,
/// which halts on an out-of-bounds request).
pub fn returndataload(interp: &mut Interpreter<'_>) -> DispatchResult {
    let offset = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let mut buf = [0u8; 32];
    if offset.bit_len() <= 32 {
        let offset = offset.as_limbs()[0] as usize;
        let data = interp.frame.return_data.as_slice();
        for i in 0..32 {
            if let Some(&b) = data.get(offset + i) {
                buf[i] = b;
            }
        }
    }
    push(interp, Word::from_be_bytes(buf))
}

pub fn keccak256(interp: &mut Interpreter<'_>) -> DispatchResult {
    let (offset, len) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };
    if offset.bit_len() > 32 || len.bit_len() > 32 {
        return DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new());
    }
    let offset = offset.as_limbs()[0] as u64;
    let len = len.as_limbs()[0] as u64;

    if let Some(halt) = interp.charge_memory_expansion(offset, len) {
        return halt;
    }
    if let Some(halt) = interp.charge(gas::G_KECCAK256 + gas::keccak_word_cost(len)) {
        return halt;
    }
    let bytes = interp.frame.memory.slice(offset as usize, len as usize);
    let hash = alloy_primitives::keccak256(bytes);
    push(interp, Word::from_be_bytes(hash.0))
}

pub fn balance(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    let addr_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    let addr = word_to_address(addr_word);
    let (balance, is_cold) = host.balance(addr)?;
    if let Some(halt) = interp.charge(gas::extcode_access_cost(is_cold, interp.spec)) {
        return Ok(halt);
    }
    Ok(push(interp, balance))
}

pub fn extcodesize(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    let addr_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    let addr = word_to_address(addr_word);
    let (size, is_cold) = host.code_size(addr)?;
    if let Some(halt) = interp.charge(gas::extcode_access_cost(is_cold, interp.spec)) {
        return Ok(halt);
    }
    Ok(push(interp, Word::from(size as u64)))
}

pub fn extcodehash(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    let addr_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    let addr = word_to_address(addr_word);
    let (hash, is_cold) = host.code_hash(addr)?;
    if let Some(halt) = interp.charge(gas::extcode_access_cost(is_cold, interp.spec)) {
        return Ok(halt);
    }
    Ok(push(interp, Word::from_be_bytes(hash.0)))
}

pub fn extcodecopy(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    let addr_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    let addr = word_to_address(addr_word);
    let (code, is_cold) = host.code(addr)?;
    if let Some(halt) = interp.charge(gas::extcode_access_cost(is_cold, interp.spec)) {
        return Ok(halt);
    }
    Ok(copy_opcode(interp, &code, true))
}

fn word_to_address(w: Word) -> evmcore_primitives::Address {
    let bytes = w.to_be_bytes::<32>();
    evmcore_primitives::Address::from_slice(&bytes[12..])
}
