//! `CREATE`/`CREATE2`/`CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL`/
//! `SELFDESTRUCT` (C9). These opcodes cannot run to completion inside a
//! single frame — running the nested code is the frame-stack owner's
//! job (`evmcore-vm`, C10) — so the handlers here do everything that is
//! this frame's responsibility (popping arguments, charging the gas
//! *this* frame owes, resolving the gas *forwarded* to the child per
//! EIP-150) and then yield a [`CallRequest`]/[`CreateRequest`] rather
//! than executing anything themselves. [`complete_call`]/
//! [`complete_create`] are the other half: called by the frame-stack
//! owner once the nested frame has run, to fold its result back into
//! this frame's stack/memory/return-data/gas.

use evmcore_host::Host;
use evmcore_primitives::{gas, Address, Word};

use super::DispatchResult;
use crate::frame::Frame;
use crate::interpreter::{HaltReason, Interpreter, InterpreterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallVariant {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

/// Everything the frame-stack owner needs to run a nested message call.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub variant: CallVariant,
    pub target: Address,
    /// `None` for `DELEGATECALL`/`STATICCALL`, which never transfer value.
    pub value: Option<Word>,
    pub input: Vec<u8>,
    pub gas_limit: u64,
    pub is_static: bool,
    /// Where in *this* frame's memory to write the callee's output.
    pub out_offset: usize,
    pub out_size: usize,
}

/// Everything the frame-stack owner needs to run a nested contract
/// creation.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub value: Word,
    pub init_code: Vec<u8>,
    /// `Some` for `CREATE2`.
    pub salt: Option<Word>,
    pub gas_limit: u64,
    pub is_static: bool,
}

fn word_to_address(w: Word) -> Address {
    let bytes = w.to_be_bytes::<32>();
    Address::from_slice(&bytes[12..])
}

fn as_u64(w: Word) -> Option<u64> {
    if w.bit_len() > 64 {
        None
    } else {
        Some(w.as_limbs()[0])
    }
}

fn as_usize(w: Word) -> Option<usize> {
    as_u64(w).map(|v| v as usize)
}

pub fn call(interp: &mut Interpreter<'_>, variant: CallVariant) -> DispatchResult {
    let has_value = matches!(variant, CallVariant::Call | CallVariant::CallCode);

    let gas_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let target_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let value = if has_value {
        match interp.frame.stack.pop() {
            Ok(v) => Some(v),
            Err(e) => return e.into(),
        }
    } else {
        None
    };
    let (args_offset, args_size, ret_offset, ret_size) = match interp.frame.stack.pop4() {
        Ok(quad) => quad,
        Err(e) => return e.into(),
    };

    let (Some(args_offset), Some(args_size), Some(ret_offset), Some(ret_size)) = (
        as_usize(args_offset),
        as_usize(args_size),
        as_usize(ret_offset),
        as_usize(ret_size),
    ) else {
        return DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new());
    };

    let transfers_value = value.map_or(false, |v| !v.is_zero());
    if transfers_value && interp.frame.input.is_static {
        return DispatchResult::Halt(HaltReason::StaticStateChange, Vec::new());
    }

    let read_words = crate::memory::Memory::words_for(args_offset as u64, args_size as u64);
    let write_words = crate::memory::Memory::words_for(ret_offset as u64, ret_size as u64);
    let target_words = read_words.max(write_words).max(interp.frame.memory.num_words());
    if let Some(halt) = interp.charge_memory_expansion(0, target_words * 32) {
        return halt;
    }

    let Some(gas_requested) = as_u64(gas_word) else {
        return DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new());
    };

    let target = word_to_address(target_word);
    let input = interp.frame.memory.slice(args_offset, args_size).to_vec();

    DispatchResult::Call(CallRequest {
        variant,
        target,
        value,
        input,
        gas_limit: gas_requested, // finalized against EIP-150/stipend by the frame owner, who also prices COLD_ACCOUNT_ACCESS/CALL_VALUE/CALL_NEW_ACCOUNT against the Journal
        is_static: interp.frame.input.is_static || variant == CallVariant::StaticCall,
        out_offset: ret_offset,
        out_size: ret_size,
    })
}

/// Folds a completed nested call's result back into the calling frame:
/// writes (truncated/zero-padded) output into memory at the reserved
/// slot, updates the return-data buffer, pushes the EVM-style boolean
/// success flag, and credits back unspent gas.
pub fn complete_call(frame: &mut Frame, request: &CallRequest, success: bool, output: Vec<u8>, gas_left: u64) {
    frame.gas_remaining += gas_left;
    let copy_len = output.len().min(request.out_size);
    if copy_len > 0 {
        frame.memory.store_data(request.out_offset, &output, 0, copy_len);
    }
    frame.return_data.set(output);
    let _ = frame.stack.push(if success { Word::from(1u64) } else { Word::ZERO });
}

pub fn create(interp: &mut Interpreter<'_>, is_create2: bool) -> DispatchResult {
    if interp.frame.input.is_static {
        return DispatchResult::Halt(HaltReason::StaticStateChange, Vec::new());
    }

    let value = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let (offset, size) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };
    let salt = if is_create2 {
        match interp.frame.stack.pop() {
            Ok(v) => Some(v),
            Err(e) => return e.into(),
        }
    } else {
        None
    };

    let (Some(offset), Some(size)) = (as_usize(offset), as_usize(size)) else {
        return DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new());
    };

    if interp.spec.enabled_init_code_limit() && size > gas::MAX_INITCODE_SIZE {
        return DispatchResult::Halt(HaltReason::InvalidCode, Vec::new());
    }

    if let Some(halt) = interp.charge_memory_expansion(offset as u64, size as u64) {
        return halt;
    }
    if let Some(halt) = interp.charge(gas::CREATE_BASE_COST) {
        return halt;
    }
    if is_create2 {
        if let Some(halt) = interp.charge(gas::keccak_word_cost(size as u64)) {
            return halt;
        }
    }
    if interp.spec.enabled_init_code_limit() {
        if let Some(halt) = interp.charge(gas::INITCODE_WORD_COST * gas::words(size as u64)) {
            return halt;
        }
    }

    let init_code = interp.frame.memory.slice(offset, size).to_vec();
    let remaining = interp.frame.gas_remaining;
    let forwarded = gas::all_but_one_64th(remaining);
    if interp.charge(forwarded).is_some() {
        return DispatchResult::Halt(HaltReason::OutOfGas, Vec::new());
    }

    DispatchResult::Create(CreateRequest {
        value,
        init_code,
        salt,
        gas_limit: forwarded,
        is_static: interp.frame.input.is_static,
    })
}

/// Folds a completed nested create's result back: pushes the new
/// contract's address on success (`0` on failure), sets return-data to
/// the deployer's revert reason on failure (never on success, per
/// EIP-211), and credits back unspent gas.
pub fn complete_create(
    frame: &mut Frame,
    success: bool,
    address: Option<Address>,
    output: Vec<u8>,
    gas_left: u64,
) {
    frame.gas_remaining += gas_left;
    if success {
        frame.return_data.clear();
        let word = address.map_or(Word::ZERO, |a| {
            let mut bytes = [0u8; 32];
            bytes[12..].copy_from_slice(a.as_slice());
            Word::from_be_bytes(bytes)
        });
        let _ = frame.stack.push(word);
    } else {
        frame.return_data.set(output);
        let _ = frame.stack.push(Word::ZERO);
    }
}

pub fn selfdestruct(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    if interp.frame.input.is_static {
        return Ok(DispatchResult::Halt(HaltReason::StaticStateChange, Vec::new()));
    }
    let beneficiary_word = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    let beneficiary = word_to_address(beneficiary_word);

    let is_cold = host.touch_address(beneficiary);
    if let Some(halt) = interp.charge(gas::address_access_cost(is_cold, interp.spec)) {
        return Ok(halt);
    }

    let beneficiary_is_new = host.mark_self_destruct(interp.frame.input.address, beneficiary)?;
    if beneficiary_is_new {
        if let Some(halt) = interp.charge(gas::CALL_NEW_ACCOUNT_COST) {
            return Ok(halt);
        }
    }
    if !interp.spec.enabled_reduced_refunds() {
        host.add_refund(gas::SELFDESTRUCT_REFUND as i64);
    }

    Ok(DispatchResult::Halt(HaltReason::SelfDestruct, Vec::new()))
}
