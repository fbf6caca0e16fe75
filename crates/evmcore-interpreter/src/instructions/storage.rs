//! Persistent storage (`SLOAD`/`SSTORE`) and transient storage
//! (`TLOAD`/`TSTORE`, EIP-1153) opcodes (C9), pricing `SSTORE` through
//! the EIP-2200/3529 table (C4) and routing every access through
//! [`Host`] for cold/warm accounting (C6).

use evmcore_host::Host;
use evmcore_primitives::gas;

use super::DispatchResult;
use crate::interpreter::{HaltReason, Interpreter, InterpreterError};

pub fn sload(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    let key = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return Ok(e.into()),
    };
    let addr = interp.frame.input.address;
    let result = host.sload(addr, key)?;
    if let Some(halt) = interp.charge(gas::storage_access_cost(result.is_cold, interp.spec)) {
        return Ok(halt);
    }
    match interp.frame.stack.push(result.value) {
        Ok(()) => Ok(DispatchResult::Advance),
        Err(e) => Ok(e.into()),
    }
}

pub fn sstore(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
) -> Result<DispatchResult, InterpreterError> {
    if interp.frame.input.is_static {
        return Ok(DispatchResult::Halt(HaltReason::StaticStateChange, Vec::new()));
    }
    // EIP-1706: SSTORE is forbidden once remaining gas drops to or below
    // the stipend, before anything is popped off the stack.
    if interp.frame.gas_remaining <= gas::SSTORE_STIPEND_GUARD {
        return Ok(DispatchResult::Halt(HaltReason::OutOfGas, Vec::new()));
    }

    let (key, value) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return Ok(e.into()),
    };
    let addr = interp.frame.input.address;
    let result = host.sstore(addr, key, value)?;
    let cost = gas::sstore_cost(result.original, result.current, value, result.is_cold, interp.spec);
    if let Some(halt) = interp.charge(cost.gas) {
        return Ok(halt);
    }
    host.add_refund(cost.refund_delta);
    Ok(DispatchResult::Advance)
}

pub fn tload(interp: &mut Interpreter<'_>, host: &mut dyn Host) -> DispatchResult {
    let key = match interp.frame.stack.pop() {
        Ok(v) => v,
        Err(e) => return e.into(),
    };
    let value = host.tload(interp.frame.input.address, key);
    match interp.frame.stack.push(value) {
        Ok(()) => DispatchResult::Advance,
        Err(e) => e.into(),
    }
}

pub fn tstore(interp: &mut Interpreter<'_>, host: &mut dyn Host) -> DispatchResult {
    if interp.frame.input.is_static {
        return DispatchResult::Halt(HaltReason::StaticStateChange, Vec::new());
    }
    let (key, value) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return e.into(),
    };
    host.tstore(interp.frame.input.address, key, value);
    DispatchResult::Advance
}
