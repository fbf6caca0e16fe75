//! `LOG0`..`LOG4` (C9): forbidden in a static context, priced per topic
//! and per data byte plus the memory-expansion cost of reading the data.

use evmcore_host::Host;
use evmcore_primitives::{gas, opcode, B256};

use super::DispatchResult;
use crate::interpreter::{HaltReason, Interpreter, InterpreterError};

pub fn log(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
    op: u8,
) -> Result<DispatchResult, InterpreterError> {
    if interp.frame.input.is_static {
        return Ok(DispatchResult::Halt(HaltReason::StaticStateChange, Vec::new()));
    }

    let (offset, size) = match interp.frame.stack.pop2() {
        Ok(pair) => pair,
        Err(e) => return Ok(e.into()),
    };
    if offset.bit_len() > 32 || size.bit_len() > 32 {
        return Ok(DispatchResult::Halt(HaltReason::InvalidMemoryAccess, Vec::new()));
    }
    let offset = offset.as_limbs()[0] as u64;
    let size = size.as_limbs()[0] as u64;

    let topic_count = opcode::log_n(op) as usize;
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        let t = match interp.frame.stack.pop() {
            Ok(v) => v,
            Err(e) => return Ok(e.into()),
        };
        topics.push(B256::from(t.to_be_bytes::<32>()));
    }

    if let Some(halt) = interp.charge_memory_expansion(offset, size) {
        return Ok(halt);
    }
    if let Some(halt) = interp.charge(gas::log_dynamic_cost(topic_count as u64, size)) {
        return Ok(halt);
    }

    let data = interp.frame.memory.slice(offset as usize, size as usize).to_vec();
    host.log(interp.frame.input.address, topics, data);
    Ok(DispatchResult::Advance)
}
