//! The ~140 opcode handlers (C9), grouped into the same functional
//! categories the opcode table (`evmcore_primitives::opcode`) uses.
//! [`dispatch`] is the single entry point the interpreter loop (C8) calls
//! once per step; everything else here is private to this crate.

pub mod arithmetic;
pub mod bitwise;
pub mod control;
pub mod environment;
pub mod log;
pub mod stack_memory;
pub mod storage;
pub mod system;

use evmcore_host::Host;
use evmcore_primitives::opcode;

use crate::bytecode::Instruction;
use crate::interpreter::{HaltReason, Interpreter, InterpreterError};
use crate::stack::StackError;

/// What a single opcode handler did, relative to the frame's state.
pub enum DispatchResult {
    /// Move to the next instruction in the stream.
    Advance,
    /// `JUMP`/`JUMPI` took the branch: continue at this instruction
    /// index.
    Jump(usize),
    /// The frame halted (normally or exceptionally).
    Halt(HaltReason, Vec<u8>),
    /// `CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL` needs the
    /// frame-stack owner to run a nested call.
    Call(system::CallRequest),
    /// `CREATE`/`CREATE2` needs the frame-stack owner to run a nested
    /// create.
    Create(system::CreateRequest),
}

impl From<StackError> for DispatchResult {
    fn from(err: StackError) -> Self {
        let reason = match err {
            StackError::Overflow => HaltReason::StackOverflow,
            StackError::Underflow => HaltReason::StackUnderflow,
        };
        DispatchResult::Halt(reason, Vec::new())
    }
}

/// Dispatches one decoded instruction to its handler.
pub fn dispatch(
    interp: &mut Interpreter<'_>,
    host: &mut dyn Host,
    instr: &Instruction,
) -> Result<DispatchResult, InterpreterError> {
    let op = instr.opcode;

    if opcode::is_push(op) {
        return Ok(stack_memory::push(interp, instr));
    }
    if opcode::is_dup(op) {
        return Ok(stack_memory::dup(interp, op));
    }
    if opcode::is_swap(op) {
        return Ok(stack_memory::swap(interp, op));
    }
    if opcode::is_log(op) {
        return log::log(interp, host, op);
    }

    match op {
        opcode::STOP => Ok(DispatchResult::Halt(HaltReason::Stop, Vec::new())),

        opcode::ADD | opcode::SUB | opcode::MUL | opcode::DIV | opcode::SDIV | opcode::MOD
        | opcode::SMOD | opcode::EXP | opcode::SIGNEXTEND => Ok(arithmetic::binary_op(interp, op)),
        opcode::ADDMOD | opcode::MULMOD => Ok(arithmetic::ternary_op(interp, op)),

        opcode::LT | opcode::GT | opcode::SLT | opcode::SGT | opcode::EQ | opcode::AND
        | opcode::OR | opcode::XOR | opcode::BYTE | opcode::SHL | opcode::SHR | opcode::SAR => {
            Ok(bitwise::binary_op(interp, op))
        }
        opcode::ISZERO | opcode::NOT => Ok(bitwise::unary_op(interp, op)),

        opcode::KECCAK256 => Ok(environment::keccak256(interp)),

        opcode::ADDRESS
        | opcode::CALLER
        | opcode::CALLVALUE
        | opcode::CALLDATASIZE
        | opcode::CODESIZE
        | opcode::RETURNDATASIZE
        | opcode::PC
        | opcode::MSIZE
        | opcode::GAS => Ok(environment::context_push(interp, op, instr)),

        opcode::ORIGIN
        | opcode::GASPRICE
        | opcode::COINBASE
        | opcode::TIMESTAMP
        | opcode::NUMBER
        | opcode::PREVRANDAO
        | opcode::GASLIMIT
        | opcode::CHAINID
        | opcode::SELFBALANCE
        | opcode::BASEFEE
        | opcode::BLOBBASEFEE => environment::context_push_host(interp, host, op),

        opcode::CALLDATALOAD => Ok(environment::calldataload(interp)),
        opcode::RETURNDATALOAD => Ok(environment::returndataload(interp)),
        opcode::CALLDATACOPY => Ok(environment::calldatacopy(interp)),
        opcode::CODECOPY => Ok(environment::codecopy(interp)),
        opcode::RETURNDATACOPY => Ok(environment::returndatacopy(interp)),
        opcode::BLOCKHASH => environment::blockhash(interp, host),
        opcode::BLOBHASH => Ok(environment::blobhash(interp, host)),

        opcode::BALANCE => environment::balance(interp, host),
        opcode::EXTCODESIZE => environment::extcodesize(interp, host),
        opcode::EXTCODECOPY => environment::extcodecopy(interp, host),
        opcode::EXTCODEHASH => environment::extcodehash(interp, host),

        opcode::POP => Ok(stack_memory::pop(interp)),
        opcode::MLOAD => Ok(stack_memory::mload(interp)),
        opcode::MSTORE => Ok(stack_memory::mstore(interp)),
        opcode::MSTORE8 => Ok(stack_memory::mstore8(interp)),
        opcode::MCOPY => Ok(stack_memory::mcopy(interp)),

        opcode::SLOAD => storage::sload(interp, host),
        opcode::SSTORE => storage::sstore(interp, host),
        opcode::TLOAD => Ok(storage::tload(interp, host)),
        opcode::TSTORE => Ok(storage::tstore(interp, host)),

        opcode::JUMP => Ok(control::jump(interp, instr)),
        opcode::JUMPI => Ok(control::jumpi(interp, instr)),
        opcode::JUMPDEST => Ok(DispatchResult::Advance),
        opcode::PUSH0 => Ok(stack_memory::push0(interp)),

        opcode::RETURN => Ok(control::ret(interp)),
        opcode::REVERT => Ok(control::revert(interp)),
        opcode::INVALID => Ok(DispatchResult::Halt(HaltReason::InvalidOpcode, Vec::new())),

        opcode::CREATE => Ok(system::create(interp, false)),
        opcode::CREATE2 => Ok(system::create(interp, true)),
        opcode::CALL => Ok(system::call(interp, system::CallVariant::Call)),
        opcode::CALLCODE => Ok(system::call(interp, system::CallVariant::CallCode)),
        opcode::DELEGATECALL => Ok(system::call(interp, system::CallVariant::DelegateCall)),
        opcode::STATICCALL => Ok(system::call(interp, system::CallVariant::StaticCall)),
        opcode::SELFDESTRUCT => system::selfdestruct(interp, host),

        _ => Ok(DispatchResult::Halt(HaltReason::InvalidOpcode, Vec::new())),
    }
}
