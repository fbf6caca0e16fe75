//! Call/create machinery (C10) and frame-stack ownership (C11): the only
//! place a child [`Frame`] is ever constructed, pushed, or folded back
//! into its parent.
//!
//! Mirrors the teacher's `run_exec_loop` (`hybrid-vm/src/handler.rs`): a
//! `Vec<Frame>` grown and shrunk by one loop, re-entering the interpreter
//! on the new top after every push and every pop. There is no recursion
//! in this crate — nested calls are modeled as loop iterations, not stack
//! frames of the host language, so call depth is bounded by the explicit
//! 1024 check rather than by the Rust call stack.

use std::sync::Arc;

use evmcore_host::{Database, Host, Journal, PrecompileError, PrecompileProvider};
use evmcore_interpreter::bytecode::AnalyzedBytecode;
use evmcore_interpreter::frame::{CallKind, Frame, FrameInput};
use evmcore_interpreter::instructions::system::{self, CallRequest, CallVariant, CreateRequest};
use evmcore_interpreter::interpreter::{ExecutionOutcome, HaltReason, Interpreter, InterpreterError, StepOutcome};
use evmcore_primitives::{gas, Address, SpecId, Word};

use crate::address;
use crate::result::ExecutionResult;

/// Why a [`StackEntry`]'s frame was pushed, i.e. what its parent must do
/// with its result once it halts. `Root` carries the journal checkpoint
/// for the whole transaction and, for a top-level `CREATE`, the address
/// that would be deployed to.
enum Origin {
    Root { create_address: Option<Address> },
    Call(CallRequest),
    Create(CreateRequest, Address),
}

struct StackEntry {
    frame: Frame,
    origin: Origin,
    /// The journal checkpoint taken immediately before this frame's value
    /// transfer (or, for `Root`, before the transaction's top-level call).
    checkpoint: usize,
}

/// Errors that abort the whole transaction rather than failing a single
/// sub-call — a database error, or analysis rejecting the root code.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),
    #[error(transparent)]
    Database(#[from] evmcore_host::DatabaseError),
    #[error("root bytecode failed analysis: {0}")]
    Analysis(#[from] evmcore_interpreter::bytecode::AnalysisError),
}

/// Runs one transaction's root frame (and every nested call/create it
/// triggers) to completion.
pub fn run_exec_loop<DB, P>(
    journal: &mut Journal<DB>,
    precompiles: &P,
    spec: SpecId,
    root_input: FrameInput,
    root_analyzed: Arc<AnalyzedBytecode>,
    root_create_address: Option<Address>,
) -> Result<ExecutionResult, VmError>
where
    DB: Database,
    P: PrecompileProvider,
{
    // §3's "Initially warmed" rule: tx.origin, tx.to, and every precompile
    // address are warm before the first opcode runs, not just once touched.
    journal.touch_address(journal.tx().origin);
    journal.touch_address(root_input.address);
    for addr in precompiles.warm_addresses() {
        journal.touch_address(addr);
    }

    let checkpoint = journal.checkpoint();
    let root = Frame::new(root_input, root_analyzed, 0);
    let mut stack = vec![StackEntry {
        frame: root,
        origin: Origin::Root {
            create_address: root_create_address,
        },
        checkpoint,
    }];

    loop {
        let top = stack.last_mut().expect("loop exits before the stack empties");
        let mut interp = Interpreter::new(&mut top.frame, spec);
        let outcome = interp.run(journal)?;

        match outcome {
            StepOutcome::Continue => unreachable!("Interpreter::run only returns on Exit/Call/Create"),
            StepOutcome::Exit(execout) => {
                let entry = stack.pop().expect("top was just borrowed");
                if let Some(result) = finish_frame(journal, spec, &mut stack, entry, execout)? {
                    return Ok(result);
                }
            }
            StepOutcome::Call(req) => dispatch_call(journal, precompiles, spec, &mut stack, req)?,
            StepOutcome::Create(req) => dispatch_create(journal, spec, &mut stack, req)?,
        }
    }
}

/// `true` for the halt reasons that mean the frame itself ran to a
/// caller-visible success (not a hard error, though `Revert` is also not
/// success despite refunding gas and propagating output).
fn is_success(reason: &HaltReason) -> bool {
    matches!(reason, HaltReason::Stop | HaltReason::Return | HaltReason::SelfDestruct)
}

/// Gas the caller gets back: full remaining gas on success or `REVERT`,
/// zero on every hard error (§7: "consumes all remaining gas").
fn refundable_gas(reason: &HaltReason, gas_remaining: u64) -> u64 {
    match reason {
        HaltReason::Stop | HaltReason::Return | HaltReason::Revert | HaltReason::SelfDestruct => gas_remaining,
        _ => 0,
    }
}

/// Output the caller's return-data buffer receives: the real output on
/// success or `REVERT`, empty on a hard error.
fn output_for_caller(reason: &HaltReason, output: &[u8]) -> Vec<u8> {
    match reason {
        HaltReason::Return | HaltReason::Revert => output.to_vec(),
        _ => Vec::new(),
    }
}

/// Folds one popped frame's [`ExecutionOutcome`] into whatever is now on
/// top of `stack` (its parent), or — if the popped frame was the root —
/// finalizes the whole transaction and returns `Some`.
fn finish_frame<DB: Database>(
    journal: &mut Journal<DB>,
    spec: SpecId,
    stack: &mut Vec<StackEntry>,
    entry: StackEntry,
    execout: ExecutionOutcome,
) -> Result<Option<ExecutionResult>, VmError> {
    match entry.origin {
        Origin::Root { create_address: None } => {
            let success = is_success(&execout.reason);
            if success {
                journal.commit(entry.checkpoint);
            } else {
                journal.revert(entry.checkpoint);
            }
            Ok(Some(ExecutionResult {
                success,
                gas_left: refundable_gas(&execout.reason, execout.gas_remaining),
                output: output_for_caller(&execout.reason, &execout.output),
                // `commit`/`revert` above already settled which of this
                // frame's logs survive; a reverted root leaves none.
                logs: journal.logs().to_vec(),
                refund: journal.refund(),
                deployed_address: None,
            }))
        }
        Origin::Root { create_address: Some(addr) } => {
            let (success, output, gas_left, deployed) =
                finalize_create(journal, spec, entry.checkpoint, addr, &execout);
            Ok(Some(ExecutionResult {
                success,
                gas_left,
                output,
                logs: journal.logs().to_vec(),
                refund: journal.refund(),
                deployed_address: deployed,
            }))
        }
        Origin::Call(req) => {
            let success = is_success(&execout.reason);
            if success {
                journal.commit(entry.checkpoint);
            } else {
                journal.revert(entry.checkpoint);
            }
            let gas_left = refundable_gas(&execout.reason, execout.gas_remaining);
            let output = output_for_caller(&execout.reason, &execout.output);
            let parent = &mut stack.last_mut().expect("a Call origin always has a parent").frame;
            system::complete_call(parent, &req, success, output, gas_left);
            parent.instr_index += 1;
            Ok(None)
        }
        Origin::Create(_req, addr) => {
            let (success, output, gas_left, deployed) =
                finalize_create(journal, spec, entry.checkpoint, addr, &execout);
            let parent = &mut stack.last_mut().expect("a Create origin always has a parent").frame;
            system::complete_create(parent, success, deployed, output, gas_left);
            parent.instr_index += 1;
            Ok(None)
        }
    }
}

/// Validates and, on success, installs a `CREATE`/`CREATE2`'s deployed
/// code (§4.10 step 6), charging the `200`-gas-per-byte deposit cost and
/// committing or reverting `checkpoint` accordingly.
fn finalize_create<DB: Database>(
    journal: &mut Journal<DB>,
    spec: SpecId,
    checkpoint: usize,
    addr: Address,
    execout: &ExecutionOutcome,
) -> (bool, Vec<u8>, u64, Option<Address>) {
    match execout.reason {
        HaltReason::Stop => {
            // Init code ran off the end without RETURNing: deploys empty
            // code, same as an explicit `RETURN(0, 0)`.
            journal.commit(checkpoint);
            (true, Vec::new(), execout.gas_remaining, Some(addr))
        }
        HaltReason::Return => {
            let code = execout.output.clone();
            let too_large = code.len() > gas::MAX_CODE_SIZE;
            let bad_prefix = spec.enabled_reject_ef_prefix() && code.first() == Some(&0xEF);
            let deposit_cost = gas::CREATE_DATA_BYTE_COST * code.len() as u64;
            if too_large || bad_prefix || deposit_cost > execout.gas_remaining {
                journal.revert(checkpoint);
                (false, Vec::new(), 0, None)
            } else {
                let gas_left = execout.gas_remaining - deposit_cost;
                if journal.set_code(addr, code).is_err() {
                    journal.revert(checkpoint);
                    return (false, Vec::new(), 0, None);
                }
                journal.commit(checkpoint);
                (true, Vec::new(), gas_left, Some(addr))
            }
        }
        HaltReason::Revert => {
            journal.revert(checkpoint);
            (false, execout.output.clone(), execout.gas_remaining, None)
        }
        _ => {
            journal.revert(checkpoint);
            (false, Vec::new(), 0, None)
        }
    }
}

/// Halts the current top-of-stack frame with `reason` as though the
/// interpreter itself had produced it, used when this frame cannot even
/// afford a `CALL`/`CREATE` opcode's own (non-forwarded) gas cost.
fn force_halt<DB: Database>(
    journal: &mut Journal<DB>,
    spec: SpecId,
    stack: &mut Vec<StackEntry>,
    reason: HaltReason,
) -> Result<Option<ExecutionResult>, VmError> {
    let entry = stack.pop().expect("caller holds at least the root frame");
    let execout = ExecutionOutcome {
        reason,
        output: Vec::new(),
        gas_remaining: 0,
    };
    finish_frame(journal, spec, stack, entry, execout)
}

/// Services a [`CallRequest`] yielded by the current top-of-stack frame:
/// charges the opcode's own (non-forwarded) gas, resolves `depth`/balance
/// soft failures, routes to a precompile, or pushes a child [`Frame`].
fn dispatch_call<DB, P>(
    journal: &mut Journal<DB>,
    precompiles: &P,
    spec: SpecId,
    stack: &mut Vec<StackEntry>,
    req: CallRequest,
) -> Result<(), VmError>
where
    DB: Database,
    P: PrecompileProvider,
{
    let transfers_value = req.value.map_or(false, |v| !v.is_zero());
    let (caller_address, depth) = {
        let top = &stack.last().expect("call request implies a live frame").frame;
        (top.input.address, top.depth)
    };
    let transfer_target = if req.variant == CallVariant::CallCode { caller_address } else { req.target };

    let is_cold = journal.touch_address(req.target);
    let mut own_cost = gas::CALL_BASE_COST + gas::address_access_cost(is_cold, spec);
    if transfers_value {
        own_cost += gas::CALL_VALUE_COST;
        if !journal.account_exists(transfer_target)? {
            own_cost += gas::CALL_NEW_ACCOUNT_COST;
        }
    }

    let charged_own = stack.last_mut().expect("checked above").frame.charge_gas(own_cost);
    if !charged_own {
        drop(force_halt(journal, spec, stack, HaltReason::OutOfGas)?);
        return Ok(());
    }
    let remaining = stack.last().expect("checked above").frame.gas_remaining;
    let forward = req.gas_limit.min(gas::all_but_one_64th(remaining));
    let charged_forward = stack.last_mut().expect("checked above").frame.charge_gas(forward);
    if !charged_forward {
        drop(force_halt(journal, spec, stack, HaltReason::OutOfGas)?);
        return Ok(());
    }
    let stipend = if transfers_value { gas::CALL_STIPEND } else { 0 };
    let child_gas = forward + stipend;

    // Depth/balance: a soft failure at entry. No snapshot was even
    // taken, and the forwarded gas (not the stipend, which was never
    // deducted) is refunded in full (§4.10 step 5, §7 item 8).
    if depth >= 1024 {
        refund_failed_call(stack, &req, forward);
        return Ok(());
    }
    if transfers_value {
        let (balance, _) = journal.balance(caller_address)?;
        if balance < req.value.expect("transfers_value implies Some") {
            refund_failed_call(stack, &req, forward);
            return Ok(());
        }
    }

    tracing::debug!(target = %req.target, variant = ?req.variant, child_gas, "dispatching call");

    if precompiles.is_precompile(req.target) {
        let checkpoint = journal.checkpoint();
        if transfers_value {
            journal.transfer(caller_address, transfer_target, req.value.unwrap())?;
        }
        match precompiles.run(req.target, &req.input, child_gas) {
            Ok(Some(out)) => {
                journal.commit(checkpoint);
                let gas_left = child_gas - out.gas_used;
                let top_frame = &mut stack.last_mut().expect("still on top").frame;
                system::complete_call(top_frame, &req, true, out.output, gas_left);
                top_frame.instr_index += 1;
            }
            Ok(None) | Err(PrecompileError::NotImplemented(_) | PrecompileError::OutOfGas | PrecompileError::InvalidInput(_)) => {
                journal.revert(checkpoint);
                let top_frame = &mut stack.last_mut().expect("still on top").frame;
                system::complete_call(top_frame, &req, false, Vec::new(), 0);
                top_frame.instr_index += 1;
            }
        }
        return Ok(());
    }

    let checkpoint = journal.checkpoint();
    if transfers_value {
        let moved = journal.transfer(caller_address, transfer_target, req.value.unwrap())?;
        if !moved {
            journal.revert(checkpoint);
            refund_failed_call(stack, &req, forward);
            return Ok(());
        }
    }

    let code = journal.code(req.target)?.0;
    let analyzed = match AnalyzedBytecode::analyze(&code, spec) {
        Ok(a) => Arc::new(a),
        Err(_) => {
            journal.revert(checkpoint);
            let top_frame = &mut stack.last_mut().expect("still on top").frame;
            system::complete_call(top_frame, &req, false, Vec::new(), forward);
            top_frame.instr_index += 1;
            return Ok(());
        }
    };

    let kind = match req.variant {
        CallVariant::Call => CallKind::Call,
        CallVariant::CallCode => CallKind::CallCode,
        CallVariant::DelegateCall => CallKind::DelegateCall,
        CallVariant::StaticCall => CallKind::StaticCall,
    };
    let (frame_address, frame_caller, frame_value) = {
        let top = &stack.last().expect("checked above").frame;
        match req.variant {
            CallVariant::Call | CallVariant::StaticCall => {
                (req.target, top.input.address, req.value.unwrap_or(Word::ZERO))
            }
            CallVariant::CallCode => (top.input.address, top.input.address, req.value.unwrap_or(Word::ZERO)),
            CallVariant::DelegateCall => (top.input.address, top.input.caller, top.input.value),
        }
    };

    let child_input = FrameInput {
        kind,
        address: frame_address,
        code_address: req.target,
        caller: frame_caller,
        value: frame_value,
        calldata: req.input.clone(),
        gas_limit: child_gas,
        is_static: req.is_static,
    };
    let child_depth = depth + 1;
    let child = Frame::new(child_input, analyzed, child_depth);
    stack.push(StackEntry {
        frame: child,
        origin: Origin::Call(req),
        checkpoint,
    });
    Ok(())
}

/// Pushes `0` (failure) onto the calling frame's stack and refunds
/// `forward` without running a child frame at all.
fn refund_failed_call(stack: &mut Vec<StackEntry>, req: &CallRequest, forward: u64) {
    let top_frame = &mut stack.last_mut().expect("checked by caller").frame;
    system::complete_call(top_frame, req, false, Vec::new(), forward);
    top_frame.instr_index += 1;
}

/// Services a [`CreateRequest`] yielded by the current top-of-stack
/// frame: resolves the new address, checks depth/balance/collision, and
/// either pushes a child frame for the init code or fails in place.
fn dispatch_create<DB: Database>(
    journal: &mut Journal<DB>,
    spec: SpecId,
    stack: &mut Vec<StackEntry>,
    req: CreateRequest,
) -> Result<(), VmError> {
    let (sender, depth) = {
        let top = &stack.last().expect("create request implies a live frame").frame;
        (top.input.address, top.depth)
    };

    let addr = match req.salt {
        Some(salt) => address::create2_address(sender, salt, &req.init_code),
        None => {
            let nonce = journal.nonce(sender)?;
            address::create_address(sender, nonce)
        }
    };

    if depth >= 1024 {
        refund_failed_create(stack, req.gas_limit);
        return Ok(());
    }
    let (balance, _) = journal.balance(sender)?;
    if balance < req.value {
        refund_failed_create(stack, req.gas_limit);
        return Ok(());
    }
    let existing_code = journal.code(addr)?.0;
    let existing_nonce = journal.nonce(addr)?;
    if !existing_code.is_empty() || existing_nonce != 0 {
        refund_failed_create(stack, req.gas_limit);
        return Ok(());
    }

    tracing::debug!(%addr, is_create2 = req.salt.is_some(), "dispatching create");

    let checkpoint = journal.checkpoint();
    journal.increment_nonce(sender)?;
    let moved = journal.transfer(sender, addr, req.value)?;
    if !moved {
        journal.revert(checkpoint);
        refund_failed_create(stack, req.gas_limit);
        return Ok(());
    }

    let analyzed = match AnalyzedBytecode::analyze(&req.init_code, spec) {
        Ok(a) => Arc::new(a),
        Err(_) => {
            journal.revert(checkpoint);
            refund_failed_create(stack, 0);
            return Ok(());
        }
    };

    let child_input = FrameInput {
        kind: if req.salt.is_some() { CallKind::Create2 } else { CallKind::Create },
        address: addr,
        code_address: addr,
        caller: sender,
        value: req.value,
        calldata: Vec::new(),
        gas_limit: req.gas_limit,
        is_static: req.is_static,
    };
    let child = Frame::new(child_input, analyzed, depth + 1);
    stack.push(StackEntry {
        frame: child,
        origin: Origin::Create(req, addr),
        checkpoint,
    });
    Ok(())
}

fn refund_failed_create(stack: &mut Vec<StackEntry>, gas_limit: u64) {
    let top_frame = &mut stack.last_mut().expect("checked by caller").frame;
    system::complete_create(top_frame, false, None, Vec::new(), gas_limit);
    top_frame.instr_index += 1;
}
