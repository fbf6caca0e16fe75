//! Bytecode analysis (C7): the one-time pass that turns raw deployed code
//! into the stream the threaded interpreter (C8) actually runs.
//!
//! Two passes over the code:
//!
//! 1. Walk linearly, skipping `PUSHn` immediate bytes, to build the set
//!    of byte offsets that are valid `JUMPDEST` targets (§4.7's "a
//!    `JUMPDEST` byte that falls inside a `PUSH` immediate is not a valid
//!    jump target").
//! 2. Walk again to build the decoded [`Instruction`] stream, partition
//!    it into basic blocks at every block-ending opcode and at every
//!    `JUMPDEST` (a block's only entry points are its first instruction
//!    and, if that instruction is a `JUMPDEST`, a dynamic jump), simulate
//!    each block's stack depth to produce [`BlockDescriptor`], and
//!    resolve `JUMP`/`JUMPI` targets at analysis time whenever the
//!    immediately preceding instruction was a `PUSH` of a valid jump
//!    target (§4.7's static jump resolution).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use evmcore_primitives::{gas, opcode, SpecId, Word};
use thiserror::Error;

/// One decoded instruction in the analyzed stream. `pc` is the original
/// byte offset in `code`, preserved so `PC` and jump-target validation
/// still make sense post-analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub pc: usize,
    pub opcode: u8,
    /// The immediate value, for `PUSH1..=PUSH32` (`PUSH0` pushes
    /// `Word::ZERO` without needing one).
    pub push_value: Option<Word>,
    /// Resolved instruction-stream index for `JUMP`/`JUMPI` whose target
    /// was a compile-time-constant valid `JUMPDEST` (§4.7). `None` means
    /// the handler must resolve the target dynamically at execution
    /// time, off the popped stack value.
    pub static_target: Option<usize>,
    /// Index of the [`BlockDescriptor`] this instruction belongs to.
    pub block: usize,
}

/// Per-basic-block aggregates the block prologue (C8) charges/validates
/// once, instead of every handler re-deriving them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Index of the block's first instruction in the analyzed stream.
    pub start: usize,
    /// Index one past the block's last instruction.
    pub end: usize,
    /// Sum of every instruction's static gas cost in this block.
    pub total_static_gas: u64,
    /// Minimum stack depth required on entry for no instruction in the
    /// block to underflow.
    pub stack_min_required: u16,
    /// Peak stack growth reached at any point inside the block relative
    /// to its entry depth (never negative: a block that only shrinks the
    /// stack peaks at its own entry). This is what the prologue must add
    /// to the caller's stack depth to bound overflow, not the block's net
    /// depth change — a block can spike well above its final depth before
    /// draining back down (`PUSH1` x5 then `POP` x5 nets to zero but
    /// peaks at +5).
    pub stack_max_growth: u16,
}

/// Failure during analysis. Unlike execution-time errors, these reject
/// the bytecode outright, before a single instruction runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// EIP-3541: deployed code may not begin with `0xEF`.
    #[error("code starts with the EIP-3541 reserved byte 0xEF")]
    InvalidMagic,
    /// EIP-170 (deployed) / EIP-3860 (init) size limit exceeded.
    #[error("code size {actual} exceeds the {limit} byte limit")]
    CodeTooLarge { actual: usize, limit: usize },
}

/// The result of analyzing a contract's bytecode: ready for the
/// interpreter to execute directly, with no further decoding needed.
#[derive(Debug, Clone)]
pub struct AnalyzedBytecode {
    code: Arc<[u8]>,
    jumpdests: HashSet<usize>,
    instructions: Vec<Instruction>,
    blocks: Vec<BlockDescriptor>,
}

impl AnalyzedBytecode {
    /// Runs both analysis passes over `code` for hardfork `spec`. Only the
    /// EIP-3541 reserved-prefix check happens here; the EIP-170 (deployed)
    /// and EIP-3860 (init code) size limits depend on which of those two
    /// this code is and on gas the analyzer has no access to, so the
    /// caller enforces them instead (`frame_stack`'s `CREATE`/`CREATE2`
    /// dispatch and finalization).
    pub fn analyze(code: &[u8], spec: SpecId) -> Result<Self, AnalysisError> {
        if spec.enabled_reject_ef_prefix() && code.first() == Some(&0xEF) {
            return Err(AnalysisError::InvalidMagic);
        }

        let jumpdests = Self::find_jumpdests(code);
        let (instructions, blocks) = Self::decode(code, &jumpdests, spec);

        Ok(Self {
            code: Arc::from(code),
            jumpdests,
            instructions,
            blocks,
        })
    }

    /// Pass 1: valid `JUMPDEST` byte offsets, skipping over `PUSH`
    /// immediate data so a `0x5B` byte embedded in a push argument is
    /// never mistaken for a jump target.
    fn find_jumpdests(code: &[u8]) -> HashSet<usize> {
        let mut set = HashSet::new();
        let mut pc = 0;
        while pc < code.len() {
            let op = code[pc];
            if op == opcode::JUMPDEST {
                set.insert(pc);
            }
            pc += 1 + opcode::push_immediate_len(op);
        }
        set
    }

    /// Pass 2: decode, partition into blocks, simulate per-block stack
    /// depth, and resolve static jump targets.
    fn decode(
        code: &[u8],
        jumpdests: &HashSet<usize>,
        spec: SpecId,
    ) -> (Vec<Instruction>, Vec<BlockDescriptor>) {
        let mut instructions = Vec::new();
        let mut pc_to_index = HashMap::new();
        let mut pc = 0;

        while pc < code.len() {
            let op = code[pc];
            let imm_len = opcode::push_immediate_len(op);
            let push_value = if imm_len > 0 {
                let end = (pc + 1 + imm_len).min(code.len());
                let mut bytes = [0u8; 32];
                let slice = &code[pc + 1..end];
                bytes[32 - slice.len()..].copy_from_slice(slice);
                Some(Word::from_be_bytes(bytes))
            } else {
                None
            };

            pc_to_index.insert(pc, instructions.len());
            instructions.push(Instruction {
                pc,
                opcode: op,
                push_value,
                static_target: None,
                block: 0, // filled in below
            });
            pc += 1 + imm_len;
        }

        // Static jump resolution: a JUMP/JUMPI resolves at analysis time
        // iff the instruction immediately before it in the stream is a
        // PUSH of a word that is both in-range and a valid JUMPDEST.
        for i in 1..instructions.len() {
            let op = instructions[i].opcode;
            if op != opcode::JUMP && op != opcode::JUMPI {
                continue;
            }
            let Some(target) = instructions[i - 1].push_value else {
                continue;
            };
            if target.bit_len() > 32 {
                continue;
            }
            let target_pc = target.as_limbs()[0] as usize;
            if jumpdests.contains(&target_pc) {
                if let Some(&idx) = pc_to_index.get(&target_pc) {
                    instructions[i].static_target = Some(idx);
                }
            }
        }

        let blocks = Self::partition_blocks(code, &mut instructions, spec);
        (instructions, blocks)
    }

    fn partition_blocks(
        code: &[u8],
        instructions: &mut [Instruction],
        spec: SpecId,
    ) -> Vec<BlockDescriptor> {
        let mut blocks = Vec::new();
        let mut start = 0usize;

        let mut i = 0usize;
        while i < instructions.len() {
            let op = instructions[i].opcode;
            let is_jumpdest_entry = op == opcode::JUMPDEST && i != start;
            let is_block_end = opcode::ends_block(op);

            if is_jumpdest_entry {
                blocks.push(Self::build_block(code, instructions, start, i, spec));
                start = i;
            }
            if is_block_end {
                blocks.push(Self::build_block(code, instructions, start, i + 1, spec));
                start = i + 1;
            }
            i += 1;
        }
        if start < instructions.len() {
            blocks.push(Self::build_block(code, instructions, start, instructions.len(), spec));
        }

        for (block_idx, block) in blocks.iter().enumerate() {
            for instr in &mut instructions[block.start..block.end] {
                instr.block = block_idx;
            }
        }
        blocks
    }

    fn build_block(
        code: &[u8],
        instructions: &[Instruction],
        start: usize,
        end: usize,
        spec: SpecId,
    ) -> BlockDescriptor {
        let mut total_static_gas = 0u64;
        let mut depth: i32 = 0;
        let mut min_depth: i32 = 0;
        let mut max_depth: i32 = 0;

        for instr in &instructions[start..end] {
            let _ = code; // bytecode bytes aren't needed beyond what decode() already extracted
            total_static_gas += gas::static_gas(instr.opcode, spec);
            let (pops, pushes) = opcode::stack_io(instr.opcode);
            depth -= i32::from(pops);
            min_depth = min_depth.min(depth);
            depth += i32::from(pushes);
            max_depth = max_depth.max(depth);
        }

        BlockDescriptor {
            start,
            end,
            total_static_gas,
            stack_min_required: u16::try_from(-min_depth).unwrap_or(0),
            stack_max_growth: u16::try_from(max_depth).unwrap_or(0),
        }
    }

    #[must_use]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn blocks(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, index: usize) -> &BlockDescriptor {
        &self.blocks[index]
    }

    /// `true` if `pc` is a valid `JUMP`/`JUMPI` destination, the check a
    /// dynamic jump must still run even though most static jumps were
    /// resolved at analysis time.
    #[must_use]
    pub fn is_valid_jumpdest(&self, pc: usize) -> bool {
        self.jumpdests.contains(&pc)
    }

    /// Maps a byte offset to its instruction index, for resolving a
    /// dynamic `JUMP`/`JUMPI` target popped off the stack at runtime.
    #[must_use]
    pub fn instruction_index_at(&self, pc: usize) -> Option<usize> {
        self.instructions.iter().position(|instr| instr.pc == pc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumpdest_inside_push_data_is_not_valid() {
        // PUSH1 0x5B (the JUMPDEST byte as push data) followed by STOP.
        let code = [opcode::PUSH1, opcode::JUMPDEST, opcode::STOP];
        let analyzed = AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap();
        assert!(!analyzed.is_valid_jumpdest(1));
    }

    #[test]
    fn real_jumpdest_is_valid() {
        let code = [opcode::JUMPDEST, opcode::STOP];
        let analyzed = AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap();
        assert!(analyzed.is_valid_jumpdest(0));
    }

    #[test]
    fn static_jump_to_valid_target_resolves_at_analysis_time() {
        // PUSH1 3; JUMP; JUMPDEST; STOP
        let code = [
            opcode::PUSH1,
            0x03,
            opcode::JUMP,
            opcode::JUMPDEST,
            opcode::STOP,
        ];
        let analyzed = AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap();
        let jump_instr = analyzed
            .instructions()
            .iter()
            .find(|i| i.opcode == opcode::JUMP)
            .unwrap();
        let target_idx = jump_instr.static_target.expect("should resolve statically");
        assert_eq!(analyzed.instructions()[target_idx].opcode, opcode::JUMPDEST);
    }

    #[test]
    fn block_partitioning_splits_at_terminators_and_jumpdests() {
        // STOP; JUMPDEST; STOP
        let code = [opcode::STOP, opcode::JUMPDEST, opcode::STOP];
        let analyzed = AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap();
        assert_eq!(analyzed.blocks().len(), 2);
        assert_eq!(analyzed.blocks()[0].start, 0);
        assert_eq!(analyzed.blocks()[0].end, 1);
        assert_eq!(analyzed.blocks()[1].start, 1);
        assert_eq!(analyzed.blocks()[1].end, 3);
    }

    #[test]
    fn block_stack_min_required_reflects_pops_before_pushes() {
        // ADD requires two items present before it runs.
        let code = [opcode::ADD, opcode::STOP];
        let analyzed = AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap();
        assert_eq!(analyzed.blocks()[0].stack_min_required, 2);
    }

    #[test]
    fn block_stack_max_growth_is_the_peak_not_the_net_delta() {
        // PUSH1 x5 then POP x5: net stack change is zero, but the block
        // transiently spikes to +5 before draining back down.
        let mut code = Vec::new();
        for _ in 0..5 {
            code.push(opcode::PUSH1);
            code.push(0x01);
        }
        for _ in 0..5 {
            code.push(opcode::POP);
        }
        code.push(opcode::STOP);
        let analyzed = AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap();
        assert_eq!(analyzed.blocks()[0].stack_max_growth, 5);
    }

    #[test]
    fn eip3541_rejects_ef_prefixed_code() {
        let code = [0xEFu8, opcode::STOP];
        assert_eq!(
            AnalyzedBytecode::analyze(&code, SpecId::CANCUN).unwrap_err(),
            AnalysisError::InvalidMagic
        );
    }
}
