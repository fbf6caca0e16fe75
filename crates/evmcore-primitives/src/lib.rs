//! 256-bit arithmetic, opcode metadata and gas schedules shared by the
//! analyzer, the interpreter and the host.
//!
//! This crate carries no execution state of its own: everything here is
//! pure functions and constant tables so that the interpreter crate can
//! stay free of arithmetic detail and the host crate can stay free of
//! opcode detail.

pub mod arithmetic;
pub mod gas;
pub mod opcode;
pub mod spec_id;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use spec_id::SpecId;

/// A 256-bit EVM word. Thin alias over `alloy_primitives::U256` so the rest
/// of the workspace never has to name the underlying `ruint` type.
pub type Word = U256;
