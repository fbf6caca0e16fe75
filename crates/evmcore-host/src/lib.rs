//! The external collaborators the interpreter is built against (§6):
//! the world-state database, the access list / refund ledger / transient
//! storage (C6), precompile dispatch, and the block/transaction context.
//!
//! Nothing in this crate knows about opcodes or the analyzed instruction
//! stream — it is the narrow interface the interpreter calls through, plus
//! one reference implementation (`InMemoryDb`) good enough to run the
//! engine's own tests against.

pub mod access_list;
pub mod context;
pub mod database;
pub mod host;
pub mod journal;
pub mod precompile;

pub use access_list::AccessList;
pub use context::{BlockContext, TxContext};
pub use database::{Database, DatabaseError, InMemoryDb};
pub use host::{Host, SloadResult, SstoreResult};
pub use journal::{Journal, LogEntry, SelfDestructRecord};
pub use precompile::{PrecompileError, PrecompileOutput, PrecompileProvider, StandardPrecompiles};
