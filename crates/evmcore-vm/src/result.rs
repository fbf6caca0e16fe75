//! The result of a top-level transaction (§6): `{success, gas_left,
//! output, logs_emitted, refund}`, plus the deployed address when the
//! transaction was a `CREATE`.

use evmcore_host::journal::LogEntry;
use evmcore_primitives::Address;
use serde::{Deserialize, Serialize};

/// The outcome of running one transaction (a top-level `CALL` or
/// `CREATE`) to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub gas_left: u64,
    /// `RETURN`/`REVERT` output, or the `CREATE` deployer's revert
    /// reason on a failed deployment. Empty for a hard error.
    pub output: Vec<u8>,
    pub logs: Vec<LogEntry>,
    /// The refund counter, already capped per §4.4/EIP-3529 and folded
    /// into `gas_left` is *not* done here — callers apply the cap against
    /// whatever `gas_used` they compute at the transaction-intrinsic-gas
    /// layer (out of scope, §1), so this is the raw, uncapped counter.
    pub refund: i64,
    /// `Some` iff the transaction was a `CREATE`/`CREATE2` that deployed
    /// successfully.
    pub deployed_address: Option<Address>,
}
