//! Hardfork identifiers.
//!
//! The interpreter and gas schedule are parameterized on [`SpecId`] so that
//! the same analyzed-stream / handler machinery can execute bytecode under
//! any hardfork's rules; §4.4/§4.6 of the spec call several constants
//! "hardfork-dependent" and this is the knob that selects among them.

use serde::{Deserialize, Serialize};

/// An Ethereum hardfork identifier, ordered chronologically so that
/// `spec_id >= SpecId::BERLIN` style gating reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SpecId {
    FRONTIER,
    HOMESTEAD,
    TANGERINE,
    SPURIOUS_DRAGON,
    BYZANTIUM,
    CONSTANTINOPLE,
    PETERSBURG,
    ISTANBUL,
    BERLIN,
    LONDON,
    MERGE,
    SHANGHAI,
    CANCUN,
}

impl SpecId {
    /// The latest hardfork this engine knows about; used as the default
    /// when a caller does not pin a specific fork.
    pub const LATEST: SpecId = SpecId::CANCUN;

    /// `true` once EIP-2929 (access lists, cold/warm gas) is active.
    #[must_use]
    pub fn enabled_access_lists(self) -> bool {
        self >= SpecId::BERLIN
    }

    /// `true` once EIP-3529 (reduced refunds, no `SELFDESTRUCT` refund) is
    /// active.
    #[must_use]
    pub fn enabled_reduced_refunds(self) -> bool {
        self >= SpecId::LONDON
    }

    /// `true` once EIP-3651 (warm `COINBASE`) is active.
    #[must_use]
    pub fn enabled_warm_coinbase(self) -> bool {
        self >= SpecId::SHANGHAI
    }

    /// `true` once EIP-1153 (transient storage) is active.
    #[must_use]
    pub fn enabled_transient_storage(self) -> bool {
        self >= SpecId::CANCUN
    }

    /// `true` once EIP-5656 (`MCOPY`) is active.
    #[must_use]
    pub fn enabled_mcopy(self) -> bool {
        self >= SpecId::CANCUN
    }

    /// `true` once EIP-4844 (blob transactions, `BLOBHASH`/`BLOBBASEFEE`) is
    /// active.
    #[must_use]
    pub fn enabled_blobs(self) -> bool {
        self >= SpecId::CANCUN
    }

    /// `true` once EIP-3860 (init-code size limit, its gas surcharge) is
    /// active.
    #[must_use]
    pub fn enabled_init_code_limit(self) -> bool {
        self >= SpecId::SHANGHAI
    }

    /// `true` once EIP-3541 (`0xEF`-prefixed deployed code is rejected) is
    /// active.
    #[must_use]
    pub fn enabled_reject_ef_prefix(self) -> bool {
        self >= SpecId::LONDON
    }

    /// `true` if `op` is a defined opcode under this hardfork. Opcodes
    /// introduced by a later fork (`PUSH0`, `MCOPY`, `TLOAD`/`TSTORE`)
    /// decode identically to earlier ones — the byte values were never
    /// reused — but must be treated as `InvalidOpcode` before their
    /// activating fork, per §4.9.
    #[must_use]
    pub fn opcode_enabled(self, op: u8) -> bool {
        use crate::opcode;
        match op {
            opcode::PUSH0 => self >= SpecId::SHANGHAI,
            opcode::MCOPY => self.enabled_mcopy(),
            opcode::TLOAD | opcode::TSTORE => self.enabled_transient_storage(),
            opcode::BLOBHASH | opcode::BLOBBASEFEE => self.enabled_blobs(),
            _ => true,
        }
    }
}

impl Default for SpecId {
    fn default() -> Self {
        SpecId::LATEST
    }
}
