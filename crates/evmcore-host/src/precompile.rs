//! Precompile address routing (§6). The spec scopes out precompile
//! *bodies* beyond address recognition and basic dispatch (§1, Non-goals);
//! [`StandardPrecompiles`] implements only `IDENTITY` in full and reports
//! every other standard address as present-but-unimplemented so callers
//! (`CALL`'s dispatcher, C10) can still distinguish "this is a precompile
//! address" from "this is an ordinary account".

use evmcore_primitives::Address;
use thiserror::Error;

/// Errors a [`PrecompileProvider`] may return.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// The address is a recognized precompile but its body is not
    /// implemented by this provider.
    #[error("precompile {0} is not implemented")]
    NotImplemented(Address),
    /// The precompile ran out of the gas it was given.
    #[error("precompile out of gas")]
    OutOfGas,
    /// The precompile rejected its input (e.g. malformed curve points).
    #[error("precompile input invalid: {0}")]
    InvalidInput(String),
}

/// The result of a successful precompile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecompileOutput {
    pub gas_used: u64,
    pub output: Vec<u8>,
}

/// Routes a call target to a precompile implementation, if any.
pub trait PrecompileProvider {
    /// `true` if `addr` is a recognized precompile address, regardless of
    /// whether this provider can actually execute it.
    fn is_precompile(&self, addr: Address) -> bool;

    /// Runs the precompile at `addr` with `input`, charging at most
    /// `gas_limit`. Returns `Ok(None)` only if `addr` is not a precompile
    /// at all; an unimplemented-but-recognized precompile is an `Err`.
    fn run(
        &self,
        addr: Address,
        input: &[u8],
        gas_limit: u64,
    ) -> Result<Option<PrecompileOutput>, PrecompileError>;

    /// Every address this provider recognizes as a precompile, so a
    /// transaction can pre-warm them all per §3's "Initially warmed" rule
    /// (precompile addresses are always warm, never charged the cold
    /// surcharge on first touch). Providers with no fixed address set can
    /// leave this empty.
    fn warm_addresses(&self) -> Vec<Address> {
        Vec::new()
    }
}

/// Addresses `0x01`-`0x04` exist in every hardfork this engine targets;
/// later ones (modexp, pairing, blake2f, point evaluation, ...) are added
/// by forks but are all out of scope here beyond being recognized.
const IDENTITY: u8 = 0x04;
const ECRECOVER: u8 = 0x01;
const SHA256: u8 = 0x02;
const RIPEMD160: u8 = 0x03;

fn precompile_index(addr: Address) -> Option<u8> {
    let bytes = addr.into_array();
    if bytes[..19].iter().any(|&b| b != 0) {
        return None;
    }
    let last = bytes[19];
    if (ECRECOVER..=IDENTITY).contains(&last) {
        Some(last)
    } else {
        None
    }
}

/// The reference [`PrecompileProvider`]: recognizes `0x01`-`0x04`, runs
/// `IDENTITY`, reports the rest as [`PrecompileError::NotImplemented`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardPrecompiles;

impl StandardPrecompiles {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// `G_IDENTITY_BASE + G_IDENTITY_WORD * ceil(len / 32)`.
    fn identity_gas(len: usize) -> u64 {
        const BASE: u64 = 15;
        const WORD: u64 = 3;
        BASE + WORD * ((len as u64 + 31) / 32)
    }
}

impl PrecompileProvider for StandardPrecompiles {
    fn is_precompile(&self, addr: Address) -> bool {
        precompile_index(addr).is_some()
    }

    fn warm_addresses(&self) -> Vec<Address> {
        (ECRECOVER..=IDENTITY)
            .map(|i| {
                let mut bytes = [0u8; 20];
                bytes[19] = i;
                Address::from(bytes)
            })
            .collect()
    }

    fn run(
        &self,
        addr: Address,
        input: &[u8],
        gas_limit: u64,
    ) -> Result<Option<PrecompileOutput>, PrecompileError> {
        let Some(index) = precompile_index(addr) else {
            return Ok(None);
        };
        match index {
            IDENTITY => {
                let gas_used = Self::identity_gas(input.len());
                if gas_used > gas_limit {
                    return Err(PrecompileError::OutOfGas);
                }
                Ok(Some(PrecompileOutput {
                    gas_used,
                    output: input.to_vec(),
                }))
            }
            ECRECOVER | SHA256 | RIPEMD160 => Err(PrecompileError::NotImplemented(addr)),
            _ => unreachable!("precompile_index only returns 0x01-0x04"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precompile_address(index: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = index;
        Address::from(bytes)
    }

    #[test]
    fn identity_echoes_input() {
        let p = StandardPrecompiles::new();
        let addr = precompile_address(IDENTITY);
        let input = b"hello world";
        let out = p.run(addr, input, 1_000_000).unwrap().unwrap();
        assert_eq!(out.output, input);
    }

    #[test]
    fn non_precompile_address_returns_none() {
        let p = StandardPrecompiles::new();
        assert!(!p.is_precompile(Address::with_last_byte(0x42)));
        assert!(p.run(Address::with_last_byte(0x42), &[], 100).unwrap().is_none());
    }

    #[test]
    fn recognized_but_unimplemented_precompile_errors() {
        let p = StandardPrecompiles::new();
        let addr = precompile_address(ECRECOVER);
        assert!(p.is_precompile(addr));
        assert_eq!(p.run(addr, &[], 100).unwrap_err(), PrecompileError::NotImplemented(addr));
    }
}
