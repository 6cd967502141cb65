//! Collateral token metadata.
//!
//! The protocol accepts a fixed allowlist of collateral tokens, configured at
//! deployment. User input refers to a token either by symbol or by address;
//! both forms resolve against the allowlist before any transaction is built.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// A supported collateral token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralToken {
    /// Display symbol (e.g. "wETH")
    pub symbol: String,

    /// On-chain contract address
    pub address: Address,

    /// Number of decimal places in the token's base unit
    pub decimals: u8,
}

impl CollateralToken {
    /// Create a new collateral token entry
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
        }
    }

    /// Check whether a user-entered reference names this token.
    ///
    /// Symbols compare case-insensitively; addresses compare by parsed
    /// bytes, so checksummed and lowercase hex both match.
    pub fn matches(&self, reference: &str) -> bool {
        if self.symbol.eq_ignore_ascii_case(reference.trim()) {
            return true;
        }
        match parse_address(reference) {
            Ok(addr) => addr == self.address,
            Err(_) => false,
        }
    }
}

impl fmt::Display for CollateralToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a 20-byte address from hex input (with or without the 0x prefix)
pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).map_err(|_| Error::InvalidAddress(value.trim().to_string()))
}
