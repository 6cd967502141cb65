//! Amount conversion and health-factor classification.
//!
//! Human-entered decimal amounts are parsed and scaled to base units exactly
//! once, at request construction; the same converted value then flows to the
//! approval and the primary call unchanged. Nothing downstream re-scales.

use std::fmt;

use alloy_primitives::U256;
use num_traits::Zero;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// UNIT CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a human-entered decimal amount into base units.
///
/// Rejects zero, negative, malformed input, and any value with more
/// fractional digits than the token carries.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256> {
    let trimmed = value.trim();
    let parsed: Decimal = trimmed.parse().map_err(|_| Error::InvalidAmount {
        value: trimmed.to_string(),
        reason: "not a decimal number".into(),
    })?;

    if parsed.is_sign_negative() {
        return Err(Error::InvalidAmount {
            value: trimmed.to_string(),
            reason: "amount is negative".into(),
        });
    }

    let parsed = parsed.normalize();
    if parsed.is_zero() {
        return Err(Error::ZeroAmount);
    }

    let scale = parsed.scale();
    if scale > u32::from(decimals) {
        return Err(Error::InvalidAmount {
            value: trimmed.to_string(),
            reason: format!("more than {} fractional digits", decimals),
        });
    }

    let factor = U256::from(10u64)
        .checked_pow(U256::from(u32::from(decimals) - scale))
        .ok_or_else(|| Error::Internal(format!("scale overflow for {} decimals", decimals)))?;

    U256::from(parsed.mantissa().unsigned_abs())
        .checked_mul(factor)
        .ok_or_else(|| Error::InvalidAmount {
            value: trimmed.to_string(),
            reason: "amount exceeds the 256-bit range".into(),
        })
}

/// Format a base-unit amount as a decimal string, trailing zeros trimmed
pub fn format_units(raw: U256, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let factor = match U256::from(10u64).checked_pow(U256::from(u32::from(decimals))) {
        Some(f) => f,
        None => return raw.to_string(),
    };

    let integer = raw / factor;
    let fraction = raw % factor;
    if fraction.is_zero() {
        return integer.to_string();
    }

    let mut frac_str = fraction.to_string();
    while frac_str.len() < usize::from(decimals) {
        frac_str.insert(0, '0');
    }
    format!("{}.{}", integer, frac_str.trim_end_matches('0'))
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEALTH FACTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Account health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Collateral value covers the minted debt at or above the threshold
    Healthy,
    /// Below the liquidation boundary; the position can be liquidated
    Undercollateralized,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Undercollateralized => write!(f, "undercollateralized"),
        }
    }
}

/// Ledger-computed health factor, fixed point with 18 decimal places.
///
/// Exactly 1.0 (10^18 raw) is the liquidation boundary: anything strictly
/// below is liquidatable, the boundary itself is still healthy. The ledger
/// reports `U256::MAX` for accounts with no minted debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HealthFactor(U256);

impl HealthFactor {
    /// Fixed-point scale: 10^18, the liquidation boundary
    pub const SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

    /// Wrap a raw ledger value
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// The raw fixed-point value
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// True when the account can be liquidated
    pub fn is_undercollateralized(&self) -> bool {
        self.0 < Self::SCALE
    }

    /// True for the sentinel the ledger reports on debt-free accounts
    pub fn is_unbounded(&self) -> bool {
        self.0 == U256::MAX
    }

    /// Classification against the liquidation boundary
    pub fn status(&self) -> HealthStatus {
        if self.is_undercollateralized() {
            HealthStatus::Undercollateralized
        } else {
            HealthStatus::Healthy
        }
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "∞")
        } else {
            write!(f, "{}", format_units(self.0, 18))
        }
    }
}
