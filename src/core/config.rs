//! Protocol deployment configuration.
//!
//! Everything the orchestrator needs to know about one deployment of the
//! protocol: the custodial engine contract, the stablecoin contract, and the
//! allowlist of supported collateral tokens. The configuration is an explicit
//! value passed in at construction; nothing reads it from globals.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::core::token::CollateralToken;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Decimal places of the USDD stablecoin
pub const STABLECOIN_DECIMALS: u8 = 18;

/// One deployment of the protocol contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Custodial engine contract: holds deposited collateral and enforces
    /// mint/redeem/liquidation rules
    pub engine: Address,

    /// USDD stablecoin token contract
    pub stablecoin: Address,

    /// Supported collateral tokens
    pub collateral_tokens: Vec<CollateralToken>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

impl ProtocolConfig {
    /// The Sepolia testnet deployment
    pub fn sepolia() -> Self {
        Self {
            engine: address!("0168f990da7d23cf80d93f224bf21e0abde81c11"),
            stablecoin: address!("7485af5b1ee43cf349376f175aaa99be9ed0d077"),
            collateral_tokens: vec![
                CollateralToken::new(
                    "wETH",
                    address!("fff9976782d46cc05630d1f6ebab18b2324d6b14"),
                    18,
                ),
                CollateralToken::new(
                    "wBTC",
                    address!("29f2d40b0605204364af54ec677bd022da425d03"),
                    18,
                ),
            ],
        }
    }

    /// Validate that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.engine == Address::ZERO {
            return Err(Error::Config("engine address is zero".into()));
        }
        if self.stablecoin == Address::ZERO {
            return Err(Error::Config("stablecoin address is zero".into()));
        }
        if self.collateral_tokens.is_empty() {
            return Err(Error::Config("no collateral tokens configured".into()));
        }
        for token in &self.collateral_tokens {
            if token.address == Address::ZERO {
                return Err(Error::Config(format!(
                    "collateral token {} has a zero address",
                    token.symbol
                )));
            }
        }
        for (i, a) in self.collateral_tokens.iter().enumerate() {
            for b in self.collateral_tokens.iter().skip(i + 1) {
                if a.symbol.eq_ignore_ascii_case(&b.symbol) {
                    return Err(Error::Config(format!(
                        "duplicate collateral token symbol: {}",
                        a.symbol
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve a user-entered token reference (symbol or address) against
    /// the allowlist
    pub fn resolve_token(&self, reference: &str) -> Result<&CollateralToken> {
        self.collateral_tokens
            .iter()
            .find(|t| t.matches(reference))
            .ok_or_else(|| Error::UnknownToken(reference.trim().to_string()))
    }

    /// Symbols of all supported tokens, for display
    pub fn token_symbols(&self) -> Vec<&str> {
        self.collateral_tokens
            .iter()
            .map(|t| t.symbol.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sepolia_deployment_validates() {
        let config = ProtocolConfig::sepolia();
        assert!(config.validate().is_ok());
        assert_eq!(config.collateral_tokens.len(), 2);
    }

    #[test]
    fn test_resolve_token_by_symbol() {
        let config = ProtocolConfig::default();
        let token = config.resolve_token("weth").unwrap();
        assert_eq!(token.symbol, "wETH");
    }

    #[test]
    fn test_resolve_token_by_address() {
        let config = ProtocolConfig::default();
        let token = config
            .resolve_token("0xfff9976782d46cc05630d1f6ebab18b2324d6b14")
            .unwrap();
        assert_eq!(token.symbol, "wETH");
    }

    #[test]
    fn test_resolve_unknown_token() {
        let config = ProtocolConfig::default();
        let err = config.resolve_token("DOGE").unwrap_err();
        assert_eq!(err, Error::UnknownToken("DOGE".into()));
    }

    #[test]
    fn test_validate_rejects_zero_engine() {
        let mut config = ProtocolConfig::default();
        config.engine = Address::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_token_list() {
        let mut config = ProtocolConfig::default();
        config.collateral_tokens.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_symbols() {
        let mut config = ProtocolConfig::default();
        let dup = config.collateral_tokens[0].clone();
        config.collateral_tokens.push(CollateralToken::new(
            dup.symbol.to_uppercase(),
            Address::repeat_byte(0x11),
            18,
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_symbols() {
        let config = ProtocolConfig::default();
        assert_eq!(config.token_symbols(), vec!["wETH", "wBTC"]);
    }
}
