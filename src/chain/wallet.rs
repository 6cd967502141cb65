//! Wallet session: account discovery and binding.
//!
//! A session binds to exactly one account reported by the signing endpoint.
//! Chain-ID checks stay with the wallet layer; the only validation here is
//! that an account exists at all.

use alloy_primitives::Address;
use tracing::info;

use crate::chain::ledger::Ledger;
use crate::error::{Error, Result};

/// A signing identity bound to one account at the endpoint
#[derive(Debug, Clone)]
pub struct WalletSession {
    account: Address,
    available: Vec<Address>,
}

impl WalletSession {
    /// Discover accounts at the endpoint and bind to one.
    ///
    /// With no `preferred` account the first reported account is used,
    /// matching wallet ordering. A preferred account that the endpoint does
    /// not offer is a configuration error; an empty account list is
    /// `NoWalletAccount`.
    pub async fn connect(ledger: &dyn Ledger, preferred: Option<Address>) -> Result<Self> {
        let available = ledger.accounts().await?;
        let account = match preferred {
            Some(wanted) => available
                .iter()
                .copied()
                .find(|a| *a == wanted)
                .ok_or_else(|| {
                    if available.is_empty() {
                        Error::NoWalletAccount
                    } else {
                        Error::Config(format!(
                            "account {} is not offered by the signing endpoint",
                            wanted
                        ))
                    }
                })?,
            None => *available.first().ok_or(Error::NoWalletAccount)?,
        };
        info!("Wallet session bound to {}", account);
        Ok(Self { account, available })
    }

    /// The bound signing account
    pub fn account(&self) -> Address {
        self.account
    }

    /// All accounts the endpoint reported
    pub fn available(&self) -> &[Address] {
        &self.available
    }
}
