//! The ledger seam between the orchestrator and the network.
//!
//! The orchestrator never talks to an endpoint directly; it drives a `Ledger`.
//! The live implementation submits through a wallet-backed JSON-RPC endpoint,
//! the simulated one records calls in memory for deterministic tests.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Hash of a submitted transaction
pub type TxHash = B256;

/// Terminal status the ledger reports for an included transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InclusionStatus {
    /// Included and executed successfully
    Succeeded,
    /// Included but reverted
    Reverted,
}

impl InclusionStatus {
    /// True for a successful execution
    pub fn is_success(&self) -> bool {
        matches!(self, InclusionStatus::Succeeded)
    }
}

/// External ledger access as the orchestrator sees it.
///
/// Submission hands a prepared call to the signing endpoint; inclusion
/// waiting suspends until the ledger reports a terminal status for that
/// specific transaction. Neither operation retries.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submit a state-changing call from `from` to `to`; resolves to the
    /// transaction hash once the endpoint has signed and broadcast it
    async fn submit(&self, from: Address, to: Address, calldata: Vec<u8>) -> Result<TxHash>;

    /// Suspend until the ledger reports a terminal status for `tx_hash`
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionStatus>;

    /// Execute a read-only call and return the raw return bytes
    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Vec<u8>>;

    /// Accounts the signing endpoint is willing to sign for
    async fn accounts(&self) -> Result<Vec<Address>>;
}
