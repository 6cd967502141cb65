//! Simulated ledger for deterministic tests.
//!
//! Records every submitted call in order and applies programmable outcomes
//! per method, so approval/primary sequencing can be verified without a live
//! network. View calls answer from a programmable table. This is a
//! first-class type: integration tests and downstream consumers drive the
//! orchestrator against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::chain::abi;
use crate::chain::ledger::{InclusionStatus, Ledger, TxHash};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDED CALLS AND OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════════

/// One recorded state-changing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedCall {
    /// Sender account
    pub from: Address,
    /// Target contract
    pub to: Address,
    /// Full calldata (selector plus argument words)
    pub calldata: Vec<u8>,
}

impl SubmittedCall {
    /// 4-byte selector of the call (zeros if the calldata is shorter)
    pub fn selector(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (i, byte) in self.calldata.iter().take(4).enumerate() {
            out[i] = *byte;
        }
        out
    }

    /// True when this call targets the method with the given signature
    pub fn matches(&self, signature: &str) -> bool {
        self.selector() == abi::selector(signature)
    }
}

/// Outcome the simulator applies to a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    /// Accept and report success at inclusion
    Succeed,
    /// Accept and report a revert at inclusion
    Revert,
    /// Refuse at the signer prompt
    RejectAtSigner,
    /// Fail the submission at the transport layer
    FailSubmission,
    /// Accept, then error while waiting for the receipt
    FailInclusionWait,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATED LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory ledger double with scripted behavior
pub struct SimulatedLedger {
    accounts: Vec<Address>,
    calls: Mutex<Vec<SubmittedCall>>,
    outcomes: Mutex<HashMap<[u8; 4], SimOutcome>>,
    views: Mutex<HashMap<[u8; 4], U256>>,
    pending: Mutex<HashMap<TxHash, SimOutcome>>,
    next_hash: AtomicU64,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLedger {
    /// Create a simulator with one default account
    pub fn new() -> Self {
        Self::with_accounts(vec![Address::repeat_byte(0xAA)])
    }

    /// Create a simulator reporting exactly the given accounts
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(HashMap::new()),
            views: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            next_hash: AtomicU64::new(1),
        }
    }

    /// Script the outcome for every future call to `signature`
    /// (unscripted methods succeed)
    pub fn set_outcome(&self, signature: &str, outcome: SimOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(abi::selector(signature), outcome);
    }

    /// Script the uint256 word a view method returns
    /// (unscripted views return zero)
    pub fn set_view(&self, signature: &str, value: U256) {
        self.views
            .lock()
            .unwrap()
            .insert(abi::selector(signature), value);
    }

    /// All state-changing calls submitted so far, in submission order
    pub fn submitted_calls(&self) -> Vec<SubmittedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of state-changing calls submitted so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn selector_of(calldata: &[u8]) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (i, byte) in calldata.iter().take(4).enumerate() {
            out[i] = *byte;
        }
        out
    }

    fn fabricate_hash(&self) -> TxHash {
        let n = self.next_hash.fetch_add(1, Ordering::Relaxed);
        TxHash::from(U256::from(n))
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    async fn submit(&self, from: Address, to: Address, calldata: Vec<u8>) -> Result<TxHash> {
        let selector = Self::selector_of(&calldata);
        let outcome = self
            .outcomes
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?
            .get(&selector)
            .copied()
            .unwrap_or(SimOutcome::Succeed);

        match outcome {
            SimOutcome::FailSubmission => {
                return Err(Error::Network("simulated submission failure".into()))
            }
            SimOutcome::RejectAtSigner => return Err(Error::SignerRejected),
            SimOutcome::Succeed | SimOutcome::Revert | SimOutcome::FailInclusionWait => {}
        }

        self.calls
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?
            .push(SubmittedCall { from, to, calldata });

        let tx_hash = self.fabricate_hash();
        self.pending
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?
            .insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionStatus> {
        let outcome = self
            .pending
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| Error::Network(format!("unknown transaction {}", tx_hash)))?;

        match outcome {
            SimOutcome::Succeed => Ok(InclusionStatus::Succeeded),
            SimOutcome::Revert => Ok(InclusionStatus::Reverted),
            SimOutcome::FailInclusionWait => {
                Err(Error::Network("simulated inclusion-wait failure".into()))
            }
            SimOutcome::RejectAtSigner | SimOutcome::FailSubmission => Err(Error::Internal(
                "transaction should not have been accepted".into(),
            )),
        }
    }

    async fn call(&self, _to: Address, calldata: Vec<u8>) -> Result<Vec<u8>> {
        let selector = Self::selector_of(&calldata);
        let value = self
            .views
            .lock()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?
            .get(&selector)
            .copied()
            .unwrap_or(U256::ZERO);
        Ok(value.to_be_bytes::<32>().to_vec())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }
}
