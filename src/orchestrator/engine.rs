//! The transaction orchestrator.
//!
//! One orchestrator drives every protocol action against a [`Ledger`]: it
//! submits the approval when the action carries one, waits for its inclusion,
//! then submits the primary engine call and waits again. A rejected, failed,
//! or undeterminable approval settles the whole action and the primary call
//! is never issued. Read-side queries report ledger values verbatim.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::abi;
use crate::chain::{Ledger, TxHash, WalletSession};
use crate::core::{format_units, HealthFactor, ProtocolConfig};
use crate::error::{Error, Result};
use crate::orchestrator::request::{ActionReceipt, ActionRequest, ApprovalStep};

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Sequences protocol actions against a ledger on behalf of one account
pub struct Orchestrator {
    config: ProtocolConfig,
    ledger: Arc<dyn Ledger>,
    account: Address,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build an orchestrator for a known account
    pub fn new(config: ProtocolConfig, ledger: Arc<dyn Ledger>, account: Address) -> Self {
        Self {
            config,
            ledger,
            account,
        }
    }

    /// Discover the signing account through the ledger and build an
    /// orchestrator bound to it
    pub async fn connect(
        config: ProtocolConfig,
        ledger: Arc<dyn Ledger>,
        preferred: Option<Address>,
    ) -> Result<Self> {
        let session = WalletSession::connect(ledger.as_ref(), preferred).await?;
        Ok(Self::new(config, ledger, session.account()))
    }

    /// The account actions are submitted from
    pub fn account(&self) -> Address {
        self.account
    }

    /// The deployment this orchestrator targets
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    // ───────────────────────────────────────────────────────────────────────
    // Sequencing
    // ───────────────────────────────────────────────────────────────────────

    /// Drive a request to settlement.
    ///
    /// The approval, when present, is submitted first and must be included
    /// and successful before the primary call is issued. Every failure is
    /// terminal: the request settles as failed and nothing is retried.
    pub async fn execute(&self, request: &mut ActionRequest) -> Result<ActionReceipt> {
        info!("Executing {} for {}", request.kind(), self.account);

        let approval_tx = match request.approval().cloned() {
            Some(step) => Some(self.run_approval(request, &step).await?),
            None => None,
        };

        request.begin_primary()?;
        let primary_tx = match self
            .ledger
            .submit(
                self.account,
                request.primary_to(),
                request.primary_calldata().to_vec(),
            )
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                request.settle_failure()?;
                return Err(e);
            }
        };
        request.record_primary_tx(primary_tx);
        debug!("Primary call submitted: {}", primary_tx);

        match self.ledger.wait_for_inclusion(primary_tx).await {
            Ok(status) if status.is_success() => {}
            Ok(_) => {
                request.settle_failure()?;
                return Err(Error::TransactionReverted {
                    tx_hash: primary_tx.to_string(),
                });
            }
            Err(e) => {
                request.settle_failure()?;
                return Err(e);
            }
        }

        request.settle_success()?;
        info!("{} settled in {}", request.kind(), primary_tx);
        Ok(ActionReceipt {
            kind: request.kind(),
            approval_tx,
            primary_tx,
            settled_at: Utc::now(),
        })
    }

    /// Submit the approval and wait for it. The outcome must be a confirmed
    /// success; a revert, rejection, or failed wait settles the request so
    /// the primary call is never issued.
    async fn run_approval(
        &self,
        request: &mut ActionRequest,
        step: &ApprovalStep,
    ) -> Result<TxHash> {
        request.begin_approval()?;
        let calldata = abi::approve(self.config.engine, step.amount);
        let tx_hash = match self.ledger.submit(self.account, step.token, calldata).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                request.settle_failure()?;
                return Err(e);
            }
        };
        request.record_approval_tx(tx_hash);
        debug!("Approval submitted to {}: {}", step.token, tx_hash);

        match self.ledger.wait_for_inclusion(tx_hash).await {
            Ok(status) if status.is_success() => Ok(tx_hash),
            Ok(_) => {
                request.settle_failure()?;
                Err(Error::ApprovalFailed {
                    tx_hash: tx_hash.to_string(),
                })
            }
            // Undeterminable outcome: fail closed.
            Err(e) => {
                request.settle_failure()?;
                Err(e)
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Actions
    // ───────────────────────────────────────────────────────────────────────

    /// Deposit collateral: approve the engine, then `depositCollateral`
    pub async fn deposit_collateral(&self, token_ref: &str, amount: &str) -> Result<ActionReceipt> {
        let mut request = ActionRequest::deposit(&self.config, token_ref, amount)?;
        self.execute(&mut request).await
    }

    /// Redeem collateral back to the wallet
    pub async fn redeem_collateral(&self, token_ref: &str, amount: &str) -> Result<ActionReceipt> {
        let mut request = ActionRequest::redeem(&self.config, token_ref, amount)?;
        self.execute(&mut request).await
    }

    /// Redeem collateral and burn stablecoin debt in one engine call
    pub async fn redeem_collateral_and_burn(
        &self,
        token_ref: &str,
        collateral_amount: &str,
        debt_amount: &str,
    ) -> Result<ActionReceipt> {
        let mut request =
            ActionRequest::redeem_and_burn(&self.config, token_ref, collateral_amount, debt_amount)?;
        self.execute(&mut request).await
    }

    /// Mint stablecoin against deposited collateral
    pub async fn mint(&self, amount: &str) -> Result<ActionReceipt> {
        let mut request = ActionRequest::mint(&self.config, amount)?;
        self.execute(&mut request).await
    }

    /// Liquidate an undercollateralized position, covering `debt_to_cover`
    /// of the target's debt
    pub async fn liquidate(
        &self,
        token_ref: &str,
        target_user: &str,
        debt_to_cover: &str,
    ) -> Result<ActionReceipt> {
        let mut request =
            ActionRequest::liquidate(&self.config, token_ref, target_user, debt_to_cover)?;
        self.execute(&mut request).await
    }

    // ───────────────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────────────

    /// Per-token collateral balances plus minted debt and aggregate USD
    /// value, verbatim from the ledger
    pub async fn query_collateral_balances(&self, user: Address) -> Result<CollateralBalances> {
        let mut balances = Vec::with_capacity(self.config.collateral_tokens.len());
        for token in &self.config.collateral_tokens {
            let data = self
                .ledger
                .call(
                    self.config.engine,
                    abi::balance_collateral_in_tokens(user, token.address),
                )
                .await?;
            balances.push(TokenBalance {
                symbol: token.symbol.clone(),
                address: token.address,
                decimals: token.decimals,
                base_units: abi::decode_uint(&data)?,
            });
        }

        let minted_data = self
            .ledger
            .call(self.config.engine, abi::minted(user))
            .await?;
        let usd_data = self
            .ledger
            .call(self.config.engine, abi::collateral_value_usd(user))
            .await?;

        Ok(CollateralBalances {
            user,
            balances,
            minted: abi::decode_uint(&minted_data)?,
            collateral_value_usd: abi::decode_uint(&usd_data)?,
        })
    }

    /// The ledger-computed health factor of a user
    pub async fn query_health_factor(&self, user: Address) -> Result<HealthFactor> {
        let data = self
            .ledger
            .call(self.config.engine, abi::health_factor(user))
            .await?;
        Ok(HealthFactor::from_raw(abi::decode_uint(&data)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUERY RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Collateral held by the engine for a user, one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token symbol
    pub symbol: String,
    /// Token contract address
    pub address: Address,
    /// Token decimal places
    pub decimals: u8,
    /// Balance in base units, verbatim from the ledger
    pub base_units: U256,
}

impl TokenBalance {
    /// Balance as a human-readable decimal string
    pub fn formatted(&self) -> String {
        format_units(self.base_units, self.decimals)
    }
}

/// A user's position: per-token collateral, minted debt, and the aggregate
/// USD value the ledger reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralBalances {
    /// The queried account
    pub user: Address,
    /// Collateral balance per supported token
    pub balances: Vec<TokenBalance>,
    /// Stablecoin debt minted by the user, base units
    pub minted: U256,
    /// Aggregate collateral value in USD, 18-decimal fixed point
    pub collateral_value_usd: U256,
}
