//! Action requests and their settlement lifecycle.
//!
//! An [`ActionRequest`] fully describes one protocol action before anything
//! is submitted: an optional approval step plus the primary engine call, with
//! every human-entered amount already converted to base units. The request
//! carries an explicit [`RequestPhase`]; transitions go through checked
//! methods, so an out-of-order step is an error rather than a silent skip.

use std::fmt;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::abi;
use crate::chain::TxHash;
use crate::core::{parse_address, parse_units, ProtocolConfig, STABLECOIN_DECIMALS};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// ACTION KINDS
// ═══════════════════════════════════════════════════════════════════════════════

/// The state-changing protocol actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Deposit collateral into the engine
    Deposit,
    /// Redeem deposited collateral
    Redeem,
    /// Redeem collateral and burn stablecoin debt in one call
    RedeemAndBurn,
    /// Mint stablecoin against deposited collateral
    Mint,
    /// Liquidate an undercollateralized position
    Liquidate,
}

impl ActionKind {
    /// Stable lowercase name, used in logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Deposit => "deposit",
            ActionKind::Redeem => "redeem",
            ActionKind::RedeemAndBurn => "redeem-and-burn",
            ActionKind::Mint => "mint",
            ActionKind::Liquidate => "liquidate",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST PHASE
// ═══════════════════════════════════════════════════════════════════════════════

/// Terminal outcome of a settled request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// The primary call was included and succeeded
    Succeeded,
    /// The action failed at some step; terminal, never retried
    Failed,
}

/// Where a request stands in the approve/settle sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPhase {
    /// Constructed, nothing submitted yet
    Idle,
    /// Approval handed to the signer, awaiting its inclusion
    AwaitingApproval,
    /// Primary call handed to the signer, awaiting its inclusion
    AwaitingPrimaryCall,
    /// Terminal: the request settled one way or the other
    Settled(Settlement),
}

impl RequestPhase {
    /// Stable lowercase name for logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Idle => "idle",
            RequestPhase::AwaitingApproval => "awaiting-approval",
            RequestPhase::AwaitingPrimaryCall => "awaiting-primary-call",
            RequestPhase::Settled(Settlement::Succeeded) => "settled:success",
            RequestPhase::Settled(Settlement::Failed) => "settled:failure",
        }
    }

    /// True once the request has settled
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestPhase::Settled(_))
    }
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTION REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

/// The allowance grant an action needs before its primary call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Token contract that must grant the allowance (a collateral token for
    /// deposits, the stablecoin for burns and liquidations)
    pub token: Address,
    /// Allowance in base units; always the exact primary-call amount
    pub amount: U256,
}

/// One fully-specified protocol action.
///
/// Construction resolves the token reference and converts amounts exactly
/// once; the same base-unit values flow into the approval and the primary
/// calldata unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    kind: ActionKind,
    approval: Option<ApprovalStep>,
    primary_to: Address,
    primary_calldata: Vec<u8>,
    phase: RequestPhase,
    approval_tx: Option<TxHash>,
    primary_tx: Option<TxHash>,
}

impl ActionRequest {
    fn new(
        kind: ActionKind,
        approval: Option<ApprovalStep>,
        primary_to: Address,
        primary_calldata: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            approval,
            primary_to,
            primary_calldata,
            phase: RequestPhase::Idle,
            approval_tx: None,
            primary_tx: None,
        }
    }

    /// Deposit collateral: approve the engine for the amount, then
    /// `depositCollateral`
    pub fn deposit(config: &ProtocolConfig, token_ref: &str, amount: &str) -> Result<Self> {
        let token = config.resolve_token(token_ref)?;
        let base = parse_units(amount, token.decimals)?;
        Ok(Self::new(
            ActionKind::Deposit,
            Some(ApprovalStep {
                token: token.address,
                amount: base,
            }),
            config.engine,
            abi::deposit_collateral(token.address, base),
        ))
    }

    /// Redeem collateral: a single `redeemCollateral` call, no approval
    pub fn redeem(config: &ProtocolConfig, token_ref: &str, amount: &str) -> Result<Self> {
        let token = config.resolve_token(token_ref)?;
        let base = parse_units(amount, token.decimals)?;
        Ok(Self::new(
            ActionKind::Redeem,
            None,
            config.engine,
            abi::redeem_collateral(token.address, base),
        ))
    }

    /// Redeem collateral and burn debt: approve the engine to pull the
    /// stablecoin debt, then the combined redeem-and-burn call
    pub fn redeem_and_burn(
        config: &ProtocolConfig,
        token_ref: &str,
        collateral_amount: &str,
        debt_amount: &str,
    ) -> Result<Self> {
        let token = config.resolve_token(token_ref)?;
        let collateral_base = parse_units(collateral_amount, token.decimals)?;
        let debt_base = parse_units(debt_amount, STABLECOIN_DECIMALS)?;
        Ok(Self::new(
            ActionKind::RedeemAndBurn,
            Some(ApprovalStep {
                token: config.stablecoin,
                amount: debt_base,
            }),
            config.engine,
            abi::redeem_collateral_and_burn(token.address, collateral_base, debt_base),
        ))
    }

    /// Mint stablecoin: a single `mintUSDD` call, no approval
    pub fn mint(config: &ProtocolConfig, amount: &str) -> Result<Self> {
        let base = parse_units(amount, STABLECOIN_DECIMALS)?;
        Ok(Self::new(
            ActionKind::Mint,
            None,
            config.engine,
            abi::mint(base),
        ))
    }

    /// Liquidate a position: approve the engine to pull the stablecoin that
    /// covers the target's debt, then `liquidate`
    pub fn liquidate(
        config: &ProtocolConfig,
        token_ref: &str,
        target_user: &str,
        debt_to_cover: &str,
    ) -> Result<Self> {
        let token = config.resolve_token(token_ref)?;
        let target = parse_address(target_user)?;
        let debt_base = parse_units(debt_to_cover, STABLECOIN_DECIMALS)?;
        Ok(Self::new(
            ActionKind::Liquidate,
            Some(ApprovalStep {
                token: config.stablecoin,
                amount: debt_base,
            }),
            config.engine,
            abi::liquidate(token.address, target, debt_base),
        ))
    }

    // ───────────────────────────────────────────────────────────────────────
    // Phase transitions
    // ───────────────────────────────────────────────────────────────────────

    /// Enter [`RequestPhase::AwaitingApproval`] as the approval is handed to
    /// the signer. Only legal from `Idle` on a request that carries an
    /// approval step.
    pub fn begin_approval(&mut self) -> Result<()> {
        if self.phase != RequestPhase::Idle || self.approval.is_none() {
            return Err(self.illegal_transition(RequestPhase::AwaitingApproval));
        }
        self.phase = RequestPhase::AwaitingApproval;
        Ok(())
    }

    /// Enter [`RequestPhase::AwaitingPrimaryCall`]. Legal from `Idle` only
    /// when no approval is required, otherwise only from `AwaitingApproval`
    /// once the approval has confirmed.
    pub fn begin_primary(&mut self) -> Result<()> {
        let legal = match self.phase {
            RequestPhase::Idle => self.approval.is_none(),
            RequestPhase::AwaitingApproval => true,
            _ => false,
        };
        if !legal {
            return Err(self.illegal_transition(RequestPhase::AwaitingPrimaryCall));
        }
        self.phase = RequestPhase::AwaitingPrimaryCall;
        Ok(())
    }

    /// Settle successfully. Only legal once the primary call is in flight.
    pub fn settle_success(&mut self) -> Result<()> {
        if self.phase != RequestPhase::AwaitingPrimaryCall {
            return Err(self.illegal_transition(RequestPhase::Settled(Settlement::Succeeded)));
        }
        self.phase = RequestPhase::Settled(Settlement::Succeeded);
        Ok(())
    }

    /// Settle as failed. Legal from either awaiting phase.
    pub fn settle_failure(&mut self) -> Result<()> {
        match self.phase {
            RequestPhase::AwaitingApproval | RequestPhase::AwaitingPrimaryCall => {
                self.phase = RequestPhase::Settled(Settlement::Failed);
                Ok(())
            }
            _ => Err(self.illegal_transition(RequestPhase::Settled(Settlement::Failed))),
        }
    }

    fn illegal_transition(&self, to: RequestPhase) -> Error {
        Error::IllegalPhaseTransition {
            from: self.phase.to_string(),
            to: to.to_string(),
        }
    }

    /// Record the approval transaction hash once the signer accepts it
    pub fn record_approval_tx(&mut self, tx_hash: TxHash) {
        self.approval_tx = Some(tx_hash);
    }

    /// Record the primary transaction hash once the signer accepts it
    pub fn record_primary_tx(&mut self, tx_hash: TxHash) {
        self.primary_tx = Some(tx_hash);
    }

    // ───────────────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────────────

    /// Which action this request performs
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    /// True when the action needs an allowance before its primary call
    pub fn requires_approval(&self) -> bool {
        self.approval.is_some()
    }

    /// The approval step, when the action carries one
    pub fn approval(&self) -> Option<&ApprovalStep> {
        self.approval.as_ref()
    }

    /// Target contract of the primary call
    pub fn primary_to(&self) -> Address {
        self.primary_to
    }

    /// Encoded calldata of the primary call
    pub fn primary_calldata(&self) -> &[u8] {
        &self.primary_calldata
    }

    /// Approval transaction hash, once submitted
    pub fn approval_tx(&self) -> Option<TxHash> {
        self.approval_tx
    }

    /// Primary transaction hash, once submitted
    pub fn primary_tx(&self) -> Option<TxHash> {
        self.primary_tx
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTION RECEIPT
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of a successfully settled action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// Which action settled
    pub kind: ActionKind,
    /// Approval transaction, when the action required one
    pub approval_tx: Option<TxHash>,
    /// The primary engine transaction
    pub primary_tx: TxHash,
    /// When the primary call's inclusion was observed
    pub settled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProtocolConfig {
        ProtocolConfig::default()
    }

    #[test]
    fn test_deposit_request_shape() {
        let config = config();
        let request = ActionRequest::deposit(&config, "wETH", "2.5").unwrap();
        let weth = config.resolve_token("wETH").unwrap();
        let expected = U256::from(2_500_000_000_000_000_000u128);

        assert_eq!(request.kind(), ActionKind::Deposit);
        assert_eq!(request.phase(), RequestPhase::Idle);
        let approval = request.approval().unwrap();
        assert_eq!(approval.token, weth.address);
        assert_eq!(approval.amount, expected);

        assert_eq!(request.primary_to(), config.engine);
        let calldata = request.primary_calldata();
        assert_eq!(&calldata[..4], &abi::selector(abi::SIG_DEPOSIT_COLLATERAL));
        assert_eq!(abi::decode_call_address(calldata, 0).unwrap(), weth.address);
        assert_eq!(abi::decode_call_uint(calldata, 1).unwrap(), expected);
    }

    #[test]
    fn test_redeem_request_has_no_approval() {
        let config = config();
        let request = ActionRequest::redeem(&config, "wBTC", "1").unwrap();

        assert!(!request.requires_approval());
        assert_eq!(
            &request.primary_calldata()[..4],
            &abi::selector(abi::SIG_REDEEM_COLLATERAL)
        );
    }

    #[test]
    fn test_redeem_and_burn_approves_stablecoin_debt() {
        let config = config();
        let request = ActionRequest::redeem_and_burn(&config, "wETH", "0.5", "1000").unwrap();
        let debt = U256::from(1000u64) * U256::from(10u64).pow(U256::from(18u8));

        let approval = request.approval().unwrap();
        assert_eq!(approval.token, config.stablecoin);
        assert_eq!(approval.amount, debt);

        let calldata = request.primary_calldata();
        assert_eq!(
            abi::decode_call_uint(calldata, 1).unwrap(),
            U256::from(500_000_000_000_000_000u128)
        );
        assert_eq!(abi::decode_call_uint(calldata, 2).unwrap(), debt);
    }

    #[test]
    fn test_mint_request() {
        let config = config();
        let request = ActionRequest::mint(&config, "100").unwrap();

        assert!(!request.requires_approval());
        assert_eq!(
            abi::decode_call_uint(request.primary_calldata(), 0).unwrap(),
            U256::from(100_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_liquidate_request_targets_user() {
        let config = config();
        let target = "0x1111111111111111111111111111111111111111";
        let request = ActionRequest::liquidate(&config, "wETH", target, "500").unwrap();

        assert_eq!(request.approval().unwrap().token, config.stablecoin);
        assert_eq!(
            abi::decode_call_address(request.primary_calldata(), 1).unwrap(),
            Address::repeat_byte(0x11)
        );
    }

    #[test]
    fn test_liquidate_rejects_bad_target() {
        let config = config();
        let err = ActionRequest::liquidate(&config, "wETH", "not-an-address", "500").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn test_unknown_token_rejected() {
        let config = config();
        let err = ActionRequest::deposit(&config, "DOGE", "1").unwrap_err();
        assert_eq!(err, Error::UnknownToken("DOGE".into()));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let config = config();
        assert_eq!(
            ActionRequest::mint(&config, "0").unwrap_err(),
            Error::ZeroAmount
        );
    }

    #[test]
    fn test_phase_happy_path_with_approval() {
        let config = config();
        let mut request = ActionRequest::deposit(&config, "wETH", "1").unwrap();

        request.begin_approval().unwrap();
        assert_eq!(request.phase(), RequestPhase::AwaitingApproval);
        request.begin_primary().unwrap();
        assert_eq!(request.phase(), RequestPhase::AwaitingPrimaryCall);
        request.settle_success().unwrap();
        assert_eq!(request.phase(), RequestPhase::Settled(Settlement::Succeeded));
        assert!(request.phase().is_terminal());
    }

    #[test]
    fn test_phase_happy_path_without_approval() {
        let config = config();
        let mut request = ActionRequest::mint(&config, "100").unwrap();

        request.begin_primary().unwrap();
        request.settle_success().unwrap();
        assert_eq!(request.phase(), RequestPhase::Settled(Settlement::Succeeded));
    }

    #[test]
    fn test_cannot_skip_required_approval() {
        let config = config();
        let mut request = ActionRequest::deposit(&config, "wETH", "1").unwrap();

        let err = request.begin_primary().unwrap_err();
        assert!(matches!(err, Error::IllegalPhaseTransition { .. }));
        assert_eq!(request.phase(), RequestPhase::Idle);
    }

    #[test]
    fn test_cannot_begin_approval_without_step() {
        let config = config();
        let mut request = ActionRequest::mint(&config, "100").unwrap();
        assert!(request.begin_approval().is_err());
    }

    #[test]
    fn test_failure_settles_from_awaiting_approval() {
        let config = config();
        let mut request = ActionRequest::deposit(&config, "wETH", "1").unwrap();

        request.begin_approval().unwrap();
        request.settle_failure().unwrap();
        assert_eq!(request.phase(), RequestPhase::Settled(Settlement::Failed));
    }

    #[test]
    fn test_settlement_is_terminal() {
        let config = config();
        let mut request = ActionRequest::mint(&config, "100").unwrap();

        request.begin_primary().unwrap();
        request.settle_failure().unwrap();
        assert!(request.begin_primary().is_err());
        assert!(request.settle_success().is_err());
        assert!(request.settle_failure().is_err());
    }

    #[test]
    fn test_cannot_settle_from_idle() {
        let config = config();
        let mut request = ActionRequest::mint(&config, "100").unwrap();
        assert!(request.settle_failure().is_err());
        assert!(request.settle_success().is_err());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RequestPhase::Idle.as_str(), "idle");
        assert_eq!(
            RequestPhase::Settled(Settlement::Failed).as_str(),
            "settled:failure"
        );
        assert_eq!(ActionKind::RedeemAndBurn.as_str(), "redeem-and-burn");
    }
}
