//! Integration tests for the transaction orchestrator.
//!
//! Every scenario drives the public API against the simulated ledger, which
//! records submitted calls in order and applies scripted outcomes per method.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use usdd::chain::abi;
use usdd::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const ACTOR: Address = Address::repeat_byte(0xAA);
const TARGET: &str = "0x2222222222222222222222222222222222222222";

fn orchestrator() -> (Orchestrator, Arc<SimulatedLedger>) {
    let ledger = Arc::new(SimulatedLedger::with_accounts(vec![ACTOR]));
    let orchestrator = Orchestrator::new(ProtocolConfig::sepolia(), ledger.clone(), ACTOR);
    (orchestrator, ledger)
}

fn one_ether() -> U256 {
    U256::from(10u64).pow(U256::from(18u8))
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPROVAL SEQUENCING
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn deposit_submits_approval_before_deposit_call() {
    let (orchestrator, ledger) = orchestrator();

    orchestrator.deposit_collateral("wETH", "2.5").await.unwrap();

    let calls = ledger.submitted_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].matches(abi::SIG_APPROVE));
    assert!(calls[1].matches(abi::SIG_DEPOSIT_COLLATERAL));
    assert_eq!(calls[0].from, ACTOR);
    assert_eq!(calls[1].from, ACTOR);
}

#[tokio::test]
async fn failed_approval_blocks_the_deposit_call() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_outcome(abi::SIG_APPROVE, SimOutcome::Revert);

    let err = orchestrator
        .deposit_collateral("wETH", "2.5")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ApprovalFailed { .. }));
    let calls = ledger.submitted_calls();
    assert_eq!(calls.len(), 1, "only the approval may reach the ledger");
    assert!(calls[0].matches(abi::SIG_APPROVE));
}

#[tokio::test]
async fn undeterminable_approval_status_fails_closed() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_outcome(abi::SIG_APPROVE, SimOutcome::FailInclusionWait);

    let err = orchestrator
        .deposit_collateral("wETH", "1")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    // the approval's outcome is unknown, so the deposit is never issued
    assert_eq!(ledger.call_count(), 1);
}

#[tokio::test]
async fn redeem_and_burn_approval_precedes_primary_with_exact_amounts() {
    let (orchestrator, ledger) = orchestrator();
    let config = ProtocolConfig::sepolia();

    orchestrator
        .redeem_collateral_and_burn("wETH", "0.5", "1000")
        .await
        .unwrap();

    let calls = ledger.submitted_calls();
    assert_eq!(calls.len(), 2);

    // approval: stablecoin grants the engine exactly the converted debt
    assert!(calls[0].matches(abi::SIG_APPROVE));
    assert_eq!(calls[0].to, config.stablecoin);
    let debt = U256::from(1000u64) * one_ether();
    assert_eq!(abi::decode_call_address(&calls[0].calldata, 0).unwrap(), config.engine);
    assert_eq!(abi::decode_call_uint(&calls[0].calldata, 1).unwrap(), debt);

    // primary: the identical amounts, not recomputed
    assert!(calls[1].matches(abi::SIG_REDEEM_AND_BURN));
    assert_eq!(calls[1].to, config.engine);
    assert_eq!(
        abi::decode_call_uint(&calls[1].calldata, 1).unwrap(),
        U256::from(500_000_000_000_000_000u128)
    );
    assert_eq!(abi::decode_call_uint(&calls[1].calldata, 2).unwrap(), debt);
}

#[tokio::test]
async fn liquidate_approval_precedes_primary_with_exact_amount() {
    let (orchestrator, ledger) = orchestrator();

    orchestrator.liquidate("wETH", TARGET, "500").await.unwrap();

    let calls = ledger.submitted_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].matches(abi::SIG_APPROVE));
    assert!(calls[1].matches(abi::SIG_LIQUIDATE));

    let debt = U256::from(500u64) * one_ether();
    assert_eq!(abi::decode_call_uint(&calls[0].calldata, 1).unwrap(), debt);
    assert_eq!(
        abi::decode_call_address(&calls[1].calldata, 1).unwrap(),
        Address::repeat_byte(0x22)
    );
    assert_eq!(abi::decode_call_uint(&calls[1].calldata, 2).unwrap(), debt);
}

#[tokio::test]
async fn liquidate_approval_revert_blocks_the_liquidation_call() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_outcome(abi::SIG_APPROVE, SimOutcome::Revert);

    let err = orchestrator
        .liquidate("wETH", TARGET, "500")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ApprovalFailed { .. }));
    for call in ledger.submitted_calls() {
        assert!(!call.matches(abi::SIG_LIQUIDATE));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// UNIT CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn deposit_of_two_and_a_half_converts_to_base_units() {
    let (orchestrator, ledger) = orchestrator();
    let expected = U256::from(2_500_000_000_000_000_000u128);

    orchestrator.deposit_collateral("wETH", "2.5").await.unwrap();

    let calls = ledger.submitted_calls();
    assert_eq!(abi::decode_call_uint(&calls[0].calldata, 1).unwrap(), expected);
    assert_eq!(abi::decode_call_uint(&calls[1].calldata, 1).unwrap(), expected);
}

#[tokio::test]
async fn token_reference_resolves_by_address_too() {
    let (orchestrator, ledger) = orchestrator();

    orchestrator
        .deposit_collateral("0xfff9976782d46cc05630d1f6ebab18b2324d6b14", "1")
        .await
        .unwrap();

    assert_eq!(ledger.call_count(), 2);
}

#[tokio::test]
async fn unknown_token_fails_before_any_ledger_interaction() {
    let (orchestrator, ledger) = orchestrator();

    let err = orchestrator.deposit_collateral("DOGE", "1").await.unwrap_err();
    assert_eq!(err, Error::UnknownToken("DOGE".into()));
    assert_eq!(ledger.call_count(), 0);
}

#[tokio::test]
async fn invalid_amount_fails_before_any_ledger_interaction() {
    let (orchestrator, ledger) = orchestrator();

    assert_eq!(
        orchestrator.mint("0").await.unwrap_err(),
        Error::ZeroAmount
    );
    assert!(matches!(
        orchestrator.mint("abc").await.unwrap_err(),
        Error::InvalidAmount { .. }
    ));
    assert_eq!(ledger.call_count(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURE SETTLEMENT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn mint_with_rejecting_signer_issues_no_further_steps() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_outcome(abi::SIG_MINT, SimOutcome::RejectAtSigner);

    let err = orchestrator.mint("100").await.unwrap_err();

    assert_eq!(err, Error::SignerRejected);
    assert_eq!(ledger.call_count(), 0);
}

#[tokio::test]
async fn reverted_redeem_reports_transaction_reverted() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_outcome(abi::SIG_REDEEM_COLLATERAL, SimOutcome::Revert);

    let err = orchestrator.redeem_collateral("wBTC", "1").await.unwrap_err();
    assert!(matches!(err, Error::TransactionReverted { .. }));
}

#[tokio::test]
async fn request_phase_reflects_the_terminal_settlement() {
    let (orchestrator, ledger) = orchestrator();
    let config = ProtocolConfig::sepolia();

    let mut ok = ActionRequest::deposit(&config, "wETH", "1").unwrap();
    orchestrator.execute(&mut ok).await.unwrap();
    assert_eq!(ok.phase(), RequestPhase::Settled(Settlement::Succeeded));

    ledger.set_outcome(abi::SIG_APPROVE, SimOutcome::Revert);
    let mut failed = ActionRequest::deposit(&config, "wETH", "1").unwrap();
    orchestrator.execute(&mut failed).await.unwrap_err();
    assert_eq!(failed.phase(), RequestPhase::Settled(Settlement::Failed));

    // settlement is terminal; the request cannot be driven again
    assert!(matches!(
        orchestrator.execute(&mut failed).await.unwrap_err(),
        Error::IllegalPhaseTransition { .. }
    ));
}

#[tokio::test]
async fn receipt_carries_both_transaction_hashes() {
    let (orchestrator, _ledger) = orchestrator();

    let with_approval = orchestrator.deposit_collateral("wETH", "1").await.unwrap();
    assert_eq!(with_approval.kind, ActionKind::Deposit);
    assert!(with_approval.approval_tx.is_some());

    let without_approval = orchestrator.mint("100").await.unwrap();
    assert_eq!(without_approval.kind, ActionKind::Mint);
    assert!(without_approval.approval_tx.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUERIES
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn balance_query_reports_ledger_values_verbatim() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_view(abi::SIG_BALANCE_COLLATERAL, U256::from(1_500_000_000_000_000_000u128));
    ledger.set_view(abi::SIG_MINTED, U256::from(250u64) * one_ether());
    ledger.set_view(abi::SIG_COLLATERAL_VALUE_USD, U256::from(4000u64) * one_ether());

    let snapshot = orchestrator.query_collateral_balances(ACTOR).await.unwrap();

    assert_eq!(snapshot.balances.len(), 2);
    assert_eq!(snapshot.balances[0].formatted(), "1.5");
    assert_eq!(snapshot.minted, U256::from(250u64) * one_ether());
    assert_eq!(snapshot.collateral_value_usd, U256::from(4000u64) * one_ether());
    // read-only: nothing was submitted
    assert_eq!(ledger.call_count(), 0);
}

#[tokio::test]
async fn health_factor_boundary_classification() {
    let (orchestrator, ledger) = orchestrator();

    // exactly 1.0 is still healthy
    ledger.set_view(abi::SIG_HEALTH_FACTOR, HealthFactor::SCALE);
    let hf = orchestrator.query_health_factor(ACTOR).await.unwrap();
    assert_eq!(hf.status(), HealthStatus::Healthy);

    // one base unit below the boundary is liquidatable
    ledger.set_view(abi::SIG_HEALTH_FACTOR, HealthFactor::SCALE - U256::from(1u8));
    let hf = orchestrator.query_health_factor(ACTOR).await.unwrap();
    assert_eq!(hf.status(), HealthStatus::Undercollateralized);
}

#[tokio::test]
async fn debt_free_account_reports_unbounded_health() {
    let (orchestrator, ledger) = orchestrator();
    ledger.set_view(abi::SIG_HEALTH_FACTOR, U256::MAX);

    let hf = orchestrator.query_health_factor(ACTOR).await.unwrap();
    assert!(hf.is_unbounded());
    assert_eq!(hf.status(), HealthStatus::Healthy);
    assert_eq!(hf.to_string(), "∞");
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET BINDING
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn connect_fails_clearly_without_wallet_accounts() {
    let ledger: Arc<dyn Ledger> = Arc::new(SimulatedLedger::with_accounts(vec![]));
    let err = Orchestrator::connect(ProtocolConfig::sepolia(), ledger, None)
        .await
        .unwrap_err();
    assert_eq!(err, Error::NoWalletAccount);
}

#[tokio::test]
async fn connect_binds_the_preferred_account() {
    let first = Address::repeat_byte(0x11);
    let second = Address::repeat_byte(0x22);
    let ledger: Arc<dyn Ledger> = Arc::new(SimulatedLedger::with_accounts(vec![first, second]));

    let orchestrator = Orchestrator::connect(ProtocolConfig::sepolia(), ledger, Some(second))
        .await
        .unwrap();
    assert_eq!(orchestrator.account(), second);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FULL SCENARIO
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn deposit_then_mint_then_query_position() {
    let (orchestrator, ledger) = orchestrator();

    orchestrator.deposit_collateral("wETH", "2").await.unwrap();
    orchestrator.mint("1000").await.unwrap();

    let calls = ledger.submitted_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].matches(abi::SIG_APPROVE));
    assert!(calls[1].matches(abi::SIG_DEPOSIT_COLLATERAL));
    assert!(calls[2].matches(abi::SIG_MINT));

    ledger.set_view(abi::SIG_BALANCE_COLLATERAL, U256::from(2u64) * one_ether());
    ledger.set_view(abi::SIG_MINTED, U256::from(1000u64) * one_ether());
    ledger.set_view(abi::SIG_HEALTH_FACTOR, U256::from(2u64) * one_ether());

    let snapshot = orchestrator.query_collateral_balances(ACTOR).await.unwrap();
    assert_eq!(snapshot.minted, U256::from(1000u64) * one_ether());

    let health = orchestrator.query_health_factor(ACTOR).await.unwrap();
    assert_eq!(health.status(), HealthStatus::Healthy);
    assert_eq!(health.to_string(), "2");
}
