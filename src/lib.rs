//! # USDD Client
//!
//! Library and command-line client for the USDD collateral-backed
//! stablecoin. All protocol logic lives in on-chain contracts; this crate
//! sequences the transactions that reach them: collect input, submit calls
//! through a wallet-backed signer, wait for confirmation, render results.
//!
//! ## Architecture
//!
//! - **Core**: deployment configuration, token registry, amount conversion,
//!   health-factor classification
//! - **Chain**: ABI encoding, the `Ledger` trait seam, the JSON-RPC
//!   provider, and a simulated ledger for deterministic tests
//! - **Orchestrator**: approve-then-act sequencing for every protocol
//!   action, with an explicit per-request lifecycle
//! - **CLI**: presentation layer over the orchestrator
//!
//! ## Example
//!
//! ```rust,ignore
//! use usdd::prelude::*;
//!
//! let ledger: Arc<dyn Ledger> = Arc::new(RpcProvider::with_url("http://127.0.0.1:8545")?);
//! let orchestrator = Orchestrator::connect(ProtocolConfig::sepolia(), ledger, None).await?;
//!
//! // Approve the engine and deposit 2.5 wETH of collateral
//! let receipt = orchestrator.deposit_collateral("wETH", "2.5").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod chain;
pub mod cli;
pub mod core;
pub mod error;
pub mod orchestrator;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{
        InclusionStatus, Ledger, RpcConfig, RpcProvider, SimOutcome, SimulatedLedger, TxHash,
        WalletSession,
    };
    pub use crate::core::{
        format_units, parse_address, parse_units, CollateralToken, HealthFactor, HealthStatus,
        ProtocolConfig, STABLECOIN_DECIMALS,
    };
    pub use crate::error::{Error, Result};
    pub use crate::orchestrator::{
        ActionKind, ActionReceipt, ActionRequest, CollateralBalances, Orchestrator, RequestPhase,
        Settlement, TokenBalance,
    };
}

/// Client version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stablecoin this client targets
pub const STABLECOIN_NAME: &str = "USDD";
