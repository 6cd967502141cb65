//! On-chain access layer.
//!
//! This module contains everything that touches the network:
//! - ABI encoding for the fixed engine/token method surface
//! - JSON-RPC transport against a wallet-backed endpoint
//! - The `Ledger` trait seam with live and simulated implementations
//! - Wallet session (account discovery and binding)

pub mod abi;
pub mod ledger;
pub mod provider;
pub mod sim;
pub mod wallet;

pub use ledger::*;
pub use provider::*;
pub use sim::*;
pub use wallet::*;
