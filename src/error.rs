//! Error types for the USDD client.
//!
//! This module defines all error types used throughout the client,
//! providing clear and actionable error messages.

use thiserror::Error;

/// Result type alias for USDD client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the USDD client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Wallet Errors
    // ═══════════════════════════════════════════════════════════════════

    /// No account available from the wallet-backed endpoint
    #[error("No wallet account available from the signing endpoint")]
    NoWalletAccount,

    /// The user declined the signer's prompt
    #[error("Transaction rejected at the signer")]
    SignerRejected,

    // ═══════════════════════════════════════════════════════════════════
    // Settlement Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Allowance transaction did not reach success status
    #[error("Approval transaction {tx_hash} did not succeed; primary call not submitted")]
    ApprovalFailed {
        /// Hash of the failed approval transaction
        tx_hash: String,
    },

    /// Primary call was included but reverted
    #[error("Transaction {tx_hash} reverted on chain")]
    TransactionReverted {
        /// Hash of the reverted transaction
        tx_hash: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Network Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Submission or inclusion-wait failed to communicate
    #[error("Network error: {0}")]
    Network(String),

    /// The endpoint answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code reported by the endpoint
        code: i64,
        /// Error message reported by the endpoint
        message: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Token reference does not resolve against the supported-token list
    #[error("Unknown collateral token: {0}")]
    UnknownToken(String),

    /// Amount could not be parsed or violates precision limits
    #[error("Invalid amount {value:?}: {reason}")]
    InvalidAmount {
        /// The amount as entered
        value: String,
        /// Reason the amount was rejected
        reason: String,
    },

    /// Amount is zero
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Address could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // ═══════════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Request lifecycle moved through an illegal transition
    #[error("Illegal request phase transition: {from} -> {to}")]
    IllegalPhaseTransition {
        /// Phase the request was in
        from: String,
        /// Phase the transition attempted to reach
        to: String,
    },
}

impl Error {
    /// Returns true if resubmitting the same request could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Rpc { .. } | Error::SignerRejected
        )
    }

    /// Returns true if this error is a terminal settlement of a submitted
    /// request, as opposed to a local failure before anything was sent
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            Error::ApprovalFailed { .. } | Error::TransactionReverted { .. } | Error::SignerRejected
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Wallet errors: 1xxx
            Error::NoWalletAccount => 1001,
            Error::SignerRejected => 1002,

            // Settlement errors: 2xxx
            Error::ApprovalFailed { .. } => 2001,
            Error::TransactionReverted { .. } => 2002,

            // Network errors: 3xxx
            Error::Network(_) => 3001,
            Error::Rpc { .. } => 3002,

            // Validation errors: 4xxx
            Error::UnknownToken(_) => 4001,
            Error::InvalidAmount { .. } => 4002,
            Error::ZeroAmount => 4003,
            Error::InvalidAddress(_) => 4004,

            // Configuration errors: 5xxx
            Error::Config(_) => 5001,
            Error::Io(_) => 5002,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
            Error::IllegalPhaseTransition { .. } => 9002,
        }
    }
}
