//! Core modules for the USDD client.
//!
//! This module contains the fundamental building blocks:
//! - Deployment configuration (engine, stablecoin, supported tokens)
//! - Collateral token metadata and reference resolution
//! - Amount conversion and health-factor classification

pub mod amount;
pub mod config;
pub mod token;

pub use amount::*;
pub use config::*;
pub use token::*;
