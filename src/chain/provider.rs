//! JSON-RPC transport against a wallet-backed endpoint.
//!
//! The endpoint holds the signing keys: `eth_sendTransaction` asks it to
//! sign and broadcast, which may block on an interactive prompt. This client
//! never signs anything itself. Receipt polling has no local timeout; an
//! inclusion wait runs until the endpoint answers or errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::chain::ledger::{InclusionStatus, Ledger, TxHash};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for the JSON-RPC transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Endpoint URL
    pub url: String,
    /// Per-request timeout in milliseconds (transport level only)
    pub timeout_ms: u64,
    /// Delay between receipt polls in milliseconds
    pub poll_interval_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            timeout_ms: 120_000,
            poll_interval_ms: 1_000,
            user_agent: "usdd-client/0.1".to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// The subset of the transaction receipt this client reads
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionReceipt {
    /// Hash of the transaction the receipt belongs to
    #[serde(rename = "transactionHash")]
    pub transaction_hash: TxHash,
    /// Execution status: 0x1 success, 0x0 reverted
    pub status: String,
    /// Block the transaction was included in
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
}

impl TransactionReceipt {
    /// Whether the ledger executed the transaction successfully
    pub fn succeeded(&self) -> bool {
        u64::from_str_radix(self.status.trim_start_matches("0x"), 16)
            .map(|v| v == 1)
            .unwrap_or(false)
    }
}

/// Map a JSON-RPC error object to a client error.
///
/// EIP-1193 user-rejected-request (4001) and EIP-1474 transaction-rejected
/// (-32003) both mean the signer declined the prompt.
fn map_rpc_error(code: i64, message: &str) -> Error {
    match code {
        4001 | -32003 => Error::SignerRejected,
        _ => Error::Rpc {
            code,
            message: message.to_string(),
        },
    }
}

fn parse_hash(value: &Value) -> Result<TxHash> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::Network(format!("transaction hash is not a string: {}", value)))?;
    text.parse::<TxHash>()
        .map_err(|_| Error::Network(format!("malformed transaction hash: {}", text)))
}

fn parse_hex_data(value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::Network(format!("call result is not a string: {}", value)))?;
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| Error::Network(format!("malformed call result {}: {}", text, e)))
}

fn parse_address_value(value: &Value) -> Result<Address> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::Network(format!("account entry is not a string: {}", value)))?;
    text.parse::<Address>()
        .map_err(|_| Error::Network(format!("malformed account address: {}", text)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDER
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON-RPC client bound to one wallet-backed endpoint
pub struct RpcProvider {
    client: Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl RpcProvider {
    /// Create a provider from a transport configuration
    pub fn new(config: RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a provider for a URL with default transport settings
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        Self::new(RpcConfig {
            url: url.into(),
            ..RpcConfig::default()
        })
    }

    /// Endpoint URL this provider talks to
    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!("RPC request {} (id {})", method, id);

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} request failed: {}", method, e)))?;

        let payload: RpcResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("failed to parse {} response: {}", method, e)))?;

        if let Some(err) = payload.error {
            debug!("RPC error from {}: code {} ({})", method, err.code, err.message);
            return Err(map_rpc_error(err.code, &err.message));
        }
        payload
            .result
            .ok_or_else(|| Error::Network(format!("{} returned neither result nor error", method)))
    }

    /// Fetch the receipt for a transaction; None until it is mined
    pub async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map_err(|e| Error::Network(format!("malformed transaction receipt: {}", e)))
    }

    /// Ask the endpoint for signable accounts, prompting where supported.
    ///
    /// Prompting endpoints implement `eth_requestAccounts`; plain nodes
    /// answer method-not-found, in which case `eth_accounts` is used.
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        let result = match self.request("eth_requestAccounts", json!([])).await {
            Ok(value) => value,
            Err(Error::Rpc { code: -32601, .. }) => {
                self.request("eth_accounts", json!([])).await?
            }
            Err(e) => return Err(e),
        };
        let entries = result
            .as_array()
            .ok_or_else(|| Error::Network(format!("account list is not an array: {}", result)))?;
        entries.iter().map(parse_address_value).collect()
    }

    /// Chain ID the endpoint is connected to
    pub async fn chain_id(&self) -> Result<u64> {
        let result = self.request("eth_chainId", json!([])).await?;
        let text = result
            .as_str()
            .ok_or_else(|| Error::Network(format!("chain id is not a string: {}", result)))?;
        u64::from_str_radix(text.trim_start_matches("0x"), 16)
            .map_err(|_| Error::Network(format!("malformed chain id: {}", text)))
    }
}

#[async_trait]
impl Ledger for RpcProvider {
    async fn submit(&self, from: Address, to: Address, calldata: Vec<u8>) -> Result<TxHash> {
        let params = json!([{
            "from": from,
            "to": to,
            "data": format!("0x{}", hex::encode(&calldata)),
        }]);
        let result = self.request("eth_sendTransaction", params).await?;
        let tx_hash = parse_hash(&result)?;
        debug!("Transaction {} submitted to {}", tx_hash, to);
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionStatus> {
        debug!("Waiting for inclusion of {}", tx_hash);
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                let status = if receipt.succeeded() {
                    InclusionStatus::Succeeded
                } else {
                    InclusionStatus::Reverted
                };
                debug!("Transaction {} included: {:?}", tx_hash, status);
                return Ok(status);
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Vec<u8>> {
        let params = json!([
            { "to": to, "data": format!("0x{}", hex::encode(&calldata)) },
            "latest",
        ]);
        let result = self.request("eth_call", params).await?;
        parse_hex_data(&result)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.request_accounts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_config_default() {
        let config = RpcConfig::default();
        assert_eq!(config.url, "http://127.0.0.1:8545");
        assert_eq!(config.poll_interval_ms, 1_000);
    }

    #[test]
    fn test_map_rpc_error_signer_rejection() {
        assert_eq!(map_rpc_error(4001, "User rejected the request"), Error::SignerRejected);
        assert_eq!(map_rpc_error(-32003, "Transaction rejected"), Error::SignerRejected);
    }

    #[test]
    fn test_map_rpc_error_other_codes() {
        let err = map_rpc_error(-32000, "insufficient funds");
        assert_eq!(
            err,
            Error::Rpc {
                code: -32000,
                message: "insufficient funds".into()
            }
        );
    }

    #[test]
    fn test_receipt_status_parsing() {
        let receipt = |status: &str| TransactionReceipt {
            transaction_hash: TxHash::ZERO,
            status: status.to_string(),
            block_number: None,
        };
        assert!(receipt("0x1").succeeded());
        assert!(receipt("0x01").succeeded());
        assert!(!receipt("0x0").succeeded());
        assert!(!receipt("bogus").succeeded());
    }

    #[test]
    fn test_parse_hash() {
        let good = json!("0x000000000000000000000000000000000000000000000000000000000000002a");
        assert!(parse_hash(&good).is_ok());
        assert!(parse_hash(&json!("0x1234")).is_err());
        assert!(parse_hash(&json!(42)).is_err());
    }

    #[test]
    fn test_parse_hex_data() {
        assert_eq!(parse_hex_data(&json!("0x")).unwrap(), Vec::<u8>::new());
        assert_eq!(parse_hex_data(&json!("0x2a")).unwrap(), vec![0x2a]);
        assert!(parse_hex_data(&json!("0xzz")).is_err());
        assert!(parse_hex_data(&json!(null)).is_err());
    }
}
