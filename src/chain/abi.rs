//! ABI encoding for the fixed contract method surface.
//!
//! The engine and token contracts are reached through a small, fixed set of
//! methods. Calls are encoded as a 4-byte keccak selector followed by 32-byte
//! words; every argument in this surface is either an address or a uint256,
//! so no dynamic-type encoding is needed.

use alloy_primitives::{keccak256, Address, U256};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CANONICAL SIGNATURES
// ═══════════════════════════════════════════════════════════════════════════════

/// ERC-20 allowance grant on the token contracts
pub const SIG_APPROVE: &str = "approve(address,uint256)";

/// Deposit collateral into the engine
pub const SIG_DEPOSIT_COLLATERAL: &str = "depositCollateral(address,uint256)";

/// Redeem collateral held by the engine
pub const SIG_REDEEM_COLLATERAL: &str = "redeemCollateral(address,uint256)";

/// Redeem collateral and burn stablecoin debt in one call
pub const SIG_REDEEM_AND_BURN: &str = "redeemCollateralAndGiveBackUSDD(address,uint256,uint256)";

/// Mint stablecoin against deposited collateral
pub const SIG_MINT: &str = "mintUSDD(uint256)";

/// Liquidate an undercollateralized position
pub const SIG_LIQUIDATE: &str = "liquidate(address,address,uint256)";

/// Collateral balance of a user for one token
pub const SIG_BALANCE_COLLATERAL: &str = "getBalanceCollateralInTokens(address,address)";

/// Stablecoin debt minted by a user
pub const SIG_MINTED: &str = "getSUSDDMinted(address)";

/// Aggregate USD value of a user's collateral
pub const SIG_COLLATERAL_VALUE_USD: &str = "getCollateralValueinUsd(address)";

/// Ledger-computed health factor of a user
pub const SIG_HEALTH_FACTOR: &str = "getHealthFactor(address)";

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODING
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte-word argument to a contract call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallArg {
    /// 20-byte address, left-padded to a word
    Address(Address),
    /// 256-bit unsigned integer, big-endian
    Uint(U256),
}

/// 4-byte function selector for a canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a call: selector followed by one 32-byte word per argument
pub fn encode_call(signature: &str, args: &[CallArg]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        match arg {
            CallArg::Address(addr) => {
                data.extend_from_slice(&[0u8; 12]);
                data.extend_from_slice(addr.as_slice());
            }
            CallArg::Uint(value) => {
                data.extend_from_slice(&value.to_be_bytes::<32>());
            }
        }
    }
    data
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLDATA BUILDERS
// ═══════════════════════════════════════════════════════════════════════════════

/// approve(spender, amount) on a token contract
pub fn approve(spender: Address, amount: U256) -> Vec<u8> {
    encode_call(SIG_APPROVE, &[CallArg::Address(spender), CallArg::Uint(amount)])
}

/// depositCollateral(token, amount) on the engine
pub fn deposit_collateral(token: Address, amount: U256) -> Vec<u8> {
    encode_call(
        SIG_DEPOSIT_COLLATERAL,
        &[CallArg::Address(token), CallArg::Uint(amount)],
    )
}

/// redeemCollateral(token, amount) on the engine
pub fn redeem_collateral(token: Address, amount: U256) -> Vec<u8> {
    encode_call(
        SIG_REDEEM_COLLATERAL,
        &[CallArg::Address(token), CallArg::Uint(amount)],
    )
}

/// redeemCollateralAndGiveBackUSDD(token, collateral, debt) on the engine
pub fn redeem_collateral_and_burn(token: Address, collateral: U256, debt: U256) -> Vec<u8> {
    encode_call(
        SIG_REDEEM_AND_BURN,
        &[
            CallArg::Address(token),
            CallArg::Uint(collateral),
            CallArg::Uint(debt),
        ],
    )
}

/// mintUSDD(amount) on the engine
pub fn mint(amount: U256) -> Vec<u8> {
    encode_call(SIG_MINT, &[CallArg::Uint(amount)])
}

/// liquidate(token, user, debtToCover) on the engine
pub fn liquidate(token: Address, user: Address, debt_to_cover: U256) -> Vec<u8> {
    encode_call(
        SIG_LIQUIDATE,
        &[
            CallArg::Address(token),
            CallArg::Address(user),
            CallArg::Uint(debt_to_cover),
        ],
    )
}

/// getBalanceCollateralInTokens(user, token) on the engine
pub fn balance_collateral_in_tokens(user: Address, token: Address) -> Vec<u8> {
    encode_call(
        SIG_BALANCE_COLLATERAL,
        &[CallArg::Address(user), CallArg::Address(token)],
    )
}

/// getSUSDDMinted(user) on the engine
pub fn minted(user: Address) -> Vec<u8> {
    encode_call(SIG_MINTED, &[CallArg::Address(user)])
}

/// getCollateralValueinUsd(user) on the engine
pub fn collateral_value_usd(user: Address) -> Vec<u8> {
    encode_call(SIG_COLLATERAL_VALUE_USD, &[CallArg::Address(user)])
}

/// getHealthFactor(user) on the engine
pub fn health_factor(user: Address) -> Vec<u8> {
    encode_call(SIG_HEALTH_FACTOR, &[CallArg::Address(user)])
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Decode a single uint256 return word
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    if data.len() < 32 {
        return Err(Error::Network(format!(
            "return data too short: {} bytes, expected 32",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..32]))
}

/// Read the uint256 argument at `index` out of encoded calldata
pub fn decode_call_uint(calldata: &[u8], index: usize) -> Result<U256> {
    let start = 4 + 32 * index;
    let end = start + 32;
    if calldata.len() < end {
        return Err(Error::Internal(format!(
            "calldata has no word at index {}",
            index
        )));
    }
    Ok(U256::from_be_slice(&calldata[start..end]))
}

/// Read the address argument at `index` out of encoded calldata
pub fn decode_call_address(calldata: &[u8], index: usize) -> Result<Address> {
    let start = 4 + 32 * index;
    let end = start + 32;
    if calldata.len() < end {
        return Err(Error::Internal(format!(
            "calldata has no word at index {}",
            index
        )));
    }
    Ok(Address::from_slice(&calldata[start + 12..end]))
}
