//! Chain-facing types and the two capability surfaces the claim flow depends on:
//! a read-only [`ChainReader`] for the day counters and a [`WalletProvider`] for
//! account discovery, network checks and transaction submission.

use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    future::Future,
    str::FromStr,
};

pub mod abi;
pub mod rpc;

/// Base mainnet.
pub const BASE_CHAIN_ID: ChainId = ChainId(8453);
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x99952E86dD355D77fc19EBc167ac93C4514BA7CB";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex::<20>(s).map(Self)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for TxHash {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed_hex::<32>(s).map(Self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// EIP-155 chain id. Wallets report it as a `0x`-prefixed hex quantity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseHexError> {
        let digits = s
            .trim()
            .strip_prefix("0x")
            .or_else(|| s.trim().strip_prefix("0X"))
            .ok_or_else(|| ParseHexError::new(s, "missing 0x prefix"))?;
        u64::from_str_radix(digits, 16)
            .map(ChainId)
            .map_err(|e| ParseHexError::new(s, e.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.to_hex())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid hex value {input:?}: {reason}")]
pub struct ParseHexError {
    input: String,
    reason: String,
}

impl ParseHexError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

fn parse_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|e| ParseHexError::new(s, e.to_string()))?;
    Ok(out)
}

/// Errors from the read-only chain client.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Rpc(#[from] rpc::RpcError),
    #[error("malformed contract response: {0}")]
    Decode(#[from] abi::AbiError),
}

/// Read-only access to the claim contract's view functions.
pub trait ChainReader {
    /// `getCurrentDay()`
    fn current_day(&self) -> impl Future<Output = Result<u64, ChainError>> + Send;

    /// `lastClaimDay(address)`
    fn last_claim_day(
        &self,
        owner: Address,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send;
}

/// A transaction the wallet is asked to sign and send. The claim call never carries
/// value, so there is no value field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Failure reported by the wallet provider, in EIP-1193 terms.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("wallet error{}: {message}", .code.map(|c| format!(" {c}")).unwrap_or_default())]
pub struct WalletError {
    pub code: Option<i64>,
    pub message: String,
}

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;
/// JSON-RPC execution error, used by nodes for reverted calls.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WalletFailure {
    UserRejected,
    Reverted,
    Other,
}

impl WalletError {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn classify(&self) -> WalletFailure {
        if self.code == Some(EXECUTION_REVERTED_CODE)
            || self.message.to_lowercase().contains("reverted")
        {
            WalletFailure::Reverted
        } else if self.code == Some(USER_REJECTED_CODE) {
            WalletFailure::UserRejected
        } else {
            WalletFailure::Other
        }
    }
}

impl From<rpc::RpcError> for WalletError {
    fn from(err: rpc::RpcError) -> Self {
        match err {
            rpc::RpcError::Rpc { code, message, .. } => WalletError::new(Some(code), message),
            other => WalletError::new(None, other.to_string()),
        }
    }
}

/// The host wallet. Only this capability surface is used, never a concrete transport.
pub trait WalletProvider {
    fn request_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<Address>, WalletError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<ChainId, WalletError>> + Send;

    fn switch_chain(
        &self,
        chain_id: ChainId,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn send_transaction(
        &self,
        tx: TxRequest,
    ) -> impl Future<Output = Result<TxHash, WalletError>> + Send;
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn address__round_trips_mixed_case_input_to_lowercase() {
        // when
        let address: Address = DEFAULT_CONTRACT_ADDRESS.parse().unwrap();

        // then
        assert_eq!(
            address.to_string(),
            DEFAULT_CONTRACT_ADDRESS.to_lowercase()
        );
    }

    #[test]
    fn address__rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
    }

    #[test]
    fn chain_id__parses_wallet_hex() {
        assert_eq!(ChainId::from_hex("0x2105").unwrap(), BASE_CHAIN_ID);
        assert_eq!(BASE_CHAIN_ID.to_hex(), "0x2105");
        assert!(ChainId::from_hex("8453").is_err());
    }

    #[test]
    fn classify__recognizes_rejection_and_revert() {
        assert_eq!(
            WalletError::new(Some(4001), "User rejected the request.").classify(),
            WalletFailure::UserRejected
        );
        assert_eq!(
            WalletError::new(Some(3), "execution error").classify(),
            WalletFailure::Reverted
        );
        assert_eq!(
            WalletError::new(Some(-32000), "execution reverted: already claimed").classify(),
            WalletFailure::Reverted
        );
        assert_eq!(
            WalletError::new(None, "Transaction Reverted").classify(),
            WalletFailure::Reverted
        );
        assert_eq!(
            WalletError::new(Some(-32603), "internal error").classify(),
            WalletFailure::Other
        );
    }
}
