//! JSON-RPC transport. [`RpcClient`] speaks plain JSON-RPC 2.0 over HTTP;
//! [`ContractReader`] and [`RpcWallet`] put the chain reader and the EIP-1193 wallet
//! surface on top of it.

use crate::chain::{
    Address,
    ChainError,
    ChainId,
    ChainReader,
    TxHash,
    TxRequest,
    WalletError,
    WalletProvider,
    abi,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use serde_json::{
    Value,
    json,
};
use std::{
    sync::{
        Arc,
        atomic::{
            AtomicU64,
            Ordering,
        },
    },
    time::Duration,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("rpc transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc endpoint responded with {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone, Debug)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

#[derive(Serialize)]
struct RequestDto<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct ResponseDto {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<ErrorDto>,
}

#[derive(Deserialize)]
struct ErrorDto {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RequestDto {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        tracing::debug!(%method, id, url = %self.url, "rpc request");
        let res = self.http.post(&self.url).json(&body).send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let dto: ResponseDto = serde_json::from_slice(&bytes)
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        if let Some(err) = dto.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }
        // `null` is a valid result, e.g. for wallet_switchEthereumChain
        serde_json::from_value(dto.result)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }
}

/// Reads the claim contract's view functions with `eth_call` against `latest`.
#[derive(Clone, Debug)]
pub struct ContractReader {
    rpc: RpcClient,
    contract: Address,
}

impl ContractReader {
    pub fn new(rpc: RpcClient, contract: Address) -> Self {
        Self { rpc, contract }
    }

    async fn call_u64(&self, data: Vec<u8>) -> Result<u64, ChainError> {
        let call = json!({
            "to": self.contract.to_string(),
            "data": abi::to_hex_data(&data),
        });
        let raw: String = self.rpc.request("eth_call", (call, "latest")).await?;
        let bytes = abi::from_hex_data(&raw)?;
        Ok(abi::decode_u64(&bytes)?)
    }
}

impl ChainReader for ContractReader {
    async fn current_day(&self) -> Result<u64, ChainError> {
        self.call_u64(abi::encode_get_current_day()).await
    }

    async fn last_claim_day(&self, owner: Address) -> Result<u64, ChainError> {
        self.call_u64(abi::encode_last_claim_day(&owner)).await
    }
}

/// Wallet provider backed by a JSON-RPC endpoint that manages accounts itself, such as
/// a local wallet bridge or a development node with unlocked accounts.
#[derive(Clone, Debug)]
pub struct RpcWallet {
    rpc: RpcClient,
}

impl RpcWallet {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

fn parse_addresses(raw: Vec<String>) -> Result<Vec<Address>, WalletError> {
    raw.iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| WalletError::new(None, e.to_string()))
        })
        .collect()
}

impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        match self
            .rpc
            .request::<_, Vec<String>>("eth_requestAccounts", json!([]))
            .await
        {
            Ok(raw) => parse_addresses(raw),
            Err(RpcError::Rpc { code, .. }) if code == METHOD_NOT_FOUND => {
                let raw: Vec<String> = self.rpc.request("eth_accounts", json!([])).await?;
                parse_addresses(raw)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        let raw: String = self.rpc.request("eth_chainId", json!([])).await?;
        ChainId::from_hex(&raw).map_err(|e| WalletError::new(None, e.to_string()))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        let _: Value = self
            .rpc
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id.to_hex() }]),
            )
            .await?;
        Ok(())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxHash, WalletError> {
        let params = json!([{
            "from": tx.from.to_string(),
            "to": tx.to.to_string(),
            "data": abi::to_hex_data(&tx.data),
        }]);
        let raw: String = self.rpc.request("eth_sendTransaction", params).await?;
        raw.parse::<TxHash>()
            .map_err(|e| WalletError::new(None, e.to_string()))
    }
}
