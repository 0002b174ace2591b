//! Application configuration.
//!
//! Defaults are compiled in. A JSON file overrides them field by field, then
//! `IMGBB_API_KEY` and `CASTINSPO_RPC_URL` override the file.

use crate::{
    chain::{
        Address,
        BASE_CHAIN_ID,
        ChainId,
        DEFAULT_CONTRACT_ADDRESS,
    },
    claim::{
        ClaimPolicy,
        SwitchFailurePolicy,
        UnlockPolicy,
    },
    render::RenderConfig,
    share::{
        compose,
        imgbb,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use url::Url;

pub const IMGBB_KEY_ENV: &str = "IMGBB_API_KEY";
pub const RPC_URL_ENV: &str = "CASTINSPO_RPC_URL";
pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub share: ShareConfig,
    pub claim: ClaimConfig,
    pub render: RenderConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub contract: Address,
    /// Read endpoint for `eth_call`.
    pub rpc_url: String,
    /// Endpoint that holds the accounts and signs. No wallet when unset.
    pub wallet_rpc_url: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: BASE_CHAIN_ID.0,
            contract: default_contract(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_rpc_url: None,
        }
    }
}

fn default_contract() -> Address {
    DEFAULT_CONTRACT_ADDRESS
        .parse()
        .unwrap_or(Address::new([0; 20]))
}

impl ChainConfig {
    pub fn target_chain(&self) -> ChainId {
        ChainId(self.chain_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub app_url: String,
    pub compose_url: String,
    pub caption: String,
    pub reward_caption: String,
    pub imgbb_endpoint: String,
    pub imgbb_api_key: Option<String>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            app_url: compose::DEFAULT_APP_URL.to_string(),
            compose_url: compose::DEFAULT_COMPOSE_URL.to_string(),
            caption: compose::DEFAULT_SHARE_CAPTION.to_string(),
            reward_caption: compose::DEFAULT_REWARD_CAPTION.to_string(),
            imgbb_endpoint: imgbb::DEFAULT_ENDPOINT.to_string(),
            imgbb_api_key: None,
        }
    }
}

impl ShareConfig {
    pub fn app_url(&self) -> Result<Url> {
        Url::parse(&self.app_url).wrap_err_with(|| format!("invalid app url {:?}", self.app_url))
    }

    pub fn compose_url(&self) -> Result<Url> {
        Url::parse(&self.compose_url)
            .wrap_err_with(|| format!("invalid compose url {:?}", self.compose_url))
    }

    pub fn imgbb_endpoint(&self) -> Result<Url> {
        Url::parse(&self.imgbb_endpoint)
            .wrap_err_with(|| format!("invalid imgbb endpoint {:?}", self.imgbb_endpoint))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    pub reconcile_delay_ms: u64,
    pub on_switch_failure: SwitchFailurePolicy,
    pub unlock: UnlockPolicy,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        let policy = ClaimPolicy::default();
        Self {
            reconcile_delay_ms: policy.reconcile_delay.as_millis() as u64,
            on_switch_failure: policy.switch_failure,
            unlock: policy.unlock,
        }
    }
}

impl ClaimConfig {
    pub fn policy(&self) -> ClaimPolicy {
        ClaimPolicy {
            switch_failure: self.on_switch_failure,
            unlock: self.unlock,
            reconcile_delay: Duration::from_millis(self.reconcile_delay_ms),
        }
    }
}

impl AppConfig {
    /// Defaults, then the file at `path` if given, then the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(raw) => Self::from_file(&expand_path(raw))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&raw).wrap_err_with(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies environment overrides read through `lookup`. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(key) = present(IMGBB_KEY_ENV) {
            self.share.imgbb_api_key = Some(key);
        }
        if let Some(url) = present(RPC_URL_ENV) {
            self.chain.rpc_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.share.app_url()?;
        self.share.compose_url()?;
        self.share.imgbb_endpoint()?;
        Url::parse(&self.chain.rpc_url)
            .wrap_err_with(|| format!("invalid rpc url {:?}", self.chain.rpc_url))?;
        self.render
            .validate()
            .map_err(|reason| eyre!("invalid render config: {reason}"))?;
        Ok(())
    }
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default__targets_base_and_the_claim_contract() {
        // when
        let config = AppConfig::default();

        // then
        assert_eq!(config.chain.target_chain(), BASE_CHAIN_ID);
        assert_eq!(
            config.chain.contract.to_string(),
            DEFAULT_CONTRACT_ADDRESS.to_lowercase()
        );
        assert_eq!(config.claim.policy(), ClaimPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_json__overrides_only_given_fields() {
        // given
        let raw = r#"{
            "claim": { "on_switch_failure": "proceed", "unlock": "on_delivery" },
            "render": { "min_font_px": 20 }
        }"#;

        // when
        let config = AppConfig::from_json(raw).unwrap();

        // then
        assert_eq!(config.claim.on_switch_failure, SwitchFailurePolicy::Proceed);
        assert_eq!(config.claim.unlock, UnlockPolicy::OnDelivery);
        assert_eq!(config.claim.reconcile_delay_ms, 5_000);
        assert_eq!(config.render.min_font_px, 20);
        assert_eq!(config.render.initial_font_px, 60);
        assert_eq!(config.share, ShareConfig::default());
    }

    #[test]
    fn apply_env__overrides_key_and_rpc_url() {
        // given
        let env: HashMap<&str, &str> = HashMap::from([
            (IMGBB_KEY_ENV, "k3y"),
            (RPC_URL_ENV, "http://localhost:8545"),
        ]);
        let mut config = AppConfig::default();

        // when
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        // then
        assert_eq!(config.share.imgbb_api_key.as_deref(), Some("k3y"));
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn apply_env__ignores_blank_values() {
        // given
        let mut config = AppConfig::default();

        // when
        config.apply_env(|_| Some("   ".to_string()));

        // then
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn validate__rejects_bad_urls() {
        // given
        let mut config = AppConfig::default();
        config.share.compose_url = "not a url".to_string();

        // then
        assert!(config.validate().is_err());
    }
}
