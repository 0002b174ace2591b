//! In-memory stand-ins for the chain, the wallet and the share surfaces.

use crate::{
    chain::{
        Address,
        BASE_CHAIN_ID,
        ChainError,
        ChainId,
        ChainReader,
        TxHash,
        TxRequest,
        WalletError,
        WalletProvider,
        rpc::RpcError,
    },
    render::RenderedImage,
    share::{
        HostActions,
        ImageHost,
        LinkOpener,
        NativeShare,
        ShareError,
    },
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};
use url::Url;

#[derive(Default)]
struct ChainInner {
    current_day: u64,
    last_claim_days: HashMap<Address, u64>,
    unreachable: bool,
    reads: usize,
}

/// A claim contract whose day counters are set by the test.
#[derive(Clone, Default)]
pub struct FakeChain {
    inner: Arc<Mutex<ChainInner>>,
}

impl FakeChain {
    pub fn new(current_day: u64) -> Self {
        let chain = Self::default();
        chain.set_current_day(current_day);
        chain
    }

    pub fn set_current_day(&self, day: u64) {
        self.inner.lock().unwrap().current_day = day;
    }

    pub fn set_last_claim_day(&self, owner: Address, day: u64) {
        self.inner.lock().unwrap().last_claim_days.insert(owner, day);
    }

    /// Records a claim for `owner` on the current day.
    pub fn record_claim(&self, owner: Address) {
        let mut inner = self.inner.lock().unwrap();
        let day = inner.current_day;
        inner.last_claim_days.insert(owner, day);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unwrap().unreachable = unreachable;
    }

    /// Number of view calls served so far.
    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    fn read(&self, f: impl FnOnce(&ChainInner) -> u64) -> Result<u64, ChainError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unreachable {
            return Err(ChainError::Rpc(RpcError::InvalidResponse(
                "fake chain unreachable".to_string(),
            )));
        }
        inner.reads += 1;
        Ok(f(&inner))
    }
}

impl ChainReader for FakeChain {
    async fn current_day(&self) -> Result<u64, ChainError> {
        self.read(|inner| inner.current_day)
    }

    async fn last_claim_day(&self, owner: Address) -> Result<u64, ChainError> {
        self.read(|inner| inner.last_claim_days.get(&owner).copied().unwrap_or(0))
    }
}

struct WalletInner {
    accounts: Vec<Address>,
    chain_id: ChainId,
    switch_error: Option<WalletError>,
    send_error: Option<WalletError>,
    sent: Vec<TxRequest>,
    switch_requests: Vec<ChainId>,
    lands_on: Option<FakeChain>,
}

impl Default for WalletInner {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            chain_id: BASE_CHAIN_ID,
            switch_error: None,
            send_error: None,
            sent: Vec::new(),
            switch_requests: Vec::new(),
            lands_on: None,
        }
    }
}

/// A wallet on Base that signs whatever it is asked to, unless told otherwise.
#[derive(Clone, Default)]
pub struct FakeWallet {
    inner: Arc<Mutex<WalletInner>>,
}

impl FakeWallet {
    pub fn with_account(address: Address) -> Self {
        let wallet = Self::default();
        wallet.inner.lock().unwrap().accounts.push(address);
        wallet
    }

    pub fn set_chain_id(&self, chain_id: ChainId) {
        self.inner.lock().unwrap().chain_id = chain_id;
    }

    pub fn fail_switch(&self, err: WalletError) {
        self.inner.lock().unwrap().switch_error = Some(err);
    }

    pub fn fail_send(&self, err: WalletError) {
        self.inner.lock().unwrap().send_error = Some(err);
    }

    /// Successful sends record the claim on `chain`.
    pub fn on_send_record_claim(&self, chain: FakeChain) {
        self.inner.lock().unwrap().lands_on = Some(chain);
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn switch_requests(&self) -> Vec<ChainId> {
        self.inner.lock().unwrap().switch_requests.clone()
    }
}

impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.inner.lock().unwrap().accounts.clone())
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        Ok(self.inner.lock().unwrap().chain_id)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        let mut inner = self.inner.lock().unwrap();
        inner.switch_requests.push(chain_id);
        match inner.switch_error.clone() {
            Some(err) => Err(err),
            None => {
                inner.chain_id = chain_id;
                Ok(())
            }
        }
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxHash, WalletError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(err) = inner.send_error.clone() {
            return Err(err);
        }
        let from = tx.from;
        inner.sent.push(tx);
        if let Some(chain) = &inner.lands_on {
            chain.record_claim(from);
        }
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&(inner.sent.len() as u64).to_be_bytes());
        Ok(TxHash::new(hash))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Behaviour {
    Works,
    Fails,
    Missing,
}

/// Native file share that can be present, absent or broken.
#[derive(Clone)]
pub struct FakeNativeShare {
    behaviour: Behaviour,
    shares: Arc<Mutex<usize>>,
}

impl FakeNativeShare {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            shares: Arc::default(),
        }
    }

    pub fn capable() -> Self {
        Self::with(Behaviour::Works)
    }

    pub fn failing() -> Self {
        Self::with(Behaviour::Fails)
    }

    pub fn incapable() -> Self {
        Self::with(Behaviour::Missing)
    }

    pub fn shares(&self) -> usize {
        *self.shares.lock().unwrap()
    }
}

impl NativeShare for FakeNativeShare {
    fn can_share_files(&self) -> bool {
        self.behaviour != Behaviour::Missing
    }

    async fn share_file(
        &self,
        _image: &RenderedImage,
        _caption: &str,
        _link: &Url,
    ) -> Result<(), ShareError> {
        match self.behaviour {
            Behaviour::Works => {
                *self.shares.lock().unwrap() += 1;
                Ok(())
            }
            Behaviour::Fails => Err(ShareError::Cancelled),
            Behaviour::Missing => Err(ShareError::Unsupported("native file share")),
        }
    }
}

#[derive(Clone)]
pub struct FakeImageHost {
    behaviour: Behaviour,
    url: Url,
    uploads: Arc<Mutex<usize>>,
}

impl FakeImageHost {
    fn with(behaviour: Behaviour, url: &str) -> Self {
        Self {
            behaviour,
            url: Url::parse(url).unwrap(),
            uploads: Arc::default(),
        }
    }

    pub fn serving(url: &str) -> Self {
        Self::with(Behaviour::Works, url)
    }

    pub fn failing() -> Self {
        Self::with(Behaviour::Fails, "https://i.ibb.co/unused.png")
    }

    pub fn unconfigured() -> Self {
        Self::with(Behaviour::Missing, "https://i.ibb.co/unused.png")
    }

    pub fn uploads(&self) -> usize {
        *self.uploads.lock().unwrap()
    }
}

impl ImageHost for FakeImageHost {
    fn is_configured(&self) -> bool {
        self.behaviour != Behaviour::Missing
    }

    async fn upload(&self, _image: &RenderedImage) -> Result<Url, ShareError> {
        *self.uploads.lock().unwrap() += 1;
        match self.behaviour {
            Behaviour::Works => Ok(self.url.clone()),
            Behaviour::Fails => Err(ShareError::Upload("fake upload failure".to_string())),
            Behaviour::Missing => Err(ShareError::NotConfigured),
        }
    }
}

/// Serves as both the host action channel and the outbound link opener.
#[derive(Clone)]
pub struct FakeOpener {
    works: bool,
    opened: Arc<Mutex<Vec<Url>>>,
}

impl FakeOpener {
    pub fn working() -> Self {
        Self {
            works: true,
            opened: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            works: false,
            opened: Arc::default(),
        }
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }

    fn open_inner(&self, url: &Url) -> Result<(), ShareError> {
        if !self.works {
            return Err(ShareError::Open("fake opener refused".to_string()));
        }
        self.opened.lock().unwrap().push(url.clone());
        Ok(())
    }
}

impl HostActions for FakeOpener {
    async fn open_url(&self, url: &Url) -> Result<(), ShareError> {
        self.open_inner(url)
    }
}

impl LinkOpener for FakeOpener {
    async fn open(&self, url: &Url) -> Result<(), ShareError> {
        self.open_inner(url)
    }
}
