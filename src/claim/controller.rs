use crate::{
    chain::{
        Address,
        ChainId,
        ChainReader,
        TxRequest,
        WalletError,
        WalletProvider,
        abi,
    },
    claim::state::{
        ClaimEvent,
        ClaimPolicy,
        ClaimState,
        Effect,
        Notice,
        reduce,
    },
    oracle::ClaimEligibilityOracle,
};
use std::{
    collections::VecDeque,
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::{
    info,
    warn,
};

/// Runs the claim reducer against a real wallet and chain reader.
///
/// Effects are executed in order. Events they produce are fed back through the reducer
/// before the call returns, except reconciliation, which arrives later through
/// [`ClaimController::process_background`].
pub struct ClaimController<W, R> {
    wallet: W,
    oracle: ClaimEligibilityOracle<R>,
    contract: Address,
    target_chain: ChainId,
    policy: ClaimPolicy,
    state: ClaimState,
    notices: Vec<Notice>,
    background_tx: mpsc::UnboundedSender<ClaimEvent>,
    background_rx: mpsc::UnboundedReceiver<ClaimEvent>,
}

impl<W, R> ClaimController<W, R>
where
    W: WalletProvider,
    R: ChainReader + Clone + Send + Sync + 'static,
{
    pub fn new(
        wallet: W,
        reader: R,
        contract: Address,
        target_chain: ChainId,
        policy: ClaimPolicy,
    ) -> Self {
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        Self {
            wallet,
            oracle: ClaimEligibilityOracle::new(reader),
            contract,
            target_chain,
            policy,
            state: ClaimState::default(),
            notices: Vec::new(),
            background_tx,
            background_rx,
        }
    }

    pub fn state(&self) -> &ClaimState {
        &self.state
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn policy(&self) -> &ClaimPolicy {
        &self.policy
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Asks the wallet for accounts and adopts the first one, then loads its status.
    pub async fn connect(&mut self) -> Result<Option<Address>, WalletError> {
        let accounts = self.wallet.request_accounts().await?;
        let address = accounts.first().copied();
        info!(?address, accounts = accounts.len(), "wallet connected");
        self.dispatch(ClaimEvent::AddressChanged(address)).await;
        Ok(address)
    }

    pub async fn set_address(&mut self, address: Option<Address>) {
        self.dispatch(ClaimEvent::AddressChanged(address)).await;
    }

    /// Re-polls the oracle. A failed read leaves the state untouched.
    pub async fn refresh(&mut self) {
        if let Some(address) = self.state.address {
            let event = self.load(address).await;
            self.dispatch(event).await;
        }
    }

    pub async fn share_completed(&mut self, delivered: bool) {
        self.dispatch(ClaimEvent::ShareCompleted { delivered }).await;
    }

    /// Runs one claim attempt: network check, optional switch, submit.
    pub async fn claim(&mut self) {
        self.dispatch(ClaimEvent::ClaimRequested).await;
    }

    /// Applies background results that have already arrived. Returns how many were
    /// applied.
    pub async fn process_background(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.background_rx.try_recv() {
            self.dispatch(event).await;
            applied += 1;
        }
        applied
    }

    /// Waits up to `limit` for the next background result and applies it. Returns
    /// false when nothing arrived in time.
    pub async fn next_background(&mut self, limit: Duration) -> bool {
        match tokio::time::timeout(limit, self.background_rx.recv()).await {
            Ok(Some(event)) => {
                self.dispatch(event).await;
                true
            }
            Ok(None) => false,
            Err(_) => {
                warn!(?limit, "no background result in time");
                false
            }
        }
    }

    pub async fn dispatch(&mut self, event: ClaimEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let before = self.state.phase;
            let (next, effects) = reduce(&self.state, event, &self.policy);
            if next.phase != before {
                info!(from = %before, to = %next.phase, "claim phase changed");
            }
            self.state = next;
            for effect in effects {
                if let Some(follow_up) = self.run(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    async fn run(&mut self, effect: Effect) -> Option<ClaimEvent> {
        match effect {
            Effect::EnsureNetwork { address } => Some(self.ensure_network(address).await),
            Effect::SendClaim { address } => Some(self.send_claim(address).await),
            Effect::ScheduleReconcile { address, delay } => {
                let oracle = self.oracle.clone();
                let tx = self.background_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let event = match oracle.check(address).await {
                        Ok(status) => ClaimEvent::Reconciled { address, status },
                        Err(err) => {
                            warn!(?err, %address, "reconciliation read failed, keeping optimistic state");
                            ClaimEvent::EligibilityUnavailable
                        }
                    };
                    let _ = tx.send(event);
                });
                None
            }
            Effect::Resync { address } => Some(self.load(address).await),
            Effect::Notify(notice) => {
                if notice.is_error() {
                    warn!(%notice, "claim notice");
                } else {
                    info!(%notice, "claim notice");
                }
                self.notices.push(notice);
                None
            }
        }
    }

    async fn load(&self, address: Address) -> ClaimEvent {
        match self.oracle.check(address).await {
            Ok(status) => ClaimEvent::EligibilityLoaded { address, status },
            Err(err) => {
                warn!(?err, %address, "claim status unavailable, keeping last known state");
                ClaimEvent::EligibilityUnavailable
            }
        }
    }

    async fn ensure_network(&self, address: Address) -> ClaimEvent {
        let current = match self.wallet.chain_id().await {
            Ok(id) => id,
            Err(err) => {
                warn!(?err, %address, "could not read wallet chain");
                return ClaimEvent::NetworkSwitchFailed {
                    message: err.message,
                };
            }
        };
        if current == self.target_chain {
            return ClaimEvent::NetworkReady;
        }
        info!(%current, target = %self.target_chain, "requesting network switch");
        match self.wallet.switch_chain(self.target_chain).await {
            Ok(()) => ClaimEvent::NetworkReady,
            Err(err) => {
                warn!(?err, policy = ?self.policy.switch_failure, "network switch failed");
                ClaimEvent::NetworkSwitchFailed {
                    message: err.message,
                }
            }
        }
    }

    async fn send_claim(&self, address: Address) -> ClaimEvent {
        let tx = TxRequest {
            from: address,
            to: self.contract,
            data: abi::encode_check_in_and_claim(),
        };
        match self.wallet.send_transaction(tx).await {
            Ok(tx) => {
                info!(%tx, %address, "claim submitted");
                ClaimEvent::ClaimSubmitted { tx }
            }
            Err(err) => {
                let kind = err.classify();
                warn!(?err, ?kind, "claim submission failed");
                ClaimEvent::ClaimFailed {
                    kind,
                    message: err.message,
                }
            }
        }
    }
}
