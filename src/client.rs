//! Session controller: one quote on screen, the share flow and the claim gate.

use crate::{
    chain::{
        Address,
        ChainReader,
        WalletProvider,
        rpc::{
            ContractReader,
            RpcClient,
            RpcWallet,
        },
    },
    claim::{
        ClaimController,
        Notice,
        Phase,
    },
    config::AppConfig,
    oracle::DayStatus,
    quotes::{
        Quote,
        QuoteStore,
    },
    render::{
        self,
        CardImage,
        RenderConfig,
    },
    share::{
        HostActions,
        ImageHost,
        LinkOpener,
        NativeShare,
        ShareDispatcher,
        ShareOutcome,
        compose,
        imgbb::ImgBbHost,
        opener::{
            SystemOpener,
            Unsupported,
        },
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use rand::{
    SeedableRng,
    rngs::StdRng,
};
use std::time::Duration;
use tracing::{
    error,
    info,
};
use url::Url;

const MAX_ERRORS: usize = 50;
const SNAPSHOT_ERRORS: usize = 5;

/// The controller the CLI runs: JSON-RPC chain and wallet, ImgBB, and the desktop
/// link opener. There is no native share sheet or host action channel outside a
/// mini-app host.
pub type CliController = AppController<
    RpcWallet,
    ContractReader,
    Unsupported,
    ImgBbHost,
    Unsupported,
    SystemOpener,
>;

#[derive(Clone, Debug)]
pub struct QuoteCard {
    pub quote: Quote,
    pub image: CardImage,
    pub deep_link: Url,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub quote: Option<Quote>,
    pub image_available: bool,
    pub deep_link: Option<Url>,
    pub address: Option<Address>,
    pub phase: Phase,
    pub has_claimed_today: bool,
    pub day: Option<DayStatus>,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController<W, R, N, H, A, L> {
    store: QuoteStore,
    rng: StdRng,
    render: RenderConfig,
    app_url: Url,
    caption: String,
    reward_caption: String,
    dispatcher: ShareDispatcher<N, H, A, L>,
    claim: ClaimController<W, R>,
    current: Option<QuoteCard>,
    pub status: String,
    errors: Vec<String>,
}

impl CliController {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let read_rpc = RpcClient::new(config.chain.rpc_url.clone())
            .wrap_err("failed to build rpc client")?;
        let wallet_rpc = match &config.chain.wallet_rpc_url {
            Some(url) => RpcClient::new(url.clone()).wrap_err("failed to build wallet client")?,
            None => read_rpc.clone(),
        };
        let claim = ClaimController::new(
            RpcWallet::new(wallet_rpc),
            ContractReader::new(read_rpc, config.chain.contract),
            config.chain.contract,
            config.chain.target_chain(),
            config.claim.policy(),
        );
        let host = ImgBbHost::new(
            config.share.imgbb_endpoint()?,
            config.share.imgbb_api_key.clone(),
        )
        .wrap_err("failed to build image host")?;
        let dispatcher = ShareDispatcher::new(
            Unsupported,
            host,
            Unsupported,
            SystemOpener,
            config.share.compose_url()?,
        );
        let store = QuoteStore::bundled().wrap_err("bundled quotes are unreadable")?;
        AppController::new(config, store, claim, dispatcher, StdRng::from_os_rng())
    }
}

impl<W, R, N, H, A, L> AppController<W, R, N, H, A, L>
where
    W: WalletProvider,
    R: ChainReader + Clone + Send + Sync + 'static,
    N: NativeShare,
    H: ImageHost,
    A: HostActions,
    L: LinkOpener,
{
    pub fn new(
        config: &AppConfig,
        store: QuoteStore,
        claim: ClaimController<W, R>,
        dispatcher: ShareDispatcher<N, H, A, L>,
        rng: StdRng,
    ) -> Result<Self> {
        Ok(Self {
            store,
            rng,
            render: config.render.clone(),
            app_url: config.share.app_url()?,
            caption: config.share.caption.clone(),
            reward_caption: config.share.reward_caption.clone(),
            dispatcher,
            claim,
            current: None,
            status: String::from("Ready"),
            errors: Vec::new(),
        })
    }

    /// Shows the quote named by `launch_link` (or a random one) and connects the
    /// wallet. A wallet that cannot connect is reported, not fatal.
    pub async fn startup(&mut self, launch_link: Option<&str>) {
        let index = launch_link.and_then(compose::quote_index_from_link);
        self.show_quote(index);
        match self.claim.connect().await {
            Ok(Some(address)) => self.status = format!("Connected {address}"),
            Ok(None) => self.status = Notice::ConnectWallet.to_string(),
            Err(err) => self.push_errors(vec![format!("Wallet unavailable: {err}")]),
        }
        self.drain_notices();
    }

    /// Watch-only session for `address`, without asking the wallet.
    pub async fn watch(&mut self, address: Address) {
        self.claim.set_address(Some(address)).await;
        self.drain_notices();
    }

    pub fn show_quote(&mut self, index: Option<i64>) -> &QuoteCard {
        let quote = self.store.select(index, &mut self.rng);
        let image = render::render_quote(&quote, &self.render);
        let deep_link = compose::deep_link(&self.app_url, quote.id);
        info!(id = quote.id, image = image.is_available(), "showing quote");
        self.current.insert(QuoteCard {
            quote,
            image,
            deep_link,
        })
    }

    pub fn next_quote(&mut self) -> &QuoteCard {
        self.show_quote(None)
    }

    pub fn current(&self) -> Option<&QuoteCard> {
        self.current.as_ref()
    }

    pub fn claim_controller(&self) -> &ClaimController<W, R> {
        &self.claim
    }

    /// Shares the current card and reports the attempt to the claim gate.
    pub async fn share(&mut self) -> ShareOutcome {
        let card = match self.current.clone() {
            Some(card) => card,
            None => self.next_quote().clone(),
        };
        let outcome = self
            .dispatcher
            .share(&card.image, &self.caption, &card.deep_link)
            .await;
        self.after_share(&outcome);
        self.claim.share_completed(outcome.delivered()).await;
        self.drain_notices();
        outcome
    }

    pub async fn claim(&mut self) {
        self.claim.claim().await;
        self.drain_notices();
    }

    /// Shares the reward caption. Only offered once today's claim went through.
    pub async fn share_reward(&mut self) -> Option<ShareOutcome> {
        if self.claim.state().phase != Phase::Claimed {
            self.status = String::from("Nothing to celebrate yet");
            return None;
        }
        let outcome = self
            .dispatcher
            .share_text(&self.reward_caption, &[&self.app_url])
            .await;
        self.after_share(&outcome);
        Some(outcome)
    }

    pub async fn refresh(&mut self) {
        self.claim.refresh().await;
        self.drain_notices();
    }

    /// Applies finished background work, such as claim reconciliation.
    pub async fn process_background(&mut self) -> usize {
        let applied = self.claim.process_background().await;
        self.drain_notices();
        applied
    }

    /// Waits up to `limit` for the next background result.
    pub async fn wait_background(&mut self, limit: Duration) -> bool {
        let arrived = self.claim.next_background(limit).await;
        self.drain_notices();
        arrived
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let state = self.claim.state();
        AppSnapshot {
            quote: self.current.as_ref().map(|card| card.quote.clone()),
            image_available: self
                .current
                .as_ref()
                .is_some_and(|card| card.image.is_available()),
            deep_link: self.current.as_ref().map(|card| card.deep_link.clone()),
            address: state.address,
            phase: state.phase,
            has_claimed_today: state.has_claimed_today,
            day: state.day,
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(SNAPSHOT_ERRORS).cloned().collect(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn after_share(&mut self, outcome: &ShareOutcome) {
        match outcome {
            ShareOutcome::NativeShare => self.status = String::from("Shared"),
            ShareOutcome::HostedCompose { .. } | ShareOutcome::TextCompose { .. } => {
                self.status = String::from("Opened composer")
            }
            ShareOutcome::OutboundLink { compose_url } => {
                self.status = format!("Opened {compose_url}")
            }
            ShareOutcome::Exhausted { compose_url } => {
                self.status = Notice::ShareFailed.to_string();
                self.push_errors(vec![format!("{}: {compose_url}", Notice::ShareFailed)]);
            }
        }
    }

    fn drain_notices(&mut self) {
        let notices = self.claim.take_notices();
        let mut errs = Vec::new();
        for notice in notices {
            self.status = notice.to_string();
            if notice.is_error() {
                errs.push(notice.to_string());
            }
        }
        self.push_errors(errs);
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }
}
