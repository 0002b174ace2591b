use crate::{
    Surfaces,
    test_app,
};
use castinspo::{
    chain::{
        Address,
        ChainId,
        WalletError,
    },
    claim::{
        Phase,
        SwitchFailurePolicy,
        UnlockPolicy,
    },
    config::AppConfig,
    test_helpers::{
        FakeChain,
        FakeOpener,
        FakeWallet,
    },
};
use std::time::Duration;

const ALICE: Address = Address::new([0xA1; 20]);

#[tokio::test]
async fn claim_flow__share_then_claim_submits_one_transaction() {
    // given
    let config = AppConfig::default();
    let chain = FakeChain::new(20_000);
    let wallet = FakeWallet::with_account(ALICE);
    wallet.on_send_record_claim(chain.clone());
    let mut app = test_app(&config, wallet.clone(), chain, Surfaces::default());
    app.startup(None).await;
    assert_eq!(app.snapshot().phase, Phase::Locked);

    // when
    app.share().await;
    app.claim().await;

    // then
    let snapshot = app.snapshot();
    assert_eq!(snapshot.phase, Phase::Claimed);
    assert!(snapshot.has_claimed_today);
    assert_eq!(wallet.sent().len(), 1);
    assert_eq!(wallet.sent()[0].to, config.chain.contract);
}

#[tokio::test]
async fn claim_flow__claim_before_share_sends_nothing() {
    // given
    let config = AppConfig::default();
    let wallet = FakeWallet::with_account(ALICE);
    let mut app = test_app(&config, wallet.clone(), FakeChain::new(20_000), Surfaces::default());
    app.startup(None).await;

    // when
    app.claim().await;

    // then
    assert!(wallet.sent().is_empty());
    assert_eq!(app.snapshot().phase, Phase::Locked);
}

#[tokio::test]
async fn claim_flow__second_claim_on_the_same_day_is_a_noop() {
    // given
    let config = AppConfig::default();
    let chain = FakeChain::new(20_000);
    let wallet = FakeWallet::with_account(ALICE);
    wallet.on_send_record_claim(chain.clone());
    let mut app = test_app(&config, wallet.clone(), chain, Surfaces::default());
    app.startup(None).await;
    app.share().await;
    app.claim().await;
    let before = app.snapshot();

    // when
    app.share().await;
    app.claim().await;

    // then
    assert_eq!(wallet.sent().len(), 1);
    assert_eq!(app.snapshot().phase, before.phase);
}

#[tokio::test]
async fn claim_flow__refresh_before_the_claim_is_mined_keeps_it_pending() {
    // given
    let config = AppConfig::default();
    let wallet = FakeWallet::with_account(ALICE);
    let mut app = test_app(&config, wallet.clone(), FakeChain::new(20_000), Surfaces::default());
    app.startup(None).await;
    app.share().await;
    app.claim().await;

    // when
    app.refresh().await;
    app.share().await;
    app.claim().await;

    // then
    let snapshot = app.snapshot();
    assert_eq!(snapshot.phase, Phase::Claimed);
    assert!(snapshot.has_claimed_today);
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn claim_flow__no_wallet_account_asks_to_connect() {
    // given
    let config = AppConfig::default();
    let wallet = FakeWallet::default();
    let mut app = test_app(&config, wallet.clone(), FakeChain::new(20_000), Surfaces::default());
    app.startup(None).await;
    app.share().await;

    // when
    app.claim().await;

    // then
    assert!(wallet.sent().is_empty());
    assert_eq!(app.snapshot().status, "Connect a wallet to claim");
}

#[tokio::test(start_paused = true)]
async fn claim_flow__reconcile_mismatch_reopens_the_claim() {
    // given
    let config = AppConfig::default();
    let chain = FakeChain::new(20_000);
    let wallet = FakeWallet::with_account(ALICE);
    let mut app = test_app(&config, wallet, chain, Surfaces::default());
    app.startup(None).await;
    app.share().await;
    app.claim().await;
    assert_eq!(app.snapshot().phase, Phase::Claimed);

    // when
    tokio::time::sleep(Duration::from_secs(5) + Duration::from_millis(10)).await;
    let applied = app.process_background().await;

    // then
    assert_eq!(applied, 1);
    let snapshot = app.snapshot();
    assert_eq!(snapshot.phase, Phase::Unlockable);
    assert!(!snapshot.has_claimed_today);
    assert_eq!(snapshot.errors.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn claim_flow__reconcile_delay_is_configurable() {
    // given
    let mut config = AppConfig::default();
    config.claim.reconcile_delay_ms = 1_000;
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(20_000),
        Surfaces::default(),
    );
    app.startup(None).await;
    app.share().await;
    app.claim().await;

    // when
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let applied = app.process_background().await;

    // then
    assert_eq!(applied, 1);
    assert_eq!(app.snapshot().phase, Phase::Unlockable);
}

#[tokio::test]
async fn claim_flow__revert_ends_locked_with_a_notice() {
    // given
    let config = AppConfig::default();
    let chain = FakeChain::new(20_000);
    let wallet = FakeWallet::with_account(ALICE);
    wallet.fail_send(WalletError::new(
        Some(-32000),
        "execution reverted: already checked in",
    ));
    let mut app = test_app(&config, wallet, chain, Surfaces::default());
    app.startup(None).await;
    app.share().await;

    // when
    app.claim().await;

    // then
    let snapshot = app.snapshot();
    assert_eq!(snapshot.phase, Phase::Locked);
    assert!(!snapshot.has_claimed_today);
    assert_eq!(
        snapshot.errors,
        vec!["Claim reverted. Today's claim may already be used".to_string()]
    );
}

#[tokio::test]
async fn claim_flow__proceed_policy_submits_on_the_wrong_chain() {
    // given
    let mut config = AppConfig::default();
    config.claim.on_switch_failure = SwitchFailurePolicy::Proceed;
    let wallet = FakeWallet::with_account(ALICE);
    wallet.set_chain_id(ChainId(10));
    wallet.fail_switch(WalletError::new(Some(4001), "User rejected the request."));
    let mut app = test_app(&config, wallet.clone(), FakeChain::new(20_000), Surfaces::default());
    app.startup(None).await;
    app.share().await;

    // when
    app.claim().await;

    // then
    assert_eq!(wallet.switch_requests(), vec![ChainId(8453)]);
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn claim_flow__on_delivery_policy_needs_an_opened_composer() {
    // given
    let mut config = AppConfig::default();
    config.claim.unlock = UnlockPolicy::OnDelivery;
    let surfaces = Surfaces {
        actions: FakeOpener::failing(),
        opener: FakeOpener::failing(),
        ..Surfaces::default()
    };
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(20_000),
        surfaces,
    );
    app.startup(None).await;

    // when
    let outcome = app.share().await;

    // then
    assert!(!outcome.delivered());
    assert_eq!(app.snapshot().phase, Phase::Locked);
}

#[tokio::test]
async fn claim_flow__day_rollover_locks_until_the_next_share() {
    // given
    let config = AppConfig::default();
    let chain = FakeChain::new(20_000);
    chain.set_last_claim_day(ALICE, 20_000);
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        chain.clone(),
        Surfaces::default(),
    );
    app.startup(None).await;
    assert_eq!(app.snapshot().phase, Phase::Claimed);

    // when
    chain.set_current_day(20_001);
    app.refresh().await;

    // then
    let snapshot = app.snapshot();
    assert_eq!(snapshot.phase, Phase::Locked);
    assert!(!snapshot.has_claimed_today);
    assert_eq!(snapshot.day.unwrap().current_day, 20_001);
}
