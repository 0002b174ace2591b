use crate::{
    Surfaces,
    test_app,
};
use castinspo::{
    chain::Address,
    config::AppConfig,
    share::{
        ShareOutcome,
        compose,
    },
    test_helpers::{
        FakeChain,
        FakeImageHost,
        FakeNativeShare,
        FakeOpener,
        FakeWallet,
    },
};
use url::Url;

const ALICE: Address = Address::new([0xA1; 20]);

fn embeds(url: &Url) -> Vec<String> {
    url.query_pairs()
        .filter(|(k, _)| k == "embeds[]")
        .map(|(_, v)| v.into_owned())
        .collect()
}

fn text(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "text")
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn share_flow__hosted_image_and_deep_link_are_both_embedded() {
    // given
    let config = AppConfig::default();
    let surfaces = Surfaces::default();
    let actions = surfaces.actions.clone();
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(1),
        surfaces,
    );
    app.startup(Some("42")).await;

    // when
    let outcome = app.share().await;

    // then
    let ShareOutcome::HostedCompose { compose_url, .. } = &outcome else {
        panic!("expected hosted compose, got {outcome:?}");
    };
    assert_eq!(
        embeds(compose_url),
        vec![
            "https://i.ibb.co/abc/castinspo.png".to_string(),
            format!("{}?q=42", compose::DEFAULT_APP_URL),
        ]
    );
    assert_eq!(text(compose_url).as_deref(), Some(compose::DEFAULT_SHARE_CAPTION));
    assert_eq!(actions.opened(), vec![compose_url.clone()]);
}

#[tokio::test]
async fn share_flow__native_share_skips_the_network() {
    // given
    let config = AppConfig::default();
    let host = FakeImageHost::serving("https://i.ibb.co/abc/castinspo.png");
    let surfaces = Surfaces {
        native: FakeNativeShare::capable(),
        host: host.clone(),
        ..Surfaces::default()
    };
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(1),
        surfaces,
    );
    app.startup(None).await;

    // when
    let outcome = app.share().await;

    // then
    assert_eq!(outcome, ShareOutcome::NativeShare);
    assert_eq!(host.uploads(), 0);
}

#[tokio::test]
async fn share_flow__long_captions_are_truncated() {
    // given
    let mut config = AppConfig::default();
    config.share.caption = "a".repeat(400);
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(1),
        Surfaces::default(),
    );
    app.startup(None).await;

    // when
    let outcome = app.share().await;

    // then
    let caption = text(outcome.compose_url().unwrap()).unwrap();
    assert_eq!(caption, format!("{}...", "a".repeat(280)));
}

#[tokio::test]
async fn share_flow__upload_failure_still_shares_the_link() {
    // given
    let config = AppConfig::default();
    let surfaces = Surfaces {
        host: FakeImageHost::failing(),
        ..Surfaces::default()
    };
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(1),
        surfaces,
    );
    app.startup(Some("3")).await;

    // when
    let outcome = app.share().await;

    // then
    let ShareOutcome::TextCompose { compose_url } = &outcome else {
        panic!("expected text compose, got {outcome:?}");
    };
    assert_eq!(
        embeds(compose_url),
        vec![format!("{}?q=3", compose::DEFAULT_APP_URL)]
    );
}

#[tokio::test]
async fn share_flow__outbound_link_when_host_channel_fails() {
    // given
    let config = AppConfig::default();
    let opener = FakeOpener::working();
    let surfaces = Surfaces {
        actions: FakeOpener::failing(),
        opener: opener.clone(),
        ..Surfaces::default()
    };
    let mut app = test_app(
        &config,
        FakeWallet::with_account(ALICE),
        FakeChain::new(1),
        surfaces,
    );
    app.startup(None).await;

    // when
    let outcome = app.share().await;

    // then
    assert!(matches!(outcome, ShareOutcome::OutboundLink { .. }));
    assert_eq!(opener.opened().len(), 1);
    assert!(app.snapshot().errors.is_empty());
}
