//! Ordered share fallback.
//!
//! [`ShareDispatcher::share`] tries, in order: the host's native file share, an
//! uploaded image plus compose link, a text-only compose link, and finally the compose
//! link as a plain outbound link. Each failure is logged and the next strategy is
//! tried. The dispatcher itself never fails; running out of strategies is reported as
//! [`ShareOutcome::Exhausted`].

use crate::render::{
    CardImage,
    RenderedImage,
};
use std::future::Future;
use tracing::{
    info,
    warn,
};
use url::Url;

pub mod compose;
pub mod imgbb;
pub mod opener;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("{0} is not available on this host")]
    Unsupported(&'static str),
    #[error("image host is not configured")]
    NotConfigured,
    #[error("share cancelled")]
    Cancelled,
    #[error("image upload failed: {0}")]
    Upload(String),
    #[error("could not open link: {0}")]
    Open(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The host's file share sheet.
pub trait NativeShare {
    fn can_share_files(&self) -> bool;

    fn share_file(
        &self,
        image: &RenderedImage,
        caption: &str,
        link: &Url,
    ) -> impl Future<Output = Result<(), ShareError>> + Send;
}

/// Binary upload to a public URL.
pub trait ImageHost {
    fn is_configured(&self) -> bool;

    fn upload(
        &self,
        image: &RenderedImage,
    ) -> impl Future<Output = Result<Url, ShareError>> + Send;
}

/// The embedding host's "open this URL" action.
pub trait HostActions {
    fn open_url(&self, url: &Url) -> impl Future<Output = Result<(), ShareError>> + Send;
}

/// Last resort: hand the URL to whatever opens links outside the host.
pub trait LinkOpener {
    fn open(&self, url: &Url) -> impl Future<Output = Result<(), ShareError>> + Send;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShareOutcome {
    NativeShare,
    HostedCompose { image_url: Url, compose_url: Url },
    TextCompose { compose_url: Url },
    OutboundLink { compose_url: Url },
    /// Every strategy failed. The caller reports "failed to open composer".
    Exhausted { compose_url: Url },
}

impl ShareOutcome {
    /// Whether a share surface was actually opened.
    pub fn delivered(&self) -> bool {
        !matches!(self, ShareOutcome::Exhausted { .. })
    }

    pub fn compose_url(&self) -> Option<&Url> {
        match self {
            ShareOutcome::NativeShare => None,
            ShareOutcome::HostedCompose { compose_url, .. }
            | ShareOutcome::TextCompose { compose_url }
            | ShareOutcome::OutboundLink { compose_url }
            | ShareOutcome::Exhausted { compose_url } => Some(compose_url),
        }
    }
}

pub struct ShareDispatcher<N, H, A, L> {
    native: N,
    host: H,
    actions: A,
    opener: L,
    compose_base: Url,
}

impl<N, H, A, L> ShareDispatcher<N, H, A, L>
where
    N: NativeShare,
    H: ImageHost,
    A: HostActions,
    L: LinkOpener,
{
    pub fn new(native: N, host: H, actions: A, opener: L, compose_base: Url) -> Self {
        Self {
            native,
            host,
            actions,
            opener,
            compose_base,
        }
    }

    pub async fn share(&self, image: &CardImage, caption: &str, deep_link: &Url) -> ShareOutcome {
        let rendered = image.rendered();

        if let Some(rendered) = rendered {
            if self.native.can_share_files() {
                match self.native.share_file(rendered, caption, deep_link).await {
                    Ok(()) => {
                        info!("shared card through native file share");
                        return ShareOutcome::NativeShare;
                    }
                    Err(err) => warn!(?err, "native file share failed"),
                }
            }
        }

        let image_url = match rendered {
            Some(rendered) if self.host.is_configured() => {
                match self.host.upload(rendered).await {
                    Ok(url) => Some(url),
                    Err(err) => {
                        warn!(?err, "image upload failed, sharing link only");
                        None
                    }
                }
            }
            Some(_) => {
                warn!("no image host configured, sharing link only");
                None
            }
            None => None,
        };

        let mut embeds: Vec<&str> = Vec::with_capacity(2);
        if let Some(url) = &image_url {
            embeds.push(url.as_str());
        }
        embeds.push(deep_link.as_str());
        let compose_url = compose::compose_url(&self.compose_base, caption, &embeds);

        if self.open_in_host(&compose_url).await {
            return match image_url {
                Some(image_url) => ShareOutcome::HostedCompose {
                    image_url,
                    compose_url,
                },
                None => ShareOutcome::TextCompose { compose_url },
            };
        }
        self.open_outbound(compose_url).await
    }

    /// Text compose with the given embeds, skipping the image strategies.
    pub async fn share_text(&self, caption: &str, embeds: &[&Url]) -> ShareOutcome {
        let embeds: Vec<&str> = embeds.iter().map(|url| url.as_str()).collect();
        let compose_url = compose::compose_url(&self.compose_base, caption, &embeds);
        if self.open_in_host(&compose_url).await {
            return ShareOutcome::TextCompose { compose_url };
        }
        self.open_outbound(compose_url).await
    }

    async fn open_in_host(&self, compose_url: &Url) -> bool {
        match self.actions.open_url(compose_url).await {
            Ok(()) => {
                info!(%compose_url, "opened composer");
                true
            }
            Err(err) => {
                warn!(?err, "host could not open composer");
                false
            }
        }
    }

    async fn open_outbound(&self, compose_url: Url) -> ShareOutcome {
        match self.opener.open(&compose_url).await {
            Ok(()) => {
                info!(%compose_url, "opened composer as outbound link");
                ShareOutcome::OutboundLink { compose_url }
            }
            Err(err) => {
                warn!(?err, "outbound link failed, no share surface left");
                ShareOutcome::Exhausted { compose_url }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::{
        FakeImageHost,
        FakeNativeShare,
        FakeOpener,
    };

    type Dispatcher = ShareDispatcher<FakeNativeShare, FakeImageHost, FakeOpener, FakeOpener>;

    fn card() -> CardImage {
        CardImage::Rendered(RenderedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            width_px: 1200,
            height_px: 630,
        })
    }

    fn link() -> Url {
        Url::parse("https://farcaster.xyz/miniapps/S9xDZOSiOGWl/castinspo?q=42").unwrap()
    }

    fn dispatcher(
        native: FakeNativeShare,
        host: FakeImageHost,
        actions: FakeOpener,
        opener: FakeOpener,
    ) -> Dispatcher {
        ShareDispatcher::new(
            native,
            host,
            actions,
            opener,
            Url::parse(compose::DEFAULT_COMPOSE_URL).unwrap(),
        )
    }

    fn embeds(url: &Url) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == "embeds[]")
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[tokio::test]
    async fn share__prefers_native_file_share() {
        // given
        let native = FakeNativeShare::capable();
        let host = FakeImageHost::serving("https://i.ibb.co/x/card.png");
        let actions = FakeOpener::working();
        let d = dispatcher(native.clone(), host.clone(), actions.clone(), FakeOpener::working());

        // when
        let outcome = d.share(&card(), "caption", &link()).await;

        // then
        assert_eq!(outcome, ShareOutcome::NativeShare);
        assert_eq!(native.shares(), 1);
        assert_eq!(host.uploads(), 0);
        assert!(actions.opened().is_empty());
    }

    #[tokio::test]
    async fn share__uploads_and_embeds_image_then_deep_link() {
        // given
        let actions = FakeOpener::working();
        let d = dispatcher(
            FakeNativeShare::incapable(),
            FakeImageHost::serving("https://i.ibb.co/x/card.png"),
            actions.clone(),
            FakeOpener::working(),
        );

        // when
        let outcome = d.share(&card(), "caption", &link()).await;

        // then
        let ShareOutcome::HostedCompose {
            image_url,
            compose_url,
        } = &outcome
        else {
            panic!("expected hosted compose, got {outcome:?}");
        };
        assert_eq!(image_url.as_str(), "https://i.ibb.co/x/card.png");
        assert_eq!(
            embeds(compose_url),
            vec![
                "https://i.ibb.co/x/card.png".to_string(),
                link().to_string()
            ]
        );
        assert_eq!(actions.opened(), vec![compose_url.clone()]);
    }

    #[tokio::test]
    async fn share__falls_back_to_text_compose_when_native_and_upload_fail() {
        // given
        let d = dispatcher(
            FakeNativeShare::failing(),
            FakeImageHost::failing(),
            FakeOpener::working(),
            FakeOpener::working(),
        );

        // when
        let outcome = d.share(&card(), "caption", &link()).await;

        // then
        let ShareOutcome::TextCompose { compose_url } = &outcome else {
            panic!("expected text compose, got {outcome:?}");
        };
        assert_eq!(embeds(compose_url), vec![link().to_string()]);
        assert!(outcome.delivered());
    }

    #[tokio::test]
    async fn share__skips_upload_without_image_host() {
        // given
        let host = FakeImageHost::unconfigured();
        let d = dispatcher(
            FakeNativeShare::incapable(),
            host.clone(),
            FakeOpener::working(),
            FakeOpener::working(),
        );

        // when
        let outcome = d.share(&card(), "caption", &link()).await;

        // then
        assert!(matches!(outcome, ShareOutcome::TextCompose { .. }));
        assert_eq!(host.uploads(), 0);
    }

    #[tokio::test]
    async fn share__unavailable_image_goes_straight_to_compose() {
        // given
        let native = FakeNativeShare::capable();
        let d = dispatcher(
            native.clone(),
            FakeImageHost::serving("https://i.ibb.co/x/card.png"),
            FakeOpener::working(),
            FakeOpener::working(),
        );

        // when
        let outcome = d.share(&CardImage::Unavailable, "caption", &link()).await;

        // then
        assert!(matches!(outcome, ShareOutcome::TextCompose { .. }));
        assert_eq!(native.shares(), 0);
    }

    #[tokio::test]
    async fn share__uses_outbound_link_when_host_cannot_open() {
        // given
        let opener = FakeOpener::working();
        let d = dispatcher(
            FakeNativeShare::incapable(),
            FakeImageHost::unconfigured(),
            FakeOpener::failing(),
            opener.clone(),
        );

        // when
        let outcome = d.share(&card(), "caption", &link()).await;

        // then
        assert!(matches!(outcome, ShareOutcome::OutboundLink { .. }));
        assert_eq!(opener.opened().len(), 1);
    }

    #[tokio::test]
    async fn share__reports_exhaustion_without_failing() {
        // given
        let d = dispatcher(
            FakeNativeShare::failing(),
            FakeImageHost::failing(),
            FakeOpener::failing(),
            FakeOpener::failing(),
        );

        // when
        let outcome = d.share(&card(), "caption", &link()).await;

        // then
        assert!(matches!(outcome, ShareOutcome::Exhausted { .. }));
        assert!(!outcome.delivered());
        assert!(outcome.compose_url().is_some());
    }

    #[tokio::test]
    async fn share_text__embeds_only_the_given_links() {
        // given
        let actions = FakeOpener::working();
        let app = Url::parse(compose::DEFAULT_APP_URL).unwrap();
        let d = dispatcher(
            FakeNativeShare::capable(),
            FakeImageHost::serving("https://i.ibb.co/x/card.png"),
            actions.clone(),
            FakeOpener::working(),
        );

        // when
        let outcome = d.share_text(compose::DEFAULT_REWARD_CAPTION, &[&app]).await;

        // then
        let ShareOutcome::TextCompose { compose_url } = &outcome else {
            panic!("expected text compose, got {outcome:?}");
        };
        assert_eq!(embeds(compose_url), vec![app.to_string()]);
    }
}
