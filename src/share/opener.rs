//! Share surfaces available outside a mini-app host.

use crate::{
    render::RenderedImage,
    share::{
        HostActions,
        LinkOpener,
        NativeShare,
        ShareError,
    },
};
use tokio::process::Command;
use url::Url;

/// Stands in for a capability the current host does not have.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unsupported;

impl NativeShare for Unsupported {
    fn can_share_files(&self) -> bool {
        false
    }

    async fn share_file(
        &self,
        _image: &RenderedImage,
        _caption: &str,
        _link: &Url,
    ) -> Result<(), ShareError> {
        Err(ShareError::Unsupported("native file share"))
    }
}

impl HostActions for Unsupported {
    async fn open_url(&self, _url: &Url) -> Result<(), ShareError> {
        Err(ShareError::Unsupported("host action channel"))
    }
}

impl LinkOpener for Unsupported {
    async fn open(&self, _url: &Url) -> Result<(), ShareError> {
        Err(ShareError::Unsupported("outbound link"))
    }
}

/// Opens links with the desktop's default handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(url: &Url) -> Command {
        let mut cmd = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            // `cmd /C start` would split the query at `&`
            let mut cmd = Command::new("rundll32");
            cmd.arg("url.dll,FileProtocolHandler");
            cmd
        } else {
            Command::new("xdg-open")
        };
        cmd.arg(url.as_str());
        cmd
    }
}

impl LinkOpener for SystemOpener {
    async fn open(&self, url: &Url) -> Result<(), ShareError> {
        let status = Self::command(url).status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(ShareError::Open(format!("opener exited with {status}")))
        }
    }
}
