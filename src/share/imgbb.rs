//! ImgBB upload client.

use crate::{
    render::RenderedImage,
    share::{
        ImageHost,
        ShareError,
    },
};
use reqwest::multipart::{
    Form,
    Part,
};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.imgbb.com/1/upload";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const FILE_NAME: &str = "castinspo.png";

#[derive(Clone, Debug)]
pub struct ImgBbHost {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponseDto {
    #[serde(default)]
    success: bool,
    data: Option<UploadDataDto>,
    error: Option<UploadErrorDto>,
}

#[derive(Deserialize)]
struct UploadDataDto {
    url: String,
}

#[derive(Deserialize)]
struct UploadErrorDto {
    message: String,
}

impl ImgBbHost {
    /// An empty key counts as no key.
    pub fn new(endpoint: Url, api_key: Option<String>) -> Result<Self, ShareError> {
        let http = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn upload_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", key);
        url
    }
}

fn parse_response(body: &[u8]) -> Result<Url, ShareError> {
    let dto: UploadResponseDto = serde_json::from_slice(body)
        .map_err(|e| ShareError::Upload(format!("unreadable response: {e}")))?;
    match dto {
        UploadResponseDto {
            success: true,
            data: Some(data),
            ..
        } => Url::parse(&data.url)
            .map_err(|e| ShareError::Upload(format!("invalid image url {:?}: {e}", data.url))),
        UploadResponseDto {
            error: Some(error), ..
        } => Err(ShareError::Upload(error.message)),
        _ => Err(ShareError::Upload("upload was not successful".to_string())),
    }
}

impl ImageHost for ImgBbHost {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn upload(&self, image: &RenderedImage) -> Result<Url, ShareError> {
        let key = self.api_key.as_deref().ok_or(ShareError::NotConfigured)?;
        let part = Part::bytes(image.bytes.clone())
            .file_name(FILE_NAME)
            .mime_str(RenderedImage::MIME_TYPE)?;
        let form = Form::new().part("image", part);
        tracing::debug!(bytes = image.bytes.len(), "uploading card image");
        let res = self
            .http
            .post(self.upload_url(key))
            .multipart(form)
            .send()
            .await?;
        let status = res.status();
        let body = res.bytes().await?;
        if !status.is_success() {
            // ImgBB reports details in the body even for error statuses
            return match parse_response(&body) {
                Err(err) => Err(err),
                Ok(_) => Err(ShareError::Upload(format!("status {status}"))),
            };
        }
        parse_response(&body)
    }
}
