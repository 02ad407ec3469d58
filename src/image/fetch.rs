//! 写真の取得（取得先の切り替え付き）

use super::{ImageResolver, ImageStatus};
use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 写真データの取得元
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwestによる取得（画像以外のレスポンスは失敗扱い）
pub struct HttpImageFetcher {
    http_client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.http_client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReviewError::ImageFetch(format!("HTTP {}", status.as_u16())));
        }

        // Driveは制限時にHTMLを200で返すことがある
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ReviewError::ImageFetch(format!(
                "画像ではありません: {}",
                content_type
            )));
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// 取得結果
#[derive(Debug)]
pub enum ImageOutcome {
    Loaded {
        url: String,
        attempt: u32,
        bytes: Vec<u8>,
    },
    Failed {
        /// 外部で開くための元リンク
        external_link: Option<String>,
    },
}

/// 成功するか Error に確定するまで取得を繰り返す
///
/// 各取得は全体タイムアウトで打ち切る。
pub async fn resolve_image(fetcher: &dyn ImageFetcher, resolver: &mut ImageResolver) -> ImageOutcome {
    loop {
        match resolver.status() {
            ImageStatus::Loaded | ImageStatus::Error => break,
            ImageStatus::Loading => {}
        }

        if resolver.retry_pending() {
            if let Some(deadline) = resolver.next_deadline() {
                tokio::time::sleep_until(deadline).await;
            }
            resolver.poll(Instant::now());
            continue;
        }

        let url = resolver.current_url();
        debug!(attempt = resolver.attempt(), url = %url, "写真を取得");

        let fetched = match resolver.give_up_at() {
            Some(deadline) => tokio::time::timeout_at(deadline, fetcher.fetch(&url)).await.ok(),
            None => Some(fetcher.fetch(&url).await),
        };

        match fetched {
            Some(Ok(bytes)) => {
                resolver.on_loaded();
                return ImageOutcome::Loaded {
                    url,
                    attempt: resolver.attempt(),
                    bytes,
                };
            }
            Some(Err(e)) => {
                warn!(attempt = resolver.attempt(), error = %e, "写真の取得に失敗");
                resolver.on_failed(Instant::now());
            }
            None => {
                resolver.poll(Instant::now());
            }
        }
    }

    ImageOutcome::Failed {
        external_link: resolver.external_link().map(str::to_string),
    }
}
