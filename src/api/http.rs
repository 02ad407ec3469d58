use super::{ApiConfig, SheetApi};
use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use photo_review_common::{is_success_response, parse_batch_response};
use serde_json::Value;
use tracing::{debug, info};

/// reqwestによるSheetApi実装
pub struct HttpSheetApi {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl HttpSheetApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http_client })
    }

    /// アクションを実行し、本文を文字列で返す
    async fn call(&self, action: &str, extra: &[(&str, String)]) -> Result<String> {
        let mut query: Vec<(&str, String)> = vec![("action", action.to_string())];
        query.extend(extra.iter().cloned());
        query.push(("key", self.config.key.clone()));

        debug!(action = action, "API呼び出し");

        let resp = self
            .http_client
            .get(&self.config.base_url)
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReviewError::ApiStatus(status.as_u16()));
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl SheetApi for HttpSheetApi {
    async fn read_all(&self) -> Result<Vec<Value>> {
        let body = self.call("readAll", &[]).await?;
        let rows = parse_batch_response(&body)?;
        info!(rows = rows.len(), "全行を取得");
        Ok(rows)
    }

    async fn cleanup_old(&self) -> Result<()> {
        self.call("cleanupOld", &[]).await?;
        Ok(())
    }

    async fn mark_check(&self, row_index: i64) -> Result<bool> {
        let body = self.call("markCheck", &[("row", row_index.to_string())]).await?;
        Ok(is_success_response(&body))
    }

    async fn delete_checked(&self) -> Result<bool> {
        let body = self.call("deleteChecked", &[]).await?;
        Ok(is_success_response(&body))
    }
}
