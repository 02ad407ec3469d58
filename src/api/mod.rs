//! スプレッドシートAPI連携モジュール
//!
//! すべての操作は `GET ?action=...&key=...` で行う。
//! - readAll: 全行取得
//! - cleanupOld: 古い行の削除（ベストエフォート）
//! - markCheck: 指定行を確認済みにする
//! - deleteChecked: 確認済み行の削除

mod http;

pub use http::HttpSheetApi;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// API接続設定（起動時に組み立てて渡す）
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub key: String,
    pub timeout: Duration,
}

/// リモートのスプレッドシートAPI
#[async_trait]
pub trait SheetApi: Send + Sync {
    /// 全行を生データのまま取得
    async fn read_all(&self) -> Result<Vec<Value>>;

    /// 古い行の削除を依頼（レスポンスは見ない）
    async fn cleanup_old(&self) -> Result<()>;

    /// 行を確認済みにする。成功マーカーが返れば `true`
    async fn mark_check(&self, row_index: i64) -> Result<bool>;

    /// 確認済み行を削除。成功マーカーが返れば `true`
    async fn delete_checked(&self) -> Result<bool>;
}
