//! 確認済み書き戻しタスク
//!
//! 書き込みは待たずに画面遷移を進める（最大1回、再送なし）。
//! 結果は必要な呼び出し側だけがチャネル経由で受け取れる。

use crate::api::SheetApi;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// 書き戻しの受領票
#[derive(Debug)]
pub struct WriteReceipt {
    row_index: i64,
    result: oneshot::Receiver<bool>,
}

impl WriteReceipt {
    /// 書き戻しタスクを起動（呼び出し元は待たない）
    pub(crate) fn spawn(api: Arc<dyn SheetApi>, row_index: i64) -> Self {
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let ok = match api.mark_check(row_index).await {
                Ok(true) => {
                    info!(row = row_index, "確認済みを書き戻し");
                    true
                }
                Ok(false) => {
                    warn!(row = row_index, "書き戻しが成功を返しませんでした");
                    false
                }
                Err(e) => {
                    error!(row = row_index, error = %e, "書き戻しに失敗");
                    false
                }
            };
            // 受領票が破棄されていても問題ない
            let _ = tx.send(ok);
        });

        Self { row_index, result: rx }
    }

    pub fn row_index(&self) -> i64 {
        self.row_index
    }

    /// 書き戻し結果を待つ
    pub async fn outcome(self) -> bool {
        self.result.await.unwrap_or(false)
    }

    /// 完了していれば結果を返す
    pub fn try_outcome(&mut self) -> Option<bool> {
        match self.result.try_recv() {
            Ok(ok) => Some(ok),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(false),
        }
    }
}
