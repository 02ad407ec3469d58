//! 確認セッション
//!
//! キュー上の現在位置・回転角・状態を保持し、ユーザー操作を適用する。
//!
//! ## 状態遷移
//! - `load`: Loading → Active（空なら Finished）、取得失敗で Failed
//! - 最後の1件を確認済みにすると、一定時間後に Finished（待機中は操作不可）
//! - `return_home`: いつでも Finished

mod write;

pub use write::WriteReceipt;

use crate::api::SheetApi;
use crate::error::Result;
use photo_review_common::{prepare_queue, Record, ViewMode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// 最後の1件を確認してから終了画面に移るまでの表示時間
pub const FINISH_DELAY: Duration = Duration::from_millis(500);

/// 1回の回転角（度）
pub const ROTATION_STEP: i32 = 90;

/// セッション状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Active,
    Finished,
    /// 取得失敗（直前のキューは保持）
    Failed(String),
}

/// 回転方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    pub fn delta(&self) -> i32 {
        match self {
            RotateDirection::Left => -ROTATION_STEP,
            RotateDirection::Right => ROTATION_STEP,
        }
    }
}

pub struct ReviewSession {
    api: Arc<dyn SheetApi>,
    queue: Vec<Record>,
    position: usize,
    rotation: i32,
    state: SessionState,
    mode: ViewMode,
    finish_at: Option<Instant>,
    finish_delay: Duration,
}

impl ReviewSession {
    pub fn new(api: Arc<dyn SheetApi>) -> Self {
        Self {
            api,
            queue: Vec::new(),
            position: 0,
            rotation: 0,
            state: SessionState::Loading,
            mode: ViewMode::Todo,
            finish_at: None,
            finish_delay: FINISH_DELAY,
        }
    }

    pub fn with_finish_delay(mut self, delay: Duration) -> Self {
        self.finish_delay = delay;
        self
    }

    /// バッチを取得してキューを作り直す
    ///
    /// `&mut self` を取るため同一セッションでの読み込みは重ならない。
    /// 取得に失敗した場合は `Failed` に遷移し、直前のキューはそのまま残す。
    ///
    /// # Returns
    /// 新しいキューの件数
    pub async fn load(&mut self, mode: ViewMode) -> Result<usize> {
        self.state = SessionState::Loading;
        self.mode = mode;
        self.finish_at = None;

        if let Err(e) = self.api.cleanup_old().await {
            warn!(error = %e, "古い行のクリーンアップに失敗、続行します");
        }

        let raw = match self.api.read_all().await {
            Ok(raw) => raw,
            Err(e) => {
                self.state = SessionState::Failed(e.to_string());
                return Err(e);
            }
        };

        self.queue = prepare_queue(&raw, mode);
        self.position = 0;
        self.rotation = 0;
        self.state = if self.queue.is_empty() {
            SessionState::Finished
        } else {
            SessionState::Active
        };

        info!(mode = %mode, batch = raw.len(), queue = self.queue.len(), "キューを構築");
        Ok(self.queue.len())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn queue(&self) -> &[Record] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn current(&self) -> Option<&Record> {
        self.queue.get(self.position)
    }

    /// 先読み用の次のレコード
    pub fn next_record(&self) -> Option<&Record> {
        self.queue.get(self.position + 1)
    }

    /// 操作を受け付けるか（終了待ちの間は受け付けない）
    fn accepts_input(&self) -> bool {
        self.state == SessionState::Active && self.finish_at.is_none()
    }

    pub fn can_advance(&self) -> bool {
        self.accepts_input() && self.position + 1 < self.queue.len()
    }

    pub fn can_retreat(&self) -> bool {
        self.accepts_input() && self.position > 0
    }

    /// 終了待ちの期限
    pub fn pending_finish(&self) -> Option<Instant> {
        self.finish_at
    }

    fn move_to(&mut self, position: usize) {
        self.position = position;
        self.rotation = 0;
    }

    /// 次へ（末尾では何もしない）
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        self.move_to(self.position + 1);
        true
    }

    /// 前へ（先頭では何もしない）
    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.move_to(self.position - 1);
        true
    }

    /// 回転（360で正規化しない）
    pub fn rotate(&mut self, direction: RotateDirection) -> i32 {
        self.rotation += direction.delta();
        self.rotation
    }

    /// 現在のレコードを確認済みにする
    ///
    /// ローカル状態を即時に更新し、書き戻しは別タスクで行う。
    /// 途中なら次へ進み、最後なら `FINISH_DELAY` 後に終了する。
    pub fn mark_current_checked(&mut self) -> Option<WriteReceipt> {
        if !self.accepts_input() {
            return None;
        }

        let position = self.position;
        let record = self.queue.get_mut(position)?;
        record.mark_reviewed();
        let row_index = record.row_index;

        if position + 1 < self.queue.len() {
            self.move_to(position + 1);
        } else {
            self.finish_at = Some(Instant::now() + self.finish_delay);
        }

        Some(WriteReceipt::spawn(Arc::clone(&self.api), row_index))
    }

    /// 期限を過ぎた終了待ちを反映
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.finish_at {
            Some(deadline) if deadline <= now => {
                self.finish_at = None;
                self.state = SessionState::Finished;
                true
            }
            _ => false,
        }
    }

    /// 終了待ちがあれば期限まで待って反映
    pub async fn settle(&mut self) {
        if let Some(deadline) = self.finish_at {
            tokio::time::sleep_until(deadline).await;
            self.poll(Instant::now());
        }
    }

    /// ホームへ戻る（キューは変更しない）
    pub fn return_home(&mut self) {
        self.finish_at = None;
        self.state = SessionState::Finished;
    }
}
