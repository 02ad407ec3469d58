//! 確認セッションの統合テスト
//!
//! メモリ上のAPIで読み込み・移動・回転・確認済み・終了を検証

use async_trait::async_trait;
use photo_review::api::SheetApi;
use photo_review::error::{ReviewError, Result};
use photo_review::review::{available_actions, prefetch_target, ReviewAction};
use photo_review::session::{ReviewSession, RotateDirection, SessionState, FINISH_DELAY};
use photo_review_common::{RowStatus, ViewMode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// メモリ上のスプレッドシート
struct FakeSheet {
    rows: Mutex<Vec<Value>>,
    read_fails: Mutex<bool>,
    cleanup_fails: bool,
    mark_succeeds: bool,
    cleanup_calls: AtomicUsize,
    marked: Mutex<Vec<i64>>,
}

impl FakeSheet {
    fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: Mutex::new(rows),
            read_fails: Mutex::new(false),
            cleanup_fails: false,
            mark_succeeds: true,
            cleanup_calls: AtomicUsize::new(0),
            marked: Mutex::new(Vec::new()),
        }
    }

    fn marked(&self) -> Vec<i64> {
        self.marked.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetApi for FakeSheet {
    async fn read_all(&self) -> Result<Vec<Value>> {
        if *self.read_fails.lock().unwrap() {
            return Err(ReviewError::ApiStatus(503));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn cleanup_old(&self) -> Result<()> {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        if self.cleanup_fails {
            return Err(ReviewError::ApiStatus(500));
        }
        Ok(())
    }

    async fn mark_check(&self, row_index: i64) -> Result<bool> {
        self.marked.lock().unwrap().push(row_index);
        Ok(self.mark_succeeds)
    }

    async fn delete_checked(&self) -> Result<bool> {
        Ok(true)
    }
}

fn sample_rows() -> Vec<Value> {
    vec![
        json!({ "codice": "C3", "nomeOperatore": "Verdi", "linkFoto": "https://example.com/3.jpg" }),
        json!({ "codice": "A1", "operatore": "Bianchi", "stato": "" }),
        json!({ "codice": "B2", "Operatore": "bianchi", "stato": "controllato" }),
        json!({ "codice": "D4", "stato": "NUOVO" }),
    ]
}

async fn loaded_session(rows: Vec<Value>, mode: ViewMode) -> (ReviewSession, Arc<FakeSheet>) {
    let api = Arc::new(FakeSheet::new(rows));
    let mut session = ReviewSession::new(api.clone());
    session.load(mode).await.expect("読み込み失敗");
    (session, api)
}

/// 重複コード・状態混在のバッチ
#[tokio::test]
async fn test_load_todo_scenario() {
    let rows = vec![
        json!({ "codice": "A1", "stato": "" }),
        json!({ "codice": "A1", "stato": "Controllato" }),
        json!({ "codice": "B9", "stato": "CONTROLLATO" }),
    ];
    let (session, api) = loaded_session(rows, ViewMode::Todo).await;

    assert_eq!(*session.state(), SessionState::Active);
    assert_eq!(session.len(), 1);
    let current = session.current().expect("現在のレコードがない");
    assert_eq!(current.row_index, 2);
    assert!(current.is_duplicate);
    assert_eq!(api.cleanup_calls.load(Ordering::SeqCst), 1);
}

/// 並び順と履歴モード
#[tokio::test]
async fn test_load_order_and_history() {
    let (todo, _) = loaded_session(sample_rows(), ViewMode::Todo).await;
    let rows: Vec<i64> = todo.queue().iter().map(|r| r.row_index).collect();
    assert_eq!(rows, vec![3, 2, 5]);

    let (history, _) = loaded_session(sample_rows(), ViewMode::History).await;
    let rows: Vec<i64> = history.queue().iter().map(|r| r.row_index).collect();
    assert_eq!(rows, vec![3, 4, 2, 5]);
    assert_eq!(history.mode(), ViewMode::History);
}

/// 空バッチは即終了、操作不可
#[tokio::test]
async fn test_empty_batch_finishes() {
    let (mut session, api) = loaded_session(Vec::new(), ViewMode::Todo).await;

    assert_eq!(*session.state(), SessionState::Finished);
    assert!(session.current().is_none());
    assert!(!session.advance());
    assert!(!session.retreat());
    assert!(session.mark_current_checked().is_none());
    assert!(api.marked().is_empty());
}

/// 取得失敗時は直前のキューを保持
#[tokio::test]
async fn test_fetch_failure_keeps_queue() {
    let (mut session, api) = loaded_session(sample_rows(), ViewMode::Todo).await;
    session.advance();
    let before: Vec<i64> = session.queue().iter().map(|r| r.row_index).collect();

    *api.read_fails.lock().unwrap() = true;
    let result = session.load(ViewMode::History).await;

    assert!(matches!(result, Err(ReviewError::ApiStatus(503))));
    assert!(matches!(session.state(), SessionState::Failed(msg) if msg.contains("503")));
    let after: Vec<i64> = session.queue().iter().map(|r| r.row_index).collect();
    assert_eq!(before, after);
    assert_eq!(session.position(), 1);

    // 再読み込みで回復
    *api.read_fails.lock().unwrap() = false;
    session.load(ViewMode::Todo).await.unwrap();
    assert_eq!(*session.state(), SessionState::Active);
    assert_eq!(session.position(), 0);
}

/// クリーンアップ失敗は無視して続行
#[tokio::test]
async fn test_cleanup_failure_swallowed() {
    let mut api = FakeSheet::new(sample_rows());
    api.cleanup_fails = true;
    let mut session = ReviewSession::new(Arc::new(api));

    let count = session.load(ViewMode::Todo).await.expect("読み込み失敗");
    assert_eq!(count, 3);
    assert_eq!(*session.state(), SessionState::Active);
}

/// 前後移動は範囲内に制限され、移動で回転がリセットされる
#[tokio::test]
async fn test_navigation_clamped() {
    let (mut session, _) = loaded_session(sample_rows(), ViewMode::Todo).await;

    assert!(!session.retreat());
    assert_eq!(session.position(), 0);

    session.rotate(RotateDirection::Right);
    assert!(session.advance());
    assert_eq!(session.rotation(), 0);
    assert!(session.advance());
    assert!(!session.advance());
    assert_eq!(session.position(), 2);

    session.rotate(RotateDirection::Left);
    assert!(!session.advance());
    assert_eq!(session.rotation(), -90, "移動しなければ回転は維持");

    assert!(session.retreat());
    assert_eq!(session.position(), 1);
    assert_eq!(session.rotation(), 0);
}

/// 回転は正規化せず累積
#[tokio::test]
async fn test_rotation_accumulates() {
    let (mut session, _) = loaded_session(sample_rows(), ViewMode::Todo).await;

    for _ in 0..4 {
        session.rotate(RotateDirection::Left);
    }
    assert_eq!(session.rotation(), -360);

    for _ in 0..5 {
        session.rotate(RotateDirection::Right);
    }
    assert_eq!(session.rotation(), 90);
}

/// 途中の確認済みは即座に次へ
#[tokio::test]
async fn test_mark_checked_advances_immediately() {
    let (mut session, api) = loaded_session(sample_rows(), ViewMode::Todo).await;
    let first_row = session.current().unwrap().row_index;

    let receipt = session.mark_current_checked().expect("受領票がない");
    assert_eq!(receipt.row_index(), first_row);
    assert_eq!(session.position(), 1);
    assert_eq!(session.queue()[0].status, RowStatus::Checked);
    assert_eq!(*session.state(), SessionState::Active);

    assert!(receipt.outcome().await);
    assert_eq!(api.marked(), vec![first_row]);
}

/// 最後の確認済みは一定時間後に終了
#[tokio::test(start_paused = true)]
async fn test_mark_last_finishes_after_delay() {
    let (mut session, _) = loaded_session(sample_rows(), ViewMode::Todo).await;
    while session.advance() {}
    let last = session.position();

    let _receipt = session.mark_current_checked().expect("受領票がない");
    assert_eq!(session.position(), last);
    assert_eq!(*session.state(), SessionState::Active);

    tokio::time::advance(FINISH_DELAY - Duration::from_millis(1)).await;
    assert!(!session.poll(Instant::now()));
    assert_eq!(*session.state(), SessionState::Active);

    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(session.poll(Instant::now()));
    assert_eq!(*session.state(), SessionState::Finished);
    assert_eq!(session.len(), 3);
}

/// settle は終了待ちの期限まで待つ
#[tokio::test(start_paused = true)]
async fn test_settle_waits_for_finish() {
    let (mut session, _) = loaded_session(vec![json!({ "codice": "Z" })], ViewMode::Todo).await;
    let start = Instant::now();

    session.mark_current_checked();
    session.settle().await;

    assert_eq!(*session.state(), SessionState::Finished);
    assert!(Instant::now() - start >= FINISH_DELAY);
}

/// 書き戻し失敗はナビゲーションに影響しない
#[tokio::test]
async fn test_write_failure_does_not_block() {
    let mut api = FakeSheet::new(sample_rows());
    api.mark_succeeds = false;
    let api = Arc::new(api);
    let mut session = ReviewSession::new(api.clone());
    session.load(ViewMode::Todo).await.unwrap();

    let receipt = session.mark_current_checked().unwrap();
    assert_eq!(session.position(), 1);
    assert!(session.queue()[0].status.is_reviewed());
    assert!(!receipt.outcome().await);
    assert_eq!(api.marked().len(), 1);
}

/// 受領票を破棄しても書き戻しは実行される
#[tokio::test]
async fn test_dropped_receipt_still_writes() {
    let (mut session, api) = loaded_session(sample_rows(), ViewMode::Todo).await;
    drop(session.mark_current_checked());

    for _ in 0..10 {
        if !api.marked().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(api.marked(), vec![3]);
}

/// ホームはキューを変えずに終了
#[tokio::test]
async fn test_return_home() {
    let (mut session, _) = loaded_session(sample_rows(), ViewMode::Todo).await;
    session.advance();
    session.return_home();

    assert_eq!(*session.state(), SessionState::Finished);
    assert_eq!(session.len(), 3);
    assert_eq!(session.position(), 1);
    assert!(!session.advance());
    assert!(session.mark_current_checked().is_none());
}

/// 終了待ちの間は確認済み・移動を受け付けない
#[tokio::test(start_paused = true)]
async fn test_finish_window_blocks_actions() {
    let delay = Duration::from_millis(200);
    let api = Arc::new(FakeSheet::new(sample_rows()));
    let mut session = ReviewSession::new(api.clone()).with_finish_delay(delay);
    session.load(ViewMode::Todo).await.unwrap();
    while session.advance() {}
    let last = session.position();
    let last_row = session.current().unwrap().row_index;

    let marked_at = Instant::now();
    let receipt = session.mark_current_checked().expect("受領票がない");
    assert_eq!(session.pending_finish(), Some(marked_at + delay));
    assert_eq!(available_actions(&session), vec![ReviewAction::Home]);

    assert!(session.mark_current_checked().is_none(), "同じ行を二重に書き戻さない");
    assert!(!session.retreat());
    assert!(!session.advance());
    assert_eq!(session.position(), last);

    tokio::time::advance(delay).await;
    assert!(session.poll(Instant::now()));
    assert_eq!(*session.state(), SessionState::Finished);
    assert_eq!(session.pending_finish(), None);

    assert!(receipt.outcome().await);
    assert_eq!(api.marked(), vec![last_row]);
}

/// 受領票は完了前には結果を返さない
#[tokio::test]
async fn test_try_outcome_after_completion() {
    let (mut session, _) = loaded_session(sample_rows(), ViewMode::Todo).await;
    let mut receipt = session.mark_current_checked().unwrap();

    assert_eq!(receipt.try_outcome(), None);
    let mut result = None;
    for _ in 0..10 {
        tokio::task::yield_now().await;
        result = receipt.try_outcome();
        if result.is_some() {
            break;
        }
    }
    assert_eq!(result, Some(true));
}

/// 先読みは次のレコードの初回取得先
#[tokio::test]
async fn test_prefetch_target_follows_position() {
    let rows = vec![
        json!({ "codice": "A", "nomeOperatore": "Aldo" }),
        json!({ "codice": "B", "nomeOperatore": "Bruno", "linkFoto": "https://drive.google.com/file/d/1AbCdEfGhIjKlMnOpQrStUvWxYz_-09/view" }),
        json!({ "codice": "C", "nomeOperatore": "Carlo", "linkFoto": "  " }),
    ];
    let (mut session, _) = loaded_session(rows, ViewMode::Todo).await;

    let (row, url) = prefetch_target(&session).expect("先読み対象がない");
    assert_eq!(row, 3);
    assert_eq!(
        url,
        "https://drive.google.com/thumbnail?id=1AbCdEfGhIjKlMnOpQrStUvWxYz_-09&sz=w1000&cb=0"
    );

    // 次がリンクなし・末尾なら先読みしない
    session.advance();
    assert!(prefetch_target(&session).is_none());
    session.advance();
    assert!(prefetch_target(&session).is_none());
}
