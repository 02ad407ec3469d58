//! 対話式確認モジュール
//!
//! キューを1件ずつ表示し、前後移動・回転・確認済み・ホームを選択させる。
//! 終了後はメニュー（未確認キュー / 履歴 / シートを開く / 終了）を出す。
//! 写真は表示対象が変わったときだけ取得し、同時に次の1件を先読みする。

use crate::error::{ReviewError, Result};
use crate::image::{resolve_image, ImageFetcher, ImageOutcome, ImagePolicy, ImageResolver};
use crate::session::{ReviewSession, RotateDirection, SessionState, WriteReceipt};
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use photo_review_common::{display_url, Record, ViewMode};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// 確認画面の操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Next,
    Prev,
    RotateLeft,
    RotateRight,
    MarkChecked,
    OpenPhoto,
    Home,
}

impl ReviewAction {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewAction::Next => "次へ",
            ReviewAction::Prev => "前へ",
            ReviewAction::RotateLeft => "左に回転",
            ReviewAction::RotateRight => "右に回転",
            ReviewAction::MarkChecked => "確認済みにする",
            ReviewAction::OpenPhoto => "写真を外部で開く",
            ReviewAction::Home => "ホームへ戻る",
        }
    }
}

/// 終了画面の操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Load(ViewMode),
    OpenSheet,
    Quit,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Load(ViewMode::Todo) => "未確認キュー (NUOVI)",
            MenuAction::Load(ViewMode::History) => "履歴を確認 (TUTTI)",
            MenuAction::OpenSheet => "スプレッドシートを開く",
            MenuAction::Quit => "終了",
        }
    }
}

pub struct ReviewOptions {
    pub mode: ViewMode,
    pub sheet_url: Option<String>,
    pub image_policy: ImagePolicy,
}

/// 先読み済みの写真
#[derive(Debug)]
struct Prefetched {
    row_index: i64,
    url: String,
    bytes: Vec<u8>,
}

/// 現在の状態で選べる操作
pub fn available_actions(session: &ReviewSession) -> Vec<ReviewAction> {
    if session.pending_finish().is_some() {
        return vec![ReviewAction::Home];
    }

    let mut actions = Vec::new();
    if session.can_advance() {
        actions.push(ReviewAction::Next);
    }
    if session.can_retreat() {
        actions.push(ReviewAction::Prev);
    }
    actions.extend([
        ReviewAction::MarkChecked,
        ReviewAction::RotateLeft,
        ReviewAction::RotateRight,
        ReviewAction::OpenPhoto,
        ReviewAction::Home,
    ]);
    actions
}

/// 1件分の表示
pub fn render_record(record: &Record, position: usize, total: usize, rotation: i32) -> String {
    let mut lines = Vec::new();

    let code = if record.code.is_empty() { "---" } else { record.code.as_str() };
    let mut header = format!("[{}/{}] {}", position + 1, total, code);
    if record.is_duplicate {
        header.push_str("  ⚠ DUPLICATO");
    }
    lines.push(header);

    if !record.operator_name.is_empty() {
        lines.push(format!("  担当: {}", record.operator_name.to_uppercase()));
    }

    let mut when = format!("  {} | {}", record.date, record.time);
    if record.status.is_reviewed() {
        when.push_str("  ✔ REGISTRATO");
    }
    lines.push(when);

    if rotation != 0 {
        lines.push(format!("  回転: {}°", rotation));
    }

    lines.join("\n")
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn select<T: Copy>(prompt: &str, items: &[(T, &str)]) -> Result<T> {
    let labels: Vec<&str> = items.iter().map(|(_, label)| *label).collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| ReviewError::Interaction(e.to_string()))?;
    Ok(items[idx].0)
}

async fn load_with_spinner(session: &mut ReviewSession, mode: ViewMode) {
    let pb = spinner("データベースを同期中...");
    let result = session.load(mode).await;
    pb.finish_and_clear();

    match result {
        Ok(0) if mode == ViewMode::Todo => println!("✓ 確認待ちの写真はありません\n"),
        Ok(0) => println!("写真がありません\n"),
        Ok(n) => println!("✔ {}件を読み込みました [{}]\n", n, mode.label()),
        Err(e) => println!("✖ 読み込みに失敗しました: {}\n", e),
    }
}

/// 次のレコードの先読み対象（行番号と初回の取得先URL）
pub fn prefetch_target(session: &ReviewSession) -> Option<(i64, String)> {
    let next = session.next_record()?;
    let link = next.photo_link.trim();
    if link.is_empty() {
        return None;
    }
    Some((next.row_index, display_url(link, 0)))
}

/// 初回の取得先だけを取得（失敗しても切り替えない）
async fn prefetch(
    fetcher: &dyn ImageFetcher,
    target: Option<(i64, String)>,
    limit: Duration,
) -> Option<Prefetched> {
    let (row_index, url) = target?;
    match tokio::time::timeout(limit, fetcher.fetch(&url)).await {
        Ok(Ok(bytes)) => {
            debug!(row = row_index, bytes = bytes.len(), "次の写真を先読み");
            Some(Prefetched { row_index, url, bytes })
        }
        Ok(Err(e)) => {
            debug!(row = row_index, error = %e, "先読みに失敗");
            None
        }
        Err(_) => {
            debug!(row = row_index, "先読みがタイムアウト");
            None
        }
    }
}

async fn show_photo(
    fetcher: &dyn ImageFetcher,
    record: &Record,
    policy: &ImagePolicy,
    cached: Option<Prefetched>,
) {
    if let Some(hit) = cached.filter(|p| p.row_index == record.row_index) {
        println!("  写真: {} ({} bytes, 先読み済み)", hit.url, hit.bytes.len());
        return;
    }

    let pb = spinner("写真を最適化中...");
    let mut resolver = ImageResolver::new(&record.photo_link, policy.clone(), Instant::now());
    let outcome = resolve_image(fetcher, &mut resolver).await;
    pb.finish_and_clear();

    match outcome {
        ImageOutcome::Loaded { url, attempt, bytes } => {
            println!("  写真: {} ({} bytes, 試行{})", url, bytes.len(), attempt + 1);
        }
        ImageOutcome::Failed { external_link: Some(link) } => {
            println!("  ✖ 写真を取得できません。外部で開いてください: {}", link);
        }
        ImageOutcome::Failed { external_link: None } => {
            println!("  ✖ 写真リンクがありません");
        }
    }
}

/// 完了済みの書き戻しを回収し、失敗件数を返す
fn collect_finished(receipts: &mut Vec<WriteReceipt>) -> usize {
    let mut failed = 0;
    receipts.retain_mut(|receipt| match receipt.try_outcome() {
        Some(true) => false,
        Some(false) => {
            println!("⚠ 行 {} の書き戻しに失敗しました", receipt.row_index());
            failed += 1;
            false
        }
        None => true,
    });
    failed
}

/// 書き戻しの完了を待つ（終了時に取りこぼさないため）
async fn drain_writes(receipts: Vec<WriteReceipt>) {
    let pending = receipts.len();
    let mut failed = 0;
    for receipt in receipts {
        if !receipt.outcome().await {
            failed += 1;
        }
    }
    if failed > 0 {
        println!("⚠ {}件中{}件の書き戻しに失敗しました", pending, failed);
    }
}

/// 対話式で確認を実行
///
/// # Arguments
/// * `session` - 確認セッション
/// * `fetcher` - 写真の取得確認に使う（Noneなら取得しない）
/// * `options` - 初期モード等
pub async fn run_interactive_review(
    session: &mut ReviewSession,
    fetcher: Option<&dyn ImageFetcher>,
    options: &ReviewOptions,
) -> Result<()> {
    let mut receipts: Vec<WriteReceipt> = Vec::new();
    // 写真を取得済みの (位置, 行番号)
    let mut shown: Option<(usize, i64)> = None;
    let mut prefetched: Option<Prefetched> = None;
    load_with_spinner(session, options.mode).await;

    loop {
        collect_finished(&mut receipts);

        if *session.state() == SessionState::Active {
            let Some(record) = session.current().cloned() else {
                session.return_home();
                continue;
            };

            println!("{}", render_record(&record, session.position(), session.len(), session.rotation()));

            let key = (session.position(), record.row_index);
            if shown != Some(key) {
                shown = Some(key);
                if let Some(fetcher) = fetcher {
                    let target = prefetch_target(session);
                    let (_, next) = tokio::join!(
                        show_photo(fetcher, &record, &options.image_policy, prefetched.take()),
                        prefetch(fetcher, target, options.image_policy.global_timeout),
                    );
                    prefetched = next;
                }
            }

            let items: Vec<(ReviewAction, &str)> = available_actions(session)
                .into_iter()
                .map(|a| (a, a.label()))
                .collect();

            match select("操作", &items)? {
                ReviewAction::Next => {
                    session.advance();
                }
                ReviewAction::Prev => {
                    session.retreat();
                }
                ReviewAction::RotateLeft => {
                    session.rotate(RotateDirection::Left);
                }
                ReviewAction::RotateRight => {
                    session.rotate(RotateDirection::Right);
                }
                ReviewAction::MarkChecked => {
                    if let Some(receipt) = session.mark_current_checked() {
                        println!("  → 確認済み (行 {})\n", receipt.row_index());
                        receipts.push(receipt);
                    }
                    session.settle().await;
                }
                ReviewAction::OpenPhoto => {
                    println!("  リンク: {}\n", record.photo_link);
                }
                ReviewAction::Home => session.return_home(),
            }
            continue;
        }

        let title = if session.is_empty() && session.mode() == ViewMode::Todo {
            "確認する写真はありません"
        } else {
            "管理メニュー"
        };
        println!("=== {} ===", title);

        let items: Vec<(MenuAction, &str)> = [
            MenuAction::Load(ViewMode::Todo),
            MenuAction::Load(ViewMode::History),
            MenuAction::OpenSheet,
            MenuAction::Quit,
        ]
        .into_iter()
        .map(|a| (a, a.label()))
        .collect();

        match select("メニュー", &items)? {
            MenuAction::Load(mode) => {
                load_with_spinner(session, mode).await;
                shown = None;
                prefetched = None;
            }
            MenuAction::OpenSheet => match options.sheet_url.as_deref() {
                Some(url) => println!("  シート: {}\n", url),
                None => println!("  シートURLが未設定です（config --set-sheet-url）\n"),
            },
            MenuAction::Quit => break,
        }
    }

    drain_writes(receipts).await;
    Ok(())
}
