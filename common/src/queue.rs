//! 確認キュー構築モジュール
//!
//! 正規化・重複判定済みのバッチを表示モードで絞り込み、
//! 担当者名 → 行番号 の順で並べる。

use crate::duplicates::flag_duplicates;
use crate::normalizer::normalize_batch;
use crate::types::{Record, ViewMode};
use serde_json::Value;
use std::cmp::Ordering;

/// 担当者名が空のレコードを末尾に送るための番兵値
pub const MISSING_OPERATOR_SENTINEL: &str = "ZZZ";

/// 表示モードに応じて残すかどうか
pub fn is_in_queue(record: &Record, mode: ViewMode) -> bool {
    match mode {
        ViewMode::Todo => !record.status.is_reviewed(),
        ViewMode::History => true,
    }
}

/// 並び順のキー（大文字化した担当者名）
fn operator_key(record: &Record) -> String {
    if record.operator_name.is_empty() {
        MISSING_OPERATOR_SENTINEL.to_string()
    } else {
        record.operator_name.to_uppercase()
    }
}

/// キューの全順序: 担当者名（大文字） → 行番号
pub fn queue_order(a: &Record, b: &Record) -> Ordering {
    operator_key(a)
        .cmp(&operator_key(b))
        .then_with(|| a.row_index.cmp(&b.row_index))
}

/// キューを構築
///
/// # Arguments
/// * `records` - 正規化・重複判定済みのバッチ
/// * `mode` - 表示モード
///
/// # Returns
/// 並べ替え済みのキュー（空なら確認対象なし）
pub fn build_queue(records: Vec<Record>, mode: ViewMode) -> Vec<Record> {
    let mut queue: Vec<Record> = records
        .into_iter()
        .filter(|r| is_in_queue(r, mode))
        .collect();

    queue.sort_by(queue_order);
    queue
}

/// 生データからキューまでを一括処理（正規化 → 重複判定 → 絞り込み・並べ替え）
pub fn prepare_queue(raw_rows: &[Value], mode: ViewMode) -> Vec<Record> {
    let mut records = normalize_batch(raw_rows);
    flag_duplicates(&mut records);
    build_queue(records, mode)
}
