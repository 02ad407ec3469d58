//! 確認レコードの型定義
//!
//! - Record: 正規化済みの1行（写真1枚）
//! - RowStatus: 行の状態（閉じたバリアント + 不明値）
//! - ViewMode: 未確認キュー / 全件履歴

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 確認済みを表すマーカー値（大文字小文字を区別しない）
pub const REVIEWED_MARKER: &str = "CONTROLLATO";

/// 新規を表す値
pub const NEW_MARKER: &str = "NUOVO";

/// 重複を表す値
pub const DUPLICATE_MARKER: &str = "DUPLICATO";

/// 行の状態
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RowStatus {
    /// 未確認（空欄を含む）
    #[default]
    New,
    /// 確認済み
    Checked,
    /// 重複としてマーク済み
    Duplicate,
    /// 上記以外の値（元の文字列を保持）
    Unknown(String),
}

impl RowStatus {
    /// 生の状態文字列から変換
    ///
    /// 確認済みマーカーとの比較は大文字化した値で行う（前後空白は除去しない）。
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return RowStatus::New;
        }

        match raw.to_uppercase().as_str() {
            REVIEWED_MARKER => RowStatus::Checked,
            NEW_MARKER => RowStatus::New,
            DUPLICATE_MARKER => RowStatus::Duplicate,
            _ => RowStatus::Unknown(raw.to_string()),
        }
    }

    /// 確認済みかどうか
    pub fn is_reviewed(&self) -> bool {
        matches!(self, RowStatus::Checked)
    }

    /// API側に書き戻す際の文字列表現
    pub fn as_str(&self) -> &str {
        match self {
            RowStatus::New => NEW_MARKER,
            RowStatus::Checked => REVIEWED_MARKER,
            RowStatus::Duplicate => DUPLICATE_MARKER,
            RowStatus::Unknown(raw) => raw,
        }
    }
}

impl From<String> for RowStatus {
    fn from(raw: String) -> Self {
        RowStatus::parse(&raw)
    }
}

impl From<RowStatus> for String {
    fn from(status: RowStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 表示モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// 未確認のみ
    #[default]
    Todo,
    /// 確認済みを含む全件
    History,
}

impl ViewMode {
    /// 画面ヘッダー用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Todo => "CODA",
            ViewMode::History => "STORICO",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Todo => write!(f, "todo"),
            ViewMode::History => write!(f, "history"),
        }
    }
}

/// 正規化済みレコード
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// シート上の行番号（書き戻しキー）
    pub row_index: i64,

    #[serde(default)]
    pub code: String,             // 識別コード（重複あり得る）

    #[serde(default)]
    pub photo_link: String,       // 写真リンク（形式は不定）

    #[serde(default)]
    pub operator_name: String,    // 担当者名

    #[serde(default)]
    pub status: RowStatus,

    /// 表示用の日付（DD-MM-YYYY）
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub time: String,

    /// 同一バッチ内でコードが重複しているか（算出値）
    #[serde(default)]
    pub is_duplicate: bool,

    /// 正規化で消費しなかった元のフィールド
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// 確認済みマーカーを付与
    pub fn mark_reviewed(&mut self) {
        self.status = RowStatus::Checked;
    }
}
