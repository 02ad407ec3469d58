//! フィールド名エイリアス解決モジュール
//!
//! APIの生データは列名の表記ゆれ（大文字小文字・区切り文字）があるため、
//! 候補名を順に見て最初の空でない値を採用する。

use serde_json::{Map, Value};

/// 担当者名の候補フィールド
pub const OPERATOR_FIELDS: &[&str] = &["nomeOperatore", "operatore", "Operatore", "nome_operatore"];

/// 日付の候補フィールド
pub const DATE_FIELDS: &[&str] = &["data", "Data"];

/// 時刻の候補フィールド
pub const TIME_FIELDS: &[&str] = &["ora", "Ora", "ORA"];

/// 識別コード
pub const CODE_FIELD: &str = "codice";

/// 写真リンク
pub const PHOTO_LINK_FIELD: &str = "linkFoto";

/// 状態
pub const STATUS_FIELD: &str = "stato";

/// 行番号
pub const ROW_INDEX_FIELD: &str = "rowIndex";

/// 正規化後のレコードが出力するキー（元データ側の同名キーは残さない）
pub const RECORD_KEYS: &[&str] = &[
    "rowIndex",
    "code",
    "photoLink",
    "operatorName",
    "status",
    "date",
    "time",
    "isDuplicate",
];

/// スカラー値を文字列化
///
/// null・配列・オブジェクトは値なしとして扱う。
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 候補フィールドから最初の空でない値を取得（前後空白除去済み）
pub fn first_non_empty(raw: &Map<String, Value>, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|field| raw.get(*field))
        .filter_map(scalar_to_string)
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// 単一フィールドの値を取得（加工なし）
pub fn field_string(raw: &Map<String, Value>, field: &str) -> String {
    raw.get(field).and_then(scalar_to_string).unwrap_or_default()
}

/// 正規化で消費されるフィールド名かどうか
pub fn is_consumed_field(name: &str) -> bool {
    [CODE_FIELD, PHOTO_LINK_FIELD, STATUS_FIELD, ROW_INDEX_FIELD].contains(&name)
        || RECORD_KEYS.contains(&name)
        || OPERATOR_FIELDS.contains(&name)
        || DATE_FIELDS.contains(&name)
        || TIME_FIELDS.contains(&name)
}
