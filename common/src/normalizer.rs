//! レコード正規化モジュール
//!
//! APIから取得した形の揃わない生データを `Record` に変換する。
//!
//! ## 処理内容
//! 1. エイリアス候補から担当者名・日付・時刻を解決
//! 2. ISO形式の日付を `DD-MM-YYYY` に変換
//! 3. 行番号の補完（未指定時は `位置 + 2`）
//!
//! 個々のレコードが壊れていても失敗させず、既定値で通す。

use crate::alias::{
    self, CODE_FIELD, DATE_FIELDS, OPERATOR_FIELDS, PHOTO_LINK_FIELD, ROW_INDEX_FIELD,
    STATUS_FIELD, TIME_FIELDS,
};
use crate::types::{Record, RowStatus};
use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// シートの1行目はヘッダー、かつ1始まりなので位置に加算する
pub const ROW_INDEX_OFFSET: i64 = 2;

/// オフセット無しのタイムスタンプ書式（ローカル時刻として解釈）
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// バッチ全体を正規化
pub fn normalize_batch(raw_rows: &[Value]) -> Vec<Record> {
    raw_rows
        .iter()
        .enumerate()
        .map(|(position, raw)| normalize_record(raw, position))
        .collect()
}

/// 1行を正規化
///
/// # Arguments
/// * `raw` - APIの生データ（オブジェクト以外は空として扱う）
/// * `position` - バッチ内の位置（0始まり）
pub fn normalize_record(raw: &Value, position: usize) -> Record {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    let extra = fields
        .iter()
        .filter(|(name, _)| !alias::is_consumed_field(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Record {
        row_index: resolve_row_index(fields, position),
        code: alias::field_string(fields, CODE_FIELD),
        photo_link: alias::field_string(fields, PHOTO_LINK_FIELD).trim().to_string(),
        operator_name: alias::first_non_empty(fields, OPERATOR_FIELDS),
        status: RowStatus::parse(&alias::field_string(fields, STATUS_FIELD)),
        date: normalize_date(&alias::first_non_empty(fields, DATE_FIELDS)),
        time: alias::first_non_empty(fields, TIME_FIELDS),
        is_duplicate: false,
        extra,
    }
}

/// 行番号を解決
///
/// 数値（または整数文字列）があればそれを使い、無ければ `position + 2`。
pub fn resolve_row_index(fields: &Map<String, Value>, position: usize) -> i64 {
    let explicit = match fields.get(ROW_INDEX_FIELD) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    explicit.unwrap_or(position as i64 + ROW_INDEX_OFFSET)
}

/// 日付文字列を表示用に変換
///
/// `T` と `-` を両方含む場合のみタイムスタンプとして解釈する。
/// 解釈できなければ元の文字列をそのまま返す。
pub fn normalize_date(raw: &str) -> String {
    if !(raw.contains('T') && raw.contains('-')) {
        return raw.to_string();
    }

    match format_display_date(raw) {
        Some(formatted) => formatted,
        None => {
            tracing::warn!(date = raw, "日付を変換できません");
            raw.to_string()
        }
    }
}

/// タイムスタンプを `DD-MM-YYYY` に変換
///
/// 日・月はUTC、年はローカル時刻で算出する。
pub fn format_display_date(raw: &str) -> Option<String> {
    let utc = parse_timestamp(raw)?;
    let local_year = utc.with_timezone(&Local).year();
    Some(format!("{:02}-{:02}-{}", utc.day(), utc.month(), local_year))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    })
}
