//! APIレスポンスパーサー
//!
//! スプレッドシートAPIのレスポンスを解釈する:
//! - readAll: 生の配列、または `{status, data, message}` 形式
//! - markCheck / deleteChecked: JSONまたは素のテキスト

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// `{status, data, message}` 形式のレスポンス
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    message: Option<String>,
}

/// readAllのレスポンスから生の行データを取り出す
///
/// # Arguments
/// * `body` - レスポンス本文
///
/// # Returns
/// * `Ok(Vec<Value>)` - 行データ
/// * `Err` - JSONでない、またはAPIがエラーを返した場合
///
/// # Examples
/// ```
/// use photo_review_common::parse_batch_response;
///
/// let rows = parse_batch_response(r#"[{"codice": "A1"}]"#).unwrap();
/// assert_eq!(rows.len(), 1);
/// ```
pub fn parse_batch_response(body: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(body.trim())?;

    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(_) => {
            let envelope: Envelope = serde_json::from_value(value)?;
            if envelope.status.eq_ignore_ascii_case("error") {
                return Err(Error::Remote(
                    envelope.message.unwrap_or_else(|| "unknown error".into()),
                ));
            }
            envelope
                .data
                .ok_or_else(|| Error::Parse("data配列がありません".into()))
        }
        _ => Err(Error::Parse("行データの配列ではありません".into())),
    }
}

/// 書き込み系レスポンスの成否を判定
///
/// JSONなら `status == "success"` または本文に `OK` を含めば成功。
/// JSONでなければ `OK` 単独、または `success` を含めば成功。
pub fn is_success_response(body: &str) -> bool {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            value.get("status").and_then(Value::as_str) == Some("success") || body.contains("OK")
        }
        Err(_) => {
            body.trim().to_uppercase() == "OK" || body.to_lowercase().contains("success")
        }
    }
}
