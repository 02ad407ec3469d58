//! 写真URL解決モジュール
//!
//! 写真リンクからGoogle DriveのファイルIDを抽出し、試行回数に応じて
//! 取得先を切り替える（レート制限・障害の回避用）。
//!
//! | attempt | 取得先 |
//! |---------|--------|
//! | 0, 1    | drive.google.com サムネイル（w1000） |
//! | 2       | lh3.googleusercontent.com |
//! | 3以上   | images.weserv.nl プロキシ経由のサムネイル |

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // .../d/<id>/view 形式
    static ref PATH_ID_RE: Regex = Regex::new(r"/d/([a-zA-Z0-9_-]{25,})").unwrap();
    // ...?id=<id> 形式
    static ref QUERY_ID_RE: Regex = Regex::new(r"[?&]id=([a-zA-Z0-9_-]{25,})").unwrap();
}

/// 同じテンプレートを使う最後の試行番号
const THUMBNAIL_LAST_ATTEMPT: u32 = 1;

/// 別ホストを使う試行番号
const ALTERNATE_HOST_ATTEMPT: u32 = 2;

/// 写真リンクからファイルIDを抽出（パス形式を優先）
pub fn extract_drive_id(link: &str) -> Option<&str> {
    PATH_ID_RE
        .captures(link)
        .or_else(|| QUERY_ID_RE.captures(link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn thumbnail_source(id: &str) -> String {
    format!("drive.google.com/thumbnail?id={}&sz=w1000", id)
}

/// 試行回数に応じた取得URLを生成
///
/// IDが抽出できなければリンクをそのまま返す。空リンクは空文字。
pub fn resolve_image_url(link: &str, attempt: u32) -> String {
    let Some(id) = extract_drive_id(link) else {
        return link.to_string();
    };

    if attempt <= THUMBNAIL_LAST_ATTEMPT {
        format!("https://{}", thumbnail_source(id))
    } else if attempt == ALTERNATE_HOST_ATTEMPT {
        format!("https://lh3.googleusercontent.com/d/{}=s1000", id)
    } else {
        format!(
            "https://images.weserv.nl/?url={}&n=-1",
            urlencoding::encode(&thumbnail_source(id))
        )
    }
}

/// キャッシュ回避用に `cb=<attempt>` を付与
pub fn with_cache_buster(url: &str, attempt: u32) -> String {
    if url.is_empty() {
        return String::new();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}cb={}", url, separator, attempt)
}

/// 実際に読み込むURL（取得先 + キャッシュ回避）
pub fn display_url(link: &str, attempt: u32) -> String {
    with_cache_buster(&resolve_image_url(link, attempt), attempt)
}
