use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIのURLが設定されていません。`photo-review config --set-url URL` で設定してください")]
    MissingApiUrl,

    #[error("APIキーが設定されていません。`photo-review config --set-key KEY` で設定してください")]
    MissingApiKey,

    #[error("HTTP通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("APIがエラーステータスを返しました: {0}")]
    ApiStatus(u16),

    #[error("画像取得エラー: {0}")]
    ImageFetch(String),

    #[error("対話入力エラー: {0}")]
    Interaction(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] photo_review_common::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
