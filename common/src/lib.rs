//! Photo Review Common Library
//!
//! CLIから使われる入出力を伴わない処理:
//! レコード正規化・重複判定・キュー構築・レスポンス解釈・写真URL解決

pub mod types;
pub mod alias;
pub mod error;
pub mod normalizer;
pub mod duplicates;
pub mod queue;
pub mod parser;
pub mod image_url;

pub use types::{Record, RowStatus, ViewMode, REVIEWED_MARKER};
pub use error::{Error, Result};
pub use normalizer::{normalize_batch, normalize_record};
pub use duplicates::{count_codes, flag_duplicates};
pub use queue::{build_queue, prepare_queue, queue_order};
pub use parser::{is_success_response, parse_batch_response};
pub use image_url::{display_url, extract_drive_id, resolve_image_url, with_cache_buster};
