use clap::{Parser, Subcommand};
use photo_review_common::ViewMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-review")]
#[command(about = "写真レコード確認ツール（スプレッドシートAPI連携）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を1件ずつ確認
    Review {
        /// 確認済みを含む全件を表示
        #[arg(long)]
        history: bool,

        /// 写真の取得確認をしない
        #[arg(long)]
        no_probe: bool,
    },

    /// キューを一覧表示
    List {
        /// 確認済みを含む全件を表示
        #[arg(long)]
        history: bool,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 行を確認済みにする
    Mark {
        /// シートの行番号
        #[arg(required = true)]
        row: i64,
    },

    /// 古い行のクリーンアップを実行
    Cleanup,

    /// 確認済みの行を削除
    DeleteChecked {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },

    /// 写真リンクの取得先を表示/取得
    Image {
        /// 写真リンク
        #[arg(required = true)]
        link: String,

        /// 表示する試行番号（省略時は全段階）
        #[arg(short, long)]
        attempt: Option<u32>,

        /// 実際に取得する（取得先の切り替えあり）
        #[arg(long)]
        fetch: bool,

        /// 取得した画像の保存先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// APIのURLを設定
        #[arg(long)]
        set_url: Option<String>,

        /// APIキーを設定
        #[arg(long)]
        set_key: Option<String>,

        /// スプレッドシートのURLを設定
        #[arg(long)]
        set_sheet_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// `--history` フラグから表示モードへ
pub fn view_mode(history: bool) -> ViewMode {
    if history {
        ViewMode::History
    } else {
        ViewMode::Todo
    }
}
