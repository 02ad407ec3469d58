use clap::Parser;
use dialoguer::Confirm;
use photo_review::{api, cli, config, error, image, review, session};
use photo_review_common::{prepare_queue, resolve_image_url};
use api::{HttpSheetApi, SheetApi};
use cli::{Cli, Commands};
use config::Config;
use error::{ReviewError, Result};
use image::{HttpImageFetcher, ImageOutcome, ImagePolicy, ImageResolver};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// 取得先の段階数（0, 1, 2, 3以上）
const IMAGE_ATTEMPTS_SHOWN: u32 = 4;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(config: &Config) -> Result<Arc<HttpSheetApi>> {
    Ok(Arc::new(HttpSheetApi::new(config.api_config()?)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Review { history, no_probe } => {
            println!("📷 photo-review - 写真確認\n");

            let api = connect(&config)?;
            let mut session = session::ReviewSession::new(api);
            let fetcher = if no_probe {
                None
            } else {
                Some(HttpImageFetcher::new(config.api_config()?.timeout)?)
            };
            let options = review::ReviewOptions {
                mode: cli::view_mode(history),
                sheet_url: config.sheet_url.clone(),
                image_policy: ImagePolicy::default(),
            };

            review::run_interactive_review(
                &mut session,
                fetcher.as_ref().map(|f| f as &dyn image::ImageFetcher),
                &options,
            )
            .await?;

            println!("\n✅ 終了");
        }

        Commands::List { history, json } => {
            let api = connect(&config)?;
            let raw = api.read_all().await?;
            let mode = cli::view_mode(history);
            let queue = prepare_queue(&raw, mode);

            if json {
                println!("{}", serde_json::to_string_pretty(&queue)?);
            } else {
                println!("[{}] {}件 / 全{}件", mode.label(), queue.len(), raw.len());
                for record in &queue {
                    println!(
                        "  行{:>5}  {:<12} {:<20} {} {} {}{}",
                        record.row_index,
                        if record.code.is_empty() { "---" } else { record.code.as_str() },
                        record.operator_name,
                        record.date,
                        record.time,
                        record.status,
                        if record.is_duplicate { "  ⚠ DUPLICATO" } else { "" },
                    );
                }
            }
        }

        Commands::Mark { row } => {
            let api = connect(&config)?;
            if api.mark_check(row).await? {
                println!("✔ 行 {} を確認済みにしました", row);
            } else {
                println!("✖ 行 {} の更新に失敗しました", row);
            }
        }

        Commands::Cleanup => {
            let api = connect(&config)?;
            api.cleanup_old().await?;
            println!("✔ クリーンアップを実行しました");
        }

        Commands::DeleteChecked { yes } => {
            let api = connect(&config)?;
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("確認済みの行をすべて削除しますか?")
                    .default(false)
                    .interact()
                    .map_err(|e| ReviewError::Interaction(e.to_string()))?;

            if !confirmed {
                println!("中止しました");
            } else if api.delete_checked().await? {
                println!("✔ 確認済みの行を削除しました");
            } else {
                println!("✖ 削除に失敗しました");
            }
        }

        Commands::Image { link, attempt, fetch, output } => {
            if !fetch {
                match attempt {
                    Some(n) => println!("{}", resolve_image_url(&link, n)),
                    None => {
                        for n in 0..IMAGE_ATTEMPTS_SHOWN {
                            println!("[{}] {}", n, resolve_image_url(&link, n));
                        }
                    }
                }
                return Ok(());
            }

            let fetcher = HttpImageFetcher::new(std::time::Duration::from_secs(config.timeout_seconds.max(1)))?;
            let mut resolver = ImageResolver::new(&link, ImagePolicy::default(), tokio::time::Instant::now());
            match image::resolve_image(&fetcher, &mut resolver).await {
                ImageOutcome::Loaded { url, attempt, bytes } => {
                    println!("✔ 取得成功 (試行{}): {}", attempt + 1, url);
                    if let Some(path) = output {
                        std::fs::write(&path, &bytes)?;
                        println!("✔ 保存: {} ({} bytes)", path.display(), bytes.len());
                    }
                }
                ImageOutcome::Failed { external_link } => {
                    println!("✖ 写真を取得できませんでした");
                    if let Some(link) = external_link {
                        println!("  外部で開いてください: {}", link);
                    }
                }
            }
        }

        Commands::Config { set_url, set_key, set_sheet_url, show } => {
            let mut config = config;

            if let Some(url) = set_url {
                config.set_api_url(url)?;
                println!("✔ APIのURLを設定しました");
            }

            if let Some(key) = set_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(url) = set_sheet_url {
                config.set_sheet_url(url)?;
                println!("✔ シートURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  API URL: {}", config.get_api_url().unwrap_or_else(|_| "未設定".into()));
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
                println!("  シートURL: {}", config.sheet_url.as_deref().unwrap_or("未設定"));
                println!("  タイムアウト: {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}
