//! 写真読み込みの状態管理
//!
//! 1件の写真ごとに Loading → Loaded / Error を管理する。
//! 読み込み失敗時は少し待ってから取得先を切り替え、
//! 上限回数を超えるか全体タイムアウトで Error に確定する。
//!
//! タイマーは期限（Instant）として保持し、`poll` で反映する。

mod fetch;

pub use fetch::{resolve_image, HttpImageFetcher, ImageFetcher, ImageOutcome};

use photo_review_common::display_url;
use std::time::Duration;
use tokio::time::Instant;

/// 読み込み状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Loading,
    Loaded,
    Error,
}

/// 再試行ポリシー
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    /// 失敗から次の取得先に切り替えるまでの待ち時間
    pub retry_delay: Duration,
    /// 取得先の切り替え上限
    pub max_escalations: u32,
    /// 1件あたりの全体タイムアウト
    pub global_timeout: Duration,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(800),
            max_escalations: 4,
            global_timeout: Duration::from_secs(12),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageResolver {
    link: String,
    attempt: u32,
    status: ImageStatus,
    retry_at: Option<Instant>,
    give_up_at: Option<Instant>,
    policy: ImagePolicy,
}

impl ImageResolver {
    pub fn new(link: &str, policy: ImagePolicy, now: Instant) -> Self {
        let mut resolver = Self {
            link: String::new(),
            attempt: 0,
            status: ImageStatus::Loading,
            retry_at: None,
            give_up_at: None,
            policy,
        };
        resolver.reset(link, now);
        resolver
    }

    /// 表示対象が変わったとき: タイマーを破棄して最初から
    pub fn reset(&mut self, link: &str, now: Instant) {
        self.link = link.trim().to_string();
        self.attempt = 0;
        self.retry_at = None;

        if self.link.is_empty() {
            self.status = ImageStatus::Error;
            self.give_up_at = None;
        } else {
            self.status = ImageStatus::Loading;
            self.give_up_at = Some(now + self.policy.global_timeout);
        }
    }

    pub fn status(&self) -> ImageStatus {
        self.status
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// 現在の試行で読み込むURL
    pub fn current_url(&self) -> String {
        display_url(&self.link, self.attempt)
    }

    /// 切り替え待ち中か
    pub fn retry_pending(&self) -> bool {
        self.retry_at.is_some()
    }

    /// 次に反映すべき期限
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.retry_at, self.give_up_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn give_up_at(&self) -> Option<Instant> {
        self.give_up_at
    }

    fn clear_timers(&mut self) {
        self.retry_at = None;
        self.give_up_at = None;
    }

    /// 読み込み成功
    pub fn on_loaded(&mut self) {
        if self.status == ImageStatus::Loading {
            self.status = ImageStatus::Loaded;
            self.clear_timers();
        }
    }

    /// 読み込み失敗
    ///
    /// 上限未満なら `retry_delay` 後の切り替えを予約、上限なら Error。
    /// 切り替え待ち中の失敗通知は無視する。
    pub fn on_failed(&mut self, now: Instant) {
        if self.status != ImageStatus::Loading || self.retry_pending() {
            return;
        }

        if self.attempt < self.policy.max_escalations {
            self.retry_at = Some(now + self.policy.retry_delay);
        } else {
            tracing::debug!(link = %self.link, attempt = self.attempt, "取得先を使い切りました");
            self.status = ImageStatus::Error;
            self.clear_timers();
        }
    }

    /// 期限を反映。状態か試行番号が変わったら `true`
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.status != ImageStatus::Loading {
            return false;
        }

        if self.give_up_at.is_some_and(|t| t <= now) {
            tracing::debug!(link = %self.link, "全体タイムアウト");
            self.status = ImageStatus::Error;
            self.clear_timers();
            return true;
        }

        if self.retry_at.is_some_and(|t| t <= now) {
            self.retry_at = None;
            self.attempt += 1;
            tracing::debug!(attempt = self.attempt, "取得先を切り替え");
            return true;
        }

        false
    }

    /// Error時の逃げ道: 元のリンクを外部で開く
    pub fn external_link(&self) -> Option<&str> {
        if self.status == ImageStatus::Error && !self.link.is_empty() {
            Some(&self.link)
        } else {
            None
        }
    }
}
