//! FMCSA 事業者登録ページからメールアドレスを取得

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::traits::BrowserSession;

/// "Email" ラベルを持つ <li> 内の span.dat
pub const EMAIL_XPATH: &str = "//label[contains(translate(normalize-space(.), 'EMAIL', 'email'), 'email')]/parent::li//span[contains(concat(' ', normalize-space(@class), ' '), ' dat ')]";

/// 1つのIDについてページを開きメール欄を読むスクレイパー
#[derive(Debug, Clone)]
pub struct EmailScraper {
    url_template: String,
    element_wait: Duration,
    poll_interval: Duration,
    lookup_timeout: Duration,
    debug_dir: Option<PathBuf>,
}

impl EmailScraper {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            url_template: config.lookup_url_template.clone(),
            element_wait: config.element_wait,
            poll_interval: config.poll_interval,
            lookup_timeout: config.lookup_timeout,
            debug_dir: config.debug_dir.clone(),
        }
    }

    pub fn lookup_url(&self, id: u64) -> String {
        self.url_template.replace("{id}", &id.to_string())
    }

    /// メールアドレスを取得
    ///
    /// 見つからない・ページエラー・タイムアウトは空文字を返す。
    /// セッション喪失のみエラーとして返す。
    pub async fn lookup(
        &self,
        session: &mut dyn BrowserSession,
        id: u64,
    ) -> Result<String, ScraperError> {
        let outcome = match timeout(self.lookup_timeout, self.scrape_email(session, id)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ScraperError::Timeout(format!(
                "{:?}以内に照会が完了しませんでした",
                self.lookup_timeout
            ))),
        };

        let email = match outcome {
            Ok(email) => email,
            Err(e) if e.is_session_fatal() => return Err(e),
            Err(e) => {
                warn!("USDOT={} - Email scrape error: {}", id, e);
                String::new()
            }
        };

        if email.is_empty() {
            self.save_debug_artifacts(session, id).await;
        } else {
            info!("USDOT={} - Email found", id);
        }

        Ok(email)
    }

    async fn scrape_email(
        &self,
        session: &mut dyn BrowserSession,
        id: u64,
    ) -> Result<String, ScraperError> {
        let url = self.lookup_url(id);
        session.navigate(&url).await?;

        let text = self.wait_for_text(session, EMAIL_XPATH).await?;
        Ok(text.trim().to_string())
    }

    /// 要素が現れるまでポーリング
    async fn wait_for_text(
        &self,
        session: &mut dyn BrowserSession,
        xpath: &str,
    ) -> Result<String, ScraperError> {
        let start = Instant::now();

        loop {
            // 描画途中のスクリプトエラーは未出現と同じ扱い
            match session.find_text(xpath).await {
                Ok(Some(text)) => {
                    debug!("Element found after {:?}", start.elapsed());
                    return Ok(text);
                }
                Ok(None) => {}
                Err(e) if e.is_session_fatal() => return Err(e),
                Err(e) => debug!("find_text failed, retrying: {}", e),
            }

            if start.elapsed() >= self.element_wait {
                return Err(ScraperError::ElementNotFound(format!(
                    "{:?}以内にメール欄が見つかりません",
                    self.element_wait
                )));
            }

            sleep(self.poll_interval).await;
        }
    }

    /// デバッグ用にページHTMLとスクリーンショットを保存（失敗しても続行）
    async fn save_debug_artifacts(&self, session: &mut dyn BrowserSession, id: u64) {
        let Some(dir) = &self.debug_dir else {
            return;
        };

        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Failed to create debug directory {:?}: {}", dir, e);
            return;
        }

        match timeout(self.lookup_timeout, session.content()).await {
            Ok(Ok(html)) => {
                let path = dir.join(format!("debug_usdot_{}.html", id));
                if let Err(e) = std::fs::write(&path, html) {
                    warn!("Failed to save page source {:?}: {}", path, e);
                }
            }
            Ok(Err(e)) => debug!("USDOT={} - Page source unavailable: {}", id, e),
            Err(_) => debug!("USDOT={} - Page source capture timed out", id),
        }

        match timeout(self.lookup_timeout, session.screenshot()).await {
            Ok(Ok(png)) => {
                let path = dir.join(format!("debug_usdot_{}.png", id));
                if let Err(e) = std::fs::write(&path, png) {
                    warn!("Failed to save screenshot {:?}: {}", path, e);
                }
            }
            Ok(Err(e)) => debug!("USDOT={} - Screenshot unavailable: {}", id, e),
            Err(_) => debug!("USDOT={} - Screenshot capture timed out", id),
        }
    }
}
