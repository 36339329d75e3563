use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, SessionLauncher};

/// ヘッドレスChromeを起動するランチャー
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    browser_path: Option<PathBuf>,
    headless: bool,
    user_agent: String,
    cdp_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            browser_path: config.browser_path.clone(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            cdp_timeout: config.cdp_timeout,
        }
    }

    /// 起動ごとにユニークなユーザーデータディレクトリ
    fn user_data_dir() -> PathBuf {
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        std::env::temp_dir().join(format!("carrier-scraper-{}", unique_id))
    }

    fn browser_config(&self, user_data_dir: &Path) -> Result<BrowserConfig, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(user_data_dir)
            .window_size(1280, 800)
            .request_timeout(self.cdp_timeout);

        if let Some(path) = &self.browser_path {
            if !path.exists() {
                return Err(ScraperError::BrowserInit(format!(
                    "ブラウザ実行ファイルが見つかりません: {}",
                    path.display()
                )));
            }
            builder = builder.chrome_executable(path);
        }

        if !self.headless {
            builder = builder.with_head();
        }

        builder
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("ブラウザ設定エラー: {}", e)))
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        info!("ブラウザを初期化中...");

        let user_data_dir = Self::user_data_dir();
        let config = self.browser_config(&user_data_dir)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(ScraperError::BrowserInit(e.to_string()));
            }
        };

        info!("ブラウザ初期化完了");
        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            user_data_dir,
        }))
    }
}

/// Chrome 1プロセス分のセッション
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    user_data_dir: PathBuf,
}

impl ChromeSession {
    fn get_page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::SessionClosed("ブラウザは既に終了しています".into()))
    }
}

/// close されずに破棄された場合の後始末（Browser の Drop が子プロセスを終了する）
impl Drop for ChromeSession {
    fn drop(&mut self) {
        let Some(task) = self.handler_task.take() else {
            return;
        };

        self.page = None;
        self.browser = None;
        task.abort();

        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("Failed to remove user data dir {:?}: {}", self.user_data_dir, e);
        }
    }
}

/// CDPエラーの分類（WebSocket/チャネル断はセッション喪失）
fn cdp_error(e: CdpError, wrap: fn(String) -> ScraperError) -> ScraperError {
    match e {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) => ScraperError::SessionClosed(e.to_string()),
        other => wrap(other.to_string()),
    }
}

/// XPathの最初のノードのテキストを JSON 文字列（または "null"）で返すスクリプト
fn find_text_script(xpath: &str) -> String {
    format!(
        r#"
        (function() {{
            var node = document.evaluate({}, document, null,
                XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
            return JSON.stringify(node ? node.textContent : null);
        }})()
        "#,
        serde_json::Value::from(xpath)
    )
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        let page = self.get_page()?;
        debug!("Navigating to {}", url);

        page.goto(url)
            .await
            .map_err(|e| cdp_error(e, ScraperError::Navigation))?;

        Ok(())
    }

    async fn find_text(&mut self, xpath: &str) -> Result<Option<String>, ScraperError> {
        let page = self.get_page()?;

        let script = find_text_script(xpath);

        let raw: String = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| cdp_error(e, ScraperError::ElementNotFound))?
            .into_value()
            .map_err(|e| ScraperError::ElementNotFound(e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| ScraperError::ElementNotFound(e.to_string()))
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        self.get_page()?
            .content()
            .await
            .map_err(|e| cdp_error(e, ScraperError::Navigation))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, ScraperError> {
        self.get_page()?
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| cdp_error(e, ScraperError::Navigation))
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("ブラウザを終了中...");

        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Browser process wait failed: {}", e);
            }
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }

        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("Failed to remove user data dir {:?}: {}", self.user_data_dir, e);
        }

        info!("ブラウザ終了完了");
        Ok(())
    }
}
