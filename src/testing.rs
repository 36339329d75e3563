//! テスト用のフェイク実装（ブラウザ・レジストリ不要）

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::registry::CarrierInfo;
use crate::traits::{BrowserSession, CarrierRegistry, SessionLauncher};

const TEST_URL_TEMPLATE: &str = "http://carrier.test/{id}";

pub fn page_url(id: u64) -> String {
    TEST_URL_TEMPLATE.replace("{id}", &id.to_string())
}

/// 待機なし・一時ディレクトリ出力の設定
pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig::new("test-key")
        .with_lookup_url_template(TEST_URL_TEMPLATE)
        .with_output_dir(dir.join("output"))
        .with_element_wait(Duration::ZERO)
        .with_lookup_timeout(Duration::from_secs(5))
        .with_request_delay(Duration::ZERO)
}

pub fn carrier(usdot: u64, legal_name: &str) -> CarrierInfo {
    CarrierInfo {
        legal_name: legal_name.to_string(),
        usdot: usdot.to_string(),
        power_units: Some(1),
        operating_status: "AUTHORIZED FOR Property".to_string(),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    emails: HashMap<String, String>,
    broken: HashSet<String>,
    dead: HashSet<String>,
    slow: HashSet<String>,
    render_delay: usize,
    script_errors: usize,
    current: Option<String>,
    polls: usize,
    visited: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl FakeSession {
    pub fn with_email(mut self, url: String, email: &str) -> Self {
        self.emails.insert(url, email.to_string());
        self
    }

    /// 遷移するとページエラー
    pub fn with_broken_page(mut self, url: String) -> Self {
        self.broken.insert(url);
        self
    }

    /// 遷移するとブラウザとの接続が切れる
    pub fn with_dead_page(mut self, url: String) -> Self {
        self.dead.insert(url);
        self
    }

    /// 遷移が終わらないページ
    pub fn with_slow_page(mut self, url: String) -> Self {
        self.slow.insert(url);
        self
    }

    /// 要素が現れるまでの find_text 呼び出し回数
    pub fn with_render_delay(mut self, polls: usize) -> Self {
        self.render_delay = polls;
        self
    }

    /// 最初の n 回の find_text がスクリプトエラーになる
    pub fn with_script_errors(mut self, count: usize) -> Self {
        self.script_errors = count;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        if self.dead.contains(url) {
            return Err(ScraperError::SessionClosed("websocket closed".into()));
        }
        self.visited.lock().unwrap().push(url.to_string());
        if self.slow.contains(url) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.broken.contains(url) {
            self.current = None;
            return Err(ScraperError::Navigation("net::ERR_CONNECTION_RESET".into()));
        }
        self.current = Some(url.to_string());
        self.polls = 0;
        Ok(())
    }

    async fn find_text(&mut self, _xpath: &str) -> Result<Option<String>, ScraperError> {
        if self.script_errors > 0 {
            self.script_errors -= 1;
            return Err(ScraperError::ElementNotFound("Evaluation failed".into()));
        }
        if self.polls < self.render_delay {
            self.polls += 1;
            return Ok(None);
        }
        Ok(self
            .current
            .as_ref()
            .and_then(|url| self.emails.get(url))
            .cloned())
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        Ok(format!(
            "<html><body>{}</body></html>",
            self.current.clone().unwrap_or_default()
        ))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, ScraperError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeLauncher {
    session: FakeSession,
    fail: bool,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session,
            ..Default::default()
        }
    }

    /// ブラウザが起動できない環境
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScraperError::BrowserInit("chrome not found".into()));
        }
        let mut session = self.session.clone();
        session.closes = self.closes.clone();
        Ok(Box::new(session))
    }
}

#[derive(Debug, Default)]
pub struct FakeRegistry {
    carriers: HashMap<u64, CarrierInfo>,
    failing: HashSet<u64>,
    calls: Mutex<Vec<u64>>,
}

impl FakeRegistry {
    pub fn with_carrier(mut self, mc_number: u64, info: CarrierInfo) -> Self {
        self.carriers.insert(mc_number, info);
        self
    }

    /// 通信エラーになるMC番号
    pub fn with_failure(mut self, mc_number: u64) -> Self {
        self.failing.insert(mc_number);
        self
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CarrierRegistry for FakeRegistry {
    async fn fetch(&self, mc_number: u64) -> Result<CarrierInfo, ScraperError> {
        self.calls.lock().unwrap().push(mc_number);
        if self.failing.contains(&mc_number) {
            return Err(ScraperError::Api(format!("MC={}: connection reset", mc_number)));
        }
        self.carriers
            .get(&mc_number)
            .cloned()
            .ok_or(ScraperError::ApiStatus {
                mc_number,
                status: 404,
            })
    }
}
