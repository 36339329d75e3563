use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScraperError;

const DEFAULT_REGISTRY_BASE_URL: &str = "https://saferwebapi.com/v2/mcmx/snapshot/";
const DEFAULT_LOOKUP_URL_TEMPLATE: &str =
    "https://ai.fmcsa.dot.gov/SMS/Carrier/{id}/CarrierRegistration.aspx";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.91 Safari/537.36";

/// プロセス起動時に一度だけ構築するアプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SaferWeb APIキー (SAFER_API_KEY)
    pub api_key: String,
    pub registry_base_url: String,
    pub api_timeout: Duration,
    /// `{id}` を置換して照会ページURLを作る
    pub lookup_url_template: String,
    /// ブラウザ実行ファイル (CHROMEDRIVER_PATH / CHROME_PATH)
    pub browser_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    /// CDPリクエストタイムアウト
    pub cdp_timeout: Duration,
    /// メール要素の出現待ち
    pub element_wait: Duration,
    pub poll_interval: Duration,
    /// 1件あたりの照会上限時間
    pub lookup_timeout: Duration,
    /// MC番号ごとの待機（ブロック回避）
    pub request_delay: Duration,
    pub output_dir: PathBuf,
    /// メールが取れなかったページのHTML/スクリーンショット保存先
    pub debug_dir: Option<PathBuf>,
    pub bind_addr: String,
    pub max_range_len: u64,
    pub default_start: u64,
    pub default_end: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            registry_base_url: DEFAULT_REGISTRY_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(30),
            lookup_url_template: DEFAULT_LOOKUP_URL_TEMPLATE.to_string(),
            browser_path: None,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cdp_timeout: Duration::from_secs(60),
            element_wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            lookup_timeout: Duration::from_secs(30),
            request_delay: Duration::from_secs(5),
            output_dir: PathBuf::from("./output"),
            debug_dir: None,
            bind_addr: "0.0.0.0:5000".to_string(),
            max_range_len: 1000,
            default_start: 1_560_000,
            default_end: 1_560_100,
        }
    }
}

impl AppConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// `.env` を読み込んだ上で環境変数から構築
    pub fn from_env() -> Result<Self, ScraperError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から構築（テスト用に分離）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScraperError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("SAFER_API_KEY").ok_or_else(|| {
            ScraperError::MissingConfig(
                "SAFER_API_KEY 環境変数が設定されていません".to_string(),
            )
        })?;

        let mut config = Self::new(api_key);

        if let Some(url) = get("SAFER_API_BASE_URL") {
            config.registry_base_url = url;
        }
        if let Some(template) = get("CARRIER_LOOKUP_URL") {
            if !template.contains("{id}") {
                return Err(ScraperError::InvalidConfig(format!(
                    "CARRIER_LOOKUP_URL に {{id}} が含まれていません: {}",
                    template
                )));
            }
            config.lookup_url_template = template;
        }
        config.browser_path = get("CHROMEDRIVER_PATH")
            .or_else(|| get("CHROME_PATH"))
            .map(PathBuf::from);
        if let Some(dir) = get("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.debug_dir = get("DEBUG_DIR").map(PathBuf::from);
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(value) = get("HEADLESS") {
            config.headless = parse_bool("HEADLESS", &value)?;
        }
        if let Some(value) = get("REQUEST_DELAY_SECS") {
            config.request_delay = parse_secs("REQUEST_DELAY_SECS", &value)?;
        }
        if let Some(value) = get("ELEMENT_WAIT_SECS") {
            config.element_wait = parse_secs("ELEMENT_WAIT_SECS", &value)?;
        }
        if let Some(value) = get("LOOKUP_TIMEOUT_SECS") {
            config.lookup_timeout = parse_secs("LOOKUP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("API_TIMEOUT_SECS") {
            config.api_timeout = parse_secs("API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("MAX_RANGE_LEN") {
            config.max_range_len = value.trim().parse().map_err(|_| {
                ScraperError::InvalidConfig(format!("MAX_RANGE_LEN: {}", value))
            })?;
        }

        Ok(config)
    }

    pub fn with_registry_base_url(mut self, url: impl Into<String>) -> Self {
        self.registry_base_url = url.into();
        self
    }

    pub fn with_lookup_url_template(mut self, template: impl Into<String>) -> Self {
        self.lookup_url_template = template.into();
        self
    }

    pub fn with_browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.browser_path = Some(path.into());
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_debug_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(path.into());
        self
    }

    pub fn with_element_wait(mut self, wait: Duration) -> Self {
        self.element_wait = wait;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_max_range_len(mut self, len: u64) -> Self {
        self.max_range_len = len;
        self
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ScraperError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ScraperError::InvalidConfig(format!("{}: {}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ScraperError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ScraperError::InvalidConfig(format!("{}: {}", key, value))),
    }
}
