use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::traits::CarrierRegistry;

use super::types::CarrierInfo;

const API_KEY_HEADER: &str = "x-api-key";
/// デバッグログに出すレスポンス本文の最大文字数
const BODY_LOG_CHARS: usize = 300;

/// SaferWeb API クライアント
#[derive(Debug, Clone)]
pub struct SaferClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SaferClient {
    /// APIキーが空の場合は起動時エラー
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        if config.api_key.trim().is_empty() {
            return Err(ScraperError::MissingConfig(
                "SAFER_API_KEY 環境変数が設定されていません".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()
            .map_err(|e| ScraperError::InvalidConfig(format!("HTTPクライアント: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.registry_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn snapshot_url(&self, mc_number: u64) -> String {
        format!("{}{}", self.base_url, mc_number)
    }
}

#[async_trait]
impl CarrierRegistry for SaferClient {
    async fn fetch(&self, mc_number: u64) -> Result<CarrierInfo, ScraperError> {
        let url = self.snapshot_url(mc_number);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ScraperError::Api(format!("MC={}: {}", mc_number, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScraperError::Api(format!("MC={}: {}", mc_number, e)))?;

        info!("MC={} - Status Code: {}", mc_number, status.as_u16());
        debug!(
            "MC={} - Response text: {}",
            mc_number,
            body.chars().take(BODY_LOG_CHARS).collect::<String>()
        );

        if !status.is_success() {
            return Err(ScraperError::ApiStatus {
                mc_number,
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ScraperError::Api(format!("MC={} レスポンス解析失敗: {}", mc_number, e)))
    }
}
