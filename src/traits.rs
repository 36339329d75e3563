use async_trait::async_trait;

use crate::error::ScraperError;
use crate::registry::CarrierInfo;

/// 起動済みブラウザ1つ分の操作
#[async_trait]
pub trait BrowserSession: Send {
    /// URLへ遷移（ロード完了まで待つ）
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// XPathに一致する最初のノードのテキスト
    async fn find_text(&mut self, xpath: &str) -> Result<Option<String>, ScraperError>;

    /// 現在ページのHTML
    async fn content(&mut self) -> Result<String, ScraperError>;

    /// 現在ページのPNGスクリーンショット
    async fn screenshot(&mut self) -> Result<Vec<u8>, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;
}

/// ブラウザセッションの起動
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ScraperError>;
}

/// MC番号から事業者情報を引く外部レジストリ
#[async_trait]
pub trait CarrierRegistry: Send + Sync {
    async fn fetch(&self, mc_number: u64) -> Result<CarrierInfo, ScraperError>;
}
