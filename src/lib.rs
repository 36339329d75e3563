//! 運送事業者メールアドレス収集サービス
//!
//! - MC番号レンジごとに SaferWeb API から事業者情報を取得
//! - FMCSA 事業者登録ページをヘッドレスChromeで開きメールアドレスを取得
//! - 1つのMC番号につき1行のCSVを生成してダウンロードさせる
//!
//! # 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use carrier_scraper_service::{
//!     AppConfig, ChromeLauncher, ExportPipeline, ExportRequest, ExportService, McRange,
//!     SaferClient,
//! };
//! use tower::ServiceExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::from_env().unwrap();
//!     let registry = Arc::new(SaferClient::new(&config).unwrap());
//!     let launcher = Arc::new(ChromeLauncher::new(&config));
//!     let service = ExportService::new(ExportPipeline::new(&config, launcher, registry));
//!
//!     let range = McRange::new(1560000, 1560010).unwrap();
//!     let result = service.oneshot(ExportRequest::new(range)).await.unwrap();
//!     println!("CSV: {:?} ({} rows)", result.csv_path, result.row_count);
//! }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod export;
pub mod lookup;
pub mod registry;
pub mod service;
pub mod traits;
pub mod web;

#[cfg(test)]
mod testing;

// 主要な型をリエクスポート
pub use browser::ChromeLauncher;
pub use config::AppConfig;
pub use error::ScraperError;
pub use export::{CarrierFilter, CarrierRecord, ExportPipeline, McRange};
pub use lookup::EmailScraper;
pub use registry::{CarrierInfo, SaferClient};
pub use service::{ExportRequest, ExportResult, ExportService};
pub use traits::{BrowserSession, CarrierRegistry, SessionLauncher};
