//! MC番号レンジ → レジストリ照会 + メール取得 → CSV

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::lookup::EmailScraper;
use crate::registry::CarrierInfo;
use crate::service::ExportResult;
use crate::traits::{BrowserSession, CarrierRegistry, SessionLauncher};

use super::range::{CarrierFilter, McRange};
use super::record::{CarrierRecord, CSV_HEADER};

/// エクスポート処理本体
pub struct ExportPipeline {
    launcher: Arc<dyn SessionLauncher>,
    registry: Arc<dyn CarrierRegistry>,
    scraper: EmailScraper,
    request_delay: Duration,
    output_dir: PathBuf,
}

impl ExportPipeline {
    pub fn new(
        config: &AppConfig,
        launcher: Arc<dyn SessionLauncher>,
        registry: Arc<dyn CarrierRegistry>,
    ) -> Self {
        Self {
            launcher,
            registry,
            scraper: EmailScraper::new(config),
            request_delay: config.request_delay,
            output_dir: config.output_dir.clone(),
        }
    }

    /// レンジ内の全MC番号を昇順に処理してCSVを書き出す
    ///
    /// ブラウザ起動失敗・セッション喪失はエラー。個別の照会失敗は空欄の行になる。
    pub async fn run(
        &self,
        range: McRange,
        filter: CarrierFilter,
    ) -> Result<ExportResult, ScraperError> {
        info!(
            "Export started: MC {}..={} ({} ids, filter={:?})",
            range.start(),
            range.end(),
            range.count(),
            filter
        );

        let mut session = SessionGuard::new(self.launcher.open().await?);
        let collected = match session.get_mut() {
            Some(active) => self.collect(active, range, filter).await,
            None => Err(ScraperError::SessionClosed("ブラウザは既に終了しています".into())),
        };

        // 成否に関わらず必ず閉じる（中断時は SessionGuard の Drop が閉じる）
        session.close().await;

        let records = collected?;
        let result = self.write_csv(&records)?;

        info!(
            "Export completed: path={:?}, rows={}, size={}bytes",
            result.csv_path,
            result.row_count,
            result.csv_content.len()
        );
        Ok(result)
    }

    async fn collect(
        &self,
        session: &mut dyn BrowserSession,
        range: McRange,
        filter: CarrierFilter,
    ) -> Result<Vec<CarrierRecord>, ScraperError> {
        let mut records = Vec::new();

        for mc_number in range.ids() {
            if let Some(record) = self.process(session, mc_number, filter).await? {
                records.push(record);
            }

            // ブロック回避のための待機
            if mc_number < range.end() && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }
        }

        Ok(records)
    }

    async fn process(
        &self,
        session: &mut dyn BrowserSession,
        mc_number: u64,
        filter: CarrierFilter,
    ) -> Result<Option<CarrierRecord>, ScraperError> {
        let info = match self.registry.fetch(mc_number).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Error fetching data for MC={}: {}", mc_number, e);
                None
            }
        };

        if filter == CarrierFilter::SingleUnitProperty
            && !info
                .as_ref()
                .is_some_and(CarrierInfo::is_single_unit_property)
        {
            debug!("MC={} - Filtered out", mc_number);
            return Ok(None);
        }

        // 登録ページはUSDOT番号で引く。レジストリ失敗時はMC番号で引き、
        // メール欄はレジストリの成否に左右されない
        let lookup_id = match info.as_ref().and_then(CarrierInfo::usdot_number) {
            Some(usdot) => usdot,
            None => {
                debug!("MC={} - No USDOT number, looking up by MC number", mc_number);
                mc_number
            }
        };
        let email = self.scraper.lookup(session, lookup_id).await?;

        Ok(Some(CarrierRecord::new(mc_number, email, info)))
    }

    fn write_csv(&self, records: &[CarrierRecord]) -> Result<ExportResult, ScraperError> {
        let rows: Vec<Vec<String>> = records.iter().map(CarrierRecord::to_row).collect();
        self.write_rows(&rows)
    }

    /// 書き込みに失敗したら途中までのファイルは残さない
    fn write_rows(&self, rows: &[Vec<String>]) -> Result<ExportResult, ScraperError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let (csv_path, file) = self.create_output_file()?;

        let written = write_records(file, rows).and_then(|()| {
            ExportResult::new(csv_path.clone(), rows.len()).map_err(ScraperError::from)
        });

        if written.is_err() {
            if let Err(e) = std::fs::remove_file(&csv_path) {
                warn!("Failed to remove partial CSV {:?}: {}", csv_path, e);
            }
        }
        written
    }

    /// output_<timestamp>.csv（同名があれば連番を付ける）
    fn create_output_file(&self) -> Result<(PathBuf, File), ScraperError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut attempt = 0u32;

        loop {
            let file_name = if attempt == 0 {
                format!("output_{}.csv", timestamp)
            } else {
                format!("output_{}_{}.csv", timestamp, attempt)
            };
            let path = self.output_dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn write_records(file: File, rows: &[Vec<String>]) -> Result<(), ScraperError> {
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// セッションを保持し、close されずに破棄された場合はバックグラウンドで閉じる
struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn BrowserSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn get_mut(&mut self) -> Option<&mut (dyn BrowserSession + 'static)> {
        self.session.as_deref_mut()
    }

    async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Failed to close browser session: {}", e);
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        warn!("Export cancelled, closing browser session in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!("Failed to close browser session: {}", e);
                    }
                });
            }
            // ランタイム外では各セッションの Drop に任せる
            Err(_) => drop(session),
        }
    }
}
