use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{info, warn};

use crate::error::ScraperError;
use crate::export::{CarrierFilter, ExportPipeline, McRange};

/// エクスポートリクエスト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub range: McRange,
    pub filter: CarrierFilter,
}

impl ExportRequest {
    pub fn new(range: McRange) -> Self {
        Self {
            range,
            filter: CarrierFilter::All,
        }
    }

    pub fn with_filter(mut self, filter: CarrierFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// エクスポート結果
#[derive(Debug)]
pub struct ExportResult {
    pub csv_path: PathBuf,
    pub csv_content: Vec<u8>,
    pub row_count: usize,
}

impl ExportResult {
    pub fn new(csv_path: PathBuf, row_count: usize) -> std::io::Result<Self> {
        let csv_content = std::fs::read(&csv_path)?;
        Ok(Self {
            csv_path,
            csv_content,
            row_count,
        })
    }

    /// ダウンロード時のファイル名
    pub fn file_name(&self) -> String {
        self.csv_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.csv".to_string())
    }

    /// 配信後にディスク上のCSVを削除
    pub fn cleanup(&self) {
        if let Err(e) = std::fs::remove_file(&self.csv_path) {
            warn!("Failed to remove {:?}: {}", self.csv_path, e);
        }
    }
}

/// tower::Serviceを実装したエクスポートサービス
#[derive(Clone)]
pub struct ExportService {
    pipeline: Arc<ExportPipeline>,
}

impl ExportService {
    pub fn new(pipeline: ExportPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl Service<ExportRequest> for ExportService {
    type Response = ExportResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ExportRequest) -> Self::Future {
        info!(
            "エクスポートリクエスト受信: MC {}..={}",
            req.range.start(),
            req.range.end()
        );

        let pipeline = self.pipeline.clone();
        Box::pin(async move { pipeline.run(req.range, req.filter).await })
    }
}
