//! Webフロントエンド
//!
//! `GET /` で入力フォーム、`POST /`（および `/generate-csv`）でCSVを返す。
//! リクエストはスクレイプ完了までブロックする。

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::error::ScraperError;
use crate::export::{CarrierFilter, McRange};
use crate::service::{ExportRequest, ExportResult, ExportService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: ExportService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(generate_csv))
        .route("/generate-csv", post(generate_csv))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// フォーム入力（未入力はデフォルトレンジ）
#[derive(Debug, Default, Deserialize)]
pub struct ExportForm {
    #[serde(default, alias = "start_mc")]
    pub mc_start: Option<String>,
    #[serde(default, alias = "end_mc")]
    pub mc_end: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
}

impl ExportForm {
    pub fn into_request(self, config: &AppConfig) -> Result<ExportRequest, ScraperError> {
        let start = parse_mc_number("mc_start", self.mc_start.as_deref(), config.default_start)?;
        let end = parse_mc_number("mc_end", self.mc_end.as_deref(), config.default_end)?;
        let range = McRange::bounded(start, end, config.max_range_len)?;
        let filter = CarrierFilter::from_form_value(self.filter.as_deref())?;

        Ok(ExportRequest::new(range).with_filter(filter))
    }
}

fn parse_mc_number(field: &str, value: Option<&str>, default: u64) -> Result<u64, ScraperError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v.parse().map_err(|_| {
            ScraperError::Validation(format!("{} は数値で指定してください: {}", field, v))
        }),
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.config, None))
}

async fn generate_csv(State(state): State<AppState>, Form(form): Form<ExportForm>) -> Response {
    match export(&state, form).await {
        Ok(result) => csv_response(result),
        Err(e) => error_response(&state.config, e),
    }
}

async fn export(state: &AppState, form: ExportForm) -> Result<ExportResult, ScraperError> {
    let request = form.into_request(&state.config)?;
    state.service.clone().oneshot(request).await
}

fn csv_response(result: ExportResult) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", result.file_name());
    result.cleanup();

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        result.csv_content,
    )
        .into_response()
}

fn error_response(config: &AppConfig, err: ScraperError) -> Response {
    match &err {
        ScraperError::Validation(_) => warn!("Rejected export request: {}", err),
        _ => error!("Export failed: {}", err),
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Html(render_page(config, Some(&err.to_string())))).into_response()
}

fn render_page(config: &AppConfig, error: Option<&str>) -> String {
    let error_html = error
        .map(|message| {
            format!(
                r#"<p class="error">{}</p>"#,
                html_escape::encode_text(message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Carrier Email Export</title>
  <style>
    body {{ font-family: sans-serif; max-width: 32rem; margin: 3rem auto; }}
    label {{ display: block; margin-top: 1rem; }}
    .error {{ color: #b00020; }}
  </style>
</head>
<body>
  <h1>Carrier Email Export</h1>
  {error_html}
  <form method="post" action="/">
    <label>MC start <input type="number" name="mc_start" min="1" value="{start}" required></label>
    <label>MC end <input type="number" name="mc_end" min="1" value="{end}" required></label>
    <label><input type="checkbox" name="filter" value="single_unit_property">
      Only carriers with 1 power unit authorized for property</label>
    <p>Up to {max} MC numbers per request. The download starts when every lookup has finished.</p>
    <button type="submit">Generate CSV</button>
  </form>
</body>
</html>
"#,
        error_html = error_html,
        start = config.default_start,
        end = config.default_end,
        max = config.max_range_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportPipeline;
    use crate::testing::{carrier, page_url, test_config, FakeLauncher, FakeRegistry, FakeSession};
    use axum::body::Body;
    use axum::http::Request;
    use std::path::Path;

    fn app(dir: &Path, launcher: Arc<FakeLauncher>, registry: Arc<FakeRegistry>) -> Router {
        let config = test_config(dir).with_max_range_len(10);
        let pipeline = ExportPipeline::new(&config, launcher, registry);
        router(AppState {
            config: Arc::new(config),
            service: ExportService::new(pipeline),
        })
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn test_form_defaults() {
        let config = AppConfig::default();
        let req = ExportForm::default().into_request(&config).unwrap();

        assert_eq!(req.range.start(), 1_560_000);
        assert_eq!(req.range.end(), 1_560_100);
        assert_eq!(req.filter, CarrierFilter::All);
    }

    #[test]
    fn test_form_validation() {
        let config = AppConfig::default();
        let form = ExportForm {
            mc_start: Some("12a".to_string()),
            mc_end: Some("20".to_string()),
            filter: None,
        };
        let err = form.into_request(&config).unwrap_err();
        assert!(matches!(err, ScraperError::Validation(_)));
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Default::default(), Default::default());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#"name="mc_start""#));
        assert!(body.contains(r#"name="mc_end""#));
    }

    #[tokio::test]
    async fn test_reversed_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Arc::new(FakeLauncher::new(FakeSession::default()));
        let app = app(dir.path(), launcher.clone(), Default::default());

        let response = app
            .oneshot(post_form("/", "mc_start=102&mc_end=100"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains(r#"class="error""#));
        assert_eq!(launcher.opens(), 0);
        assert!(!dir.path().join("output").exists());
    }

    #[tokio::test]
    async fn test_non_numeric_and_oversized_ranges_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Default::default(), Default::default());

        let response = app
            .clone()
            .oneshot(post_form("/", "mc_start=abc&mc_end=100"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_form("/", "mc_start=1&mc_end=11"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_valid_range_downloads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Arc::new(FakeLauncher::new(
            FakeSession::default()
                .with_email(page_url(9100), "a@x.com")
                .with_email(page_url(9102), "b@y.com"),
        ));
        let registry = Arc::new(
            FakeRegistry::default()
                .with_carrier(100, carrier(9100, "ALPHA LLC"))
                .with_carrier(102, carrier(9102, "BRAVO INC")),
        );
        let app = app(dir.path(), launcher.clone(), registry);

        let response = app
            .oneshot(post_form("/", "mc_start=100&mc_end=102"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"output_"));
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let body = body_string(response).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("MC Number,Email,"));
        assert!(lines[1].starts_with("100,a@x.com,ALPHA LLC"));
        assert!(lines[2].starts_with("101,,"));
        assert!(lines[3].starts_with("102,b@y.com,BRAVO INC"));

        assert_eq!(launcher.closes(), 1);
        let leftover = std::fs::read_dir(dir.path().join("output")).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_legacy_route_and_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Default::default(), Default::default());

        let response = app
            .oneshot(post_form("/generate-csv", "start_mc=7&end_mc=8"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert_eq!(body.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_browser_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(
            dir.path(),
            Arc::new(FakeLauncher::failing()),
            Default::default(),
        );

        let response = app
            .oneshot(post_form("/", "mc_start=1&mc_end=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("chrome not found"));
    }
}
