use actix_web::HttpResponse;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::ImportReport;

static IMPORT_REQUESTS: AtomicU64 = AtomicU64::new(0);
static IMPORT_ERRORS: AtomicU64 = AtomicU64::new(0);
static REJECTED_KEYS: AtomicU64 = AtomicU64::new(0);
static ROWS_ATTEMPTED: AtomicU64 = AtomicU64::new(0);
static ROWS_CREATED: AtomicU64 = AtomicU64::new(0);

pub fn increment_import_request_count() {
    IMPORT_REQUESTS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_import_error_count() {
    IMPORT_ERRORS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_rejected_key_count() {
    REJECTED_KEYS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_import(report: &ImportReport) {
    ROWS_ATTEMPTED.fetch_add(report.total as u64, Ordering::Relaxed);
    ROWS_CREATED.fetch_add(report.created as u64, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub import_requests_total: u64,
    pub import_errors_total: u64,
    pub api_key_rejections_total: u64,
    pub import_rows_total: u64,
    pub import_rows_created_total: u64,
}

impl MetricsSnapshot {
    pub fn snapshot() -> Self {
        Self {
            import_requests_total: IMPORT_REQUESTS.load(Ordering::Relaxed),
            import_errors_total: IMPORT_ERRORS.load(Ordering::Relaxed),
            api_key_rejections_total: REJECTED_KEYS.load(Ordering::Relaxed),
            import_rows_total: ROWS_ATTEMPTED.load(Ordering::Relaxed),
            import_rows_created_total: ROWS_CREATED.load(Ordering::Relaxed),
        }
    }

    fn render(&self) -> String {
        let counters = [
            (
                "import_requests_total",
                "Total number of import requests",
                self.import_requests_total,
            ),
            (
                "import_errors_total",
                "Import requests that ended with an error",
                self.import_errors_total,
            ),
            (
                "api_key_rejections_total",
                "Requests rejected for a bad API key",
                self.api_key_rejections_total,
            ),
            (
                "import_rows_total",
                "Rows attempted across all imports",
                self.import_rows_total,
            ),
            (
                "import_rows_created_total",
                "Rows whose account was created",
                self.import_rows_created_total,
            ),
        ];

        counters
            .iter()
            .map(|(name, help, value)| {
                format!(
                    "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n",
                    name = name,
                    help = help,
                    value = value
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus counters", content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsSnapshot::snapshot().render())
}
