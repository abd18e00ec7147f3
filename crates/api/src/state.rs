use domain::attendance::CheckInWindow;
use events::EventPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Secret used to read tenant/subject claims off bearer tokens. When
    /// absent, extraction falls back to headers and query parameters only.
    pub jwt_secret: Option<String>,
    pub publisher: Arc<dyn EventPublisher>,
    pub check_in_window: CheckInWindow,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        jwt_secret: Option<String>,
        publisher: Arc<dyn EventPublisher>,
        check_in_window: CheckInWindow,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            pool,
            jwt_secret,
            publisher,
            check_in_window,
            metrics_handle,
        }
    }
}
