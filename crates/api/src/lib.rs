pub mod auth;
pub mod booking;
pub mod checkin;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod worker;

pub use error::ApiError;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::OPTIONS,
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-tenant-id"),
            HeaderName::from_static("x-subject-id"),
        ]);

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Prometheus metrics
        .route("/metrics", get(routes::prometheus::metrics))
        // Reference entities
        .route(
            "/scheduling/programs",
            get(routes::programs::get_programs)
                .post(routes::programs::create_program)
                .patch(routes::programs::update_program)
                .delete(routes::programs::delete_program),
        )
        .route(
            "/scheduling/locations",
            get(routes::locations::get_locations)
                .post(routes::locations::create_location)
                .patch(routes::locations::update_location)
                .delete(routes::locations::delete_location),
        )
        .route(
            "/scheduling/schedules",
            get(routes::schedules::get_schedules)
                .post(routes::schedules::create_schedule)
                .patch(routes::schedules::update_schedule)
                .delete(routes::schedules::delete_schedule),
        )
        .route(
            "/scheduling/exceptions",
            get(routes::exceptions::get_exceptions)
                .post(routes::exceptions::create_exception)
                .patch(routes::exceptions::update_exception)
                .delete(routes::exceptions::delete_exception),
        )
        // Virtual session read path
        .route("/scheduling/sessions", get(routes::sessions::get_sessions))
        // Booking lifecycle
        .route(
            "/scheduling/bookings",
            get(routes::bookings::list_bookings)
                .post(routes::bookings::create_booking)
                .delete(routes::bookings::cancel_booking),
        )
        // Attendance
        .route(
            "/scheduling/attendance",
            get(routes::attendance::list_attendance)
                .post(routes::attendance::create_check_in)
                .patch(routes::attendance::override_attendance),
        )
        // Event-bus push ingress
        .route("/scheduling/events", post(routes::events::ingest_event))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
