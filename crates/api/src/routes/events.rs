use axum::{extract::State, Json};
use events::EventEnvelope;

use crate::{state::AppState, worker};

/// POST /scheduling/events - push ingress for the event bus.
///
/// Always answers 200 with the single result event; failures ride inside a
/// `_failed` payload so the bus never redelivers.
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(envelope): Json<EventEnvelope>,
) -> Json<EventEnvelope> {
    let result = worker::process_event(&state, &envelope).await;
    if let Err(err) = state.publisher.publish(&result) {
        tracing::error!(error = %err, detail_type = %result.detail_type, "failed to publish result event");
    }
    Json(result)
}
