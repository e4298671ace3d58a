//! Development endpoint that accepts delivered records.
//!
//! Any `POST` whose body parses as JSON is logged, kept in memory and answered
//! with `200`; anything else gets `400`.

use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

/// Records received so far, in arrival order.
#[derive(Clone, Default)]
pub struct ReceiverState {
    received: Arc<Mutex<Vec<Value>>>,
}

impl ReceiverState {
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, value: Value) {
        if let Ok(mut received) = self.received.lock() {
            received.push(value);
        }
    }
}

pub fn router(state: ReceiverState) -> Router {
    Router::new()
        .route("/", post(receive))
        .route("/{*path}", post(receive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receive(State(state): State<ReceiverState>, body: Bytes) -> (StatusCode, Json<Value>) {
    match serde_json::from_slice::<Value>(&body) {
        Ok(data) => {
            let pretty = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
            tracing::info!("Received data:\n{pretty}");
            state.push(data);
            (
                StatusCode::OK,
                Json(json!({"status": "success", "message": "Data received successfully"})),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, body = %String::from_utf8_lossy(&body), "Received invalid JSON");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": "Invalid JSON received"})),
            )
        }
    }
}
