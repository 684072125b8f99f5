use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use najie_core::{Envelope, MaskedConfig};
use serde::{Deserialize, Serialize};

/// Payload of `GET /api/config`; `config` is `null` when nothing is stored.
#[derive(Serialize)]
pub struct ConfigView {
    pub config: Option<MaskedConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub key: Option<String>,
    pub expires: Option<u64>,
}

/// Envelopes always travel with 200; the `ok` flag carries the outcome.
pub fn reply<T: Serialize>(envelope: Envelope<T>) -> Response {
    Json(envelope).into_response()
}

/// A request that never reached an operation.
pub fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    tracing::debug!(error = %message, "rejected request");
    (StatusCode::BAD_REQUEST, Json(Envelope::<()>::failure(message))).into_response()
}
