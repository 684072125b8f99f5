use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Response;

use najie_core::{ConfigUpdate, CosConfig, Envelope, MaskedConfig};

use crate::models::{ConfigView, bad_request, reply};
use crate::state::AppState;

pub async fn get_config(State(state): State<Arc<AppState>>) -> Response {
    let loaded = state.client.config_store().load().await;
    reply(loaded.map(|stored| ConfigView {
        config: stored.as_ref().map(MaskedConfig::from),
    }))
}

pub async fn save_config(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Response {
    let update = match body {
        Ok(Json(update)) => update,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let merged = match merge_with_stored(&state, update).await {
        Envelope::Ok(config) => config,
        Envelope::Failed(e) => return reply(Envelope::<()>::Failed(e)),
    };
    reply(state.client.config_store().save(&merged).await)
}

pub async fn test_config(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Response {
    let update = match body {
        Ok(Json(update)) => update,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let merged = match merge_with_stored(&state, update).await {
        Envelope::Ok(config) => config,
        Envelope::Failed(e) => return reply(Envelope::<()>::Failed(e)),
    };
    reply(state.client.test_connection(&merged).await)
}

/// Resolve masked sentinels against the stored record, then merge over it.
async fn merge_with_stored(state: &AppState, update: ConfigUpdate) -> Envelope<CosConfig> {
    state
        .client
        .config_store()
        .load()
        .await
        .map(|stored| update.resolve(stored.as_ref()))
}
