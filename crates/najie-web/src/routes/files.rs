use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;

use najie_storage::{DEFAULT_LIST_LIMIT, DEFAULT_URL_EXPIRES_SECS};

use crate::models::{ListQuery, UrlQuery, bad_request, reply};
use crate::state::AppState;

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let prefix = query.prefix.unwrap_or_default();
    let limit = query
        .limit
        .filter(|&l| l > 0)
        .unwrap_or(DEFAULT_LIST_LIMIT);
    reply(state.client.list(&prefix, limit).await)
}

pub async fn signed_url(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UrlQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let Some(key) = query.key.filter(|k| !k.is_empty()) else {
        return bad_request("missing key parameter");
    };
    let expires = query
        .expires
        .filter(|&e| e > 0)
        .unwrap_or(DEFAULT_URL_EXPIRES_SECS);
    reply(state.client.signed_url(&key, expires).await)
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    key: Result<Path<String>, PathRejection>,
) -> Response {
    let Path(key) = match key {
        Ok(k) => k,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    reply(state.client.delete(&key).await)
}

/// `/api/files/url` shadows the wildcard route, so the object literally named
/// `url` is deleted here.
pub async fn delete_key_named_url(State(state): State<Arc<AppState>>) -> Response {
    reply(state.client.delete("url").await)
}
