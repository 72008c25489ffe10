use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::geo::{cities_path, countries_path, states_path};
use crate::server::{ApiError, ProxyState};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

pub async fn countries(State(state): State<ProxyState>) -> Result<Json<Value>, ApiError> {
    proxied(&state, countries_path()).await
}

pub async fn states(
    State(state): State<ProxyState>,
    Path(country_iso): Path<String>,
) -> Result<Json<Value>, ApiError> {
    proxied(&state, states_path(&country_iso)?).await
}

pub async fn cities(
    State(state): State<ProxyState>,
    Path((country_iso, state_iso)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    proxied(&state, cities_path(&country_iso, &state_iso)?).await
}

/// Serve `path` from the cache, going upstream only on a miss.
async fn proxied(state: &ProxyState, path: String) -> Result<Json<Value>, ApiError> {
    let upstream = state.upstream.clone();
    let value = state
        .cache
        .get_or_fetch(&path, || async { upstream.fetch(&path).await })
        .await?;
    Ok(Json(value))
}
