use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    ParamError, ParametrizationService, Result,
    model::{ToggleDraft, ToggleRecord},
};

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct EnableQuery {
    pub enable: bool,
}

/// Runs a synchronous service call on the blocking pool.
async fn run<T, F>(
    service: ParametrizationService,
    f: F,
) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ParametrizationService) -> Result<T> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || f(&service)).await.map_err(|e| ParamError::Server(e.to_string()))?;
    Ok(outcome?)
}

fn found(
    record: Option<ToggleRecord>,
    what: String,
) -> std::result::Result<Json<ToggleRecord>, ApiError> {
    record.map(Json).ok_or_else(|| ParamError::NotFound(what).into())
}

pub async fn list_all(State(service): State<ParametrizationService>) -> std::result::Result<Json<Vec<ToggleRecord>>, ApiError> {
    run(service, |s| s.list_all()).await.map(Json)
}

pub async fn get_by_id(
    State(service): State<ParametrizationService>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<ToggleRecord>, ApiError> {
    let record = run(service, move |s| s.get_by_id(id)).await?;
    found(record, format!("parametrization {}", id))
}

pub async fn get_by_key(
    State(service): State<ParametrizationService>,
    Path(key): Path<String>,
) -> std::result::Result<Json<ToggleRecord>, ApiError> {
    let what = format!("parametrization {}", key);
    let record = run(service, move |s| s.get_by_key(&key)).await?;
    found(record, what)
}

pub async fn create(
    State(service): State<ParametrizationService>,
    Json(draft): Json<ToggleDraft>,
) -> std::result::Result<Json<ToggleRecord>, ApiError> {
    let record = ToggleRecord::from(draft);
    run(service, move |s| s.save(&record)).await.map(Json)
}

/// Replaces record `id`. The existence check reads through the cache, so a
/// record removed with `delete_no_cache` can still be "found" here.
pub async fn update(
    State(service): State<ParametrizationService>,
    Path(id): Path<i64>,
    Json(draft): Json<ToggleDraft>,
) -> std::result::Result<Json<ToggleRecord>, ApiError> {
    let record = ToggleRecord::from(draft).with_id(id);
    let saved = run(service, move |s| match s.get_by_id(id)? {
        Some(_) => s.save(&record).map(Some),
        None => Ok(None),
    })
    .await?;
    found(saved, format!("parametrization {}", id))
}

pub async fn set_enabled(
    State(service): State<ParametrizationService>,
    Path(id): Path<i64>,
    Query(query): Query<EnableQuery>,
) -> std::result::Result<StatusCode, ApiError> {
    run(service, move |s| s.set_enabled(query.enable, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(service): State<ParametrizationService>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    run(service, move |s| s.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_no_cache(
    State(service): State<ParametrizationService>,
    Path(id): Path<i64>,
) -> std::result::Result<StatusCode, ApiError> {
    run(service, move |s| s.delete_no_cache(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
