//! Table endpoints

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;

use super::response::{ApiError, ApiSuccess, success};
use super::{AppState, CascadeQuery, DEFAULT_PAGE_LIMIT};
use crate::executor::SqlExecutor;
use crate::types::CreateTableRequest;

/// `?limit=&offset=` for the data endpoint
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Handler for GET /api/tables
pub async fn list_tables_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
) -> Result<Response, ApiError> {
    let tables = state
        .service
        .list_tables()
        .await
        .map_err(|e| state.fail(e))?;

    Ok(success(StatusCode::OK, ApiSuccess::new(tables)))
}

/// Handler for POST /api/tables
///
/// Body: `{"tableName": "...", "columns": [ColumnDefinition, ...]}`.
pub async fn create_table_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
    body: Result<Json<CreateTableRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        debug!(error = %rejection, "Rejected create table body");
        ApiError::bad_request(rejection.body_text(), state.debug)
    })?;

    let result = state
        .service
        .create_table(request)
        .await
        .map_err(|e| state.fail(e))?;

    let message = format!("Table '{}' created successfully", result.table_name);
    Ok(success(
        StatusCode::CREATED,
        ApiSuccess::new(result).with_message(message),
    ))
}

/// Handler for GET /api/tables/{table}
pub async fn get_table_schema_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
    Path(table): Path<String>,
) -> Result<Response, ApiError> {
    let schema = state
        .service
        .get_table_schema(&table)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(success(StatusCode::OK, ApiSuccess::new(schema)))
}

/// Handler for DELETE /api/tables/{table}?cascade=bool
pub async fn drop_table_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
    Path(table): Path<String>,
    query: Result<Query<CascadeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), state.debug))?;

    let result = state
        .service
        .drop_table(&table, query.enabled())
        .await
        .map_err(|e| state.fail(e))?;

    let message = format!("Table '{}' dropped successfully", result.table_name);
    Ok(success(
        StatusCode::OK,
        ApiSuccess::new(result).with_message(message),
    ))
}

/// Handler for GET /api/tables/{table}/data?limit&offset
pub async fn get_table_data_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
    Path(table): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(page) =
        query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), state.debug))?;

    let data = state
        .service
        .get_table_data(
            &table,
            page.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            page.offset.unwrap_or(0),
        )
        .await
        .map_err(|e| state.fail(e))?;

    Ok(success(StatusCode::OK, ApiSuccess::new(data)))
}
