//! Column endpoints

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;

use super::response::{ApiError, ApiSuccess, success};
use super::{AppState, CascadeQuery};
use crate::executor::SqlExecutor;
use crate::types::ColumnDefinition;

/// Handler for POST /api/tables/{table}/columns
pub async fn add_column_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
    Path(table): Path<String>,
    body: Result<Json<ColumnDefinition>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(column) =
        body.map_err(|rejection| ApiError::bad_request(rejection.body_text(), state.debug))?;

    let result = state
        .service
        .add_column(&table, column)
        .await
        .map_err(|e| state.fail(e))?;

    let message = format!("Column added to table '{}'", result.table_name);
    Ok(success(
        StatusCode::CREATED,
        ApiSuccess::new(result).with_message(message),
    ))
}

/// Handler for DELETE /api/tables/{table}/columns/{column}?cascade=bool
pub async fn drop_column_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
    Path((table, column)): Path<(String, String)>,
    query: Result<Query<CascadeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) =
        query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), state.debug))?;

    let result = state
        .service
        .drop_column(&table, &column, query.enabled())
        .await
        .map_err(|e| state.fail(e))?;

    let message = format!("Column '{}' dropped from table '{}'", column, table);
    Ok(success(
        StatusCode::OK,
        ApiSuccess::new(result).with_message(message),
    ))
}
