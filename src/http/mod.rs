//! REST API
//!
//! JSON endpoints under `/api` backed by a shared [`TableService`].

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, get, post};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AdminError;
use crate::executor::SqlExecutor;
use crate::service::TableService;

pub mod columns;
pub mod response;
pub mod tables;

pub use response::{ApiError, ApiSuccess};

/// Page size used when a data request carries no `limit`
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// State shared by all handlers
pub struct AppState<E: SqlExecutor> {
    pub service: TableService<E>,
    /// Expose SQL and driver messages in error bodies
    pub debug: bool,
}

impl<E: SqlExecutor> AppState<E> {
    pub fn new(service: TableService<E>, debug: bool) -> Self {
        Self { service, debug }
    }

    pub(crate) fn fail(&self, error: AdminError) -> ApiError {
        ApiError::new(error, self.debug)
    }
}

/// `?cascade=true|false`, absent means false
#[derive(Debug, Default, Deserialize)]
pub struct CascadeQuery {
    #[serde(default)]
    pub cascade: Option<bool>,
}

impl CascadeQuery {
    pub fn enabled(&self) -> bool {
        self.cascade.unwrap_or(false)
    }
}

/// Create the application router
///
/// All routes are nested under `/api`, wrapped in permissive CORS and
/// request tracing.
pub fn create_router<E: SqlExecutor>(state: Arc<AppState<E>>) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler::<E>))
        .route(
            "/tables",
            get(tables::list_tables_handler::<E>).post(tables::create_table_handler::<E>),
        )
        .route(
            "/tables/{table}",
            get(tables::get_table_schema_handler::<E>).delete(tables::drop_table_handler::<E>),
        )
        .route(
            "/tables/{table}/data",
            get(tables::get_table_data_handler::<E>),
        )
        .route(
            "/tables/{table}/columns",
            post(columns::add_column_handler::<E>),
        )
        .route(
            "/tables/{table}/columns/{column}",
            delete(columns::drop_column_handler::<E>),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Handler for GET /api/health
pub async fn health_handler<E: SqlExecutor>(
    State(state): State<Arc<AppState<E>>>,
) -> Result<Response, ApiError> {
    state.service.ping().await.map_err(|e| state.fail(e))?;

    Ok(response::success(
        StatusCode::OK,
        ApiSuccess::new(serde_json::json!({ "database": "connected" })),
    ))
}
