// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, request extractors, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::document::{
    BulkIndexResponse, CreateDocumentResponse, Document, DocumentBody, MessageResponse,
};
use crate::models::error::{ErrorResponse, Validate};
use crate::models::health::{EngineInfo, HealthResponse, RootResponse};
use crate::models::search::{SearchHit, SearchQuery, SearchResponse};
use crate::models::version::VersionResponse;
use crate::services::engine::EngineError;
use crate::services::search::SearchClient;
use axum::{
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `DOCSEARCH_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("DOCSEARCH_VERSION");

/// Prefix for the document and search routes.
pub const API_PREFIX: &str = "/api/v1";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub search_client: Arc<SearchClient>,
}

impl AppState {
    pub fn new(search_client: Arc<SearchClient>) -> Self {
        Self { search_client }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure response: a status code plus a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Document not found")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.detail))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Validated JSON extractor
// ---------------------------------------------------------------------------

/// Axum extractor that parses a JSON body and runs its [`Validate`] checks.
///
/// Parse failures keep the status chosen by `axum::Json` (400, 415 or 422);
/// constraint violations are rejected with 422. Either way the body is an
/// [`ErrorResponse`], and handlers only ever see validated values.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

// ---------------------------------------------------------------------------
// Service routes
// ---------------------------------------------------------------------------

#[utoipa::path(get, path = "/", responses((status = 200, description = "Service banner", body = RootResponse)))]
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Document Search API".to_string(),
        docs: "/docs".to_string(),
        health: "/health".to_string(),
    })
}

/// Reports engine cluster name and version, or why the engine could not be reached.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Engine probe result", body = HealthResponse)))]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.search_client.info().await {
        Ok(info) => Json(HealthResponse::Healthy {
            elasticsearch: info,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            Json(HealthResponse::Unhealthy {
                error: e.to_string(),
            })
        }
    }
}

#[utoipa::path(get, path = "/version", responses((status = 200, description = "Build version", body = VersionResponse)))]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "docsearch".to_string(),
        version: VERSION.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Document and search routes
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = Document,
    responses(
        (status = 201, description = "Document indexed", body = CreateDocumentResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Search engine error", body = ErrorResponse),
    )
)]
pub async fn create_document_handler(
    State(state): State<AppState>,
    ValidatedJson(document): ValidatedJson<Document>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), ApiError> {
    let id = state.search_client.index_document(document, None).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDocumentResponse {
            id,
            message: "Document created successfully".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/documents/bulk",
    request_body = Vec<Document>,
    responses(
        (status = 201, description = "Batch submitted", body = BulkIndexResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Search engine error", body = ErrorResponse),
    )
)]
pub async fn bulk_create_handler(
    State(state): State<AppState>,
    ValidatedJson(documents): ValidatedJson<Vec<Document>>,
) -> Result<(StatusCode, Json<BulkIndexResponse>), ApiError> {
    let outcome = state.search_client.bulk_index(documents, None).await?;

    Ok((
        StatusCode::CREATED,
        Json(BulkIndexResponse {
            indexed: outcome.indexed,
            errors: outcome.errors,
            ids: outcome.ids,
            message: "Documents indexed successfully".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/search",
    request_body = SearchQuery,
    responses(
        (status = 200, description = "Ranked hits", body = SearchResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Search engine error", body = ErrorResponse),
    )
)]
pub async fn search_handler(
    State(state): State<AppState>,
    ValidatedJson(query): ValidatedJson<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state.search_client.search(&query, None).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    params(("id" = String, Path, description = "Document key")),
    responses(
        (status = 200, description = "Stored document body"),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Search engine error", body = ErrorResponse),
    )
)]
pub async fn get_document_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentBody>, ApiError> {
    state
        .search_client
        .get_document(&id, None)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// Merges the request body's fields into the stored document.
#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}",
    params(("id" = String, Path, description = "Document key")),
    responses(
        (status = 200, description = "Fields merged", body = MessageResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Search engine error", body = ErrorResponse),
    )
)]
pub async fn update_document_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(fields): ValidatedJson<DocumentBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state
        .search_client
        .update_document(&id, &fields, None)
        .await?
    {
        return Err(ApiError::not_found());
    }

    Ok(Json(MessageResponse {
        message: "Document updated successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id" = String, Path, description = "Document key")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Search engine error", body = ErrorResponse),
    )
)]
pub async fn delete_document_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.search_client.delete_document(&id, None).await? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(title = "Document Search API", description = "REST API over an Elasticsearch index"),
    paths(
        root_handler,
        health_handler,
        version_handler,
        create_document_handler,
        bulk_create_handler,
        search_handler,
        get_document_handler,
        update_document_handler,
        delete_document_handler,
    ),
    components(schemas(
        Document,
        CreateDocumentResponse,
        BulkIndexResponse,
        MessageResponse,
        SearchQuery,
        SearchHit,
        SearchResponse,
        ErrorResponse,
        EngineInfo,
        HealthResponse,
        RootResponse,
        VersionResponse,
    ))
)]
pub struct ApiDoc;

/// Build the Axum application router, including Swagger UI at `/docs`.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/documents", post(create_document_handler))
        .route("/documents/bulk", post(bulk_create_handler))
        .route(
            "/documents/{id}",
            get(get_document_handler)
                .put(update_document_handler)
                .delete(delete_document_handler),
        )
        .route("/search", post(search_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .nest(API_PREFIX, api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
