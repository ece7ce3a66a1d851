use std::sync::Arc;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::{get, post}, Router, Json};
use tower_http::cors::{CorsLayer, Any};
use serde_json::{json, Value};
use tracing::{info, warn};
use crate::construct::LanguageSpecification;
use crate::error::LangforgeError;
use crate::protocol::{Ack, ErrorBody, GenerateRequest, GenerationResult, SpecificationSummary};
use crate::workshop::Workshop;

pub const WELCOME: &str = "Welcome to Illiterate Wizard - Programming Language Builder";

/// A workshop failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LangforgeError);

impl From<LangforgeError> for ApiError {
    fn from(e: LangforgeError) -> Self { ApiError(e) }
}

pub fn status_of(e: &LangforgeError) -> StatusCode {
    match e {
        LangforgeError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LangforgeError::NotFound(_) => StatusCode::NOT_FOUND,
        LangforgeError::GenerationInProgress(_) | LangforgeError::NameTaken(_) => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        let body = ErrorBody {
            detail: self.0.to_string(),
            code: self.0.code().to_string(),
            violations: self.0.violations().to_vec(),
        };
        warn!(code = %status.as_u16(), error = %body.detail, "request failed");
        (status, Json(body)).into_response()
    }
}

type Shared = State<Arc<Workshop>>;

// The workshop holds a synchronous SQLite connection, so every call runs on
// the blocking pool.
async fn blocking<T, F>(workshop: Arc<Workshop>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Workshop) -> crate::error::Result<T> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || work(&workshop))
        .await
        .map_err(|e| {
            warn!(error = %e, "Join error");
            LangforgeError::Invariant(format!("worker failed: {e}"))
        })?;
    Ok(outcome?)
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": WELCOME, "version": env!("CARGO_PKG_VERSION") }))
}

async fn create_language(
    State(workshop): Shared,
    Json(spec): Json<LanguageSpecification>,
) -> Result<Json<Ack>, ApiError> {
    let ack = blocking(workshop, move |w| w.save_specification(&spec)).await?;
    Ok(Json(ack))
}

async fn list_languages(State(workshop): Shared) -> Result<Json<Vec<SpecificationSummary>>, ApiError> {
    Ok(Json(blocking(workshop, |w| w.list_specifications()).await?))
}

async fn get_language(
    State(workshop): Shared,
    Path(name): Path<String>,
) -> Result<Json<LanguageSpecification>, ApiError> {
    Ok(Json(blocking(workshop, move |w| w.fetch_specification(&name)).await?))
}

async fn update_language(
    State(workshop): Shared,
    Path(name): Path<String>,
    Json(spec): Json<LanguageSpecification>,
) -> Result<Json<Ack>, ApiError> {
    let ack = blocking(workshop, move |w| w.update_specification(&name, &spec)).await?;
    Ok(Json(ack))
}

async fn delete_language(
    State(workshop): Shared,
    Path(name): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    Ok(Json(blocking(workshop, move |w| w.delete_specification(&name)).await?))
}

async fn generate_language(
    State(workshop): Shared,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>, ApiError> {
    let started = std::time::Instant::now();
    let result = blocking(workshop, move |w| w.generate_language(&request)).await?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(ms = elapsed_ms, name = %result.language_name, files = result.files_generated.len(), "generation complete");
    Ok(Json(result))
}

async fn download_language(
    State(workshop): Shared,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let archive = blocking(workshop, move |w| w.download_language(&name)).await?;
    let disposition = format!("attachment; filename={}", archive.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    )
        .into_response())
}

pub fn router(workshop: Arc<Workshop>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/", get(welcome))
        .route("/api/languages", post(create_language).get(list_languages))
        .route(
            "/api/languages/:name",
            get(get_language).put(update_language).delete(delete_language),
        )
        .route("/api/generate", post(generate_language))
        .route("/api/download/:name", get(download_language))
        .layer(cors)
        .with_state(workshop)
}
