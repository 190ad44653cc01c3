use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::ApiError,
    models::{MindMapNode, UploadStats, UploadedDocument},
};

// --- Payloads y Respuestas de la API ---

/// Los campos admiten cualquier valor JSON; los vacíos cuentan como ausentes.
#[derive(Debug, Deserialize)]
pub struct AskQuestionPayload {
    #[serde(default)]
    context: Value,
    #[serde(default)]
    question: Value,
}

#[derive(Debug, Serialize)]
pub struct UploadPdfResponse {
    success: bool,
    mindmap: MindMapNode,
    stats: UploadStats,
    text_sample: String,
}

#[derive(Debug, Serialize)]
pub struct AskQuestionResponse {
    success: bool,
    answer: String,
}

/// Campos del formulario multipart de subida.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedDocument>,
    llama_api_key: Option<String>,
}

// --- Router ---

/// Las rutas se sirven en la raíz y también bajo `/api`, que es donde las
/// busca el frontend web.
pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.config.max_upload_bytes;
    let routes = Router::new()
        .route("/upload-pdf/", post(upload_pdf_handler))
        .route("/ask-question/", post(ask_question_handler));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn upload_pdf_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadPdfResponse>, ApiError> {
    let span = info_span!("upload_pdf", request_id = %Uuid::new_v4());
    upload_pdf(&state, multipart).instrument(span).await
}

async fn upload_pdf(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadPdfResponse>, ApiError> {
    // Una petición que no es multipart es, a efectos del cliente, una subida sin fichero.
    let form = match multipart {
        Ok(multipart) => read_upload_form(multipart).await?,
        Err(_) => UploadForm::default(),
    };

    let upload = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if !upload.has_pdf_extension() {
        return Err(ApiError::bad_request("File must be a PDF"));
    }
    info!(filename = %upload.filename, bytes = upload.bytes.len(), "PDF recibido");

    let extraction = state
        .extractor
        .extract(&upload, form.llama_api_key.as_deref())
        .await?;
    if extraction.text.trim().is_empty() {
        return Err(ApiError::bad_request("No text found in PDF"));
    }

    let chunks = state.chunker.split(&extraction.text);
    let sample = chunks
        .iter()
        .take(state.config.sample_chunks)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    info!(
        chunks = chunks.len(),
        sample_chars = sample.chars().count(),
        is_complex = extraction.is_complex,
        "Texto troceado"
    );

    let mindmap = state.mind_maps.generate(&sample).await?;

    Ok(Json(UploadPdfResponse {
        success: true,
        mindmap,
        stats: UploadStats {
            total_characters: extraction.text.chars().count(),
            number_of_chunks: chunks.len(),
            is_complex: extraction.is_complex,
        },
        text_sample: sample,
    }))
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to read multipart: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                // Una parte "file" sin nombre de fichero no es un fichero.
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Internal(format!("Failed to read file: {e}")))?;
                form.file = Some(UploadedDocument::new(filename, bytes));
            }
            Some("llama_api_key") => {
                let key = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Internal(format!("Failed to read field: {e}")))?;
                form.llama_api_key = Some(key);
            }
            _ => {}
        }
    }

    Ok(form)
}

#[axum::debug_handler]
async fn ask_question_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AskQuestionResponse>, ApiError> {
    let span = info_span!("ask_question", request_id = %Uuid::new_v4());
    ask_question(&state, &body).instrument(span).await
}

async fn ask_question(state: &AppState, body: &[u8]) -> Result<Json<AskQuestionResponse>, ApiError> {
    let payload: AskQuestionPayload =
        serde_json::from_slice(body).map_err(|e| ApiError::Internal(e.to_string()))?;

    let (Some(context), Some(question)) = (
        payload_text(payload.context),
        payload_text(payload.question),
    ) else {
        return Err(ApiError::bad_request("Context and question are required"));
    };

    let answer = state.answerer.answer(&context, &question).await?;
    Ok(Json(AskQuestionResponse {
        success: true,
        answer,
    }))
}

/// Valores vacíos (`null`, `""`, `false`, `0`, `[]`, `{}`) cuentan como
/// ausentes. Una cadena se usa tal cual; cualquier otro valor, serializado.
fn payload_text(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text),
        Value::Number(ref number) if number.as_f64() == Some(0.0) => None,
        Value::Array(ref items) if items.is_empty() => None,
        Value::Object(ref fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
