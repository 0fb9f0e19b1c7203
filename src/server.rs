//! HTTP surface: `/encode`, `/decode`, `/capacity` and `/health`.
//!
//! Every request builds its own carrier and frame on a blocking worker and
//! throws them away afterwards. Nothing is shared between requests except
//! the read-only [`Config`].

use std::io::Cursor;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header::{self, HeaderName};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::{Capacity, Carrier, DecodeOutcome, Decoder, Encoder, StegoError};

pub const CAPACITY_USED: HeaderName = HeaderName::from_static("x-capacity-used");
pub const ENCRYPTION_USED: HeaderName = HeaderName::from_static("x-encryption-used");
pub const MESSAGE_SIZE: HeaderName = HeaderName::from_static("x-message-size");

const SERVICE_NAME: &str = "StegoCrypt API";
const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/png", "image/bmp", "image/jpeg", "image/jpg"];

/// Room for the message, password and multipart framing next to the image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn router(config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([CAPACITY_USED, ENCRYPTION_USED, MESSAGE_SIZE]);

    let body_limit = config
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/encode", post(encode))
        .route("/decode", post(decode))
        .route("/capacity", post(capacity))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(Arc::new(config.clone()))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Image Steganography with AES-256 Encryption",
        "endpoints": {
            "encode": "/encode",
            "decode": "/decode",
            "capacity": "/capacity",
        },
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

async fn encode(State(config): State<Arc<Config>>, multipart: Multipart) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart, &config).await?;
    let image = form.take_image()?;
    let message = form
        .message
        .ok_or_else(|| ApiError::bad_request("missing form field: message"))?;
    let password = form.password;

    let (summary, stego_image) = run_blocking(move || {
        let mut output = Cursor::new(Vec::new());
        let summary =
            Encoder::new().encode(Cursor::new(image), &message, password.as_deref(), &mut output)?;
        Ok((summary, output.into_inner()))
    })
    .await?;

    info!(
        encrypted = summary.encryption_used,
        message_size = summary.message_size_bytes,
        capacity_used = summary.capacity_used_percent,
        "message embedded"
    );

    let encryption_used = if summary.encryption_used { "True" } else { "False" };
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=stego_image.png".to_string(),
            ),
            (CAPACITY_USED, format!("{:.1}", summary.capacity_used_percent)),
            (ENCRYPTION_USED, encryption_used.to_string()),
            (MESSAGE_SIZE, summary.message_size_bytes.to_string()),
        ],
        stego_image,
    )
        .into_response())
}

#[derive(Serialize)]
struct DecodeResponse {
    success: bool,
    #[serde(flatten)]
    outcome: DecodeOutcome,
}

async fn decode(
    State(config): State<Arc<Config>>,
    multipart: Multipart,
) -> Result<Json<DecodeResponse>, ApiError> {
    let mut form = UploadForm::read(multipart, &config).await?;
    let image = form.take_image()?;
    let password = form.password;

    let outcome = run_blocking(move || {
        Decoder::new().decode(Cursor::new(image), password.as_deref())
    })
    .await?;

    info!(
        decrypted = outcome.decryption_used,
        message_length = outcome.message_length,
        "message extracted"
    );

    Ok(Json(DecodeResponse {
        success: true,
        outcome,
    }))
}

#[derive(Serialize)]
struct CapacityResponse {
    success: bool,
    capacity: Capacity,
}

async fn capacity(
    State(config): State<Arc<Config>>,
    multipart: Multipart,
) -> Result<Json<CapacityResponse>, ApiError> {
    let mut form = UploadForm::read(multipart, &config).await?;
    let image = form.take_image()?;

    let capacity = run_blocking(move || Ok(Capacity::of(&Carrier::from_bytes(&image)?))).await?;

    Ok(Json(CapacityResponse {
        success: true,
        capacity,
    }))
}

/// Pixel walking and key derivation are CPU-bound, keep them off the reactor.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("worker failed: {err}"),
        )),
    }
}

#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    message: Option<String>,
    password: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, config: &Config) -> Result<Self, ApiError> {
        let mut form = Self::default();

        let map_upload_err = |err| upload_error(err, config);

        while let Some(field) = multipart.next_field().await.map_err(map_upload_err)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    if let Some(content_type) = field.content_type() {
                        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
                            return Err(StegoError::UnsupportedFormat.into());
                        }
                    }

                    let bytes = field.bytes().await.map_err(map_upload_err)?;
                    if bytes.len() > config.max_upload_bytes {
                        return Err(file_too_large(config));
                    }
                    form.image = Some(bytes.to_vec());
                }
                "message" => form.message = Some(field.text().await.map_err(map_upload_err)?),
                "password" => form.password = Some(field.text().await.map_err(map_upload_err)?),
                other => warn!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn take_image(&mut self) -> Result<Vec<u8>, ApiError> {
        self.image
            .take()
            .ok_or_else(|| ApiError::bad_request("missing form field: image"))
    }
}

fn file_too_large(config: &Config) -> ApiError {
    ApiError::bad_request(format!(
        "File too large. Max size: {} MB",
        config.max_upload_bytes / (1024 * 1024)
    ))
}

/// A body cut off by the router's limit is still an oversized upload.
fn upload_error(err: MultipartError, config: &Config) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        file_too_large(config)
    } else {
        err.into()
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl From<StegoError> for ApiError {
    fn from(err: StegoError) -> Self {
        let status = match &err {
            StegoError::UnsupportedFormat
            | StegoError::CorruptImage(_)
            | StegoError::CarrierTooSmall { .. }
            | StegoError::EmptyMessage
            | StegoError::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            StegoError::PasswordRequired | StegoError::InvalidPassword => StatusCode::UNAUTHORIZED,
            StegoError::NoHiddenMessage
            | StegoError::TruncatedFrame { .. }
            | StegoError::InvalidLength(_)
            | StegoError::InvalidFlag(_) => StatusCode::NOT_FOUND,
            StegoError::EncryptionFailed | StegoError::ImageEncoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, detail = %self.detail, "request failed");
        }
        let body = Json(serde_json::json!({
            "detail": self.detail,
        }));
        (self.status, body).into_response()
    }
}
