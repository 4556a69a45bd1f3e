//! HTTP endpoints and the error type they share.
//!
//! `ApiError` is the only place where pipeline failures become HTTP
//! statuses. Detail strings are user-facing (Indonesian) and kept short.

mod health;
mod summarize;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ringkas_extract::ExtractionError;
use ringkas_llm::LlmError;

// ── Shared types ─────────────────────────────────────────────────

/// Error body, same shape as FastAPI's `HTTPException`.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Neither a prompt nor a file was sent.
    NoInput,
    /// Input was present but produced no text.
    EmptyText,
    /// File suffix is not one of `.txt`, `.docx`, `.pdf`.
    UnsupportedType,
    FileTooLarge { limit: usize },
    /// Body rejected by the transport-level size limit.
    BodyTooLarge,
    InvalidForm(String),
    /// A supported file failed to parse. Reported as a server error.
    Extraction(ExtractionError),
    Upstream(LlmError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoInput
            | ApiError::EmptyText
            | ApiError::UnsupportedType
            | ApiError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            ApiError::FileTooLarge { .. } | ApiError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Extraction(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::NoInput => "Tidak ada teks atau file yang diunggah.".to_string(),
            ApiError::EmptyText => "Teks yang diekstrak kosong atau tidak valid.".to_string(),
            ApiError::UnsupportedType => {
                "Tipe file tidak didukung. Gunakan .txt, .docx, atau .pdf.".to_string()
            }
            ApiError::FileTooLarge { limit } => {
                format!("Ukuran file melebihi batas {}.", human_size(*limit))
            }
            ApiError::BodyTooLarge => "Ukuran permintaan melebihi batas.".to_string(),
            ApiError::InvalidForm(e) => format!("Form tidak valid: {e}"),
            ApiError::Extraction(e) => format!("Gagal mengekstrak teks dari file: {e}"),
            ApiError::Upstream(e) => upstream_detail(e),
            ApiError::Internal(e) => e.clone(),
        }
    }
}

/// Transport failures collapse into one message; their kind only shows in logs.
fn upstream_detail(e: &LlmError) -> String {
    match e {
        LlmError::ApiError { status, .. } => format!("Gagal menghubungi API: {status}"),
        LlmError::MalformedResponse(_) => "API tidak mengembalikan konten.".to_string(),
        LlmError::Timeout(_) => "Waktu permintaan ke API habis.".to_string(),
        LlmError::Connect(_) | LlmError::Protocol(_) => "Gagal menghubungi API.".to_string(),
        LlmError::NotConfigured(_) => "API belum dikonfigurasi.".to_string(),
    }
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{bytes} byte")
    }
}

impl From<ExtractionError> for ApiError {
    fn from(e: ExtractionError) -> Self {
        if e.is_rejected_input() {
            ApiError::UnsupportedType
        } else {
            ApiError::Extraction(e)
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        ApiError::Upstream(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {:?}", self);
        } else {
            tracing::info!(status = status.as_u16(), "Request rejected: {:?}", self);
        }
        (status, Json(ErrorResponse { detail: self.detail() })).into_response()
    }
}

// ── Re-exports ───────────────────────────────────────────────────

pub use health::health;
pub use summarize::summarize;
