//! `POST /summarize`: text or document in, summary out.

mod input;


use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use self::input::{SummarizeInput, Upload};
use super::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SummaryEnvelope {
    pub success: bool,
    pub data: SummaryData,
}

#[derive(Serialize)]
pub struct SummaryData {
    pub text: String,
}

/// Validate, extract, summarize. A supplied file takes precedence over the
/// prompt; nothing is retried.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    input: SummarizeInput,
) -> Result<Json<SummaryEnvelope>, ApiError> {
    let started = Instant::now();
    let has_prompt = input.prompt.as_deref().is_some_and(|p| !p.is_empty());
    if input.file.is_none() && !has_prompt {
        return Err(ApiError::NoInput);
    }

    let text = match input.file {
        Some(upload) => extract_upload(&state, upload).await?,
        None => input.prompt.unwrap_or_default().trim().to_string(),
    };

    if text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }

    let input_chars = text.chars().count();
    let summary = state.summarizer.summarize(&text).await.map_err(|e| {
        warn!(
            kind = e.kind(),
            input_chars,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Summarization failed: {}", e
        );
        ApiError::from(e)
    })?;

    info!(
        input_chars,
        summary_chars = summary.chars().count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Summary generated"
    );

    Ok(Json(SummaryEnvelope {
        success: true,
        data: SummaryData { text: summary },
    }))
}

/// Size-check the upload, then extract its text on the blocking pool.
async fn extract_upload(state: &AppState, upload: Upload) -> Result<String, ApiError> {
    let Upload { filename, bytes } = upload;
    let size = bytes.len();
    let limit = state.limits.max_upload_bytes;

    if size > limit {
        warn!(filename = %filename, size, limit, "Upload exceeds size limit");
        return Err(ApiError::FileTooLarge { limit });
    }

    let started = Instant::now();
    let max_pages = state.limits.max_pdf_pages;
    let name = filename.clone();
    let result = tokio::task::spawn_blocking(move || {
        ringkas_extract::extract_text_with_limit(&bytes, &name, max_pages)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Gagal mengekstrak teks dari file: {e}")))?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(doc) => {
            info!(
                filename = %filename,
                file_type = %doc.file_type,
                size,
                chars = doc.total_chars(),
                truncated_pages = doc.truncation.is_some(),
                elapsed_ms,
                "Extracted text from upload"
            );
            Ok(doc.text)
        }
        Err(e) => {
            warn!(filename = %filename, size, elapsed_ms, "Extraction failed: {}", e);
            Err(e.into())
        }
    }
}
