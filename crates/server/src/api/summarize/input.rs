//! Request body extraction for `POST /summarize`.
//!
//! Accepts `multipart/form-data` (`prompt`, `file`) or
//! `application/x-www-form-urlencoded` (`prompt`). Any other body carries no
//! input and is left for the handler to reject.

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Form;
use serde::Deserialize;

use crate::api::ApiError;

pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Default)]
pub struct SummarizeInput {
    pub prompt: Option<String>,
    pub file: Option<Upload>,
}

#[derive(Deserialize)]
struct PromptForm {
    prompt: Option<String>,
}

impl<S: Send + Sync> FromRequest<S> for SummarizeInput {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidForm(e.body_text()))?;
            read_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<PromptForm>::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidForm(e.body_text()))?;
            Ok(Self {
                prompt: form.prompt,
                file: None,
            })
        } else {
            Ok(Self::default())
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<SummarizeInput, ApiError> {
    let mut input = SummarizeInput::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "prompt" => {
                input.prompt = Some(field.text().await.map_err(form_error)?);
            }
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(form_error)?;
                // Browsers send an empty, unnamed part when no file was picked
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                input.file = Some(Upload { filename, bytes });
            }
            other => tracing::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(input)
}

fn form_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BodyTooLarge
    } else {
        ApiError::InvalidForm(e.body_text())
    }
}
