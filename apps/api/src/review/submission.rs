//! Request extractor for resume submissions (multipart upload or JSON body).

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::review::extract::{extract_text, FileKind};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub media_type: String,
    pub bytes: Bytes,
}

/// Pasted text and/or an uploaded file. When a file is present it is the
/// source of the resume text.
#[derive(Debug, Clone, Default)]
pub struct ResumeSubmission {
    pub text: Option<String>,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    #[serde(default)]
    text: Option<String>,
}

impl ResumeSubmission {
    /// Resolves the submission to raw resume text, extracting the uploaded
    /// file if there is one.
    pub async fn into_text(self) -> Result<String, AppError> {
        let Some(file) = self.file else {
            return Ok(self.text.unwrap_or_default());
        };

        let kind = FileKind::from_media_type(&file.media_type)?;
        info!(
            file_name = file.file_name.as_deref().unwrap_or("<unnamed>"),
            media_type = %file.media_type,
            size = file.bytes.len(),
            "Extracting text from uploaded file"
        );

        let bytes = file.bytes;
        let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;
        Ok(text)
    }
}

#[async_trait]
impl FromRequest<AppState> for ResumeSubmission {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        // Anything that is not a form is read as a JSON body, whatever its
        // declared content type.
        if !is_multipart {
            let raw = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            let body: TextBody = serde_json::from_slice(&raw)
                .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?;
            return Ok(ResumeSubmission {
                text: body.text,
                file: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut submission = ResumeSubmission::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e.body_text())))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().map(String::from);
                    let media_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::Validation(format!("Invalid file upload: {}", e.body_text()))
                    })?;

                    if bytes.len() > state.config.max_upload_bytes {
                        return Err(AppError::Validation(format!(
                            "File size exceeds the {} byte limit",
                            state.config.max_upload_bytes
                        )));
                    }
                    // Browsers send an empty part when no file was chosen.
                    if !bytes.is_empty() {
                        submission.file = Some(UploadedFile {
                            file_name,
                            media_type,
                            bytes,
                        });
                    }
                }
                "text" => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Invalid text field: {}", e.body_text()))
                    })?;
                    submission.text = Some(text);
                }
                _ => {}
            }
        }

        Ok(submission)
    }
}
