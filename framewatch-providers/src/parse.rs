use crate::runtime::HttpResponse;
use serde::Deserialize;
use thiserror::Error;

/// Why an analysis round trip did not produce text.
///
/// The messages are shown to the user verbatim after an `Error: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP error! status: {status}, message: {body}")]
    Status { status: u16, body: String },

    #[error("Response was not JSON")]
    NotJson { content_type: Option<String> },

    #[error("Invalid response format")]
    InvalidFormat,
}

#[derive(Debug, Deserialize)]
struct ProcessFrameResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Validates a `/process_frame` response and extracts its text.
pub fn parse_process_frame_response(resp: &HttpResponse) -> Result<String, AnalysisError> {
    if !resp.is_success() {
        return Err(AnalysisError::Status {
            status: resp.status,
            body: resp.body_text(),
        });
    }

    let is_json = resp
        .content_type
        .as_deref()
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(AnalysisError::NotJson {
            content_type: resp.content_type.clone(),
        });
    }

    let decoded: ProcessFrameResponse =
        serde_json::from_slice(&resp.body).map_err(|_| AnalysisError::InvalidFormat)?;

    decoded
        .response
        .filter(|t| !t.is_empty())
        .ok_or(AnalysisError::InvalidFormat)
}
