use crate::request::HttpRequest;
use anyhow::Context;
use serde::Serialize;
use url::Url;

pub const PROCESS_FRAME_PATH: &str = "process_frame";

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub image: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("image", &format!("<{} bytes>", self.image.len()))
            .field("prompt", &self.prompt)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AnalysisRequest {
    pub fn new(image: impl Into<String>, prompt: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            image: image.into(),
            prompt: prompt.into(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
        }
    }
}

/// Resolves `<base_url>/process_frame`.
///
/// The base URL may carry a path prefix (e.g. behind a reverse proxy); it is kept.
pub fn process_frame_url(base_url: &str) -> anyhow::Result<Url> {
    let trimmed = base_url.trim();
    let mut base = Url::parse(trimmed).with_context(|| format!("invalid base url: {trimmed}"))?;
    if !base.path().ends_with('/') {
        let p = format!("{}/", base.path());
        base.set_path(&p);
    }
    base.join(PROCESS_FRAME_PATH)
        .with_context(|| format!("join {PROCESS_FRAME_PATH} onto {trimmed}"))
}

pub fn build_process_frame_request(
    endpoint: &Url,
    req: &AnalysisRequest,
) -> anyhow::Result<HttpRequest> {
    let payload = serde_json::to_string(req).context("encode analysis request JSON")?;

    Ok(HttpRequest {
        url: endpoint.to_string(),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Accept".into(), "application/json".into()),
        ],
        json_body: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoint_path() {
        assert_eq!(
            process_frame_url("http://127.0.0.1:5000").unwrap().as_str(),
            "http://127.0.0.1:5000/process_frame"
        );
        assert_eq!(
            process_frame_url("https://vision.example.com/api/").unwrap().as_str(),
            "https://vision.example.com/api/process_frame"
        );
        assert_eq!(
            process_frame_url("https://vision.example.com/api").unwrap().as_str(),
            "https://vision.example.com/api/process_frame"
        );
        assert!(process_frame_url("not a url").is_err());
    }

    #[test]
    fn omits_empty_api_key() {
        let url = process_frame_url("http://127.0.0.1:5000").unwrap();
        let req = AnalysisRequest::new("data:image/jpeg;base64,AAAA", "describe", Some(""));
        let http = build_process_frame_request(&url, &req).unwrap();

        assert_eq!(http.header("accept"), Some("application/json"));
        let v: serde_json::Value = serde_json::from_str(&http.json_body).unwrap();
        assert_eq!(v["image"], "data:image/jpeg;base64,AAAA");
        assert_eq!(v["prompt"], "describe");
        assert!(v.get("api_key").is_none());
    }

    #[test]
    fn includes_api_key_when_present() {
        let url = process_frame_url("http://127.0.0.1:5000").unwrap();
        let req = AnalysisRequest::new("data:,", "p", Some("sk-1"));
        let http = build_process_frame_request(&url, &req).unwrap();
        assert!(http.json_body.contains("\"api_key\":\"sk-1\""));
        assert!(!format!("{req:?}").contains("sk-1"));
    }
}
