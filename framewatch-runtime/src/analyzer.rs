use framewatch_core::config::EndpointConfig;
use framewatch_engine::traits::FrameAnalyzer;
use framewatch_providers::parse::{AnalysisError, parse_process_frame_response};
use framewatch_providers::process_frame::{
    AnalysisRequest, build_process_frame_request, process_frame_url,
};
use framewatch_providers::runtime::HttpClient;
use std::time::Duration;
use url::Url;

/// Sends frames to a `/process_frame` endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFrameAnalyzer {
    client: HttpClient,
    endpoint: Url,
}

impl HttpFrameAnalyzer {
    pub fn new(cfg: &EndpointConfig) -> anyhow::Result<Self> {
        let endpoint = process_frame_url(&cfg.base_url)?;
        let client = HttpClient::new(cfg.request_timeout_secs.map(Duration::from_secs))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Single attempt; no retry.
    pub async fn analyze_once(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let http = build_process_frame_request(&self.endpoint, request)
            .map_err(|e| AnalysisError::Transport(format!("{e:#}")))?;
        log::debug!("sending {http:?}");

        let resp = self
            .client
            .execute(&http)
            .await
            .map_err(|e| AnalysisError::Transport(format!("{e:#}")))?;
        log::debug!(
            "response status={} content_type={:?} bytes={}",
            resp.status,
            resp.content_type,
            resp.body.len()
        );

        parse_process_frame_response(&resp)
    }
}

#[async_trait::async_trait]
impl FrameAnalyzer for HttpFrameAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> anyhow::Result<String> {
        Ok(self.analyze_once(request).await?)
    }
}
