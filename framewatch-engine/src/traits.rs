use async_trait::async_trait;
use framewatch_core::types::{MediaConstraints, MediaSource};
use framewatch_providers::process_frame::AnalysisRequest;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    // Tightly packed RGBA8 rows at the stream's native resolution.
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl VideoFrame {
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: rgba.repeat(pixels),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no {0} device available")]
    NoDevice(MediaSource),

    #[error("{0} capture is not supported by this backend")]
    Unsupported(MediaSource),

    #[error("stream has ended")]
    Ended,

    #[error("capture failed: {0}")]
    Capture(String),
}

/// A live video stream bound to the capture controller.
#[async_trait]
pub trait MediaStream: Send + Sync {
    fn source(&self) -> MediaSource;

    /// Human-readable device/window name for logs.
    fn label(&self) -> String;

    /// The most recent frame at native resolution.
    async fn grab_frame(&self) -> anyhow::Result<VideoFrame>;

    /// Terminates every track of the stream. Further grabs fail with `MediaError::Ended`.
    fn stop_tracks(&self);
}

#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn acquire(
        &self,
        source: MediaSource,
        constraints: MediaConstraints,
    ) -> anyhow::Result<Arc<dyn MediaStream>>;
}

#[async_trait]
pub trait FrameAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> anyhow::Result<String>;
}

/// Where status lines and analysis results are shown.
pub trait OutputSink: Send + Sync {
    /// Appends a line to the end of the log.
    fn append(&self, line: &str);

    /// Replaces the visible content with `text`.
    fn present(&self, text: &str);
}
