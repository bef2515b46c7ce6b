use std::sync::Arc;

use async_trait::async_trait;
use framewatch_core::types::{CaptureKind, MediaConstraints, MediaSource};
use framewatch_engine::traits::{MediaBackend, MediaError, MediaStream};

/// Dispatches stream requests to the backend for the requested capture kind.
///
/// - `CaptureKind::UserCamera` -> camera backend
/// - `CaptureKind::Display` -> display backend (screen and application windows)
#[derive(Clone, Default)]
pub struct MediaRouter {
    camera: Option<Arc<dyn MediaBackend>>,
    display: Option<Arc<dyn MediaBackend>>,
}

impl MediaRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.camera = Some(backend);
        self
    }

    pub fn with_display(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.display = Some(backend);
        self
    }

    pub fn supports(&self, source: MediaSource) -> bool {
        match source.constraints().kind {
            CaptureKind::UserCamera => self.camera.is_some(),
            CaptureKind::Display => self.display.is_some(),
        }
    }
}

#[async_trait]
impl MediaBackend for MediaRouter {
    async fn acquire(
        &self,
        source: MediaSource,
        constraints: MediaConstraints,
    ) -> anyhow::Result<Arc<dyn MediaStream>> {
        let backend = match constraints.kind {
            CaptureKind::UserCamera => self.camera.as_ref(),
            CaptureKind::Display => self.display.as_ref(),
        };
        let backend = backend.ok_or(MediaError::Unsupported(source))?;
        backend.acquire(source, constraints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::SyntheticBackend;

    #[tokio::test]
    async fn routes_display_sources_to_display_backend() {
        let display = Arc::new(SyntheticBackend::new(16, 9));
        let router = MediaRouter::new().with_display(display.clone());

        assert!(router.supports(MediaSource::Application));
        assert!(!router.supports(MediaSource::Camera));

        let s = router
            .acquire(MediaSource::Screen, MediaSource::Screen.constraints())
            .await
            .unwrap();
        assert_eq!(s.source(), MediaSource::Screen);
        assert_eq!(display.events(), vec!["acquire screen".to_string()]);

        let err = router
            .acquire(MediaSource::Camera, MediaSource::Camera.constraints())
            .await
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<MediaError>(),
            Some(&MediaError::Unsupported(MediaSource::Camera))
        );
    }
}
