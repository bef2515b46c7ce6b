use crate::session::{CaptureController, SessionError};
use framewatch_core::types::MediaSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Bound(MediaSource),
    // Another selection or start is in progress.
    Busy,
}

impl CaptureController {
    /// Replaces the bound stream with a new one from `source`.
    ///
    /// The previous stream's tracks are stopped before the new stream is
    /// requested. On failure nothing is bound.
    pub async fn select_source(&self, source: MediaSource) -> Result<SelectOutcome, SessionError> {
        let previous = {
            let mut inner = self.lock().await;
            if inner.busy {
                log::debug!("source selection ignored: busy");
                return Ok(SelectOutcome::Busy);
            }
            inner.busy = true;
            inner.stream.take()
        };

        if let Some(prev) = previous {
            log::info!("stopping {} stream ({})", prev.source(), prev.label());
            prev.stop_tracks();
        }

        let acquired = self
            .shared
            .backend
            .acquire(source, source.constraints())
            .await;

        let mut inner = self.lock().await;
        inner.busy = false;

        match acquired {
            Ok(stream) => {
                log::info!("bound {source} stream ({})", stream.label());
                inner.stream = Some(stream);
                drop(inner);
                self.sink().append(source.started_message());
                Ok(SelectOutcome::Bound(source))
            }
            Err(e) => {
                drop(inner);
                let message = format!("{e:#}");
                log::warn!("failed to acquire {source} stream: {message}");
                self.sink().append(&format!("Error: {message}"));
                Err(SessionError::MediaAcquisition {
                    media: source,
                    message,
                })
            }
        }
    }

    /// Stops and unbinds the active stream, if any.
    pub async fn release_source(&self) {
        let stream = self.lock().await.stream.take();
        if let Some(stream) = stream {
            log::info!("released {} stream", stream.source());
            stream.stop_tracks();
        }
    }

    pub async fn active_source(&self) -> Option<MediaSource> {
        self.lock().await.stream.as_ref().map(|s| s.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ControllerOptions, StartOutcome};
    use crate::sink::MemorySink;
    use crate::traits::{FrameAnalyzer, MediaBackend, MediaError, MediaStream, VideoFrame};
    use async_trait::async_trait;
    use framewatch_core::settings::Settings;
    use framewatch_core::types::{DisplaySurface, MediaConstraints};
    use framewatch_providers::process_frame::AnalysisRequest;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Events = Arc<Mutex<Vec<String>>>;

    struct RecordingStream {
        source: MediaSource,
        events: Events,
    }

    #[async_trait]
    impl MediaStream for RecordingStream {
        fn source(&self) -> MediaSource {
            self.source
        }

        fn label(&self) -> String {
            format!("rec-{}", self.source)
        }

        async fn grab_frame(&self) -> anyhow::Result<VideoFrame> {
            Ok(VideoFrame::solid(2, 2, [0, 0, 0, 255]))
        }

        fn stop_tracks(&self) {
            self.events.lock().unwrap().push(format!("stop {}", self.source));
        }
    }

    struct RecordingBackend {
        events: Events,
        deny: Option<MediaSource>,
        delay: Option<Duration>,
        seen: Mutex<Vec<MediaConstraints>>,
    }

    #[async_trait]
    impl MediaBackend for RecordingBackend {
        async fn acquire(
            &self,
            source: MediaSource,
            constraints: MediaConstraints,
        ) -> anyhow::Result<Arc<dyn MediaStream>> {
            self.events.lock().unwrap().push(format!("acquire {source}"));
            self.seen.lock().unwrap().push(constraints);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.deny == Some(source) {
                return Err(MediaError::PermissionDenied("user dismissed the picker".into()).into());
            }
            Ok(Arc::new(RecordingStream {
                source,
                events: self.events.clone(),
            }))
        }
    }

    struct NoopAnalyzer;

    #[async_trait]
    impl FrameAnalyzer for NoopAnalyzer {
        async fn analyze(&self, _request: &AnalysisRequest) -> anyhow::Result<String> {
            Ok("ok".into())
        }
    }

    fn setup(deny: Option<MediaSource>) -> (CaptureController, Arc<RecordingBackend>, Arc<MemorySink>) {
        setup_with_delay(deny, None)
    }

    fn setup_with_delay(
        deny: Option<MediaSource>,
        delay: Option<Duration>,
    ) -> (CaptureController, Arc<RecordingBackend>, Arc<MemorySink>) {
        let backend = Arc::new(RecordingBackend {
            events: Arc::new(Mutex::new(vec![])),
            deny,
            delay,
            seen: Mutex::new(vec![]),
        });
        let sink = Arc::new(MemorySink::new());
        let c = CaptureController::new(
            Settings::default(),
            ControllerOptions::default(),
            backend.clone(),
            Arc::new(NoopAnalyzer),
            sink.clone(),
        );
        (c, backend, sink)
    }

    #[tokio::test]
    async fn switching_source_stops_previous_tracks_first() {
        let (c, backend, sink) = setup(None);

        c.select_source(MediaSource::Camera).await.unwrap();
        c.select_source(MediaSource::Application).await.unwrap();

        let events = backend.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["acquire camera", "stop camera", "acquire application"]
        );
        assert_eq!(c.active_source().await, Some(MediaSource::Application));
        assert_eq!(sink.last_line().as_deref(), Some("Application share started."));

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen[1].display_surface, Some(DisplaySurface::Application));
    }

    #[tokio::test]
    async fn denied_permission_leaves_nothing_bound() {
        let (c, backend, sink) = setup(Some(MediaSource::Screen));

        c.select_source(MediaSource::Camera).await.unwrap();
        let err = c.select_source(MediaSource::Screen).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::MediaAcquisition {
                media: MediaSource::Screen,
                ..
            }
        ));

        assert_eq!(c.active_source().await, None);
        assert!(!c.status().await.busy);
        assert!(sink.last_line().unwrap().starts_with("Error: permission denied"));
        assert!(backend.events.lock().unwrap().contains(&"stop camera".to_string()));
    }

    #[tokio::test]
    async fn release_stops_tracks() {
        let (c, backend, _sink) = setup(None);
        c.select_source(MediaSource::Screen).await.unwrap();
        c.release_source().await;
        assert_eq!(c.active_source().await, None);
        assert_eq!(
            backend.events.lock().unwrap().last().map(String::as_str),
            Some("stop screen")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_selection_is_rejected_while_busy() {
        let (c, backend, _sink) = setup_with_delay(None, Some(Duration::from_secs(2)));

        let first = {
            let c = c.clone();
            tokio::spawn(async move { c.select_source(MediaSource::Camera).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(c.status().await.busy);
        assert_eq!(
            c.select_source(MediaSource::Screen).await.unwrap(),
            SelectOutcome::Busy
        );
        assert_eq!(c.start().await.unwrap(), StartOutcome::Ignored);

        assert_eq!(
            first.await.unwrap().unwrap(),
            SelectOutcome::Bound(MediaSource::Camera)
        );
        assert!(!c.status().await.busy);
        assert_eq!(
            backend.events.lock().unwrap().clone(),
            vec!["acquire camera"]
        );
    }
}
