use crate::encoder::encode_jpeg_data_uri;
use crate::traits::{FrameAnalyzer, MediaBackend, MediaStream, OutputSink};
use framewatch_core::config::{CaptureOptions, DEFAULT_JPEG_QUALITY};
use framewatch_core::settings::{Settings, SettingsError};
use framewatch_core::types::{MediaSource, SessionState, StaleResponsePolicy};
use framewatch_providers::process_frame::AnalysisRequest;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active media stream; select a source first")]
    NoActiveStream,

    #[error("failed to acquire {media} stream: {message}")]
    MediaAcquisition { media: MediaSource, message: String },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { generation: u64 },
    // Already capturing, or another start/selection is in progress.
    Ignored,
    // `stop()` ran while the first capture was in flight.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    // Not capturing (or the tick belongs to an earlier session).
    Skipped,
    Presented(String),
    Failed(String),
    // Arrived after its session ended and the policy drops those.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub timer_armed: bool,
    pub generation: u64,
    pub active_source: Option<MediaSource>,
    pub busy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub jpeg_quality: u8,
    pub stale_responses: StaleResponsePolicy,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            stale_responses: StaleResponsePolicy::Display,
        }
    }
}

impl From<CaptureOptions> for ControllerOptions {
    fn from(o: CaptureOptions) -> Self {
        Self {
            jpeg_quality: o.jpeg_quality,
            stale_responses: o.stale_responses,
        }
    }
}

#[derive(Default)]
pub(crate) struct Inner {
    pub(crate) state: SessionState,
    // Shared by source selection and start; neither is re-entrant.
    pub(crate) busy: bool,
    pub(crate) generation: u64,
    pub(crate) timer: Option<JoinHandle<()>>,
    pub(crate) stream: Option<Arc<dyn MediaStream>>,
    pub(crate) settings: Settings,
}

pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    pub(crate) backend: Arc<dyn MediaBackend>,
    pub(crate) analyzer: Arc<dyn FrameAnalyzer>,
    pub(crate) sink: Arc<dyn OutputSink>,
    pub(crate) options: ControllerOptions,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        if let Some(stream) = inner.stream.take() {
            stream.stop_tracks();
        }
    }
}

/// Owns the capture session: the bound stream, the settings and the timer.
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct CaptureController {
    pub(crate) shared: Arc<Shared>,
}

impl CaptureController {
    pub fn new(
        settings: Settings,
        options: ControllerOptions,
        backend: Arc<dyn MediaBackend>,
        analyzer: Arc<dyn FrameAnalyzer>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    settings,
                    ..Default::default()
                }),
                backend,
                analyzer,
                sink,
                options,
            }),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().await
    }

    pub(crate) fn sink(&self) -> &dyn OutputSink {
        self.shared.sink.as_ref()
    }

    pub async fn status(&self) -> SessionStatus {
        let inner = self.lock().await;
        SessionStatus {
            state: inner.state,
            timer_armed: inner.timer.is_some(),
            generation: inner.generation,
            active_source: inner.stream.as_ref().map(|s| s.source()),
            busy: inner.busy,
        }
    }

    /// Begins a session: one immediate capture, then one every refresh interval.
    pub async fn start(&self) -> Result<StartOutcome, SessionError> {
        let generation = {
            let mut inner = self.lock().await;
            if inner.busy || inner.state == SessionState::Capturing {
                log::debug!("start ignored (busy={}, state={:?})", inner.busy, inner.state);
                return Ok(StartOutcome::Ignored);
            }
            inner.busy = true;
            inner.state = SessionState::Capturing;
            inner.generation += 1;
            inner.generation
        };

        let first = self.capture_frame(generation).await;

        let mut inner = self.lock().await;
        inner.busy = false;

        if let Err(e) = first {
            if inner.generation == generation {
                inner.state = SessionState::Idle;
            }
            drop(inner);
            log::error!("error starting capture: {e}");
            self.sink().append("Error starting capture.");
            return Err(e);
        }

        if inner.state != SessionState::Capturing || inner.generation != generation {
            log::info!("capture stopped before the timer was armed (generation {generation})");
            return Ok(StartOutcome::Cancelled);
        }

        let period = inner.settings.refresh_interval();
        inner.timer = Some(self.spawn_timer(generation, period));
        drop(inner);

        log::info!("capture started (generation {generation}, every {period:?})");
        self.sink().append("Capture started.");
        Ok(StartOutcome::Started { generation })
    }

    /// Ends the session. In-flight requests are not aborted.
    pub async fn stop(&self) -> StopOutcome {
        let timer = {
            let mut inner = self.lock().await;
            if inner.state == SessionState::Idle {
                return StopOutcome::Ignored;
            }
            inner.state = SessionState::Idle;
            inner.timer.take()
        };

        if let Some(timer) = timer {
            timer.abort();
        }

        log::info!("capture stopped");
        self.sink().append("Capture stopped.");
        StopOutcome::Stopped
    }

    fn spawn_timer(&self, generation: u64, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let now = Instant::now();
            let first = now.checked_add(period).unwrap_or(now);
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let controller = CaptureController { shared };

                // Ticks are not serialized: a slow request overlaps the next tick.
                tokio::spawn(async move {
                    if let Err(e) = controller.capture_frame(generation).await {
                        controller.report_error(&e.to_string());
                    }
                });
            }
        })
    }

    /// Runs one capture-and-analyze cycle for `generation`.
    ///
    /// Grab, encode and analysis failures are reported to the sink and returned as
    /// `TickOutcome::Failed`; only a missing stream is returned as an error.
    pub async fn capture_frame(&self, generation: u64) -> Result<TickOutcome, SessionError> {
        let (stream, settings) = {
            let inner = self.lock().await;
            if inner.state != SessionState::Capturing || inner.generation != generation {
                return Ok(TickOutcome::Skipped);
            }
            let stream = inner.stream.clone().ok_or(SessionError::NoActiveStream)?;
            (stream, inner.settings.clone())
        };

        let result = self.analyze_stream(stream.as_ref(), &settings).await;

        if self.is_stale(generation).await
            && self.shared.options.stale_responses == StaleResponsePolicy::Discard
        {
            log::debug!("discarding response from ended session {generation}");
            return Ok(TickOutcome::Discarded);
        }

        match result {
            Ok(text) => {
                self.sink().present(&text);
                Ok(TickOutcome::Presented(text))
            }
            Err(e) => {
                let message = format!("{e:#}");
                self.report_error(&message);
                Ok(TickOutcome::Failed(message))
            }
        }
    }

    async fn analyze_stream(
        &self,
        stream: &dyn MediaStream,
        settings: &Settings,
    ) -> anyhow::Result<String> {
        let frame = stream.grab_frame().await?;
        let image = encode_jpeg_data_uri(&frame, self.shared.options.jpeg_quality)?;
        log::debug!(
            "sending {}x{} frame from {} ({} bytes)",
            frame.width,
            frame.height,
            stream.label(),
            image.len()
        );

        let request = AnalysisRequest::new(image, settings.prompt_text.clone(), settings.api_key());
        self.shared.analyzer.analyze(&request).await
    }

    async fn is_stale(&self, generation: u64) -> bool {
        let inner = self.lock().await;
        inner.state != SessionState::Capturing || inner.generation != generation
    }

    fn report_error(&self, message: &str) {
        log::error!("capture tick failed: {message}");
        let line = format!("Error: {message}");
        self.sink().append(&line);
        self.sink().present(&line);
    }

    pub async fn settings(&self) -> Settings {
        self.lock().await.settings.clone()
    }

    /// Applies the settings form. Takes effect from the next tick; the refresh
    /// interval applies from the next `start()`.
    pub async fn save_settings(
        &self,
        raw_mode: &str,
        raw_prompt: &str,
        raw_interval: &str,
        raw_credential: &str,
    ) -> Result<Settings, SessionError> {
        let saved = {
            let mut inner = self.lock().await;
            let mut next = inner.settings.clone();
            next.save(raw_mode, raw_prompt, raw_interval, raw_credential)?;
            inner.settings = next.clone();
            next
        };

        log::info!("settings saved: {saved:?}");
        self.sink().append(&format!(
            "Settings saved. Using {} analysis mode.",
            saved.prompt_mode
        ));
        Ok(saved)
    }

    /// Stops capture and releases the bound stream.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.release_source().await;
    }
}
