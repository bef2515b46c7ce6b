//
// Screen and application-window capture on top of xcap.
//
// Targets are remembered by id and looked up again on every grab, so no xcap
// handle crosses threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use framewatch_core::types::{CursorVisibility, MediaConstraints, MediaSource};
use framewatch_engine::traits::{MediaBackend, MediaError, MediaStream, VideoFrame};
use xcap::{Monitor, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Monitor(u32),
    Window(u32),
}

/// Display capture for the screen and application sources.
///
/// There is no picker dialog: the screen source takes the primary monitor and
/// the application source takes the first visible window whose app name or
/// title contains `window_filter` (any window when unset).
#[derive(Debug, Clone, Default)]
pub struct ScreenBackend {
    window_filter: Option<String>,
}

impl ScreenBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.window_filter = (!filter.trim().is_empty()).then(|| filter.trim().to_lowercase());
        self
    }
}

fn pick_monitor() -> Result<(Target, String), MediaError> {
    let monitors = Monitor::all().map_err(|e| MediaError::Capture(format!("list monitors: {e}")))?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary())
        .or_else(|| monitors.first())
        .ok_or(MediaError::NoDevice(MediaSource::Screen))?;
    Ok((Target::Monitor(monitor.id()), monitor.name().to_string()))
}

fn pick_window(filter: Option<&str>) -> Result<(Target, String), MediaError> {
    let windows = Window::all().map_err(|e| MediaError::Capture(format!("list windows: {e}")))?;
    let window = windows
        .iter()
        .filter(|w| !w.is_minimized() && !w.title().is_empty())
        .find(|w| match filter {
            Some(needle) => {
                w.app_name().to_lowercase().contains(needle)
                    || w.title().to_lowercase().contains(needle)
            }
            None => true,
        })
        .ok_or(MediaError::NoDevice(MediaSource::Application))?;
    Ok((
        Target::Window(window.id()),
        format!("{} ({})", window.app_name(), window.title()),
    ))
}

fn capture(target: Target) -> Result<VideoFrame, MediaError> {
    let image = match target {
        Target::Monitor(id) => {
            let monitors =
                Monitor::all().map_err(|e| MediaError::Capture(format!("list monitors: {e}")))?;
            let monitor = monitors
                .into_iter()
                .find(|m| m.id() == id)
                .ok_or(MediaError::Ended)?;
            monitor
                .capture_image()
                .map_err(|e| MediaError::Capture(e.to_string()))?
        }
        Target::Window(id) => {
            let windows =
                Window::all().map_err(|e| MediaError::Capture(format!("list windows: {e}")))?;
            let window = windows
                .into_iter()
                .find(|w| w.id() == id)
                .ok_or(MediaError::Ended)?;
            window
                .capture_image()
                .map_err(|e| MediaError::Capture(e.to_string()))?
        }
    };
    let (width, height) = (image.width(), image.height());
    Ok(VideoFrame {
        width,
        height,
        rgba: image.into_raw(),
    })
}

#[async_trait]
impl MediaBackend for ScreenBackend {
    async fn acquire(
        &self,
        source: MediaSource,
        constraints: MediaConstraints,
    ) -> anyhow::Result<Arc<dyn MediaStream>> {
        if constraints.cursor == Some(CursorVisibility::Always) {
            log::debug!("cursor overlay is not drawn by this backend");
        }
        let filter = self.window_filter.clone();
        let (target, label) = tokio::task::spawn_blocking(move || match source {
            MediaSource::Screen => pick_monitor(),
            MediaSource::Application => pick_window(filter.as_deref()),
            MediaSource::Camera => Err(MediaError::Unsupported(source)),
        })
        .await
        .map_err(|e| MediaError::Capture(format!("display lookup panicked: {e}")))??;

        log::info!("{source} capture bound to {label}");
        Ok(Arc::new(ScreenStream {
            source,
            target,
            label,
            stopped: AtomicBool::new(false),
        }))
    }
}

pub struct ScreenStream {
    source: MediaSource,
    target: Target,
    label: String,
    stopped: AtomicBool,
}

#[async_trait]
impl MediaStream for ScreenStream {
    fn source(&self) -> MediaSource {
        self.source
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    async fn grab_frame(&self) -> anyhow::Result<VideoFrame> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(MediaError::Ended.into());
        }
        let target = self.target;
        let frame = tokio::task::spawn_blocking(move || capture(target))
            .await
            .map_err(|e| MediaError::Capture(format!("capture task panicked: {e}")))??;
        Ok(frame)
    }

    fn stop_tracks(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            log::info!("{} capture released: {}", self.source, self.label);
        }
    }
}
