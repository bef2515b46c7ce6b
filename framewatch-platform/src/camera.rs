//
// Webcam capture on top of nokhwa.
//
// nokhwa's `Camera` is not `Send`, so each stream owns a worker thread that
// opens the device and answers grab requests over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::time::Duration;

use async_trait::async_trait;
use framewatch_core::types::{MediaConstraints, MediaSource};
use framewatch_engine::traits::{MediaBackend, MediaError, MediaStream, VideoFrame};
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use tokio::sync::oneshot;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

enum Cmd {
    Grab(oneshot::Sender<Result<VideoFrame, MediaError>>),
    Shutdown,
}

enum WorkerMsg {
    Ready(String),
    Error(MediaError),
}

#[derive(Debug, Clone, Default)]
pub struct CameraBackend {
    device_index: u32,
}

impl CameraBackend {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

#[async_trait]
impl MediaBackend for CameraBackend {
    async fn acquire(
        &self,
        source: MediaSource,
        _constraints: MediaConstraints,
    ) -> anyhow::Result<Arc<dyn MediaStream>> {
        if source != MediaSource::Camera {
            return Err(MediaError::Unsupported(source).into());
        }
        let index = self.device_index;
        let stream = tokio::task::spawn_blocking(move || CameraStream::open(index))
            .await
            .map_err(|e| MediaError::Capture(format!("camera worker panicked: {e}")))??;
        Ok(Arc::new(stream))
    }
}

pub struct CameraStream {
    label: String,
    cmd_tx: Mutex<Option<mpsc::Sender<Cmd>>>,
    stopped: AtomicBool,
}

impl CameraStream {
    fn open(index: u32) -> Result<Self, MediaError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();

        std::thread::spawn(move || {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
            let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("camera open failed: {e}");
                    let _ = worker_tx.send(WorkerMsg::Error(MediaError::NoDevice(MediaSource::Camera)));
                    return;
                }
            };
            if let Err(e) = camera.open_stream() {
                let _ = worker_tx.send(WorkerMsg::Error(MediaError::PermissionDenied(e.to_string())));
                return;
            }
            let _ = worker_tx.send(WorkerMsg::Ready(camera.info().human_name()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Cmd::Grab(resp) => {
                        let _ = resp.send(read_frame(&mut camera));
                    }
                    Cmd::Shutdown => break,
                }
            }

            if let Err(e) = camera.stop_stream() {
                log::warn!("camera stop failed: {e}");
            }
        });

        let label = match worker_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(WorkerMsg::Ready(name)) => name,
            Ok(WorkerMsg::Error(e)) => return Err(e),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let _ = cmd_tx.send(Cmd::Shutdown);
                return Err(MediaError::Capture("camera startup timed out".into()));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(MediaError::Capture("camera worker exited".into()));
            }
        };
        log::info!("camera opened: {label}");

        Ok(Self {
            label,
            cmd_tx: Mutex::new(Some(cmd_tx)),
            stopped: AtomicBool::new(false),
        })
    }
}

fn read_frame(camera: &mut Camera) -> Result<VideoFrame, MediaError> {
    let buffer = camera.frame().map_err(|e| MediaError::Capture(e.to_string()))?;
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| MediaError::Capture(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    Ok(VideoFrame {
        width,
        height,
        rgba: rgb_to_rgba(&decoded.into_raw()),
    })
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    out
}

#[async_trait]
impl MediaStream for CameraStream {
    fn source(&self) -> MediaSource {
        MediaSource::Camera
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    async fn grab_frame(&self) -> anyhow::Result<VideoFrame> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(MediaError::Ended.into());
        }
        let (resp_tx, resp_rx) = oneshot::channel();
        {
            let guard = self.cmd_tx.lock().unwrap_or_else(PoisonError::into_inner);
            let tx = guard.as_ref().ok_or(MediaError::Ended)?;
            tx.send(Cmd::Grab(resp_tx)).map_err(|_| MediaError::Ended)?;
        }
        let frame = resp_rx.await.map_err(|_| MediaError::Ended)??;
        Ok(frame)
    }

    fn stop_tracks(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let tx = self
            .cmd_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            let _ = tx.send(Cmd::Shutdown);
        }
        log::info!("camera stopped: {}", self.label);
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        assert_eq!(rgb_to_rgba(&[1, 2, 3, 4, 5, 6]), vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(rgb_to_rgba(&[]).is_empty());
    }

    #[test]
    fn backend_keeps_requested_device() {
        assert_eq!(CameraBackend::new(2).device_index, 2);
        assert_eq!(CameraBackend::default().device_index, 0);
    }
}
