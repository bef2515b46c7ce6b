#[cfg(feature = "camera")]
pub mod camera;
pub mod router;
#[cfg(feature = "screen")]
pub mod screen;

use router::MediaRouter;

/// Device choices for the native backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeOptions {
    pub camera_index: u32,
    /// Substring of the application name or window title to share.
    pub window_filter: Option<String>,
}

/// Backends compiled into this build.
///
/// Sources without a backend fail to bind with `MediaError::Unsupported`.
#[cfg_attr(
    not(any(feature = "camera", feature = "screen")),
    allow(unused_variables)
)]
pub fn native_backend(opts: &NativeOptions) -> MediaRouter {
    #[allow(unused_mut)]
    let mut router = MediaRouter::new();

    #[cfg(feature = "camera")]
    {
        let camera = camera::CameraBackend::new(opts.camera_index);
        router = router.with_camera(std::sync::Arc::new(camera));
    }

    #[cfg(feature = "screen")]
    {
        let mut screen = screen::ScreenBackend::new();
        if let Some(filter) = &opts.window_filter {
            screen = screen.with_window_filter(filter.clone());
        }
        router = router.with_display(std::sync::Arc::new(screen));
    }

    router
}

/// A router where every source is served by the synthetic backend.
pub fn synthetic_backend(width: u32, height: u32) -> MediaRouter {
    let backend = test::SyntheticBackend::new(width, height).boxed();
    MediaRouter::new()
        .with_camera(backend.clone())
        .with_display(backend)
}
