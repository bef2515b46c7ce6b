use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    Camera,
    Screen,
    Application,
}

impl MediaSource {
    pub fn constraints(self) -> MediaConstraints {
        match self {
            MediaSource::Camera => MediaConstraints {
                kind: CaptureKind::UserCamera,
                display_surface: None,
                cursor: None,
            },
            MediaSource::Screen => MediaConstraints {
                kind: CaptureKind::Display,
                display_surface: None,
                cursor: None,
            },
            MediaSource::Application => MediaConstraints {
                kind: CaptureKind::Display,
                display_surface: Some(DisplaySurface::Application),
                cursor: Some(CursorVisibility::Always),
            },
        }
    }

    /// Confirmation line shown once the stream is bound.
    pub fn started_message(self) -> &'static str {
        match self {
            MediaSource::Camera => "Webcam stream started.",
            MediaSource::Screen => "Screen share started.",
            MediaSource::Application => "Application share started.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaSource::Camera => "camera",
            MediaSource::Screen => "screen",
            MediaSource::Application => "application",
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media source: {0}")]
pub struct UnknownMediaSource(pub String);

impl FromStr for MediaSource {
    type Err = UnknownMediaSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camera" | "webcam" => Ok(MediaSource::Camera),
            "screen" => Ok(MediaSource::Screen),
            "application" | "app" | "window" => Ok(MediaSource::Application),
            _ => Err(UnknownMediaSource(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    UserCamera,
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplaySurface {
    Monitor,
    Window,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorVisibility {
    Always,
    Motion,
    Never,
}

/// What a backend is asked for when a source is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub kind: CaptureKind,
    pub display_surface: Option<DisplaySurface>,
    pub cursor: Option<CursorVisibility>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
}

/// What to do with an analysis response that arrives after its session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    #[default]
    Display,
    Discard,
}
