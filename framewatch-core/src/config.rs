use crate::settings::Settings;
use crate::types::StaleResponsePolicy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub capture: CaptureOptions,

    // Secrets are stored outside this struct at rest.
    #[serde(default)]
    pub credential_present: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            endpoint: EndpointConfig::default(),
            capture: CaptureOptions::default(),
            credential_present: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,

    // No timeout unless configured; a tick makes exactly one attempt.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub jpeg_quality: u8,

    #[serde(default)]
    pub stale_responses: StaleResponsePolicy,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            stale_responses: StaleResponsePolicy::Display,
        }
    }
}
