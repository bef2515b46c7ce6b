use std::sync::Arc;

use framewatch_core::config::AppConfig;
use framewatch_core::settings::Settings;
use framewatch_engine::session::{CaptureController, ControllerOptions};
use framewatch_engine::traits::{FrameAnalyzer, MediaBackend, OutputSink};

use crate::analyzer::HttpFrameAnalyzer;
use crate::config_store::ConfigStore;
use crate::secrets::{SecretKey, get_secret, store_credential};

/// Build a runnable controller from config + platform backends.
///
/// This keeps the CLI layer thin.
pub fn build_controller_from_config(
    cfg: &AppConfig,
    backend: Arc<dyn MediaBackend>,
    sink: Arc<dyn OutputSink>,
) -> anyhow::Result<CaptureController> {
    let analyzer: Arc<dyn FrameAnalyzer> = Arc::new(HttpFrameAnalyzer::new(&cfg.endpoint)?);
    log::info!("analysis endpoint: {}", cfg.endpoint.base_url);

    Ok(CaptureController::new(
        cfg.settings.clone(),
        ControllerOptions::from(cfg.capture),
        backend,
        analyzer,
        sink,
    ))
}

/// Fills the in-memory credential from the OS keyring.
///
/// Best-effort: a keyring failure is logged and leaves the credential unset.
pub fn hydrate_credential(cfg: &mut AppConfig) {
    if !cfg.credential_present || cfg.settings.credential.is_some() {
        return;
    }
    match get_secret(SecretKey::AnalysisApiKey) {
        Ok(v) => cfg.settings.credential = v,
        Err(e) => log::warn!("could not read credential from keyring: {e:#}"),
    }
}

/// Writes settings to the config file and the credential to the keyring.
pub fn persist_settings(
    store: &ConfigStore,
    cfg: &mut AppConfig,
    settings: &Settings,
) -> anyhow::Result<()> {
    store_credential(settings.api_key())?;
    cfg.credential_present = settings.api_key().is_some();
    cfg.settings = settings.clone();
    store.save(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use framewatch_core::types::{MediaConstraints, MediaSource};
    use framewatch_engine::sink::MemorySink;
    use framewatch_engine::traits::MediaStream;

    struct NoMedia;

    #[async_trait]
    impl MediaBackend for NoMedia {
        async fn acquire(
            &self,
            source: MediaSource,
            _constraints: MediaConstraints,
        ) -> anyhow::Result<Arc<dyn MediaStream>> {
            Err(framewatch_engine::traits::MediaError::NoDevice(source).into())
        }
    }

    #[tokio::test]
    async fn controller_starts_from_config_settings() {
        let mut cfg = AppConfig::default();
        cfg.settings.save("handsign", "", "4", "").unwrap();

        let c = build_controller_from_config(
            &cfg,
            Arc::new(NoMedia),
            Arc::new(MemorySink::new()),
        )
        .unwrap();
        let s = c.settings().await;
        assert_eq!(s.refresh_interval_secs, 4.0);
        assert_eq!(s.prompt_mode, cfg.settings.prompt_mode);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.endpoint.base_url = "::nope::".into();
        let res = build_controller_from_config(
            &cfg,
            Arc::new(NoMedia),
            Arc::new(MemorySink::new()),
        );
        assert!(res.is_err());
    }

    #[test]
    fn hydrate_skips_keyring_without_flag() {
        let mut cfg = AppConfig::default();
        hydrate_credential(&mut cfg);
        assert_eq!(cfg.settings.credential, None);
    }
}
