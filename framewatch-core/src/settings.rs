use crate::prompts::{PromptMode, UnknownPromptMode, is_default_prompt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REFRESH_INTERVAL_SECS: f64 = 1.0;
pub const MAX_REFRESH_INTERVAL_SECS: f64 = 24.0 * 60.0 * 60.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error(transparent)]
    UnknownMode(#[from] UnknownPromptMode),
}

/// User-editable analysis settings.
///
/// Each capture tick takes a snapshot of these, so a save only affects ticks
/// that start afterwards.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub prompt_mode: PromptMode,
    pub prompt_text: String,
    pub refresh_interval_secs: f64,

    // Secrets are stored outside this struct at rest.
    #[serde(skip)]
    pub credential: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("prompt_mode", &self.prompt_mode)
            .field("prompt_text", &self.prompt_text)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt_mode: PromptMode::General,
            prompt_text: PromptMode::General.default_prompt().to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            credential: None,
        }
    }
}

impl Settings {
    /// Applies raw values from the settings form.
    ///
    /// An empty prompt, or one that is still a built-in prompt, is replaced by the
    /// built-in prompt of the selected mode. The interval falls back to the default
    /// when it is missing, zero, negative or not a number, and is capped at one day.
    /// The credential is kept verbatim; an empty one clears it.
    pub fn save(
        &mut self,
        raw_mode: &str,
        raw_prompt: &str,
        raw_interval: &str,
        raw_credential: &str,
    ) -> Result<(), SettingsError> {
        let mode: PromptMode = raw_mode.parse()?;

        self.prompt_mode = mode;
        self.prompt_text = resolve_prompt(mode, raw_prompt);
        self.refresh_interval_secs = coerce_interval(raw_interval);
        self.credential = (!raw_credential.is_empty()).then(|| raw_credential.to_string());
        Ok(())
    }

    /// Switches the prompt mode, rewriting the prompt only when the user has not
    /// typed their own text.
    pub fn select_mode(&mut self, mode: PromptMode, current_text: &str) {
        self.prompt_mode = mode;
        let trimmed = current_text.trim();
        if trimmed.is_empty() || is_default_prompt(trimmed) {
            self.prompt_text = mode.default_prompt().to_string();
        } else {
            self.prompt_text = trimmed.to_string();
        }
    }

    /// Never zero and never longer than a day.
    pub fn refresh_interval(&self) -> Duration {
        Some(self.refresh_interval_secs)
            .filter(|s| !s.is_nan())
            .and_then(|s| Duration::try_from_secs_f64(s.min(MAX_REFRESH_INTERVAL_SECS)).ok())
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_REFRESH_INTERVAL_SECS))
    }

    /// The credential to send with a request, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.credential.as_deref().filter(|k| !k.is_empty())
    }
}

fn resolve_prompt(mode: PromptMode, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_default_prompt(trimmed) {
        mode.default_prompt().to_string()
    } else {
        trimmed.to_string()
    }
}

fn coerce_interval(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.min(MAX_REFRESH_INTERVAL_SECS),
        _ => DEFAULT_REFRESH_INTERVAL_SECS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{GENERAL_PROMPT, HANDSIGN_PROMPT, WEAPON_PROMPT};

    #[test]
    fn empty_prompt_under_weapon_mode_uses_weapon_default() {
        let mut s = Settings::default();
        s.save("weapon", "   ", "2", "").unwrap();
        assert_eq!(s.prompt_mode, PromptMode::Weapon);
        assert_eq!(s.prompt_text, WEAPON_PROMPT);
        assert_eq!(s.refresh_interval_secs, 2.0);
        assert_eq!(s.credential, None);
    }

    #[test]
    fn stale_default_prompt_is_replaced_on_mode_change() {
        let mut s = Settings::default();
        s.save("handsign", GENERAL_PROMPT, "1", "").unwrap();
        assert_eq!(s.prompt_text, HANDSIGN_PROMPT);
    }

    #[test]
    fn custom_text_is_trimmed_and_kept() {
        let mut s = Settings::default();
        s.save("custom", "  count the mugs  ", "0.5", "sk-test").unwrap();
        assert_eq!(s.prompt_mode, PromptMode::Custom);
        assert_eq!(s.prompt_text, "count the mugs");
        assert_eq!(s.refresh_interval(), Duration::from_millis(500));
        assert_eq!(s.api_key(), Some("sk-test"));
    }

    #[test]
    fn bad_intervals_fall_back_to_default() {
        for raw in ["", "0", "-3", "abc", "NaN", "inf"] {
            let mut s = Settings::default();
            s.save("general", "", raw, "").unwrap();
            assert_eq!(s.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS, "raw={raw:?}");
        }
    }

    #[test]
    fn huge_intervals_are_capped_at_a_day() {
        let mut s = Settings::default();
        s.save("general", "", "1e19", "").unwrap();
        assert_eq!(s.refresh_interval_secs, MAX_REFRESH_INTERVAL_SECS);
        assert_eq!(s.refresh_interval(), Duration::from_secs(86_400));

        // A hand-edited config file bypasses `save`.
        let loaded = Settings {
            refresh_interval_secs: 1e300,
            ..Settings::default()
        };
        assert_eq!(loaded.refresh_interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn unknown_mode_leaves_settings_untouched() {
        let mut s = Settings::default();
        assert!(s.save("laser", "x", "5", "k").is_err());
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn select_mode_keeps_user_text() {
        let mut s = Settings::default();
        s.select_mode(PromptMode::Weapon, "");
        assert_eq!(s.prompt_text, WEAPON_PROMPT);

        s.select_mode(PromptMode::HandSign, "my own prompt");
        assert_eq!(s.prompt_mode, PromptMode::HandSign);
        assert_eq!(s.prompt_text, "my own prompt");
    }

    #[test]
    fn debug_redacts_credential() {
        let mut s = Settings::default();
        s.save("general", "", "1", "secret-key").unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
