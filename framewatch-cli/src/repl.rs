use framewatch_core::prompts::PromptMode;
use framewatch_core::settings::Settings;
use framewatch_core::types::MediaSource;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Select(MediaSource),
    Start,
    Stop,
    Status,
    Mode(PromptMode),
    Prompt(String),
    Interval(String),
    Key(String),
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  camera | screen | application   bind a video source
  start | stop                    begin or end periodic analysis
  status                          show session state
  mode <general|weapon|handsign|custom>
  prompt <text>                   edit the prompt (empty resets to the mode default)
  interval <seconds>              edit the refresh interval
  key <credential>                edit the access credential (empty clears it)
  save                            apply and persist the edited settings
  quit";

pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "start" => ReplCommand::Start,
        "stop" => ReplCommand::Stop,
        "status" => ReplCommand::Status,
        "save" => ReplCommand::Save,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        "mode" => ReplCommand::Mode(rest.parse().map_err(|e| format!("{e}"))?),
        "prompt" => ReplCommand::Prompt(rest.to_string()),
        "interval" => ReplCommand::Interval(rest.to_string()),
        "key" => ReplCommand::Key(rest.to_string()),
        other => match other.parse::<MediaSource>() {
            Ok(source) => ReplCommand::Select(source),
            Err(_) => return Err(format!("unknown command: {word} (try `help`)")),
        },
    };
    Ok(Some(cmd))
}

/// The editable settings form. Nothing here reaches the session until `save`.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub mode: PromptMode,
    pub prompt: String,
    pub interval: String,
    pub key: String,
}

impl SettingsForm {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            mode: s.prompt_mode,
            prompt: s.prompt_text.clone(),
            interval: s.refresh_interval_secs.to_string(),
            key: s.credential.clone().unwrap_or_default(),
        }
    }

    /// Switching mode swaps in the new default unless the prompt was edited.
    pub fn select_mode(&mut self, mode: PromptMode) {
        let mut draft = Settings::default();
        draft.select_mode(mode, &self.prompt);
        self.mode = draft.prompt_mode;
        self.prompt = draft.prompt_text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framewatch_core::prompts::{GENERAL_PROMPT, WEAPON_PROMPT};

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("  ").unwrap(), None);
        assert_eq!(
            parse_line("webcam").unwrap(),
            Some(ReplCommand::Select(MediaSource::Camera))
        );
        assert_eq!(
            parse_line("Application").unwrap(),
            Some(ReplCommand::Select(MediaSource::Application))
        );
        assert_eq!(
            parse_line("mode weapon").unwrap(),
            Some(ReplCommand::Mode(PromptMode::Weapon))
        );
        assert_eq!(
            parse_line("prompt  count the  cars ").unwrap(),
            Some(ReplCommand::Prompt("count the  cars".into()))
        );
        assert_eq!(parse_line("key").unwrap(), Some(ReplCommand::Key(String::new())));
        assert!(parse_line("mode bogus").is_err());
        assert!(parse_line("fly").is_err());
    }

    #[test]
    fn form_mode_switch_follows_defaults() {
        let mut form = SettingsForm::from_settings(&Settings::default());
        assert_eq!(form.prompt, GENERAL_PROMPT);
        assert_eq!(form.interval, "1");

        form.select_mode(PromptMode::Weapon);
        assert_eq!(form.prompt, WEAPON_PROMPT);

        form.prompt = "look for red cars".into();
        form.select_mode(PromptMode::General);
        assert_eq!(form.mode, PromptMode::General);
        assert_eq!(form.prompt, "look for red cars");
    }
}
