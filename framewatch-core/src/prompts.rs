use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GENERAL_PROMPT: &str =
    "Analyze this frame for text, objects, and overall scene context.";

pub const WEAPON_PROMPT: &str = "Focus specifically on detecting weapons or weapon-like objects in this frame. Look for: 1) Firearms (guns, rifles, pistols) including toys and replicas 2) Knives, blades, or sharp objects 3) Explosive devices or replicas 4) Improvised weapons or threatening objects. IMPORTANT: If you see ANY object that resembles a weapon (even toys, replicas, or props), explicitly write 'WEAPON DETECTED:' followed by the type and whether it appears to be real or a toy/replica. If absolutely nothing weapon-like is visible, state 'NO WEAPONS DETECTED' at the beginning of your response.";

pub const HANDSIGN_PROMPT: &str = "Focus specifically on detecting peace signs (✌️) in this frame. Look for: 1) V-shaped hand gesture with index and middle fingers 2) Palm facing camera 3) Clear visibility of the gesture. IMPORTANT: Only if you clearly see a peace sign gesture, explicitly write 'PEACE SIGN DETECTED' in your response and include the ✌️ emoji. If no peace sign is visible, clearly state 'NO PEACE SIGN DETECTED' at the beginning of your response. Describe the confidence level and positioning of any detected peace sign.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    #[default]
    General,
    Weapon,
    #[serde(rename = "handsign")]
    HandSign,
    Custom,
}

impl PromptMode {
    pub const ALL: [PromptMode; 4] = [
        PromptMode::General,
        PromptMode::Weapon,
        PromptMode::HandSign,
        PromptMode::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptMode::General => "general",
            PromptMode::Weapon => "weapon",
            PromptMode::HandSign => "handsign",
            PromptMode::Custom => "custom",
        }
    }

    /// The built-in prompt for this mode.
    ///
    /// `Custom` has no text of its own and falls back to the general prompt.
    pub fn default_prompt(self) -> &'static str {
        match self {
            PromptMode::General | PromptMode::Custom => GENERAL_PROMPT,
            PromptMode::Weapon => WEAPON_PROMPT,
            PromptMode::HandSign => HANDSIGN_PROMPT,
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown prompt mode: {0}")]
pub struct UnknownPromptMode(pub String);

impl FromStr for PromptMode {
    type Err = UnknownPromptMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(PromptMode::General),
            "weapon" => Ok(PromptMode::Weapon),
            "handsign" | "hand_sign" | "hand-sign" => Ok(PromptMode::HandSign),
            "custom" => Ok(PromptMode::Custom),
            _ => Err(UnknownPromptMode(s.to_string())),
        }
    }
}

/// Returns true if `text` is one of the built-in prompts (any mode).
pub fn is_default_prompt(text: &str) -> bool {
    [GENERAL_PROMPT, WEAPON_PROMPT, HANDSIGN_PROMPT].contains(&text)
}
