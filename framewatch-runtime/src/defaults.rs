use std::path::PathBuf;

const CONFIG_DIR: &str = "framewatch";
const CONFIG_FILE: &str = "config.json";

/// `$XDG_CONFIG_HOME/framewatch/config.json`, falling back to `~/.config`, then the
/// working directory.
pub fn default_config_path() -> PathBuf {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_path_from(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(CONFIG_DIR).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_xdg_then_home() {
        assert_eq!(
            config_path_from(Some("/xdg".into()), Some("/home/u".into())),
            PathBuf::from("/xdg/framewatch/config.json")
        );
        assert_eq!(
            config_path_from(Some("relative".into()), Some("/home/u".into())),
            PathBuf::from("/home/u/.config/framewatch/config.json")
        );
        assert_eq!(
            config_path_from(None, None),
            PathBuf::from("./framewatch/config.json")
        );
    }
}
