use std::fs;
use std::path::Path;

use serde::Deserialize;

pub const CONFIG_FILE: &str = "config.toml";

/// Category chips and duration presets shown on the Today view. Loaded
/// from `config.toml` in the state directory; a missing or malformed
/// file degrades to the built-in presets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub categories: Vec<String>,
    pub duration_presets_min: Vec<u32>,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                "学习".to_string(),
                "写作".to_string(),
                "阅读".to_string(),
                "运动".to_string(),
            ],
            duration_presets_min: vec![15, 25, 45, 60],
        }
    }
}

pub fn load_config(state_dir: &Path) -> FocusConfig {
    let path = state_dir.join(CONFIG_FILE);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return FocusConfig::default(),
    };

    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("warning: ignoring malformed {}: {err}", path.display());
            FocusConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{CONFIG_FILE, FocusConfig, load_config};

    #[test]
    fn missing_file_yields_defaults() {
        let dir = temp_dir("focus_config_missing");
        assert_eq!(load_config(&dir), FocusConfig::default());
    }

    #[test]
    fn reads_presets_from_toml() {
        let dir = temp_dir("focus_config_read");
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        fs::write(
            dir.join(CONFIG_FILE),
            "categories = [\"Deep Work\", \"Admin\"]\nduration_presets_min = [10, 50]\n",
        )
        .expect("config write should succeed");

        let config = load_config(&dir);
        assert_eq!(config.categories, vec!["Deep Work", "Admin"]);
        assert_eq!(config.duration_presets_min, vec![10, 50]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = temp_dir("focus_config_malformed");
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        fs::write(dir.join(CONFIG_FILE), "categories = 7").expect("config write should succeed");

        assert_eq!(load_config(&dir), FocusConfig::default());

        let _ = fs::remove_dir_all(dir);
    }

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }
}
