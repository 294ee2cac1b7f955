use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-course config file
pub const CONFIG_FILE_NAME: &str = "olxcheck.toml";

/// How findings are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings loaded from olxcheck.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OlxcheckConfig {
    /// Diagnostic codes to suppress
    pub ignore: Vec<String>,
    /// Number of stages to run (0 = all)
    pub steps: Option<u8>,
    pub format: OutputFormat,
}

impl OlxcheckConfig {
    /// Load config for a course directory.
    ///
    /// Looks at `<course_dir>/olxcheck.toml`, then the user config dir,
    /// and falls back to defaults when neither exists.
    pub fn load(course_dir: &Path) -> anyhow::Result<Self> {
        let local = course_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from(&local);
        }

        if let Some(user) = Self::user_config_path() {
            if user.exists() {
                return Self::load_from(&user);
            }
        }

        Ok(Self::default())
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: OlxcheckConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `~/.config/olxcheck/config.toml` (platform equivalent)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("olxcheck").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_course_local_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "ignore = [\"UnreferencedFile\"]\nsteps = 7\nformat = \"json\"\n",
        )
        .unwrap();

        let config = OlxcheckConfig::load(dir.path()).unwrap();
        assert_eq!(config.ignore, vec!["UnreferencedFile".to_string()]);
        assert_eq!(config.steps, Some(7));
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "steps = 3\n").unwrap();

        let config = OlxcheckConfig::load_from(&path).unwrap();
        assert!(config.ignore.is_empty());
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "steps = \"many\"\n").unwrap();

        assert!(OlxcheckConfig::load_from(&path).is_err());
    }
}
