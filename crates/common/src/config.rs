//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exported videos and previews are written.
    pub output_dir: PathBuf,

    /// Video export settings.
    pub export: ExportDefaults,

    /// Background removal tool settings.
    pub background_removal: BackgroundRemovalConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Export parameters handed to the encoding engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Path or name of the ffmpeg binary.
    pub ffmpeg_path: String,

    /// Path or name of the ffprobe binary (used only for reporting).
    pub ffprobe_path: String,

    /// Upper bound on the exported clip length.
    pub max_duration_secs: u32,

    /// Prefix of exported file names (`<prefix><unix-millis>.mp4`).
    pub file_prefix: String,
}

/// External background removal tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundRemovalConfig {
    /// Program to run.
    pub command: String,

    /// Arguments. `{model}` is replaced by [`BackgroundRemovalConfig::model`].
    pub args: Vec<String>,

    /// Segmentation model name passed to the tool.
    pub model: String,

    /// Optional directory the tool should load model files from.
    pub model_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "photoglow=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs_default_output(),
            export: ExportDefaults::default(),
            background_removal: BackgroundRemovalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            max_duration_secs: 15,
            file_prefix: "Status_".to_string(),
        }
    }
}

impl Default for BackgroundRemovalConfig {
    fn default() -> Self {
        Self {
            command: "rembg".to_string(),
            args: vec![
                "i".to_string(),
                "-m".to_string(),
                "{model}".to_string(),
                "-".to_string(),
                "-".to_string(),
            ],
            model: "isnet-general-use".to_string(),
            model_dir: None,
        }
    }
}

impl BackgroundRemovalConfig {
    /// Arguments with placeholders expanded.
    pub fn resolved_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{model}", &self.model))
            .collect()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("photoglow").join("config.json")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
}

/// Default output directory, mirroring a browser's download folder.
fn dirs_default_output() -> PathBuf {
    std::env::var("XDG_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_export_directive() {
        let config = AppConfig::default();
        assert_eq!(config.export.max_duration_secs, 15);
        assert_eq!(config.export.file_prefix, "Status_");
        assert_eq!(config.export.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_removal_args_expand_model() {
        let config = BackgroundRemovalConfig {
            model: "u2net".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_args(), vec!["i", "-m", "u2net", "-", "-"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.output_dir = PathBuf::from("/srv/exports");
        config.logging.level = "debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.output_dir, PathBuf::from("/srv/exports"));
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.export.max_duration_secs, 15);
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"export": {"ffmpeg_path": "/opt/ffmpeg"}}"#).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.export.ffmpeg_path, "/opt/ffmpeg");
        assert_eq!(loaded.export.file_prefix, "Status_");
        assert_eq!(loaded.background_removal.command, "rembg");
    }
}
