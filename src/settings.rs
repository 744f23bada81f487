use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine_path: PathBuf,
    pub language: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("tesseract"),
            language: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    engine: Option<EngineSettings>,
    ocr: Option<OcrSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct EngineSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    language: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML)
        .with_context(|| "failed to parse built-in settings")?;
    settings.merge(defaults);

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        let content = fs::read_to_string(extra)
            .with_context(|| format!("failed to read settings: {}", extra.display()))?;
        let parsed: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {}", extra.display()))?;
        settings.merge(parsed);
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(engine) = incoming.engine {
            if let Some(path) = engine.path {
                self.engine_path = path;
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(language) = ocr.language {
                let trimmed = language.trim();
                self.language = if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn built_in_defaults() {
        let settings = load_settings(None).expect("settings");
        assert_eq!(settings.engine_path, PathBuf::from("tesseract"));
        assert_eq!(settings.language, None);
    }

    #[test]
    fn extra_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        let mut file = fs::File::create(&path).expect("create settings");
        writeln!(file, "[engine]\npath = \"/opt/ocr/engine\"").expect("write");
        writeln!(file, "[ocr]\nlanguage = \"deu\"").expect("write");

        let settings = load_settings(Some(&path)).expect("settings");
        assert_eq!(settings.engine_path, PathBuf::from("/opt/ocr/engine"));
        assert_eq!(settings.language.as_deref(), Some("deu"));
    }

    #[test]
    fn empty_language_means_engine_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[ocr]\nlanguage = \"  \"\n").expect("write settings");

        let settings = load_settings(Some(&path)).expect("settings");
        assert_eq!(settings.language, None);
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }
}
