use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

const FALLBACK_LANGUAGE: &str = "eng";

/// Fixed host-locale to engine-language-code table, used only to pick a
/// default recognition language.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    engine_codes: HashMap<String, String>,
}

impl LocaleTable {
    pub fn load() -> Result<Self> {
        let raw = include_str!("locales.json");
        let engine_codes: HashMap<String, String> =
            serde_json::from_str(raw).with_context(|| "failed to parse locale table data")?;
        Ok(LocaleTable { engine_codes })
    }

    pub fn engine_language(&self, locale: &str) -> Option<&str> {
        let locale = locale.split(['.', '@']).next().unwrap_or(locale);
        if let Some(code) = self.engine_codes.get(locale) {
            return Some(code.as_str());
        }
        let (prefix, _) = locale.split_once('_')?;
        self.engine_codes.get(prefix).map(String::as_str)
    }

    pub fn default_language(&self, locale: &str) -> String {
        self.engine_language(locale)
            .unwrap_or(FALLBACK_LANGUAGE)
            .to_string()
    }

    pub fn locale_for(&self, engine_language: &str) -> Option<&str> {
        self.engine_codes
            .iter()
            .find(|(_, code)| code.as_str() == engine_language)
            .map(|(locale, _)| locale.as_str())
    }
}

pub fn available_languages(engine: &Path) -> Result<Vec<String>> {
    let output = Command::new(engine)
        .arg("--list-langs")
        .output()
        .with_context(|| format!("failed to run {} --list-langs", engine.display()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} --list-langs failed: {}",
            engine.display(),
            stderr.trim()
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut languages = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        if idx == 0 {
            // First line is the engine's "List of available languages" header.
            continue;
        }
        let value = line.trim();
        if !value.is_empty() {
            languages.push(value.to_string());
        }
    }
    Ok(languages)
}
