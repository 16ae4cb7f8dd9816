//! INI file configuration adapter.
//!
//! Sections and keys are case-insensitive and `;`/`#` start a comment
//! anywhere on a line, so values cannot contain either character.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// No sections at all; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    /// `section.key` names present in the file but absent from `known`,
    /// sorted. Comparison ignores case.
    pub fn unrecognized_keys(&self, known: &[(&str, &str)]) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .config
            .get_map_ref()
            .iter()
            .flat_map(|(section, keys)| keys.keys().map(move |key| (section, key)))
            .filter(|(section, key)| {
                !known.iter().any(|(s, k)| {
                    s.eq_ignore_ascii_case(section) && k.eq_ignore_ascii_case(key)
                })
            })
            .map(|(section, key)| format!("{section}.{key}"))
            .collect();
        unknown.sort();
        unknown
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}
