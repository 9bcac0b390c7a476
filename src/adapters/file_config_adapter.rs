//! INI file configuration adapter.

use crate::domain::error::SamsignalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SamsignalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SamsignalError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SamsignalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SamsignalError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, SamsignalError> {
        self.config
            .getint(section, key)
            .map_err(|reason| SamsignalError::invalid(section, key, reason))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, SamsignalError> {
        self.config
            .getfloat(section, key)
            .map_err(|reason| SamsignalError::invalid(section, key, reason))
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, SamsignalError> {
        match self.config.get(section, key) {
            None => Ok(None),
            Some(value) => Self::parse_bool(&value).map(Some).ok_or_else(|| {
                SamsignalError::invalid(section, key, format!("expected true/false, got '{}'", value))
            }),
        }
    }
}
