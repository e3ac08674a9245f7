use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, net::IpAddr, path::PathBuf};

pub const DEFAULT_MODEL_PATH: &str = "frost_prediction_model.json";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub model_path: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_predictions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            max_upload_bytes: 200 * 1024 * 1024,
            log_predictions: false,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }

    /// Defaults, then `CONFIG_PATH` file, then individual env overrides.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(p) = var("MODEL_PATH") {
            self.model_path = PathBuf::from(p);
        }
        if let Some(v) = var("BIND_ADDR") {
            match v.parse() {
                Ok(addr) => self.bind_addr = addr,
                Err(_) => tracing::warn!("ignoring unparseable BIND_ADDR={}", v),
            }
        }
        if let Some(v) = var("PORT") {
            match v.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("ignoring unparseable PORT={}", v),
            }
        }
        if let Some(v) = var("MAX_UPLOAD_BYTES") {
            match v.parse() {
                Ok(n) => self.max_upload_bytes = n,
                Err(_) => tracing::warn!("ignoring unparseable MAX_UPLOAD_BYTES={}", v),
            }
        }
        if let Some(v) = var("LOG_PRED") {
            self.log_predictions = v == "1";
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("MODEL_PATH", "/models/frost.json"),
            ("PORT", "9090"),
            ("LOG_PRED", "1"),
            ("BIND_ADDR", "not-an-ip"),
        ]
        .into_iter()
        .collect();

        let cfg = Config::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.model_path, PathBuf::from("/models/frost.json"));
        assert_eq!(cfg.port, 9090);
        assert!(cfg.log_predictions);
        // bad value keeps the default
        assert_eq!(cfg.bind_addr, IpAddr::from([0, 0, 0, 0]));
    }

    #[test]
    fn test_partial_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "port": 3000, "max_upload_bytes": 1024 }}"#).unwrap();

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_upload_bytes, 1024);
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_invalid_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "port = 3000").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }
}
