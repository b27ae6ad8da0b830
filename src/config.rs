use std::collections::HashMap;
use std::fs;
use std::path::Path;

use url::Url;

use crate::error::{BingoError, Result};
use crate::logging::{LogLevel, log_info, log_warning};

pub const SERVER_CONFIG_PATH: &str = "conf/server.conf";
pub const TERMINAL_CONFIG_PATH: &str = "conf/terminal.conf";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin used in share links; the request's Host header when unset.
    pub public_url: Option<Url>,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Page the terminal board pretends to live on; share links point here.
    pub base_url: Url,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_url: None,
            log_level: LogLevel::Info,
        }
    }
}

/// `http://127.0.0.1:3000/`, where the server listens by default.
pub fn default_base_url() -> Result<Url> {
    Url::parse(DEFAULT_BASE_URL).map_err(|e| BingoError::Config(format!("invalid default base_url: {e}")))
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_str_content(&content)
    }

    fn from_str_content(content: &str) -> Result<Self> {
        let config_map = parse_config(content);
        let defaults = Self::default();

        let host = config_map.get("host").cloned().unwrap_or(defaults.host);

        let port = match config_map.get("port") {
            Some(p) => p.parse::<u16>().map_err(|_| BingoError::Config(format!("invalid port '{p}'")))?,
            None => defaults.port,
        };

        let public_url = match config_map.get("public_url") {
            Some(u) if !u.is_empty() => {
                Some(Url::parse(u).map_err(|e| BingoError::Config(format!("invalid public_url '{u}': {e}")))?)
            }
            _ => None,
        };

        let log_level = match config_map.get("log_level") {
            Some(l) => l.parse::<LogLevel>().map_err(BingoError::Config)?,
            None => defaults.log_level,
        };

        Ok(ServerConfig { host, port, public_url, log_level })
    }

    pub fn load_or_default() -> Self {
        match Self::from_file(SERVER_CONFIG_PATH) {
            Ok(config) => {
                log_info(&format!("Loaded configuration from {SERVER_CONFIG_PATH}"));
                config
            }
            Err(e) => {
                log_warning(&format!("Could not load config from {SERVER_CONFIG_PATH}: {e}. Using defaults."));
                Self::default()
            }
        }
    }
}

impl TerminalConfig {
    pub fn new() -> Result<Self> {
        Ok(TerminalConfig { base_url: default_base_url()? })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config_map = parse_config(&content);

        let base_url = match config_map.get("base_url") {
            Some(u) => Url::parse(u).map_err(|e| BingoError::Config(format!("invalid base_url '{u}': {e}")))?,
            None => default_base_url()?,
        };

        Ok(TerminalConfig { base_url })
    }

    pub fn load_or_default() -> Result<Self> {
        match Self::from_file(TERMINAL_CONFIG_PATH) {
            Ok(config) => Ok(config),
            Err(e) => {
                log_warning(&format!("Could not load terminal config from {TERMINAL_CONFIG_PATH}: {e}. Using defaults."));
                Self::new()
            }
        }
    }
}

fn parse_config(content: &str) -> HashMap<String, String> {
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            config.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let content = r#"
            # This is a comment
            host = 0.0.0.0
            port = 8080
            public_url = https://bingo.example.com/
        "#;

        let config = parse_config(content);
        assert_eq!(config.get("host"), Some(&"0.0.0.0".to_string()));
        assert_eq!(config.get("port"), Some(&"8080".to_string()));
        assert_eq!(config.get("public_url"), Some(&"https://bingo.example.com/".to_string()));
    }

    #[test]
    fn test_server_config_from_content() {
        let config = ServerConfig::from_str_content("port = 8080\nlog_level = debug\npublic_url = https://bingo.example.com/").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.public_url.unwrap().as_str(), "https://bingo.example.com/");
    }

    #[test]
    fn test_server_config_rejects_bad_port() {
        assert!(matches!(ServerConfig::from_str_content("port = lots"), Err(BingoError::Config(_))));
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.public_url.is_none());
    }

    #[test]
    fn test_terminal_config_default() {
        let config = TerminalConfig::new().unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:3000/");
        assert_eq!(default_base_url().unwrap(), config.base_url);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(ServerConfig::from_file("conf/does-not-exist.conf"), Err(BingoError::Io(_))));
    }
}
