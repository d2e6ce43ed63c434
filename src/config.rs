//! Server configuration from the environment

use crate::llm::DEFAULT_BASE_URL;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Default secrets location, the one Streamlit apps use
pub const DEFAULT_SECRETS_PATH: &str = ".streamlit/secrets.toml";

pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid port: {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} is not a valid IP address: {value:?}")]
    InvalidBind { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub secrets_path: PathBuf,
    pub groq_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            secrets_path: PathBuf::from(DEFAULT_SECRETS_PATH),
            groq_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Build from an explicit variable map; unset or empty values use defaults
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = get("GROQ_CHAT_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort {
                var: "GROQ_CHAT_PORT",
                value: port.clone(),
            })?;
        }

        if let Some(bind) = get("GROQ_CHAT_BIND") {
            config.bind = bind.parse().map_err(|_| ConfigError::InvalidBind {
                var: "GROQ_CHAT_BIND",
                value: bind.clone(),
            })?;
        }

        if let Some(path) = get("GROQ_CHAT_SECRETS") {
            config.secrets_path = PathBuf::from(path);
        }

        if let Some(url) = get("GROQ_BASE_URL") {
            config.groq_base_url.clone_from(url);
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8501");
        assert_eq!(config.secrets_path, PathBuf::from(".streamlit/secrets.toml"));
        assert_eq!(config.groq_base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_vars(&vars(&[
            ("GROQ_CHAT_PORT", "9000"),
            ("GROQ_CHAT_BIND", "0.0.0.0"),
            ("GROQ_CHAT_SECRETS", "/etc/groq/secrets.toml"),
            ("GROQ_BASE_URL", "http://localhost:1234/v1"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.secrets_path, PathBuf::from("/etc/groq/secrets.toml"));
        assert_eq!(config.groq_base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = ServerConfig::from_vars(&vars(&[("GROQ_CHAT_PORT", "")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_vars(&vars(&[("GROQ_CHAT_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));

        let err = ServerConfig::from_vars(&vars(&[("GROQ_CHAT_BIND", "localhost")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "GROQ_CHAT_BIND is not a valid IP address: \"localhost\""
        );
    }
}
