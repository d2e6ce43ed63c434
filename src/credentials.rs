//! API key resolution
//!
//! Sources are consulted in a fixed order and the first one that yields a
//! non-empty value wins: the secrets file, then the environment.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key looked up in the secrets file
pub const SECRETS_KEY: &str = "Groq_api_key";

/// Environment variable consulted when the secrets file has no key
pub const ENV_KEY: &str = "GROQ_API_KEY";

/// Opaque API key. `Debug` is redacted so it can't leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key; empty strings are not credentials
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// One place a credential might come from
pub trait CredentialSource: Send + Sync {
    /// Short label used in logs
    fn describe(&self) -> String;

    fn lookup(&self) -> Option<Credential>;
}

/// Errors reading the secrets file
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("Failed to read secrets at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse secrets at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load a TOML secrets file. A missing file is not an error.
pub fn load_secrets(path: &Path) -> Result<Option<toml::Table>, SecretsError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SecretsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| SecretsError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Top-level key in a Streamlit-style `secrets.toml`.
///
/// The file is re-read on every lookup so edits apply to the next request.
#[derive(Debug, Clone)]
pub struct SecretsFile {
    path: PathBuf,
    key: String,
}

impl SecretsFile {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }
}

impl CredentialSource for SecretsFile {
    fn describe(&self) -> String {
        format!("secrets file {} [{}]", self.path.display(), self.key)
    }

    fn lookup(&self) -> Option<Credential> {
        let table = match load_secrets(&self.path) {
            Ok(Some(table)) => table,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unusable secrets file");
                return None;
            }
        };

        match table.get(&self.key)? {
            toml::Value::String(s) => Credential::new(s.clone()),
            other => {
                tracing::warn!(
                    key = %self.key,
                    found = other.type_str(),
                    "Secrets entry is not a string"
                );
                None
            }
        }
    }
}

/// Environment variable
#[derive(Debug, Clone)]
pub struct EnvVar {
    name: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl CredentialSource for EnvVar {
    fn describe(&self) -> String {
        format!("env {}", self.name)
    }

    fn lookup(&self) -> Option<Credential> {
        std::env::var(&self.name).ok().and_then(Credential::new)
    }
}

/// Ordered list of credential sources
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Secrets file first, then `GROQ_API_KEY`
    pub fn groq(secrets_path: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Box::new(SecretsFile::new(secrets_path, SECRETS_KEY)),
            Box::new(EnvVar::new(ENV_KEY)),
        ])
    }

    /// First credential found, or None
    pub fn resolve(&self) -> Option<Credential> {
        self.sources.iter().find_map(|source| {
            let credential = source.lookup();
            if credential.is_some() {
                tracing::debug!(source = %source.describe(), "Resolved API key");
            }
            credential
        })
    }
}
