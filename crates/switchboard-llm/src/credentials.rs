//! API key lookup: environment first, then a `key=value` credential store
//!
//! Store lookups are memoized in a process-wide cache instead of being
//! written back into the environment. The cache is populated at most once per
//! store and key; concurrent resolvers serialize on the cache entry, so the
//! store file is never read twice for the same key.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use dashmap::DashMap;
use secrecy::SecretString;

use crate::error::LlmError;

/// Directory under the platform config dir holding the credential store
const STORE_DIR: &str = "switchboard";

/// File name of the credential store
const STORE_FILE: &str = "credentials";

static CACHE: LazyLock<DashMap<(PathBuf, String), SecretString>> = LazyLock::new(DashMap::new);

/// Environment variable carrying the API key for `backend`
///
/// `openai` → `OPENAI_API_KEY`, `my-backend` → `MY_BACKEND_API_KEY`.
pub fn env_var_for(backend: &str) -> String {
    let stem: String = backend
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{stem}_API_KEY")
}

/// Default location of the credential store, if the platform has a config dir
pub fn default_store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(STORE_DIR).join(STORE_FILE))
}

/// Resolves API keys for backends that need one
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    store: Option<PathBuf>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self {
            store: default_store_path(),
        }
    }
}

impl CredentialResolver {
    /// Resolver reading the given store instead of the default location
    pub fn with_store(path: impl Into<PathBuf>) -> Self {
        Self {
            store: Some(path.into()),
        }
    }

    /// Path of the fallback store, if any
    pub fn store(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    /// Resolve the key for `backend`
    ///
    /// Returns `Ok(None)` when the backend does not use credentials.
    pub fn resolve(&self, backend: &str, requires_credential: bool) -> Result<Option<SecretString>, LlmError> {
        if !requires_credential {
            return Ok(None);
        }

        let env_var = env_var_for(backend);

        if let Ok(value) = std::env::var(&env_var)
            && !value.is_empty()
        {
            return Ok(Some(SecretString::from(value)));
        }

        let Some(store) = &self.store else {
            return Err(LlmError::CredentialStoreUnavailable {
                path: PathBuf::new(),
                reason: "no config directory on this platform".to_owned(),
            });
        };

        let entry = CACHE
            .entry((store.clone(), env_var.clone()))
            .or_try_insert_with(|| {
                tracing::debug!(backend, path = %store.display(), "reading credential store");
                let key = read_store_entry(store, &env_var)?;
                key.map(SecretString::from).ok_or_else(|| LlmError::MissingCredential {
                    backend: backend.to_owned(),
                    env_var: env_var.clone(),
                })
            })?;

        Ok(Some(entry.value().clone()))
    }
}

/// Look up `key` in the store at `path`
///
/// Empty values count as absent.
fn read_store_entry(path: &Path, key: &str) -> Result<Option<String>, LlmError> {
    let unavailable = |reason: String| LlmError::CredentialStoreUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
    let entries = parse_store(&contents).map_err(unavailable)?;

    Ok(entries
        .into_iter()
        .rev()
        .find(|(name, value)| name == key && !value.is_empty())
        .map(|(_, value)| value))
}

/// Parse `key=value` lines, skipping blanks and `#` comments
fn parse_store(contents: &str) -> Result<Vec<(String, String)>, String> {
    let mut entries = Vec::new();

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            return Err(format!("line {}: expected `key=value`", number + 1));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {}: empty key", number + 1));
        }

        entries.push((key.to_owned(), unquote(value.trim()).to_owned()));
    }

    Ok(entries)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}
