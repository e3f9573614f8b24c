use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error on an empty backend name, an unparseable or zero
    /// timeout, or an endpoint that is not http(s)
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, backend) in &self.backends {
            if name.trim().is_empty() {
                anyhow::bail!("backend names must not be empty");
            }

            if let Some(timeout) = backend.timeout()?
                && timeout.is_zero()
            {
                anyhow::bail!("backends.{name}.timeout must be greater than 0");
            }

            if let Some(ref endpoint) = backend.endpoint
                && !matches!(endpoint.scheme(), "http" | "https")
            {
                anyhow::bail!(
                    "backends.{name}.endpoint must use http or https, got '{}'",
                    endpoint.scheme()
                );
            }

            if backend.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                anyhow::bail!("backends.{name}.model must not be empty");
            }
        }

        Ok(())
    }
}
