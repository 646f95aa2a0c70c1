//! Configuration schema for crypt.toml: encryption defaults and logging.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CryptError, CryptResult};
use crate::kdf::KdfParams;
use crate::registry;

/// Top-level configuration (loaded from crypt.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptConfig {
    pub crypto: CryptoConfig,
    pub log: LogConfig,
}

/// Encryption defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Algorithm used by `encrypt` when none is given (default: crypt-aes-256-gcm)
    pub default_algorithm: String,
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
    /// Accept empty passwords (default: true)
    pub allow_empty_password: bool,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        let kdf = KdfParams::default();
        Self {
            default_algorithm: registry::default_algorithm().to_string(),
            argon2_mem_cost_kib: kdf.mem_cost_kib,
            argon2_time_cost: kdf.time_cost,
            argon2_parallelism: kdf.parallelism,
            allow_empty_password: true,
        }
    }
}

impl CryptoConfig {
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            mem_cost_kib: self.argon2_mem_cost_kib,
            time_cost: self.argon2_time_cost,
            parallelism: self.argon2_parallelism,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl CryptConfig {
    /// Parse TOML text and validate it.
    pub fn from_toml(text: &str) -> CryptResult<Self> {
        let config: CryptConfig = toml::from_str(text)
            .map_err(|e| CryptError::Config(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> CryptResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            CryptError::Config(format!("reading config {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> CryptResult<()> {
        registry::resolve(&self.crypto.default_algorithm)?;
        self.crypto.kdf_params().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[crypto]
default_algorithm = "crypt-xchacha20-poly1305"
argon2_mem_cost_kib = 131072
argon2_time_cost = 4
argon2_parallelism = 8
allow_empty_password = false

[log]
level = "debug"
format = "json"
"#;
        let config = CryptConfig::from_toml(toml_str).unwrap();

        assert_eq!(config.crypto.default_algorithm, "crypt-xchacha20-poly1305");
        assert_eq!(config.crypto.argon2_mem_cost_kib, 131072);
        assert_eq!(config.crypto.kdf_params().parallelism, 8);
        assert!(!config.crypto.allow_empty_password);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config = CryptConfig::from_toml("").unwrap();

        assert_eq!(config.crypto.default_algorithm, "crypt-aes-256-gcm");
        assert_eq!(config.crypto.kdf_params(), KdfParams::default());
        assert!(config.crypto.allow_empty_password);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_parse_partial_config() {
        let config = CryptConfig::from_toml("[crypto]\nargon2_time_cost = 2\n").unwrap();

        // Overridden
        assert_eq!(config.crypto.argon2_time_cost, 2);
        // Defaults
        assert_eq!(config.crypto.argon2_mem_cost_kib, 65536);
        assert_eq!(config.log.format, "text");
    }

    #[test]
    fn test_rejects_unknown_algorithm() {
        let result = CryptConfig::from_toml("[crypto]\ndefault_algorithm = \"rot13\"\n");
        assert!(matches!(result, Err(CryptError::UnknownAlgorithm(_))));
    }

    #[test]
    fn test_rejects_bad_kdf_params() {
        let result = CryptConfig::from_toml("[crypto]\nargon2_time_cost = 0\n");
        assert!(matches!(result, Err(CryptError::InvalidParameters(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CryptConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.crypto.default_algorithm, "crypt-aes-256-gcm");
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crypt.toml");
        std::fs::write(&path, "[log]\nlevel = \"info\"\n").unwrap();
        let config = CryptConfig::load(&path).unwrap();
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = CryptConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = CryptConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.crypto.default_algorithm, parsed.crypto.default_algorithm);
        assert_eq!(config.crypto.kdf_params(), parsed.crypto.kdf_params());
    }
}
