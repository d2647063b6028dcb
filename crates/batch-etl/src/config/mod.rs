//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// SHA256 of the serialized configuration, stored with each job execution.
    pub fn fingerprint(&self) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
source:
  host: localhost
  database: batch
  user: postgres
  password: secret
"#;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.source.port, 5432);
        assert_eq!(config.source.ssl_mode, "disable");
        assert_eq!(config.job.name, "importUserJob");
        assert_eq!(config.job.step_name, "step1");
        assert_eq!(config.job.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.job.source_table, "reader");
        assert_eq!(config.job.target_table, "writer");
        assert!(config.job.record_history);
        assert!(config.shares_database());
        assert_eq!(config.target().database, "batch");
    }

    #[test]
    fn test_separate_target() {
        let yaml = format!(
            "{}target:\n  host: warehouse\n  database: dw\n  user: loader\n  ssl_mode: require\njob:\n  chunk_size: 100\n",
            MINIMAL
        );
        let config = Config::from_yaml(&yaml).unwrap();
        assert!(!config.shares_database());
        assert_eq!(config.target().host, "warehouse");
        assert_eq!(config.target().ssl_mode, "require");
        assert_eq!(config.job.chunk_size, 100);
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = "source:\n  host: localhost\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let a = Config::from_yaml(MINIMAL).unwrap();
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.job.chunk_size = 10;
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
