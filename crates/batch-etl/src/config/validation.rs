//! Configuration validation.

use super::{Config, DatabaseConfig};
use crate::drivers::common::SslMode;
use crate::error::{EtlError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_database("source", &config.source)?;
    // The writer holds one target connection for the whole run; the reader
    // (shared pool) or the completion listener needs a second one.
    match &config.target {
        Some(target) => {
            validate_database("target", target)?;
            if target.max_connections < 2 {
                return Err(EtlError::Config(
                    "target.max_connections must be at least 2".into(),
                ));
            }
        }
        None if config.source.max_connections < 2 => {
            return Err(EtlError::Config(
                "source.max_connections must be at least 2 when no target is configured".into(),
            ));
        }
        None => {}
    }

    if config.job.name.trim().is_empty() {
        return Err(EtlError::Config("job.name is required".into()));
    }
    if config.job.chunk_size == 0 {
        return Err(EtlError::Config(
            "job.chunk_size must be at least 1".into(),
        ));
    }
    validate_table_name("job.source_table", &config.job.source_table)?;
    validate_table_name("job.target_table", &config.job.target_table)?;

    if config.shares_database() && config.job.source_table == config.job.target_table {
        return Err(EtlError::Config(
            "job.source_table and job.target_table cannot be the same table".into(),
        ));
    }

    Ok(())
}

fn validate_database(section: &str, db: &DatabaseConfig) -> Result<()> {
    if db.host.is_empty() {
        return Err(EtlError::Config(format!("{}.host is required", section)));
    }
    if db.database.is_empty() {
        return Err(EtlError::Config(format!("{}.database is required", section)));
    }
    if db.user.is_empty() {
        return Err(EtlError::Config(format!("{}.user is required", section)));
    }
    if db.max_connections == 0 {
        return Err(EtlError::Config(format!(
            "{}.max_connections must be at least 1",
            section
        )));
    }
    SslMode::parse(&db.ssl_mode)?;
    Ok(())
}

/// Table names are interpolated into SQL, so only plain (optionally
/// schema-qualified) identifiers are accepted.
fn validate_table_name(field: &str, name: &str) -> Result<()> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    };

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(EtlError::Config(format!(
            "{} must be a plain table name (letters, digits, underscore), got '{}'",
            field, name
        )));
    }
    Ok(())
}
