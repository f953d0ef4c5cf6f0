//! Configuration validation.

use super::Config;
use crate::error::{GenError, Result};
use crate::generate::TableFilter;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Exactly one input
    match (&config.source, &config.dumps) {
        (Some(_), Some(_)) => {
            return Err(GenError::Config(
                "source and dumps cannot both be specified".into(),
            ))
        }
        (None, None) => {
            return Err(GenError::Config(
                "one of source or dumps is required".into(),
            ))
        }
        _ => {}
    }

    // Source validation
    if let Some(source) = &config.source {
        if source.host.is_empty() {
            return Err(GenError::Config("source.host is required".into()));
        }
        if source.database.is_empty() {
            return Err(GenError::Config("source.database is required".into()));
        }
        if source.user.is_empty() {
            return Err(GenError::Config("source.user is required".into()));
        }
        if source.max_connections == 0 {
            return Err(GenError::Config(
                "source.max_connections must be at least 1".into(),
            ));
        }
    }

    // Dump validation
    if let Some(dumps) = &config.dumps {
        if dumps.fields.as_os_str().is_empty() {
            return Err(GenError::Config("dumps.fields is required".into()));
        }
        if dumps.indexes.as_os_str().is_empty() {
            return Err(GenError::Config("dumps.indexes is required".into()));
        }
    }

    if config.output.idl.is_none() && config.output.dsl.is_none() {
        return Err(GenError::Config(
            "at least one of output.idl or output.dsl is required".into(),
        ));
    }

    if let Some(conn) = &config.connection {
        if conn.identifier.is_empty() {
            return Err(GenError::Config("connection.identifier is required".into()));
        }
        if conn.connection_uri_secret.is_empty() {
            return Err(GenError::Config(
                "connection.connection_uri_secret is required".into(),
            ));
        }
    }

    TableFilter::from_lists(config.filter.include.clone(), config.filter.exclude.clone())?;

    Ok(())
}
