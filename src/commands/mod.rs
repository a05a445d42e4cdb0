//! Command implementations for the vigiball CLI

pub mod bidding;
pub mod common;
pub mod import;
pub mod init;
pub mod valuation;


use std::path::{Path, PathBuf};

use crate::config::{default_config_path, default_database_path, CONFIG_ENV_VAR, DB_ENV_VAR};

/// Database path: explicit, then `VIGIBALL_DB`, then the default location.
pub fn resolve_database_path(explicit: Option<&Path>) -> PathBuf {
    resolve_path(explicit, DB_ENV_VAR, default_database_path)
}

/// Config path: explicit, then `VIGIBALL_CONFIG`, then the default location.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    resolve_path(explicit, CONFIG_ENV_VAR, default_config_path)
}

fn resolve_path(explicit: Option<&Path>, env_var: &str, default: fn() -> PathBuf) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var_os(env_var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default)
}
