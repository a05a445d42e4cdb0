//! Database and settings bootstrap.

use std::{fs, path::Path};

use tracing::info;

use crate::{config::AppConfig, storage::PlayerDatabase, Result};

/// Create the database schema at `db_path` and, when asked, write the default
/// settings to `config_path`. An existing settings file is never overwritten.
pub fn handle_init(db_path: &Path, config_path: &Path, write_config: bool) -> Result<()> {
    let config = AppConfig::load_from(config_path)?;
    PlayerDatabase::open(db_path, config.ledger.lock_timeout())?;
    info!(db = %db_path.display(), "database ready");
    println!("✓ Database ready at {}", db_path.display());

    if !write_config {
        return Ok(());
    }
    if config_path.exists() {
        println!("Settings already exist at {}, leaving them untouched", config_path.display());
        return Ok(());
    }
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(config_path, serde_json::to_string_pretty(&AppConfig::default())?)?;
    println!("✓ Default settings written to {}", config_path.display());
    Ok(())
}
