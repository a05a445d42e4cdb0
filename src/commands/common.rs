//! Common utilities and helper functions shared across commands.

use tracing::debug;

use super::{resolve_config_path, resolve_database_path};
use crate::{
    cli::GlobalOpts, config::AppConfig, storage::PlayerDatabase, valuation::ValuationEngine,
    Result,
};

/// Context containing common resources needed by most commands
pub struct CommandContext {
    pub config: AppConfig,
    pub db: PlayerDatabase,
    pub engine: ValuationEngine,
}

impl CommandContext {
    /// Load settings, open the database and build the valuation engine
    pub fn new(opts: &GlobalOpts) -> Result<Self> {
        let config_path = resolve_config_path(opts.config.as_deref());
        let config = AppConfig::load(Some(&config_path))?;
        let db_path = resolve_database_path(opts.db.as_deref());
        debug!(config = %config_path.display(), db = %db_path.display(), "opening context");

        let db = PlayerDatabase::open(&db_path, config.ledger.lock_timeout())?;
        Self::with_database(config, db)
    }

    /// Context over an already open database
    pub fn with_database(config: AppConfig, db: PlayerDatabase) -> Result<Self> {
        let engine = ValuationEngine::from_config(&config.valuation)?;
        Ok(Self { config, db, engine })
    }
}

/// Money in millions with two decimals, or `-` when absent.
pub fn format_money(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
