//! Vigiball: player valuation and three-phase bidding
//!
//! A library for scoring football players from scouting data and recording
//! how participants bid on them across three rounds.
//!
//! ## Features
//!
//! - **Valuation Engine**: Base value, elite score and market premium combined
//!   into a market value (`final_mvpa`), with pluggable strategies
//! - **Scouting Intake**: Import scouting records, derive p-scores from raw
//!   per-season stats and keep valuations fresh
//! - **Bidding Ledger**: Per-session, per-player phase 1 → 2 → 3 bids with a
//!   non-decreasing floor and a soft ceiling bound to the current valuation
//! - **Database Storage**: SQLite persistence that stays consistent under
//!   concurrent writers
//!
//! ## Quick Start
//!
//! ```rust
//! use vigiball::{
//!     config::AppConfig,
//!     storage::{BidRequest, PlayerProfile},
//!     Phase, PlayerDatabase, SessionId, ValuationEngine,
//! };
//!
//! # fn example() -> vigiball::Result<()> {
//! let config = AppConfig::default();
//! let engine = ValuationEngine::from_config(&config.valuation)?;
//! let mut db = PlayerDatabase::open_in_memory()?;
//!
//! let mut profile = PlayerProfile::new("Jude Bellingham");
//! profile.p_score = Some(88.0);
//! profile.age = Some(20.0);
//! let player = db.insert_player(&profile, &engine)?;
//!
//! let session = SessionId::new("s1")?;
//! let request = BidRequest::new(session.clone(), player.id, Phase::One, 80.0);
//! db.submit_bid(&config.ledger, &request)?;
//!
//! assert_eq!(db.final_bid(&session, player.id)?, Some(80.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Environment Configuration
//!
//! ```bash
//! export VIGIBALL_DB=/path/to/vigiball.db
//! export VIGIBALL_CONFIG=/path/to/config.json
//! export RUST_LOG=vigiball=debug
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod ledger;
pub mod scouting;
pub mod storage;
pub mod valuation;

// Re-export commonly used types
pub use cli::types::{Phase, PlayerId, SessionId};
pub use config::AppConfig;
pub use error::{Result, VigiballError};
pub use storage::PlayerDatabase;
pub use valuation::ValuationEngine;
