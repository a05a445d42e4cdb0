//! Storage layer for players and bids
//!
//! This module provides a clean abstraction over the SQLite database,
//! organized into logical components:
//! - `models`: Data structures
//! - `schema`: Database connection and schema management
//! - `players`: Player records and optimistic valuation writes
//! - `bids`: The three-phase bidding ledger

pub mod bids;
pub mod models;
pub mod players;
pub mod schema;


// Re-export the main types and database struct for easy access
pub use models::*;
pub use schema::PlayerDatabase;
