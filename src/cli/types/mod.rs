//! Type-safe wrappers for players, sessions and bidding phases.

pub mod ids;
pub mod phase;

pub use ids::{PlayerId, SessionId};
pub use phase::Phase;
