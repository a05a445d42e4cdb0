//! CLI argument definitions and parsing.

pub mod types;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use types::{Phase, PlayerId, SessionId};

/// Location of the database and settings, shared by every command
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// SQLite database file (or set `VIGIBALL_DB`).
    #[clap(long, global = true, env = "VIGIBALL_DB")]
    pub db: Option<PathBuf>,

    /// JSON settings file (or set `VIGIBALL_CONFIG`).
    #[clap(long, global = true, env = "VIGIBALL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Identifies one participant's bid trajectory on one player
#[derive(Debug, Args)]
pub struct BidTarget {
    /// Bidding session (participant) identifier.
    #[clap(long, short)]
    pub session: SessionId,

    /// Player id.
    #[clap(long, short)]
    pub player: PlayerId,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the database and, optionally, a settings file with every default spelled out
    Init {
        /// Also write the default settings to the config path.
        #[clap(long)]
        write_config: bool,
    },

    /// Import scouting records from a JSON array file.
    ///
    /// Players are matched on name and season; missing p-scores are derived
    /// from each record's `stats` against its season and position peers.
    Import {
        /// Path to the scouting JSON file.
        file: PathBuf,
    },

    /// Recompute stored valuations with the current settings
    Recompute {
        /// Only this player (retries on concurrent scouting updates).
        #[clap(long, short)]
        player: Option<PlayerId>,

        /// List players whose stored valuation is out of date instead of rewriting.
        #[clap(long, conflicts_with = "player")]
        check: bool,
    },

    /// List players, optionally filtered by a name fragment
    Players {
        /// Substring of the player name.
        #[clap(long, short)]
        name: Option<String>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Show one player with its valuation breakdown
    Show {
        player: PlayerId,

        #[clap(long)]
        json: bool,
    },

    /// Submit a bid for the next phase of a session/player pair
    Bid {
        #[clap(flatten)]
        target: BidTarget,

        /// Phase: 1, 2, 3 or phase1..phase3.
        #[clap(long)]
        phase: Phase,

        /// Bid amount, in millions.
        #[clap(long, short)]
        amount: f64,

        /// Seconds the participant took to decide.
        #[clap(long)]
        time_taken: Option<f64>,

        #[clap(long)]
        json: bool,
    },

    /// Print the highest submitted phase amount of a session/player pair
    FinalBid {
        #[clap(flatten)]
        target: BidTarget,
    },

    /// Rank every session's final bid for a player
    Leaderboard {
        player: PlayerId,

        #[clap(long)]
        json: bool,
    },

    /// Show every accepted submission of a session/player pair
    History {
        #[clap(flatten)]
        target: BidTarget,

        #[clap(long)]
        json: bool,
    },
}

#[derive(Debug, Parser)]
#[clap(
    name = "vigiball",
    about = "Football player valuation and three-phase bidding"
)]
pub struct Vigiball {
    #[clap(flatten)]
    pub global: GlobalOpts,

    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Vigiball::command().debug_assert();
    }

    #[test]
    fn test_parse_bid() {
        let app = Vigiball::try_parse_from([
            "vigiball", "bid", "-s", "s1", "-p", "42", "--phase", "2", "-a", "120",
        ])
        .unwrap();

        match app.command {
            Commands::Bid {
                target,
                phase,
                amount,
                time_taken,
                json,
            } => {
                assert_eq!(target.session.as_str(), "s1");
                assert_eq!(target.player, PlayerId::new(42));
                assert_eq!(phase, Phase::Two);
                assert_eq!(amount, 120.0);
                assert_eq!(time_taken, None);
                assert!(!json);
            }
            other => panic!("Expected Bid command, got {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let app =
            Vigiball::try_parse_from(["vigiball", "show", "7", "--db", "/tmp/v.db"]).unwrap();
        assert_eq!(app.global.db, Some(PathBuf::from("/tmp/v.db")));
        assert!(matches!(app.command, Commands::Show { .. }));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Vigiball::try_parse_from([
            "vigiball", "bid", "-s", "", "-p", "1", "--phase", "1", "-a", "1"
        ])
        .is_err());
        assert!(Vigiball::try_parse_from([
            "vigiball", "bid", "-s", "s1", "-p", "1", "--phase", "4", "-a", "1"
        ])
        .is_err());
        assert!(Vigiball::try_parse_from(["vigiball", "recompute", "-p", "1", "--check"]).is_err());
    }
}
