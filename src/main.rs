//! Entry point: parse CLI and dispatch to command handlers.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vigiball::{
    cli::{Commands, Vigiball},
    commands::{
        bidding::{handle_bid, handle_final_bid, handle_history, handle_leaderboard, BidParams},
        common::CommandContext,
        import::handle_import,
        init::handle_init,
        resolve_config_path, resolve_database_path,
        valuation::{handle_players, handle_recompute, handle_show},
    },
};

/// Run the CLI.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = Vigiball::parse();

    if let Commands::Init { write_config } = app.command {
        let db_path = resolve_database_path(app.global.db.as_deref());
        let config_path = resolve_config_path(app.global.config.as_deref());
        return handle_init(&db_path, &config_path, write_config)
            .with_context(|| format!("initializing {}", db_path.display()));
    }

    let mut ctx = CommandContext::new(&app.global).context("loading settings and database")?;

    match app.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Import { file } => {
            handle_import(&mut ctx, &file)
                .with_context(|| format!("importing {}", file.display()))?;
        }

        Commands::Recompute { player, check } => {
            handle_recompute(&mut ctx, player, check)?;
        }

        Commands::Players { name, json } => handle_players(&ctx, name.as_deref(), json)?,

        Commands::Show { player, json } => {
            handle_show(&ctx, player, json)?;
        }

        Commands::Bid {
            target,
            phase,
            amount,
            time_taken,
            json,
        } => {
            handle_bid(
                &mut ctx,
                BidParams {
                    session_id: target.session,
                    player_id: target.player,
                    phase,
                    amount,
                    time_taken,
                    as_json: json,
                },
            )?;
        }

        Commands::FinalBid { target } => {
            handle_final_bid(&ctx, &target.session, target.player)?;
        }

        Commands::Leaderboard { player, json } => handle_leaderboard(&ctx, player, json)?,

        Commands::History { target, json } => {
            handle_history(&ctx, &target.session, target.player, json)?
        }
    }

    Ok(())
}
