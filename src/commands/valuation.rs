//! Player listing and valuation maintenance commands.

use super::common::{format_money, print_json, CommandContext};
use crate::{
    cli::types::PlayerId,
    storage::{Player, RecomputeSummary},
    Result,
};

fn player_line(player: &Player) -> String {
    format!(
        "{:>5}  {:<28} {:<10} {:<6} {:>7}  {}",
        player.id.as_i64(),
        player.name,
        player.season.as_deref().unwrap_or("-"),
        player.position.as_deref().unwrap_or("-"),
        format_money(player.final_mvpa),
        player.squad.as_deref().unwrap_or("-"),
    )
}

/// Recompute valuations: one player, every player, or only report stale ones.
pub fn handle_recompute(
    ctx: &mut CommandContext,
    player: Option<PlayerId>,
    check: bool,
) -> Result<RecomputeSummary> {
    if check {
        let stale = ctx.db.stale_players(&ctx.engine)?;
        if stale.is_empty() {
            println!("✓ All stored valuations are up to date");
        } else {
            println!("{} players have out-of-date valuations:", stale.len());
            for p in &stale {
                println!("{}", player_line(p));
            }
        }
        return Ok(RecomputeSummary::default());
    }

    if let Some(id) = player {
        let ledger = &ctx.config.ledger;
        let updated = ctx.db.recompute_with_retry(
            id,
            &ctx.engine,
            ledger.max_retries,
            ledger.retry_backoff(),
        )?;
        println!("✓ {}", player_line(&updated));
        let unscouted = usize::from(updated.p_score.is_none());
        return Ok(RecomputeSummary {
            updated: 1 - unscouted,
            unscouted,
            ..RecomputeSummary::default()
        });
    }

    println!("Recomputing all valuations with the {} strategy...", ctx.engine.strategy_name());
    let summary = ctx.db.recompute_all(&ctx.engine)?;
    println!(
        "✓ {} updated, {} unscouted, {} invalid, {} conflicts",
        summary.updated, summary.unscouted, summary.invalid, summary.conflicts
    );
    Ok(summary)
}

/// List players, optionally filtered by a name fragment.
pub fn handle_players(ctx: &CommandContext, name: Option<&str>, as_json: bool) -> Result<()> {
    let players = match name {
        Some(fragment) => ctx.db.search_players(fragment)?,
        None => ctx.db.list_players()?,
    };

    if as_json {
        return print_json(&players);
    }
    if players.is_empty() {
        println!("No players found");
        return Ok(());
    }
    for p in &players {
        println!("{}", player_line(p));
    }
    Ok(())
}

/// Show one player with its valuation breakdown.
pub fn handle_show(ctx: &CommandContext, id: PlayerId, as_json: bool) -> Result<Player> {
    let player = ctx.db.require_player(id)?;

    if as_json {
        print_json(&player)?;
        return Ok(player);
    }

    println!("{} ({})", player.name, player.id);
    println!(
        "  {} | {} | {} | {}",
        player.season.as_deref().unwrap_or("-"),
        player.position.as_deref().unwrap_or("-"),
        player.squad.as_deref().unwrap_or("-"),
        player.comp.as_deref().unwrap_or("-"),
    );
    match player.age {
        Some(age) => println!("  Age:            {:.1}", age),
        None => println!("  Age:            -"),
    }
    println!("  P-score:        {}", format_money(player.p_score));
    println!("  Base value:     {}", format_money(player.base_value));
    println!("  Elite score:    {}", format_money(player.elite_score));
    println!("  Market premium: {}", format_money(player.market_premium));
    println!("  Final MVPA:     {}", format_money(player.final_mvpa));
    if let Some(ceiling) = crate::ledger::ceiling_for(
        player.final_mvpa,
        ctx.config.ledger.ceiling_multiplier,
    ) {
        println!("  Bid ceiling:    {:.2}", ceiling);
    }
    if !ctx.engine.is_fresh(&player) {
        println!("  ⚠ Stored valuation is out of date; run `vigiball recompute`");
    }
    if let Some(note) = &player.scout_note {
        println!("  Note: {}", note);
    }
    Ok(player)
}
