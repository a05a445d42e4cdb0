//! Bidding ledger commands.

use super::common::{format_money, print_json, CommandContext};
use crate::{
    cli::types::{Phase, PlayerId, SessionId},
    storage::{BidReceipt, BidRequest},
    Result,
};

/// Parameters of a bid submission from the command line
#[derive(Debug)]
pub struct BidParams {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub phase: Phase,
    pub amount: f64,
    pub time_taken: Option<f64>,
    pub as_json: bool,
}

/// Submit one bid and print the resulting trajectory.
pub fn handle_bid(ctx: &mut CommandContext, params: BidParams) -> Result<BidReceipt> {
    let mut request = BidRequest::new(
        params.session_id,
        params.player_id,
        params.phase,
        params.amount,
    );
    request.time_taken = params.time_taken;

    let receipt = ctx.db.submit_bid(&ctx.config.ledger, &request)?;

    if params.as_json {
        print_json(&receipt)?;
        return Ok(receipt);
    }

    let bid = &receipt.bid;
    println!(
        "✓ {} bid of {:.2} recorded for session {} on player {}",
        request.phase, request.amount, bid.session_id, bid.player_id
    );
    println!(
        "  phase1 {} → phase2 {} → phase3 {}",
        format_money(bid.phase1_bid),
        format_money(bid.phase2_bid),
        format_money(bid.phase3_bid)
    );
    println!(
        "  MVPA shown {} | ceiling {}",
        format_money(receipt.mvpa_shown),
        format_money(receipt.ceiling)
    );
    if receipt.over_ceiling {
        println!("  ⚠ Above the advisory ceiling");
    }
    Ok(receipt)
}

/// Print the final bid of a session/player pair.
pub fn handle_final_bid(
    ctx: &CommandContext,
    session_id: &SessionId,
    player_id: PlayerId,
) -> Result<Option<f64>> {
    let amount = ctx.db.final_bid(session_id, player_id)?;
    match amount {
        Some(a) => println!("{:.2}", a),
        None => println!("No bid from session {} on player {}", session_id, player_id),
    }
    Ok(amount)
}

/// Print every session's final bid for a player, best first.
pub fn handle_leaderboard(ctx: &CommandContext, player_id: PlayerId, as_json: bool) -> Result<()> {
    let player = ctx.db.require_player(player_id)?;
    let entries = ctx.db.leaderboard(player_id)?;

    if as_json {
        return print_json(&entries);
    }

    println!("Leaderboard for {} (MVPA {})", player.name, format_money(player.final_mvpa));
    if entries.is_empty() {
        println!("  No bids yet");
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<20} {:>10.2}  {}",
            rank + 1,
            entry.session_id.as_str(),
            entry.amount,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

/// Print the audit trail of a session/player pair.
pub fn handle_history(
    ctx: &CommandContext,
    session_id: &SessionId,
    player_id: PlayerId,
    as_json: bool,
) -> Result<()> {
    let events = ctx.db.bid_history(session_id, player_id)?;

    if as_json {
        return print_json(&events);
    }
    if events.is_empty() {
        println!("No bids from session {} on player {}", session_id, player_id);
        return Ok(());
    }
    for event in &events {
        let took = event
            .time_taken
            .map(|t| format!(" after {:.1}s", t))
            .unwrap_or_default();
        println!(
            "{}  {} {:>10.2}{}  (MVPA {}, ceiling {})",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.phase,
            event.bid_amount,
            took,
            format_money(event.mvpa_shown),
            format_money(event.ceiling)
        );
    }
    Ok(())
}
