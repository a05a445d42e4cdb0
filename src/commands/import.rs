//! Scouting file import.

use std::{fs, path::Path};

use super::common::CommandContext;
use crate::{
    scouting::{import_records, parse_records, ImportSummary},
    Result,
};

/// Read a JSON array of scouting records and store them.
pub fn handle_import(ctx: &mut CommandContext, file: &Path) -> Result<ImportSummary> {
    let contents = fs::read_to_string(file)?;
    let records = parse_records(&contents)?;
    println!("Importing {} scouting records from {}...", records.len(), file.display());

    let summary = import_records(&mut ctx.db, &ctx.engine, records)?;

    println!(
        "✓ {} inserted, {} updated, {} re-ranked, {} rejected",
        summary.inserted,
        summary.updated,
        summary.reranked,
        summary.rejected.len()
    );
    for (name, reason) in &summary.rejected {
        println!("  ⚠ {}: {}", name, reason);
    }
    Ok(summary)
}
