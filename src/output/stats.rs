//! Statistics generation from the mirror database
//!
//! This module provides functionality for extracting and displaying
//! mirror statistics from the storage layer.

use crate::storage::{RunRecord, Storage, Table};
use crate::SyncError;

/// Mirror statistics summary
#[derive(Debug, Clone)]
pub struct MirrorStatistics {
    /// Row count of every required table, in schema order
    pub table_counts: Vec<(Table, u64)>,

    /// Pages stored with markup
    pub pages_with_markup: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl MirrorStatistics {
    pub fn count(&self, table: Table) -> u64 {
        self.table_counts
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(MirrorStatistics)` - Successfully loaded statistics
/// * `Err(SyncError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<MirrorStatistics, SyncError> {
    let table_counts = Table::REQUIRED
        .into_iter()
        .map(|table| Ok((table, storage.count_rows(table)?)))
        .collect::<Result<Vec<_>, SyncError>>()?;

    Ok(MirrorStatistics {
        table_counts,
        pages_with_markup: storage.count_pages_with_markup()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &MirrorStatistics) {
    println!("=== Mirror Statistics ===\n");

    println!("Rows by Table:");
    for (table, count) in &stats.table_counts {
        println!("  {}: {}", table.name(), count);
    }
    println!();

    let pages = stats.count(Table::Page);
    let coverage = if pages > 0 {
        (stats.pages_with_markup as f64 / pages as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Markup Coverage: {:.1}% ({} / {} pages stored with markup)",
        coverage, stats.pages_with_markup, pages
    );

    match &stats.latest_run {
        Some(run) => {
            println!("\nLatest Run (#{}):", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
            println!("  Counters: {}", run.stats);
        }
        None => println!("\nNo runs recorded"),
    }
}
