//! Apply recorded batches to a fresh store and print the resulting model.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dronewatch_cli::load_batches;
use dronewatch_core::{Category, EntityStore, ListProjection, TrackerRules};

/// Replay recorded telemetry batches
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Recording (JSON document or JSON Lines, one batch per line)
    file: PathBuf,

    /// Authorized registration prefix
    #[arg(long, default_value = "B")]
    prefix: String,

    /// Path samples kept per drone
    #[arg(long, default_value_t = 100)]
    path_capacity: usize,

    /// Select a drone after replay
    #[arg(long)]
    select: Option<String>,

    /// Show only unsafe drones in the list
    #[arg(long)]
    unsafe_only: bool,

    /// List window offset
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// List window size
    #[arg(long, default_value_t = 25)]
    limit: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let batches = load_batches(&args.file)?;
    let mut store = EntityStore::new(TrackerRules {
        authorized_prefix: args.prefix.clone(),
        path_capacity: args.path_capacity,
        ..TrackerRules::default()
    });

    let mut outcomes = Vec::with_capacity(batches.len());
    for batch in &batches {
        outcomes.push(store.apply_batch(batch));
    }
    if let Some(id) = &args.select {
        store.select(id.as_str());
    }

    let mut projection = ListProjection::window(args.offset, args.limit);
    if args.unsafe_only {
        projection = projection.only(Category::Unsafe);
    }
    let page = projection.project(store.all(), store.selected());
    let stats = store.statistics();

    if args.json {
        let selected_path = store.selected().map(|id| store.path_of(id));
        let out = serde_json::json!({
            "batches": outcomes,
            "statistics": stats,
            "list": page,
            "selected": store.selected().and_then(|id| store.by_id(id)),
            "selected_path": selected_path,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (i, outcome) in outcomes.iter().enumerate() {
        println!(
            "batch {:3}: {} accepted, {} new, {} dropped",
            i + 1,
            outcome.accepted,
            outcome.created,
            outcome.dropped
        );
    }

    println!(
        "\n{} drones ({} safe, {} unsafe, {} flying)",
        stats.total_drones, stats.safe_count, stats.unsafe_count, stats.flying_count
    );
    println!(
        "altitude avg {:.1}m  min {:.1}m  max {:.1}m  battery avg {:.0}%\n",
        stats.average_altitude, stats.min_altitude, stats.max_altitude, stats.average_battery_pct
    );

    println!("{:<2} {:<14} {:<20} {:<12} {:<7} {:>8} {:>8}", "", "ID", "NAME", "STATUS", "RISK", "ALT(m)", "BATT%");
    for row in &page.rows {
        let marker = if row.selected { ">" } else { "" };
        let risk = match row.category {
            Category::Safe => "SAFE",
            Category::Unsafe => "UNSAFE",
        };
        println!(
            "{:<2} {:<14} {:<20} {:<12} {:<7} {:>8.1} {:>8.0}",
            marker, row.id, row.display_name, row.status_label, risk, row.altitude, row.battery_pct
        );
    }
    println!(
        "\nshowing {}-{} of {}",
        page.offset + usize::from(!page.rows.is_empty()),
        page.offset + page.rows.len(),
        page.total
    );

    if let Some(id) = store.selected() {
        match store.by_id(id) {
            Some(drone) => println!(
                "\nselected {}: {} path samples, flying for {:.1}s",
                id,
                store.path_of(id).len(),
                drone.flight_duration_ms as f64 / 1000.0
            ),
            None => println!("\nselected {} is not tracked", id),
        }
    }

    Ok(())
}
