//! Replays the bundled demo recording through a fresh store.

use std::path::PathBuf;

use dronewatch_cli::load_batches;
use dronewatch_core::{Category, EntityStore};

fn recording() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/recording.jsonl")
}

#[test]
fn demo_recording_replays() {
    let batches = load_batches(&recording()).unwrap();
    assert_eq!(batches.len(), 3);

    let mut store = EntityStore::default();
    let outcomes: Vec<_> = batches.iter().map(|b| store.apply_batch(b)).collect();
    assert_eq!(outcomes[0].dropped, 1);
    assert_eq!(outcomes[0].accepted, 2);
    assert_eq!(outcomes[1].created, 1);

    assert_eq!(store.len(), 3);
    assert_eq!(store.unsafe_count(), 2);

    let falcon = store.by_id("d1").unwrap();
    assert_eq!(falcon.category, Category::Safe);
    assert_eq!(falcon.position.altitude, 55.0);
    assert_eq!(falcon.flight_duration_ms, 4_000);
    assert_eq!(store.path_of("d1").len(), 3);

    // Feature without altitude or registration falls back to defaults
    let d3 = store.by_id("d3").unwrap();
    assert_eq!(d3.position.altitude, 0.0);
    assert_eq!(d3.category, Category::Unsafe);
    assert_eq!(d3.battery_pct, 100.0);
}
