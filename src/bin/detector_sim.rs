//! Synthetic detection feed
//!
//! Stands in for the visual detection subsystem: emits JSONL stock-count
//! observations to stdout, one per category per tick, with gradual
//! depletion, confidence noise, and occasional restocks. Pipe into the
//! shelfwatch runtime:
//!
//! ```text
//! detector_sim | shelfwatch
//! ```

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

/// Emitted observation, matching the runtime's intake format
#[derive(Serialize)]
struct FeedObservation {
    category_id: i64,
    count: u32,
    confidence: f64,
    observed_at: String,
}

/// One simulated shelf section
struct ShelfSection {
    category_id: i64,
    stock: f64,
    capacity: f64,
    /// Units consumed per tick, before noise
    depletion_per_tick: f64,
}

impl ShelfSection {
    fn tick(&mut self, rng: &mut impl Rng) -> FeedObservation {
        // Deplete with ±50% noise; shoppers are not a smooth process
        let draw = self.depletion_per_tick * rng.gen_range(0.5..1.5);
        self.stock = (self.stock - draw).max(0.0);

        // Restock: near-certain when empty, rare otherwise
        let restock_chance = if self.stock <= 0.5 { 0.4 } else { 0.01 };
        if rng.gen_bool(restock_chance) {
            self.stock = self.capacity;
        }

        // The detector miscounts occasionally and is never fully sure
        let detected = (self.stock + rng.gen_range(-1.0..1.0)).round().max(0.0) as u32;
        FeedObservation {
            category_id: self.category_id,
            count: detected,
            confidence: rng.gen_range(0.75..0.99),
            observed_at: Utc::now().to_rfc3339(),
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let interval_ms: u64 = std::env::var("SIM_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    // 0 = run forever
    let ticks: u64 = std::env::var("SIM_TICKS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut rng = rand::thread_rng();
    let mut sections: Vec<ShelfSection> = (1..=5)
        .map(|category_id| {
            let capacity = rng.gen_range(20.0..60.0);
            ShelfSection {
                category_id,
                stock: capacity,
                capacity,
                depletion_per_tick: rng.gen_range(0.2..1.5),
            }
        })
        .collect();

    log::info!(
        "📷 detector_sim: {} sections, tick {}ms",
        sections.len(),
        interval_ms
    );

    let mut emitted = 0u64;
    loop {
        for section in &mut sections {
            let observation = section.tick(&mut rng);
            match serde_json::to_string(&observation) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("❌ serialize failed: {}", e),
            }
        }
        emitted += 1;
        if ticks > 0 && emitted >= ticks {
            break;
        }
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    }
}
