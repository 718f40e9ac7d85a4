//! Two-channel search.
//!
//! A new best match must be strictly closer on every channel at once. A decoy
//! that resembles the query on channel A only cannot displace a window that is
//! closer on both channels.
//!
//! Run with: cargo run --release --example multichannel

use dtw_search::{SearchConfig, SearchEngine, WarpingWindow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 50_000;
    let m = 64;

    let mut a: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut b: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let qa: Vec<f64> = (0..m).map(|i| (i as f64 * 0.2).sin()).collect();
    let qb: Vec<f64> = (0..m).map(|i| (i as f64 * 0.1).cos()).collect();

    // Decoy: channel A alone resembles the query
    for i in 0..m {
        a[10_000 + i] = qa[i] + rng.gen_range(-0.2..0.2);
    }
    // Target: both channels match closely
    for i in 0..m {
        a[30_000 + i] = qa[i] + rng.gen_range(-0.05..0.05);
        b[30_000 + i] = qb[i] + rng.gen_range(-0.05..0.05);
    }

    let config = SearchConfig::new(m, WarpingWindow::Fraction(0.1)).with_channels(2);
    let engine = SearchEngine::new(config, &[&qa, &qb]).expect("valid configuration");
    let report = engine.search_channels(&[&a, &b]).expect("search failed");

    println!("Two-channel DTW search");
    println!("======================");
    println!("Decoy (channel A only) at 10000, target (both channels) at 30000");
    match &report.best {
        Some(best) => {
            println!("Location: {}", best.location);
            for (c, d) in best.distances.iter().enumerate() {
                println!("  Distance({}): {d:.6}", c + 1);
            }
        }
        None => println!("No match"),
    }
    println!("Improvements of best-so-far: {}", report.stats.improvements);
}
