//! Single-channel nearest-neighbor search.
//!
//! Hides a warped copy of a query inside a noisy random walk and recovers it,
//! comparing the pruned search against the exhaustive reference.
//!
//! Run with: cargo run --release --example basic_search

use std::time::Instant;

use dtw_search::{SearchConfig, SearchEngine, WarpingWindow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    let mut rng = StdRng::seed_from_u64(42);
    let n = 200_000;
    let m = 128;

    // Random walk background
    let mut data = Vec::with_capacity(n);
    let mut level = 0.0;
    for _ in 0..n {
        level += rng.gen_range(-1.0..1.0);
        data.push(level);
    }

    // Query: a chirp. Plant a time-stretched, offset, scaled copy at a known spot.
    let query: Vec<f64> = (0..m)
        .map(|i| {
            let t = i as f64 / m as f64;
            (t * t * 40.0).sin()
        })
        .collect();
    let planted = 123_456;
    for i in 0..m {
        let t = (i as f64 * 0.97) / m as f64;
        data[planted + i] = 50.0 + 3.0 * (t * t * 40.0).sin() + rng.gen_range(-0.05..0.05);
    }

    let config = SearchConfig::new(m, WarpingWindow::Fraction(0.05));
    let engine = SearchEngine::new(config, &[&query]).expect("valid configuration");

    println!("UCR-style DTW subsequence search");
    println!("================================");
    println!("Stream length: {n}, query length: {m}, radius: {}", engine.radius());
    println!("Planted match at: {planted}");

    let start = Instant::now();
    let report = engine.search_slice(&data).expect("search failed");
    let fast = start.elapsed();

    println!("\nPruned search ({:.3}s):", fast.as_secs_f64());
    println!("  Location: {:?}", report.location());
    println!("  Distance: {:.6}", report.distance(0).unwrap_or(f64::NAN));
    let s = &report.stats;
    println!("  Pruned by LB_Kim:          {:6.2}%", 100.0 * s.kim_fraction());
    println!("  Pruned by LB_Keogh query:  {:6.2}%", 100.0 * s.keogh_query_fraction());
    println!("  Pruned by LB_Keogh data:   {:6.2}%", 100.0 * s.keogh_data_fraction());
    println!("  Reached DTW:               {:6.2}%", 100.0 * s.dtw_fraction());

    // The exhaustive reference is slow; run it on a slice around the match.
    let lo = planted - 5_000;
    let hi = planted + 5_000;
    let start = Instant::now();
    let naive = engine.naive_search(&[&data[lo..hi]]).expect("search failed");
    println!(
        "\nExhaustive search on [{lo}, {hi}) ({:.3}s): location {:?}, distance {:.6}",
        start.elapsed().as_secs_f64(),
        naive.location().map(|l| l + lo as u64),
        naive.distance(0).unwrap_or(f64::NAN)
    );
}
