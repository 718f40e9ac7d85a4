//! Search a text stream chunk by chunk.
//!
//! Data is parsed from an in-memory text buffer through `ReaderSource`, the
//! same path the command-line tool uses for files. Only one chunk (plus the
//! `m - 1` samples carried between chunks) is held in memory at a time.
//!
//! Run with: cargo run --release --example streaming_reader

use std::fmt::Write;
use std::io::Cursor;

use dtw_search::{read_query, ReaderSource, SearchConfig, SearchEngine, WarpingWindow};

fn main() {
    let m = 32;
    let n = 20_000;

    let mut text = String::new();
    for i in 0..n {
        let x = (i as f64 * 0.05).sin() + 0.3 * (i as f64 * 0.37).cos();
        let x = if (15_000..15_000 + m).contains(&i) {
            ((i - 15_000) as f64 / 4.0).tanh() * 2.0
        } else {
            x
        };
        writeln!(text, "{x:.6}").expect("writing to a String cannot fail");
    }

    let query_text: String = (0..m)
        .map(|i| format!("{:.6} ", (i as f64 / 4.0).tanh()))
        .collect();
    let query = read_query(Cursor::new(query_text), m, 1).expect("query parses");

    let config = SearchConfig::new(m, WarpingWindow::Samples(3)).with_chunk_capacity(1_000);
    let engine = SearchEngine::new(config, &[&query[0]]).expect("valid configuration");
    let source = ReaderSource::new(Cursor::new(text), 1).expect("one channel");
    let report = engine.search(source).expect("search failed");

    println!("Streaming search over {} samples in chunks of 1000", report.samples_scanned);
    println!("Location: {:?} (planted at 15000)", report.location());
    println!("Distance: {:.6}", report.distance(0).unwrap_or(f64::NAN));
    println!("Windows examined: {}", report.stats.positions);
}
