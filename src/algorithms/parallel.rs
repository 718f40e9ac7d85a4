//! Segmented parallel search (feature `parallel`).
//!
//! The window positions are split into contiguous segments, each scanned by
//! its own cascade with its own buffers. Segments share one best-so-far so a
//! good match found anywhere tightens pruning everywhere.
//!
//! Thresholds are read without locking: they only ever decrease, so a stale
//! read is just a looser threshold. Publishing a match takes a lock, re-checks
//! every channel against the current best and replaces all channels and the
//! location together. Because segments race, the match reported among
//! equal-distance candidates (and, with several channels, among candidates
//! that are not uniformly better than one another) can depend on scheduling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::algorithms::query::PreparedQuery;
use crate::algorithms::search::{build_report, log_report, scan, ScanSummary};
use crate::core::error::SearchError;
use crate::core::report::{BestSoFar, BestTracker, PruningStats, SearchReport};
use crate::source::SliceSource;

/// Below this many window positions the sequential scan is used.
const MIN_PARALLEL_POSITIONS: usize = 4096;

/// Best-so-far shared between segment scans.
#[derive(Debug)]
pub struct SharedBest {
    /// `f64` bits of each channel's current threshold.
    thresholds: Vec<AtomicU64>,
    current: Mutex<BestSoFar>,
}

impl SharedBest {
    pub fn new(channels: usize) -> Self {
        Self {
            thresholds: (0..channels)
                .map(|_| AtomicU64::new(f64::INFINITY.to_bits()))
                .collect(),
            current: Mutex::new(BestSoFar::new(channels)),
        }
    }

    pub fn into_inner(self) -> BestSoFar {
        self.current
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BestTracker for &SharedBest {
    #[inline]
    fn threshold(&self, channel: usize) -> f64 {
        f64::from_bits(self.thresholds[channel].load(Ordering::Relaxed))
    }

    fn offer(&mut self, location: u64, distances: &[f64]) -> bool {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !current.offer(location, distances) {
            return false;
        }
        for (slot, d) in self.thresholds.iter().zip(distances) {
            slot.store(d.to_bits(), Ordering::Relaxed);
        }
        true
    }
}

/// Split `n_positions` window positions into at most `n_segments` contiguous ranges.
fn segment_ranges(n_positions: usize, n_segments: usize) -> Vec<(usize, usize)> {
    if n_positions == 0 || n_segments == 0 {
        return vec![];
    }
    let n_segments = n_segments.min(n_positions);
    (0..n_segments)
        .map(|s| {
            (
                s * n_positions / n_segments,
                (s + 1) * n_positions / n_segments,
            )
        })
        .collect()
}

/// Parallel counterpart of [`crate::algorithms::search::search`] over in-memory channels.
pub fn par_search(
    queries: &[PreparedQuery],
    chunk_capacity: usize,
    data: &[&[f64]],
) -> Result<SearchReport, SearchError> {
    let first = queries.first().ok_or(SearchError::NoChannels)?;
    if data.len() != queries.len() {
        return Err(SearchError::ChannelMismatch {
            expected: queries.len(),
            actual: data.len(),
        });
    }
    let m = first.len();
    let source = SliceSource::new(data.to_vec())?;
    let n = data[0].len();
    let n_positions = (n + 1).saturating_sub(m);

    if n_positions < MIN_PARALLEL_POSITIONS {
        return crate::algorithms::search::search(queries, chunk_capacity, source);
    }

    let shared = SharedBest::new(queries.len());
    let n_segments = rayon::current_num_threads() * 4;
    let ranges = segment_ranges(n_positions, n_segments);

    let summaries: Vec<ScanSummary> = ranges
        .into_par_iter()
        .map(|(start, end)| {
            let segment: Vec<&[f64]> = data.iter().map(|ch| &ch[start..end + m - 1]).collect();
            let mut best = &shared;
            scan(
                queries,
                chunk_capacity,
                start as u64,
                SliceSource::new(segment)?,
                &mut best,
            )
        })
        .collect::<Result<_, _>>()?;

    let mut stats = PruningStats::default();
    for summary in &summaries {
        stats.merge(&summary.stats);
    }
    let summary = ScanSummary {
        stats,
        samples_scanned: n as u64,
    };
    let report = build_report(queries, summary, shared.into_inner());
    log_report(&report);
    Ok(report)
}
