use tracing::{debug, info};

use crate::algorithms::dtw::{banded_dtw, dtw_distance, DtwWorkspace};
use crate::algorithms::lower_bounds::{
    into_remaining_bound, lb_keogh_data, lb_keogh_query, lb_kim_hierarchy,
};
use crate::algorithms::query::PreparedQuery;
use crate::algorithms::window::{ChunkWindow, SlidingWindow};
use crate::core::error::SearchError;
use crate::core::report::{BestSoFar, BestTracker, PruningStats, SearchReport};
use crate::core::stats::{window_stats, z_normalize_into};
use crate::source::{ChunkSource, SliceSource};

/// Counters and volume of one scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanSummary {
    pub stats: PruningStats,
    /// Samples read from the source (per channel).
    pub samples_scanned: u64,
}

/// Where a window position left the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Flat,
    PrunedByKim,
    PrunedByKeoghQuery,
    PrunedByKeoghData,
    Rejected,
    Accepted,
}

/// Working buffers for one channel.
struct ChannelState<'q> {
    query: &'q PreparedQuery,
    window: SlidingWindow,
    /// Z-normalized window, only filled once the data-envelope stage is reached.
    normalized: Vec<f64>,
    cb_query: Vec<f64>,
    cb_data: Vec<f64>,
    dtw: DtwWorkspace,
    mean: f64,
    std: f64,
    lb_query: f64,
    lb_data: f64,
}

impl<'q> ChannelState<'q> {
    fn new(query: &'q PreparedQuery) -> Self {
        let m = query.len();
        Self {
            query,
            window: SlidingWindow::new(m),
            normalized: vec![0.0; m],
            cb_query: vec![0.0; m],
            cb_data: vec![0.0; m],
            dtw: DtwWorkspace::new(query.radius()),
            mean: 0.0,
            std: 1.0,
            lb_query: 0.0,
            lb_data: 0.0,
        }
    }
}

/// Run the lower-bound cascade and DTW for the window starting at `start`.
///
/// Every channel must pass a stage before any channel moves to the next one.
/// On `Accepted`, `distances` holds the exact squared DTW cost per channel.
fn evaluate<S: ChunkSource, B: BestTracker>(
    states: &mut [ChannelState<'_>],
    chunk: &ChunkWindow<S>,
    start: usize,
    best: &B,
    distances: &mut [f64],
) -> Verdict {
    for st in states.iter_mut() {
        match st.window.normalization() {
            Some((mean, std)) => {
                st.mean = mean;
                st.std = std;
            }
            None => return Verdict::Flat,
        }
    }

    for (c, st) in states.iter().enumerate() {
        let bsf = best.threshold(c);
        let lb = lb_kim_hierarchy(st.window.values(), &st.query.normalized, st.mean, st.std, bsf);
        if lb >= bsf {
            return Verdict::PrunedByKim;
        }
    }

    for (c, st) in states.iter_mut().enumerate() {
        let bsf = best.threshold(c);
        st.lb_query = lb_keogh_query(
            st.query,
            st.window.values(),
            st.mean,
            st.std,
            &mut st.cb_query,
            bsf,
        );
        if st.lb_query >= bsf {
            return Verdict::PrunedByKeoghQuery;
        }
    }

    for (c, st) in states.iter_mut().enumerate() {
        let bsf = best.threshold(c);
        z_normalize_into(st.window.values(), st.mean, st.std, &mut st.normalized);
        let (lower, upper) = chunk.envelope(c, start);
        st.lb_data = lb_keogh_data(st.query, lower, upper, st.mean, st.std, &mut st.cb_data, bsf);
        if st.lb_data >= bsf {
            return Verdict::PrunedByKeoghData;
        }
    }

    for (c, st) in states.iter_mut().enumerate() {
        let bsf = best.threshold(c);
        // The tighter bound gives the better lookahead
        let remaining = if st.lb_query > st.lb_data {
            &mut st.cb_query
        } else {
            &mut st.cb_data
        };
        into_remaining_bound(remaining);
        let d = banded_dtw(&st.normalized, &st.query.normalized, remaining, bsf, &mut st.dtw);
        if d >= bsf {
            return Verdict::Rejected;
        }
        distances[c] = d;
    }
    Verdict::Accepted
}

/// Stream `source` through the cascade, offering every verified match to `best`.
///
/// `queries` holds one prepared query per channel, all of the same length and
/// radius. Match locations are reported as `base_offset` plus the offset of
/// the window start within `source`.
pub fn scan<S: ChunkSource, B: BestTracker>(
    queries: &[PreparedQuery],
    chunk_capacity: usize,
    base_offset: u64,
    source: S,
    best: &mut B,
) -> Result<ScanSummary, SearchError> {
    let first = queries.first().ok_or(SearchError::NoChannels)?;
    let m = first.len();
    let mut chunks = ChunkWindow::new(
        source,
        queries.len(),
        m,
        first.radius(),
        chunk_capacity,
        base_offset,
    )?;
    let mut states: Vec<ChannelState> = queries.iter().map(ChannelState::new).collect();
    let mut distances = vec![0.0; queries.len()];
    let mut stats = PruningStats::default();

    while chunks.advance()? {
        for st in &mut states {
            st.window.reset();
        }
        for i in 0..chunks.chunk_len() {
            for (c, st) in states.iter_mut().enumerate() {
                st.window.admit(chunks.samples(c)[i]);
            }
            if i + 1 < m {
                continue;
            }
            let start = i + 1 - m;
            stats.positions += 1;

            match evaluate(&mut states, &chunks, start, best, &mut distances) {
                Verdict::Flat => stats.flat_windows += 1,
                Verdict::PrunedByKim => stats.pruned_by_kim += 1,
                Verdict::PrunedByKeoghQuery => stats.pruned_by_keogh_query += 1,
                Verdict::PrunedByKeoghData => stats.pruned_by_keogh_data += 1,
                Verdict::Rejected => {
                    stats.dtw_computed += 1;
                    stats.dtw_rejected += 1;
                }
                Verdict::Accepted => {
                    stats.dtw_computed += 1;
                    let location = chunks.chunk_start() + start as u64;
                    if best.offer(location, &distances) {
                        stats.improvements += 1;
                        debug!(location, distances = ?distances, "new best match");
                    } else {
                        // Another scan published something better in the meantime
                        stats.dtw_rejected += 1;
                    }
                }
            }
        }
    }

    Ok(ScanSummary {
        stats,
        samples_scanned: chunks.samples_read(),
    })
}

/// Find the window of `source` nearest to `queries` under banded DTW.
pub fn search<S: ChunkSource>(
    queries: &[PreparedQuery],
    chunk_capacity: usize,
    source: S,
) -> Result<SearchReport, SearchError> {
    let mut best = BestSoFar::new(queries.len());
    let summary = scan(queries, chunk_capacity, 0, source, &mut best)?;
    let report = build_report(queries, summary, best);
    log_report(&report);
    Ok(report)
}

/// Reference search: exact DTW at every window position, no lower bounds.
///
/// Applies the same flat-window and tie-breaking rules as [`search`], so both
/// report the same location on well-separated inputs.
pub fn naive_search(queries: &[PreparedQuery], data: &[&[f64]]) -> Result<SearchReport, SearchError> {
    let first = queries.first().ok_or(SearchError::NoChannels)?;
    if data.len() != queries.len() {
        return Err(SearchError::ChannelMismatch {
            expected: queries.len(),
            actual: data.len(),
        });
    }
    // Validates equal channel lengths
    SliceSource::new(data.to_vec())?;

    let m = first.len();
    let n = data[0].len();
    let mut best = BestSoFar::new(queries.len());
    let mut stats = PruningStats::default();
    let mut normalized = vec![0.0; m];
    let mut distances = vec![0.0; queries.len()];

    if let Some((c, k)) = data
        .iter()
        .enumerate()
        .find_map(|(c, ch)| ch.iter().position(|x| !x.is_finite()).map(|k| (c, k)))
    {
        return Err(SearchError::NonFiniteSample {
            channel: c,
            offset: k as u64,
        });
    }

    for start in 0..(n + 1).saturating_sub(m) {
        stats.positions += 1;
        let mut flat = false;
        for (c, (query, channel)) in queries.iter().zip(data).enumerate() {
            let window = &channel[start..start + m];
            let Some((mean, std)) = window_stats(window) else {
                flat = true;
                break;
            };
            z_normalize_into(window, mean, std, &mut normalized);
            distances[c] = dtw_distance(&normalized, &query.normalized, query.radius());
        }
        if flat {
            stats.flat_windows += 1;
            continue;
        }
        stats.dtw_computed += 1;
        if best.offer(start as u64, &distances) {
            stats.improvements += 1;
        } else {
            stats.dtw_rejected += 1;
        }
    }

    let summary = ScanSummary {
        stats,
        samples_scanned: n as u64,
    };
    Ok(build_report(queries, summary, best))
}

pub(crate) fn build_report(queries: &[PreparedQuery], summary: ScanSummary, best: BestSoFar) -> SearchReport {
    let (query_len, radius) = queries
        .first()
        .map(|q| (q.len(), q.radius()))
        .unwrap_or_default();
    SearchReport {
        best: best.into_match(),
        samples_scanned: summary.samples_scanned,
        query_len,
        radius,
        stats: summary.stats,
    }
}

pub(crate) fn log_report(report: &SearchReport) {
    let s = &report.stats;
    info!(
        samples = report.samples_scanned,
        location = ?report.location(),
        positions = s.positions,
        flat = s.flat_fraction(),
        kim = s.kim_fraction(),
        keogh_query = s.keogh_query_fraction(),
        keogh_data = s.keogh_data_fraction(),
        dtw = s.dtw_fraction(),
        "search finished"
    );
}
