use serde::{Deserialize, Serialize};

/// Source of per-channel pruning thresholds and sink for verified matches.
///
/// Implemented by the sequential [`BestSoFar`] and by the shared tracker used
/// for concurrent scans. Distances are squared DTW costs.
pub trait BestTracker {
    /// Current best-so-far for `channel`; candidates at or above it are pruned.
    fn threshold(&self, channel: usize) -> f64;

    /// Offer a fully verified match. It is accepted only if every channel's
    /// distance is strictly below that channel's current best, in which case
    /// all channels and the location are replaced together.
    fn offer(&mut self, location: u64, distances: &[f64]) -> bool;
}

/// Best verified match of a sequential scan.
#[derive(Debug, Clone)]
pub struct BestSoFar {
    /// Squared DTW distance per channel.
    distances: Vec<f64>,
    /// Absolute stream offset of the match start.
    location: Option<u64>,
}

impl BestSoFar {
    /// No match yet: every threshold is infinite.
    pub fn new(channels: usize) -> Self {
        Self {
            distances: vec![f64::INFINITY; channels],
            location: None,
        }
    }

    /// Start from known thresholds, e.g. to force early abandonment.
    pub fn with_thresholds(distances: Vec<f64>) -> Self {
        Self {
            distances,
            location: None,
        }
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn location(&self) -> Option<u64> {
        self.location
    }

    /// Convert into the reported match, taking square roots of the costs.
    pub fn into_match(self) -> Option<BestMatch> {
        let location = self.location?;
        Some(BestMatch {
            location,
            distances: self.distances.iter().map(|d| d.sqrt()).collect(),
        })
    }
}

impl BestTracker for BestSoFar {
    #[inline]
    fn threshold(&self, channel: usize) -> f64 {
        self.distances[channel]
    }

    fn offer(&mut self, location: u64, distances: &[f64]) -> bool {
        debug_assert_eq!(distances.len(), self.distances.len());
        let improves = distances
            .iter()
            .zip(&self.distances)
            .all(|(candidate, current)| candidate < current);
        if improves {
            self.distances.copy_from_slice(distances);
            self.location = Some(location);
        }
        improves
    }
}

/// The reported nearest neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    /// Absolute offset of the match start in the stream.
    pub location: u64,
    /// DTW distance per channel (square root of the accumulated squared cost).
    pub distances: Vec<f64>,
}

/// Where candidate positions were eliminated.
///
/// Purely observational; counts positions, not channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruningStats {
    /// Window positions examined.
    pub positions: u64,
    /// Positions skipped because some channel's window had zero variance.
    pub flat_windows: u64,
    /// Pruned by the endpoint bound.
    pub pruned_by_kim: u64,
    /// Pruned by the query-envelope bound.
    pub pruned_by_keogh_query: u64,
    /// Pruned by the data-envelope bound.
    pub pruned_by_keogh_data: u64,
    /// Positions that reached full DTW.
    pub dtw_computed: u64,
    /// DTW evaluations that did not beat best-so-far (abandoned or complete).
    pub dtw_rejected: u64,
    /// Times best-so-far was replaced.
    pub improvements: u64,
}

impl PruningStats {
    fn fraction(&self, count: u64) -> f64 {
        if self.positions == 0 {
            0.0
        } else {
            count as f64 / self.positions as f64
        }
    }

    pub fn kim_fraction(&self) -> f64 {
        self.fraction(self.pruned_by_kim)
    }

    pub fn keogh_query_fraction(&self) -> f64 {
        self.fraction(self.pruned_by_keogh_query)
    }

    pub fn keogh_data_fraction(&self) -> f64 {
        self.fraction(self.pruned_by_keogh_data)
    }

    pub fn flat_fraction(&self) -> f64 {
        self.fraction(self.flat_windows)
    }

    pub fn dtw_fraction(&self) -> f64 {
        self.fraction(self.dtw_computed)
    }

    /// Accumulate counts from another (e.g. per-segment) scan.
    pub fn merge(&mut self, other: &PruningStats) {
        self.positions += other.positions;
        self.flat_windows += other.flat_windows;
        self.pruned_by_kim += other.pruned_by_kim;
        self.pruned_by_keogh_query += other.pruned_by_keogh_query;
        self.pruned_by_keogh_data += other.pruned_by_keogh_data;
        self.dtw_computed += other.dtw_computed;
        self.dtw_rejected += other.dtw_rejected;
        self.improvements += other.improvements;
    }
}

/// Outcome of one search over a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Best match, or `None` when no window could be compared.
    pub best: Option<BestMatch>,
    /// Total samples read from the stream (per channel).
    pub samples_scanned: u64,
    /// Query length used.
    pub query_len: usize,
    /// Effective band radius used.
    pub radius: usize,
    pub stats: PruningStats,
}

impl SearchReport {
    pub fn location(&self) -> Option<u64> {
        self.best.as_ref().map(|b| b.location)
    }

    /// Distance on `channel`, if a match was found.
    pub fn distance(&self, channel: usize) -> Option<f64> {
        self.best.as_ref().and_then(|b| b.distances.get(channel).copied())
    }
}
