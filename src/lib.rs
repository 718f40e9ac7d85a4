pub mod algorithms;
pub mod core;
pub mod source;

pub use crate::algorithms::dtw::{banded_dtw, dtw_distance, DtwWorkspace};
pub use crate::algorithms::envelope::{Envelope, EnvelopeBuilder};
pub use crate::algorithms::query::PreparedQuery;
pub use crate::algorithms::search::ScanSummary;
pub use crate::core::config::{SearchConfig, WarpingWindow, DEFAULT_CHUNK_CAPACITY};
pub use crate::core::error::SearchError;
pub use crate::core::report::{BestMatch, BestSoFar, BestTracker, PruningStats, SearchReport};
pub use crate::source::{read_query, ChunkSource, ReaderSource, SliceSource};

/// High-level facade: one validated configuration plus its prepared queries.
///
/// # Examples
///
/// ```
/// use dtw_search::{SearchConfig, SearchEngine, WarpingWindow};
///
/// let query = [0.0, 1.0, 0.0];
/// let data = [5.0, 5.0, 0.0, 1.0, 0.0, 5.0, 5.0];
/// let config = SearchConfig::new(3, WarpingWindow::Samples(0));
/// let engine = SearchEngine::new(config, &[&query]).unwrap();
/// let report = engine.search_slice(&data).unwrap();
/// assert_eq!(report.location(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SearchConfig,
    queries: Vec<PreparedQuery>,
}

impl SearchEngine {
    /// Validate `config` and prepare one query per channel.
    pub fn new(config: SearchConfig, queries: &[&[f64]]) -> Result<Self, SearchError> {
        config.validate()?;
        if queries.len() != config.channels {
            return Err(SearchError::ChannelMismatch {
                expected: config.channels,
                actual: queries.len(),
            });
        }
        let radius = config.radius();
        let queries = queries
            .iter()
            .enumerate()
            .map(|(channel, raw)| {
                if raw.len() != config.query_len {
                    return Err(SearchError::QueryLengthMismatch {
                        channel,
                        expected: config.query_len,
                        actual: raw.len(),
                    });
                }
                if let Some(k) = raw.iter().position(|x| !x.is_finite()) {
                    return Err(SearchError::NonFiniteSample {
                        channel,
                        offset: k as u64,
                    });
                }
                PreparedQuery::new(raw, radius).ok_or(SearchError::ConstantQuery { channel })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            query_len = config.query_len,
            radius,
            channels = config.channels,
            "prepared queries"
        );
        Ok(Self { config, queries })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Effective band radius.
    pub fn radius(&self) -> usize {
        self.config.radius()
    }

    pub fn queries(&self) -> &[PreparedQuery] {
        &self.queries
    }

    /// Scan any chunk source and report its nearest window.
    pub fn search<S: ChunkSource>(&self, source: S) -> Result<SearchReport, SearchError> {
        algorithms::search::search(&self.queries, self.config.chunk_capacity, source)
    }

    /// Search a single in-memory channel.
    pub fn search_slice(&self, data: &[f64]) -> Result<SearchReport, SearchError> {
        self.search(SliceSource::single(data))
    }

    /// Search synchronized in-memory channels.
    pub fn search_channels(&self, data: &[&[f64]]) -> Result<SearchReport, SearchError> {
        self.search(SliceSource::new(data.to_vec())?)
    }

    /// Scan `source` against an externally owned best-so-far.
    ///
    /// Lets callers resume from known thresholds or accumulate over several
    /// sources; `base_offset` is added to every reported location.
    pub fn scan_with<S: ChunkSource, B: BestTracker>(
        &self,
        source: S,
        base_offset: u64,
        best: &mut B,
    ) -> Result<ScanSummary, SearchError> {
        algorithms::search::scan(
            &self.queries,
            self.config.chunk_capacity,
            base_offset,
            source,
            best,
        )
    }

    /// Exhaustive reference search without lower bounds.
    pub fn naive_search(&self, data: &[&[f64]]) -> Result<SearchReport, SearchError> {
        algorithms::search::naive_search(&self.queries, data)
    }

    /// Search in-memory channels with segments scanned in parallel.
    #[cfg(feature = "parallel")]
    pub fn par_search(&self, data: &[&[f64]]) -> Result<SearchReport, SearchError> {
        algorithms::parallel::par_search(&self.queries, self.config.chunk_capacity, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_validates_queries() {
        let config = SearchConfig::new(3, WarpingWindow::Fraction(0.5));
        assert!(matches!(
            SearchEngine::new(config.clone(), &[&[1.0, 2.0]]),
            Err(SearchError::QueryLengthMismatch {
                channel: 0,
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            SearchEngine::new(config.clone(), &[&[2.0, 2.0, 2.0]]),
            Err(SearchError::ConstantQuery { channel: 0 })
        ));
        assert!(matches!(
            SearchEngine::new(config.clone(), &[&[0.0, 1.0, 0.0], &[1.0, 0.0, 1.0]]),
            Err(SearchError::ChannelMismatch {
                expected: 1,
                actual: 2
            })
        ));
        assert!(matches!(
            SearchEngine::new(config, &[&[0.0, f64::INFINITY, 0.0]]),
            Err(SearchError::NonFiniteSample { channel: 0, offset: 1 })
        ));
    }

    #[test]
    fn test_engine_rejects_bad_config() {
        let config = SearchConfig::new(1, WarpingWindow::Samples(0));
        assert!(matches!(
            SearchEngine::new(config, &[&[1.0]]),
            Err(SearchError::InvalidQueryLength(1))
        ));
        let config = SearchConfig::new(4, WarpingWindow::Samples(1)).with_chunk_capacity(3);
        assert!(matches!(
            SearchEngine::new(config, &[&[0.0, 1.0, 2.0, 3.0]]),
            Err(SearchError::ChunkTooSmall { .. })
        ));
    }

    #[test]
    fn test_engine_radius_from_fraction() {
        let query: Vec<f64> = (0..128).map(|i| (i as f64 * 0.1).sin()).collect();
        let config = SearchConfig::new(128, WarpingWindow::Fraction(0.05));
        let engine = SearchEngine::new(config, &[&query]).unwrap();
        assert_eq!(engine.radius(), 6);
        assert_eq!(engine.queries()[0].radius(), 6);
    }

    #[test]
    fn test_two_channel_search() {
        let qa = [0.0, 1.0, 2.0, 1.0];
        let qb = [3.0, 1.0, 0.0, 1.0];
        let noise_a = [0.5, -0.5, 0.25, 0.75, -1.0, 0.3, 0.1, -0.2, 0.9, 0.4];
        let noise_b = [0.1, 0.7, -0.3, 0.2, 0.6, -0.8, 0.0, 0.5, -0.4, 0.3];
        let a = [&noise_a[..5], &qa[..], &noise_a[5..]].concat();
        let b = [&noise_b[..5], &qb[..], &noise_b[5..]].concat();

        let config = SearchConfig::new(4, WarpingWindow::Samples(1)).with_channels(2);
        let engine = SearchEngine::new(config, &[&qa, &qb]).unwrap();
        let report = engine.search_channels(&[&a, &b]).unwrap();
        assert_eq!(report.location(), Some(5));
        assert!(report.distance(0).unwrap() < 1e-9);
        assert!(report.distance(1).unwrap() < 1e-9);
    }
}
