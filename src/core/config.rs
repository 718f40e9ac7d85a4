use serde::{Deserialize, Serialize};

use crate::core::error::SearchError;

/// Default number of samples pulled from the stream per chunk.
pub const DEFAULT_CHUNK_CAPACITY: usize = 100_000;

/// Width of the Sakoe-Chiba band, either relative to the query length or in samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpingWindow {
    /// Fraction of the query length, in `[0, 1]`.
    Fraction(f64),
    /// Absolute radius in samples.
    Samples(usize),
}

impl WarpingWindow {
    /// Interpret a raw `R` parameter: `R <= 1` is a fraction of the query
    /// length, anything larger is an absolute radius (floored).
    pub fn from_raw(r: f64) -> Result<Self, SearchError> {
        if !r.is_finite() || r < 0.0 {
            return Err(SearchError::InvalidWarpingWindow(r));
        }
        if r <= 1.0 {
            Ok(Self::Fraction(r))
        } else {
            Ok(Self::Samples(r.floor() as usize))
        }
    }

    /// Band radius for a query of length `m`, clamped to `m - 1`.
    pub fn radius(&self, m: usize) -> usize {
        let r = match *self {
            Self::Fraction(f) => (f * m as f64).floor() as usize,
            Self::Samples(n) => n,
        };
        r.min(m.saturating_sub(1))
    }

    fn validate(&self) -> Result<(), SearchError> {
        match *self {
            Self::Fraction(f) if !f.is_finite() || !(0.0..=1.0).contains(&f) => {
                Err(SearchError::InvalidWarpingWindow(f))
            }
            _ => Ok(()),
        }
    }
}

/// Configuration for a subsequence search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Query (and window) length `m`.
    pub query_len: usize,
    /// Warping band width.
    pub window: WarpingWindow,
    /// Number of synchronized channels; a new best must win on all of them.
    #[serde(default = "default_channels")]
    pub channels: usize,
    /// Maximum samples held per chunk, including the `m - 1` carried over.
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,
}

fn default_channels() -> usize {
    1
}

fn default_chunk_capacity() -> usize {
    DEFAULT_CHUNK_CAPACITY
}

impl SearchConfig {
    pub fn new(query_len: usize, window: WarpingWindow) -> Self {
        Self {
            query_len,
            window,
            channels: default_channels(),
            chunk_capacity: default_chunk_capacity(),
        }
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_chunk_capacity(mut self, chunk_capacity: usize) -> Self {
        self.chunk_capacity = chunk_capacity;
        self
    }

    /// Effective band radius.
    pub fn radius(&self) -> usize {
        self.window.radius(self.query_len)
    }

    /// Check every parameter before anything is allocated.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query_len < 2 {
            return Err(SearchError::InvalidQueryLength(self.query_len));
        }
        self.window.validate()?;
        if self.channels == 0 {
            return Err(SearchError::NoChannels);
        }
        if self.chunk_capacity < self.query_len {
            return Err(SearchError::ChunkTooSmall {
                capacity: self.chunk_capacity,
                query_len: self.query_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_fraction_and_samples() {
        assert_eq!(
            WarpingWindow::from_raw(0.05).unwrap(),
            WarpingWindow::Fraction(0.05)
        );
        assert_eq!(
            WarpingWindow::from_raw(1.0).unwrap(),
            WarpingWindow::Fraction(1.0)
        );
        assert_eq!(
            WarpingWindow::from_raw(7.9).unwrap(),
            WarpingWindow::Samples(7)
        );
        assert!(WarpingWindow::from_raw(-0.1).is_err());
        assert!(WarpingWindow::from_raw(f64::NAN).is_err());
    }

    #[test]
    fn test_radius() {
        // floor(0.05 * 128) = 6
        assert_eq!(WarpingWindow::Fraction(0.05).radius(128), 6);
        assert_eq!(WarpingWindow::Fraction(0.0).radius(128), 0);
        assert_eq!(WarpingWindow::Samples(3).radius(128), 3);
        // Clamped to m - 1
        assert_eq!(WarpingWindow::Samples(50).radius(10), 9);
        assert_eq!(WarpingWindow::Fraction(1.0).radius(10), 9);
    }

    #[test]
    fn test_validate() {
        let config = SearchConfig::new(128, WarpingWindow::Fraction(0.1));
        assert!(config.validate().is_ok());
        assert_eq!(config.channels, 1);
        assert_eq!(config.chunk_capacity, DEFAULT_CHUNK_CAPACITY);

        let config = SearchConfig::new(1, WarpingWindow::Samples(0));
        assert!(matches!(
            config.validate(),
            Err(SearchError::InvalidQueryLength(1))
        ));

        let config = SearchConfig::new(16, WarpingWindow::Samples(2)).with_channels(0);
        assert!(matches!(config.validate(), Err(SearchError::NoChannels)));

        let config = SearchConfig::new(16, WarpingWindow::Samples(2)).with_chunk_capacity(15);
        assert!(matches!(
            config.validate(),
            Err(SearchError::ChunkTooSmall { .. })
        ));

        let config = SearchConfig::new(16, WarpingWindow::Fraction(1.5));
        assert!(matches!(
            config.validate(),
            Err(SearchError::InvalidWarpingWindow(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let json = r#"{"query_len": 64, "window": {"fraction": 0.1}}"#;
        let config: SearchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.query_len, 64);
        assert_eq!(config.window, WarpingWindow::Fraction(0.1));
        assert_eq!(config.channels, 1);
        assert_eq!(config.chunk_capacity, DEFAULT_CHUNK_CAPACITY);
        assert_eq!(config.radius(), 6);
    }
}
