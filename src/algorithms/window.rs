use tracing::debug;

use crate::algorithms::envelope::EnvelopeBuilder;
use crate::core::error::SearchError;
use crate::core::stats::{window_stats, RunningStats};
use crate::source::ChunkSource;

/// The last `m` raw samples of one channel plus their running statistics.
///
/// Samples are written twice (`data[s]` and `data[s + m]`), so the current
/// window is always the contiguous slice starting at the oldest slot and the
/// comparison code never needs modular indexing.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    m: usize,
    data: Vec<f64>,
    stats: RunningStats,
    /// Slot the next sample goes to; once full, also the oldest sample.
    next: usize,
    admitted: usize,
    /// Length of the trailing run of identical samples.
    run: usize,
    since_rebuild: usize,
}

impl SlidingWindow {
    pub fn new(m: usize) -> Self {
        Self {
            m,
            data: vec![0.0; 2 * m],
            stats: RunningStats::new(m),
            next: 0,
            admitted: 0,
            run: 0,
            since_rebuild: 0,
        }
    }

    pub fn reset(&mut self) {
        self.next = 0;
        self.admitted = 0;
        self.run = 0;
        self.since_rebuild = 0;
    }

    /// Slide by one sample, evicting the oldest once the window is full.
    ///
    /// Sums are re-anchored on the current window every `m` samples, which
    /// bounds rounding drift at O(1) amortized cost.
    #[inline]
    pub fn admit(&mut self, x: f64) {
        let slot = self.next;
        if self.admitted == 0 {
            self.stats.reset(x);
        }
        let last = if slot == 0 { self.m - 1 } else { slot - 1 };
        if self.admitted > 0 && self.data[last] == x {
            self.run += 1;
        } else {
            self.run = 1;
        }

        if self.admitted >= self.m {
            self.stats.evict(self.data[slot]);
        } else {
            self.admitted += 1;
        }
        self.data[slot] = x;
        self.data[slot + self.m] = x;
        self.stats.push(x);
        self.next = if slot + 1 == self.m { 0 } else { slot + 1 };

        self.since_rebuild += 1;
        if self.since_rebuild >= self.m && self.is_full() {
            self.since_rebuild = 0;
            self.stats.rebuild(&self.data[self.next..self.next + self.m]);
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.admitted >= self.m
    }

    /// Current window, oldest sample first. Only meaningful once full.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.data[self.next..self.next + self.m]
    }

    /// Whether every sample in the window is identical.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.run >= self.m
    }

    /// `(mean, std)` of the window, `None` if it is flat.
    ///
    /// Recomputes two-pass statistics over the window when the running sums
    /// are too ill-conditioned to trust, so the flat decision always agrees
    /// with [`window_stats`].
    #[inline]
    pub fn normalization(&self) -> Option<(f64, f64)> {
        if self.is_constant() {
            return None;
        }
        self.stats
            .normalization()
            .or_else(|| window_stats(self.values()))
    }
}

/// Chunked view of a stream with a per-chunk data envelope.
///
/// Each chunk starts with the last `m - 1` samples of the previous one, so
/// every window position of the stream falls entirely inside exactly one chunk.
#[derive(Debug)]
pub struct ChunkWindow<S> {
    source: S,
    m: usize,
    capacity: usize,
    samples: Vec<Vec<f64>>,
    lower: Vec<Vec<f64>>,
    upper: Vec<Vec<f64>>,
    envelope: EnvelopeBuilder,
    /// Absolute stream offset of `samples[_][0]`.
    chunk_start: u64,
    samples_read: u64,
}

impl<S: ChunkSource> ChunkWindow<S> {
    /// `base_offset` is the absolute position of the source's first sample.
    pub fn new(
        source: S,
        channels: usize,
        m: usize,
        radius: usize,
        capacity: usize,
        base_offset: u64,
    ) -> Result<Self, SearchError> {
        if source.channels() != channels {
            return Err(SearchError::ChannelMismatch {
                expected: channels,
                actual: source.channels(),
            });
        }
        if capacity < m {
            return Err(SearchError::ChunkTooSmall {
                capacity,
                query_len: m,
            });
        }
        Ok(Self {
            source,
            m,
            capacity,
            samples: vec![Vec::with_capacity(capacity); channels],
            lower: vec![vec![0.0; capacity]; channels],
            upper: vec![vec![0.0; capacity]; channels],
            envelope: EnvelopeBuilder::new(radius),
            chunk_start: base_offset,
            samples_read: 0,
        })
    }

    /// Load the next chunk. Returns `false` once the stream is exhausted.
    pub fn advance(&mut self) -> Result<bool, SearchError> {
        let len = self.chunk_len();
        let carry = len.min(self.m - 1);
        for samples in &mut self.samples {
            samples.drain(..len - carry);
        }
        self.chunk_start += (len - carry) as u64;

        let read = self
            .source
            .read_chunk(&mut self.samples, self.capacity - carry)?;
        if read == 0 {
            return Ok(false);
        }

        for (channel, samples) in self.samples.iter().enumerate() {
            if let Some(k) = samples[carry..].iter().position(|x| !x.is_finite()) {
                return Err(SearchError::NonFiniteSample {
                    channel,
                    offset: self.chunk_start + (carry + k) as u64,
                });
            }
        }
        self.samples_read += read as u64;

        let len = self.chunk_len();
        for ((samples, lower), upper) in self
            .samples
            .iter()
            .zip(self.lower.iter_mut())
            .zip(self.upper.iter_mut())
        {
            self.envelope
                .compute_into(samples, &mut lower[..len], &mut upper[..len]);
        }

        debug!(
            chunk_start = self.chunk_start,
            len,
            carried = carry,
            "loaded chunk"
        );
        Ok(true)
    }

    /// Samples in the current chunk (per channel).
    pub fn chunk_len(&self) -> usize {
        self.samples[0].len()
    }

    pub fn samples(&self, channel: usize) -> &[f64] {
        &self.samples[channel]
    }

    /// Raw data envelope `(lower, upper)` for the `m` positions starting at `start`.
    pub fn envelope(&self, channel: usize, start: usize) -> (&[f64], &[f64]) {
        let end = start + self.m;
        (
            &self.lower[channel][start..end],
            &self.upper[channel][start..end],
        )
    }

    /// Absolute stream offset of the first sample of the current chunk.
    pub fn chunk_start(&self) -> u64 {
        self.chunk_start
    }

    /// Samples pulled from the source so far.
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }
}
