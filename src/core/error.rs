use thiserror::Error;

/// Errors reported by configuration, query preparation and stream ingestion.
///
/// The numeric kernels (envelopes, lower bounds, DTW) never fail; everything
/// that can go wrong happens before or around them.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query length {0}: at least 2 samples are required")]
    InvalidQueryLength(usize),
    #[error("invalid warping window {0}: must be a finite, non-negative number")]
    InvalidWarpingWindow(f64),
    #[error("chunk capacity {capacity} is smaller than the query length {query_len}")]
    ChunkTooSmall { capacity: usize, query_len: usize },
    #[error("at least one channel is required")]
    NoChannels,
    #[error("expected {expected} channel(s), got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("channel {channel} has {actual} samples, expected {expected} like channel 0")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },
    #[error("query for channel {channel} has {actual} samples, expected {expected}")]
    QueryLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },
    #[error("query for channel {channel} is constant and cannot be z-normalized")]
    ConstantQuery { channel: usize },
    #[error("non-finite sample on channel {channel} at stream offset {offset}")]
    NonFiniteSample { channel: usize, offset: u64 },
    #[error("stream ended inside a record: {leftover} of {channels} value(s) read")]
    TruncatedRecord { channels: usize, leftover: usize },
    #[error("cannot parse {token:?} as a number (line {line})")]
    Parse { line: usize, token: String },
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let err = SearchError::ChunkTooSmall {
            capacity: 8,
            query_len: 16,
        };
        assert_eq!(
            err.to_string(),
            "chunk capacity 8 is smaller than the query length 16"
        );

        let err = SearchError::NonFiniteSample {
            channel: 1,
            offset: 42,
        };
        assert!(err.to_string().contains("offset 42"));
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: SearchError = io.into();
        assert!(matches!(err, SearchError::Io(_)));
    }
}
