//! Stream and query inputs.
//!
//! A [`ChunkSource`] hands out synchronized samples for every channel in
//! original order. The search engine only ever asks it for "up to N more".

use std::collections::VecDeque;
use std::io::BufRead;

use crate::core::error::SearchError;

/// Supplier of raw, synchronized multi-channel samples.
pub trait ChunkSource {
    /// Number of channels produced.
    fn channels(&self) -> usize;

    /// Append up to `max` samples to each `out[c]` and return how many were
    /// appended (the same count for every channel). `0` means end of stream.
    fn read_chunk(&mut self, out: &mut [Vec<f64>], max: usize) -> Result<usize, SearchError>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn channels(&self) -> usize {
        (**self).channels()
    }

    fn read_chunk(&mut self, out: &mut [Vec<f64>], max: usize) -> Result<usize, SearchError> {
        (**self).read_chunk(out, max)
    }
}

/// In-memory channels of equal length.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    channels: Vec<&'a [f64]>,
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(channels: Vec<&'a [f64]>) -> Result<Self, SearchError> {
        let first = channels.first().ok_or(SearchError::NoChannels)?;
        let len = first.len();
        if let Some((channel, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(SearchError::ChannelLengthMismatch {
                channel,
                expected: len,
                actual: ch.len(),
            });
        }
        Ok(Self { channels, pos: 0 })
    }

    /// A single-channel source.
    pub fn single(data: &'a [f64]) -> Self {
        Self {
            channels: vec![data],
            pos: 0,
        }
    }

    fn len(&self) -> usize {
        self.channels[0].len()
    }
}

impl ChunkSource for SliceSource<'_> {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn read_chunk(&mut self, out: &mut [Vec<f64>], max: usize) -> Result<usize, SearchError> {
        debug_assert_eq!(out.len(), self.channels.len());
        let n = max.min(self.len() - self.pos);
        for (dst, src) in out.iter_mut().zip(&self.channels) {
            dst.extend_from_slice(&src[self.pos..self.pos + n]);
        }
        self.pos += n;
        Ok(n)
    }
}

/// Whitespace-separated numbers from a reader, `channels` values per record.
///
/// Line breaks carry no meaning: tokens are consumed in order and grouped
/// into records, so `"1 2\n3 4"` and `"1\n2\n3\n4"` are the same two-channel stream.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    channels: usize,
    line: String,
    line_no: usize,
    pending: VecDeque<f64>,
    record: Vec<f64>,
    eof: bool,
}

impl<R: BufRead> ReaderSource<R> {
    /// Fails with [`SearchError::NoChannels`] when `channels` is zero.
    pub fn new(reader: R, channels: usize) -> Result<Self, SearchError> {
        if channels == 0 {
            return Err(SearchError::NoChannels);
        }
        Ok(Self {
            reader,
            channels,
            line: String::new(),
            line_no: 0,
            pending: VecDeque::new(),
            record: Vec::with_capacity(channels),
            eof: false,
        })
    }

    /// Next numeric token, reading more lines as needed.
    fn next_value(&mut self) -> Result<Option<f64>, SearchError> {
        loop {
            if let Some(v) = self.pending.pop_front() {
                return Ok(Some(v));
            }
            if self.eof {
                return Ok(None);
            }
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                self.eof = true;
                return Ok(None);
            }
            self.line_no += 1;
            for token in self.line.split_whitespace() {
                let value = token.parse::<f64>().map_err(|_| SearchError::Parse {
                    line: self.line_no,
                    token: token.to_string(),
                })?;
                self.pending.push_back(value);
            }
        }
    }
}

impl<R: BufRead> ChunkSource for ReaderSource<R> {
    fn channels(&self) -> usize {
        self.channels
    }

    fn read_chunk(&mut self, out: &mut [Vec<f64>], max: usize) -> Result<usize, SearchError> {
        debug_assert_eq!(out.len(), self.channels);
        let mut produced = 0;
        while produced < max {
            match self.next_value()? {
                Some(v) => {
                    self.record.push(v);
                    if self.record.len() == self.channels {
                        for (dst, &v) in out.iter_mut().zip(&self.record) {
                            dst.push(v);
                        }
                        self.record.clear();
                        produced += 1;
                    }
                }
                None if !self.record.is_empty() => {
                    return Err(SearchError::TruncatedRecord {
                        channels: self.channels,
                        leftover: self.record.len(),
                    });
                }
                None => break,
            }
        }
        Ok(produced)
    }
}

/// Read exactly `m` query records (per channel) from `reader`.
///
/// Records past the first `m` are ignored.
pub fn read_query<R: BufRead>(reader: R, m: usize, channels: usize) -> Result<Vec<Vec<f64>>, SearchError> {
    let mut source = ReaderSource::new(reader, channels)?;
    let mut out = vec![Vec::with_capacity(m); channels];
    let mut got = 0;
    while got < m {
        let n = source.read_chunk(&mut out, m - got)?;
        if n == 0 {
            break;
        }
        got += n;
    }
    if got < m {
        return Err(SearchError::QueryLengthMismatch {
            channel: 0,
            expected: m,
            actual: got,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_slice_source_chunks() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [5.0, 4.0, 3.0, 2.0, 1.0];
        let mut src = SliceSource::new(vec![&a, &b]).unwrap();
        assert_eq!(src.channels(), 2);

        let mut out = vec![Vec::new(), Vec::new()];
        assert_eq!(src.read_chunk(&mut out, 3).unwrap(), 3);
        assert_eq!(src.read_chunk(&mut out, 3).unwrap(), 2);
        assert_eq!(src.read_chunk(&mut out, 3).unwrap(), 0);
        assert_eq!(out[0], a);
        assert_eq!(out[1], b);
    }

    #[test]
    fn test_sources_reject_bad_channel_counts() {
        let a = [1.0, 2.0];
        let b = [1.0];
        assert!(matches!(
            SliceSource::new(vec![&a, &b]),
            Err(SearchError::ChannelLengthMismatch {
                channel: 1,
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            SliceSource::new(vec![]),
            Err(SearchError::NoChannels)
        ));
        assert!(matches!(
            ReaderSource::new(Cursor::new("1 2 3"), 0),
            Err(SearchError::NoChannels)
        ));
        assert!(matches!(
            read_query(Cursor::new("1 2 3"), 3, 0),
            Err(SearchError::NoChannels)
        ));
    }

    #[test]
    fn test_reader_source_ignores_line_layout() {
        let text = "1 10\n2\t20\n3\n30\n\n4 40 5 50\n";
        let mut src = ReaderSource::new(Cursor::new(text), 2).unwrap();
        let mut out = vec![Vec::new(), Vec::new()];
        assert_eq!(src.read_chunk(&mut out, 2).unwrap(), 2);
        assert_eq!(src.read_chunk(&mut out, 10).unwrap(), 3);
        assert_eq!(src.read_chunk(&mut out, 10).unwrap(), 0);
        assert_eq!(out[0], vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out[1], vec![10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_reader_source_errors() {
        let mut src = ReaderSource::new(Cursor::new("1.5 2.5\n3.5 oops\n"), 1).unwrap();
        let mut out = vec![Vec::new()];
        let err = src.read_chunk(&mut out, 10).unwrap_err();
        match err {
            SearchError::Parse { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut src = ReaderSource::new(Cursor::new("1 2 3"), 2).unwrap();
        let mut out = vec![Vec::new(), Vec::new()];
        assert!(matches!(
            src.read_chunk(&mut out, 10),
            Err(SearchError::TruncatedRecord {
                channels: 2,
                leftover: 1
            })
        ));
    }

    #[test]
    fn test_read_query() {
        let q = read_query(Cursor::new("0 1 0 9 9"), 3, 1).unwrap();
        assert_eq!(q, vec![vec![0.0, 1.0, 0.0]]);

        let q = read_query(Cursor::new("1 2\n3 4\n"), 2, 2).unwrap();
        assert_eq!(q, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);

        assert!(matches!(
            read_query(Cursor::new("1 2"), 3, 1),
            Err(SearchError::QueryLengthMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }
}
