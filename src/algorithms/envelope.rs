use crate::core::ring_buffer::RingDeque;

/// Sliding minimum/maximum envelope of a sequence for a warping radius `r`.
///
/// `lower[i]` and `upper[i]` are the minimum and maximum of `values[i-r..=i+r]`
/// clipped to the sequence bounds. Every alignment reachable within the band
/// lies between them, which is what makes the LB_Keogh bounds valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Envelope {
    /// Compute the envelope of `values` in O(n).
    pub fn compute(values: &[f64], radius: usize) -> Self {
        let mut env = Self {
            lower: vec![0.0; values.len()],
            upper: vec![0.0; values.len()],
        };
        let mut builder = EnvelopeBuilder::new(radius);
        builder.compute_into(values, &mut env.lower, &mut env.upper);
        env
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}

/// Reusable envelope computation (Lemire's streaming min/max).
///
/// Holds the two monotonic index queues so chunk-sized envelopes can be
/// recomputed without reallocating them.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    radius: usize,
    max_q: RingDeque<usize>,
    min_q: RingDeque<usize>,
}

impl EnvelopeBuilder {
    pub fn new(radius: usize) -> Self {
        // Indices in a queue span at most 2r+1 positions, plus the one being pushed.
        let capacity = 2 * radius + 2;
        Self {
            radius,
            max_q: RingDeque::with_capacity(capacity),
            min_q: RingDeque::with_capacity(capacity),
        }
    }

    /// Write the envelope of `values` into `lower` and `upper`.
    ///
    /// Each index is pushed and popped at most once per queue, so the whole
    /// pass is amortized O(1) per element regardless of the radius.
    pub fn compute_into(&mut self, values: &[f64], lower: &mut [f64], upper: &mut [f64]) {
        let n = values.len();
        let r = self.radius;
        debug_assert!(lower.len() >= n && upper.len() >= n);

        self.max_q.clear();
        self.min_q.clear();

        for i in 0..n + r {
            if i < n {
                let x = values[i];
                while let Some(b) = self.max_q.back() {
                    if values[b] <= x {
                        self.max_q.pop_back();
                    } else {
                        break;
                    }
                }
                self.max_q.push_back(i);
                while let Some(b) = self.min_q.back() {
                    if values[b] >= x {
                        self.min_q.pop_back();
                    } else {
                        break;
                    }
                }
                self.min_q.push_back(i);
            }

            if i < r {
                continue;
            }
            // Position p sees indices [p - r, p + r]; everything up to min(p + r, n - 1) is queued.
            let p = i - r;
            let oldest = p.saturating_sub(r);
            while matches!(self.max_q.front(), Some(f) if f < oldest) {
                self.max_q.pop_front();
            }
            while matches!(self.min_q.front(), Some(f) if f < oldest) {
                self.min_q.pop_front();
            }
            if let (Some(hi), Some(lo)) = (self.max_q.front(), self.min_q.front()) {
                upper[p] = values[hi];
                lower[p] = values[lo];
            }
        }
    }
}
