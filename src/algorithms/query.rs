use crate::algorithms::envelope::Envelope;
use crate::core::stats::z_normalize;

/// A query pattern prepared for the lower-bound cascade.
///
/// Built once before streaming starts and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    /// Z-normalized query, in original order.
    pub normalized: Vec<f64>,
    /// Envelope of the normalized query, in original order.
    pub envelope: Envelope,
    /// Query positions sorted by descending `|normalized[i]|`.
    pub order: Vec<usize>,
    /// `normalized` permuted by `order`.
    pub sorted_values: Vec<f64>,
    /// `envelope.lower` permuted by `order`.
    pub sorted_lower: Vec<f64>,
    /// `envelope.upper` permuted by `order`.
    pub sorted_upper: Vec<f64>,
    radius: usize,
}

impl PreparedQuery {
    /// Normalize `raw`, build its envelope and importance order.
    ///
    /// Returns `None` if the query is flat (or empty) and so has no z-normalized form.
    pub fn new(raw: &[f64], radius: usize) -> Option<Self> {
        let normalized = z_normalize(raw)?;
        let envelope = Envelope::compute(&normalized, radius);

        // Positions far from the mean tend to contribute the largest point-wise
        // bounds, so visiting them first makes the cumulative bounds abandon sooner.
        let mut order: Vec<usize> = (0..normalized.len()).collect();
        order.sort_by(|&a, &b| normalized[b].abs().total_cmp(&normalized[a].abs()));

        Some(Self::with_order(normalized, envelope, order, radius))
    }

    fn with_order(normalized: Vec<f64>, envelope: Envelope, order: Vec<usize>, radius: usize) -> Self {
        let sorted_values = order.iter().map(|&i| normalized[i]).collect();
        let sorted_lower = order.iter().map(|&i| envelope.lower[i]).collect();
        let sorted_upper = order.iter().map(|&i| envelope.upper[i]).collect();
        Self {
            normalized,
            envelope,
            order,
            sorted_values,
            sorted_lower,
            sorted_upper,
            radius,
        }
    }

    /// The same query visited in a different order.
    ///
    /// # Panics
    /// Panics if `order` is not a permutation of `0..len`.
    pub fn reordered(&self, order: Vec<usize>) -> Self {
        let mut seen = vec![false; self.len()];
        for &i in &order {
            assert!(i < seen.len() && !seen[i], "order is not a permutation");
            seen[i] = true;
        }
        assert_eq!(order.len(), self.len(), "order is not a permutation");
        Self::with_order(
            self.normalized.clone(),
            self.envelope.clone(),
            order,
            self.radius,
        )
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn radius(&self) -> usize {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_query_and_envelope() {
        let raw = [1.0, 2.0, 3.0, 2.0, 1.0, 0.0];
        let q = PreparedQuery::new(&raw, 1).unwrap();
        assert_eq!(q.len(), 6);
        assert_eq!(q.radius(), 1);

        let mean = q.normalized.iter().sum::<f64>() / 6.0;
        assert!(mean.abs() < 1e-12);
        for i in 0..q.len() {
            assert!(q.envelope.lower[i] <= q.normalized[i]);
            assert!(q.normalized[i] <= q.envelope.upper[i]);
        }
    }

    #[test]
    fn test_order_is_descending_magnitude() {
        let raw = [0.0, 10.0, 1.0, -7.0, 2.0];
        let q = PreparedQuery::new(&raw, 0).unwrap();
        for w in q.order.windows(2) {
            assert!(
                q.normalized[w[0]].abs() >= q.normalized[w[1]].abs(),
                "order not descending: {:?}",
                q.order
            );
        }
        // Largest deviation from the mean (1.2) is the 10.0 at index 1
        assert_eq!(q.order[0], 1);
    }

    #[test]
    fn test_sorted_arrays_follow_order() {
        let raw = [0.3, -1.2, 2.5, 0.0, 1.1, -0.4, 0.9];
        let q = PreparedQuery::new(&raw, 2).unwrap();
        for (rank, &pos) in q.order.iter().enumerate() {
            assert_eq!(q.sorted_values[rank], q.normalized[pos]);
            assert_eq!(q.sorted_lower[rank], q.envelope.lower[pos]);
            assert_eq!(q.sorted_upper[rank], q.envelope.upper[pos]);
        }
    }

    #[test]
    fn test_reordered_identity() {
        let raw = [0.3, -1.2, 2.5, 0.0];
        let q = PreparedQuery::new(&raw, 1).unwrap();
        let ident = q.reordered(vec![0, 1, 2, 3]);
        assert_eq!(ident.sorted_values, q.normalized);
        assert_eq!(ident.sorted_lower, q.envelope.lower);
    }

    #[test]
    #[should_panic(expected = "order is not a permutation")]
    fn test_reordered_rejects_duplicates() {
        let q = PreparedQuery::new(&[1.0, 2.0, 4.0], 0).unwrap();
        q.reordered(vec![0, 0, 1]);
    }

    #[test]
    fn test_constant_query_rejected() {
        assert!(PreparedQuery::new(&[3.0; 8], 2).is_none());
        assert!(PreparedQuery::new(&[], 0).is_none());
    }
}
