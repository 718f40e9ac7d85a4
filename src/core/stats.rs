/// Smallest ratio of standard deviation to shifted RMS at which running sums
/// are still trusted. Below it, the window statistics are recomputed two-pass.
///
/// The running variance is `E[d^2] - E[d]^2` over the shifted samples `d`,
/// so its absolute error scales with `E[d^2]`, not with the variance itself.
pub const CONDITIONING_TOLERANCE: f64 = 1e-4;

/// Running sum and sum of squares over the last `m` admitted samples.
///
/// Sums are kept relative to a shift value so that a large common offset does
/// not cancel away the spread. The caller admits and evicts samples explicitly
/// and re-anchors the sums with [`RunningStats::rebuild`].
#[derive(Debug, Clone)]
pub struct RunningStats {
    m: usize,
    shift: f64,
    sum: f64,
    sum_sq: f64,
}

impl RunningStats {
    pub fn new(m: usize) -> Self {
        assert!(m > 0, "Window length must be > 0");
        Self {
            m,
            shift: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Clear the sums; samples pushed from now on are taken relative to `shift`.
    #[inline]
    pub fn reset(&mut self, shift: f64) {
        self.shift = shift;
        self.sum = 0.0;
        self.sum_sq = 0.0;
    }

    /// Recompute the sums from scratch over `window`, shifted by its first sample.
    pub fn rebuild(&mut self, window: &[f64]) {
        debug_assert_eq!(window.len(), self.m);
        self.reset(window.first().copied().unwrap_or(0.0));
        for &x in window {
            self.push(x);
        }
    }

    #[inline]
    pub fn push(&mut self, x: f64) {
        let d = x - self.shift;
        self.sum += d;
        self.sum_sq += d * d;
    }

    #[inline]
    pub fn evict(&mut self, x: f64) {
        let d = x - self.shift;
        self.sum -= d;
        self.sum_sq -= d * d;
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.shift + self.sum / self.m as f64
    }

    /// Population standard deviation, with the variance clamped at 0.
    #[inline]
    pub fn std(&self) -> f64 {
        let mu = self.sum / self.m as f64;
        (self.sum_sq / self.m as f64 - mu * mu).max(0.0).sqrt()
    }

    /// Root mean square of the shifted samples.
    #[inline]
    pub fn shifted_rms(&self) -> f64 {
        (self.sum_sq / self.m as f64).max(0.0).sqrt()
    }

    /// `(mean, std)` of the current window, or `None` when the sums have lost
    /// too much precision to separate the spread from rounding.
    #[inline]
    pub fn normalization(&self) -> Option<(f64, f64)> {
        let sigma = self.std();
        (sigma > CONDITIONING_TOLERANCE * self.shifted_rms()).then(|| (self.mean(), sigma))
    }
}

/// Two-pass mean and population standard deviation.
///
/// `None` for flat input: empty, every sample equal, or a spread that
/// underflows to zero.
pub fn window_stats(values: &[f64]) -> Option<(f64, f64)> {
    let (&first, rest) = values.split_first()?;
    if rest.iter().all(|&x| x == first) {
        return None;
    }
    let n = values.len() as f64;
    let mu = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / n;
    let sigma = var.sqrt();
    (sigma > 0.0).then_some((mu, sigma))
}

/// Z-normalize `values` into `out` using the given statistics.
#[inline]
pub fn z_normalize_into(values: &[f64], mean: f64, std: f64, out: &mut [f64]) {
    debug_assert_eq!(values.len(), out.len());
    for (o, &x) in out.iter_mut().zip(values) {
        *o = (x - mean) / std;
    }
}

/// Z-normalized copy of `values`, or `None` if they are flat.
pub fn z_normalize(values: &[f64]) -> Option<Vec<f64>> {
    let (mean, std) = window_stats(values)?;
    let mut out = vec![0.0; values.len()];
    z_normalize_into(values, mean, std, &mut out);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats_slide() {
        // ts = [1, 2, 3, 4, 5], m = 3
        // Windows: [1,2,3], [2,3,4], [3,4,5]; std = sqrt(2/3) for all
        let ts = [1.0, 2.0, 3.0, 4.0, 5.0];
        let m = 3;
        let mut stats = RunningStats::new(m);
        stats.reset(ts[0]);
        let expected_std = (2.0_f64 / 3.0).sqrt();
        for (i, &x) in ts.iter().enumerate() {
            stats.push(x);
            if i + 1 >= m {
                let (mu, sigma) = stats.normalization().unwrap();
                assert!((mu - (i as f64)).abs() < 1e-10, "mean at {i}: {mu}");
                assert!((sigma - expected_std).abs() < 1e-10);
                stats.evict(ts[i + 1 - m]);
            }
        }
    }

    #[test]
    fn test_running_stats_constant_needs_exact_check() {
        let mut stats = RunningStats::new(4);
        stats.reset(5.0);
        for _ in 0..4 {
            stats.push(5.0);
        }
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert_eq!(stats.std(), 0.0);
        assert!(stats.normalization().is_none());
        assert!(window_stats(&[5.0; 4]).is_none());
    }

    #[test]
    fn test_running_stats_large_offset_keeps_spread() {
        let spread = [0.3, -0.2, 0.0, 0.5, 0.0, -0.5, 0.1, 0.4];
        let ts: Vec<f64> = spread.iter().map(|x| 1e6 + x).collect();
        let m = 4;
        let mut stats = RunningStats::new(m);
        stats.reset(ts[0]);
        for (i, &x) in ts.iter().enumerate() {
            stats.push(x);
            if i + 1 >= m {
                let (mu, sigma) = stats.normalization().unwrap();
                let (ref_mu, ref_sigma) = window_stats(&ts[i + 1 - m..=i]).unwrap();
                assert!((mu - ref_mu).abs() < 1e-9, "mean at {i}: {mu} vs {ref_mu}");
                assert!(
                    (sigma - ref_sigma).abs() < 1e-8 * ref_sigma,
                    "std at {i}: {sigma} vs {ref_sigma}"
                );
                stats.evict(ts[i + 1 - m]);
            }
        }
    }

    #[test]
    fn test_rebuild_matches_two_pass() {
        let window = [1e-7, 3e-7, -2e-7, 0.0, 5e-7];
        let mut stats = RunningStats::new(window.len());
        stats.rebuild(&window);
        let (mu, sigma) = stats.normalization().unwrap();
        let (ref_mu, ref_sigma) = window_stats(&window).unwrap();
        assert!((mu - ref_mu).abs() < 1e-20);
        assert!((sigma - ref_sigma).abs() < 1e-12 * ref_sigma);
    }

    #[test]
    fn test_flatness_does_not_depend_on_scale() {
        assert!(window_stats(&[1e-7, 0.0, 1e-7]).is_some());
        assert!(window_stats(&[1e6 + 0.3, 1e6 - 0.2, 1e6]).is_some());
        assert!(window_stats(&[1e12; 5]).is_none());
        assert!(window_stats(&[-3e-9; 3]).is_none());
    }

    #[test]
    fn test_z_normalize_moments() {
        let values = [3.0, -1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let z = z_normalize(&values).unwrap();
        let n = z.len() as f64;
        let mean = z.iter().sum::<f64>() / n;
        let var = z.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-12, "mean = {mean}");
        assert!((var.sqrt() - 1.0).abs() < 1e-12, "std = {}", var.sqrt());
    }

    #[test]
    fn test_z_normalize_flat_and_empty() {
        assert!(z_normalize(&[2.0; 6]).is_none());
        assert!(z_normalize(&[]).is_none());
        assert!(window_stats(&[1.0]).is_none());
    }
}
