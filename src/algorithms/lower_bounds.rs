//! Lower bounds on the band-constrained DTW distance.
//!
//! All bounds work on squared point-wise costs and take the raw window plus
//! its mean/std, normalizing on the fly. Each returns as soon as its running
//! total reaches `bsf`; the partial total is then still a valid lower bound.

use crate::algorithms::query::PreparedQuery;

#[inline(always)]
fn dist(x: f64, y: f64) -> f64 {
    (x - y) * (x - y)
}

/// Number of front/back tiers the endpoint bound may use for length `m`.
///
/// Front tier `k` covers cells with `max(i, j) == k`, back tier `k` covers
/// cells with `min(i, j) == m - 1 - k`. Every warping path crosses each of
/// these layers, and `k` front and `k` back layers are disjoint iff `2k <= m`.
#[inline]
fn kim_tiers(m: usize) -> usize {
    (m / 2).min(3)
}

/// LB_Kim hierarchy: first/last 1, 2 and 3 points of the window.
///
/// O(1), weak, but cheap enough to run at every position.
pub fn lb_kim_hierarchy(window: &[f64], query: &[f64], mean: f64, std: f64, bsf: f64) -> f64 {
    let m = window.len();
    debug_assert_eq!(m, query.len());
    debug_assert!(m >= 2);
    let tiers = kim_tiers(m);
    let z = |k: usize| (window[k] - mean) / std;

    // 1 point at front and back
    let x0 = z(0);
    let y0 = z(m - 1);
    let mut lb = dist(x0, query[0]) + dist(y0, query[m - 1]);
    if lb >= bsf || tiers < 2 {
        return lb;
    }

    // 2 points at front
    let x1 = z(1);
    let d = dist(x1, query[0])
        .min(dist(x0, query[1]))
        .min(dist(x1, query[1]));
    lb += d;
    if lb >= bsf {
        return lb;
    }

    // 2 points at back
    let y1 = z(m - 2);
    let d = dist(y1, query[m - 1])
        .min(dist(y0, query[m - 2]))
        .min(dist(y1, query[m - 2]));
    lb += d;
    if lb >= bsf || tiers < 3 {
        return lb;
    }

    // 3 points at front
    let x2 = z(2);
    let d = dist(x0, query[2])
        .min(dist(x1, query[2]))
        .min(dist(x2, query[2]))
        .min(dist(x2, query[1]))
        .min(dist(x2, query[0]));
    lb += d;
    if lb >= bsf {
        return lb;
    }

    // 3 points at back
    let y2 = z(m - 3);
    let d = dist(y0, query[m - 3])
        .min(dist(y1, query[m - 3]))
        .min(dist(y2, query[m - 3]))
        .min(dist(y2, query[m - 2]))
        .min(dist(y2, query[m - 1]));
    lb + d
}

/// LB_Keogh against the query envelope.
///
/// Visits window positions in the query's importance order. The point-wise
/// contribution of window position `i` is written to `contributions[i]`;
/// when the bound completes below `bsf`, every entry has been written.
pub fn lb_keogh_query(
    query: &PreparedQuery,
    window: &[f64],
    mean: f64,
    std: f64,
    contributions: &mut [f64],
    bsf: f64,
) -> f64 {
    debug_assert_eq!(window.len(), query.len());
    debug_assert_eq!(contributions.len(), query.len());
    let mut lb = 0.0;
    for (rank, &pos) in query.order.iter().enumerate() {
        if lb >= bsf {
            break;
        }
        let x = (window[pos] - mean) / std;
        let upper = query.sorted_upper[rank];
        let lower = query.sorted_lower[rank];
        let d = if x > upper {
            dist(x, upper)
        } else if x < lower {
            dist(x, lower)
        } else {
            0.0
        };
        lb += d;
        contributions[pos] = d;
    }
    lb
}

/// LB_Keogh against the data envelope.
///
/// `lower`/`upper` are the raw-valued data envelope over the window (taken
/// from the chunk envelope) and are normalized with the window's `mean`/`std`.
/// `contributions[j]` receives the bound for query position `j`.
pub fn lb_keogh_data(
    query: &PreparedQuery,
    lower: &[f64],
    upper: &[f64],
    mean: f64,
    std: f64,
    contributions: &mut [f64],
    bsf: f64,
) -> f64 {
    debug_assert_eq!(lower.len(), query.len());
    debug_assert_eq!(upper.len(), query.len());
    let mut lb = 0.0;
    for (rank, &pos) in query.order.iter().enumerate() {
        if lb >= bsf {
            break;
        }
        let q = query.sorted_values[rank];
        let uu = (upper[pos] - mean) / std;
        let ll = (lower[pos] - mean) / std;
        let d = if q > uu {
            dist(q, uu)
        } else if q < ll {
            dist(q, ll)
        } else {
            0.0
        };
        lb += d;
        contributions[pos] = d;
    }
    lb
}

/// Turn point-wise contributions into remaining-bound form, in place.
///
/// Afterwards `bound[i]` is the sum of contributions at `i..m`, so it is
/// non-increasing in `i` and non-negative.
pub fn into_remaining_bound(bound: &mut [f64]) {
    let mut acc = 0.0;
    for v in bound.iter_mut().rev() {
        acc += *v;
        *v = acc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::dtw::dtw_distance;
    use crate::algorithms::envelope::Envelope;
    use crate::core::stats::{window_stats, z_normalize};

    fn signal(n: usize, phase: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (i as f64 * 0.4 + phase).sin() + 0.3 * (i as f64 * 1.7 + phase).cos())
            .collect()
    }

    #[test]
    fn test_kim_exact_match_is_zero() {
        let raw = signal(16, 0.0);
        let q = z_normalize(&raw).unwrap();
        let (mean, std) = window_stats(&raw).unwrap();
        let lb = lb_kim_hierarchy(&raw, &q, mean, std, f64::INFINITY);
        assert!(lb.abs() < 1e-20, "Self bound should be 0, got {lb}");
    }

    #[test]
    fn test_kim_early_exit_returns_partial() {
        let raw = signal(16, 0.0);
        let other = z_normalize(&signal(16, 2.0)).unwrap();
        let (mean, std) = window_stats(&raw).unwrap();
        let full = lb_kim_hierarchy(&raw, &other, mean, std, f64::INFINITY);
        let first = {
            let x0 = (raw[0] - mean) / std;
            let y0 = (raw[15] - mean) / std;
            dist(x0, other[0]) + dist(y0, other[15])
        };
        assert!(first > 0.0);
        let partial = lb_kim_hierarchy(&raw, &other, mean, std, first * 0.5);
        assert!((partial - first).abs() < 1e-12);
        assert!(full >= partial);
    }

    #[test]
    fn test_kim_short_windows_stay_below_dtw() {
        // Short windows use fewer tiers so front and back cells never overlap
        for m in 2..8 {
            let raw: Vec<f64> = (0..m).map(|i| ((i * 5) % 7) as f64).collect();
            let qraw: Vec<f64> = (0..m).map(|i| ((i * 3 + 1) % 5) as f64).collect();
            let (mean, std) = window_stats(&raw).unwrap();
            let q = z_normalize(&qraw).unwrap();
            let t = z_normalize(&raw).unwrap();
            for r in 0..m {
                let lb = lb_kim_hierarchy(&raw, &q, mean, std, f64::INFINITY);
                let d = dtw_distance(&t, &q, r);
                assert!(lb <= d + 1e-9, "m={m} r={r}: kim {lb} > dtw {d}");
            }
        }
    }

    #[test]
    fn test_keogh_query_writes_contributions() {
        let raw = signal(24, 0.5);
        let query = PreparedQuery::new(&signal(24, 1.9), 2).unwrap();
        let (mean, std) = window_stats(&raw).unwrap();
        let mut cb = vec![f64::NAN; 24];
        let lb = lb_keogh_query(&query, &raw, mean, std, &mut cb, f64::INFINITY);
        assert!(cb.iter().all(|v| v.is_finite() && *v >= 0.0));
        let total: f64 = cb.iter().sum();
        assert!((total - lb).abs() < 1e-9);

        let t = z_normalize(&raw).unwrap();
        let d = dtw_distance(&t, &query.normalized, 2);
        assert!(lb <= d + 1e-9, "keogh {lb} > dtw {d}");
    }

    #[test]
    fn test_keogh_query_early_exit() {
        let raw = signal(24, 0.5);
        let query = PreparedQuery::new(&signal(24, 1.9), 0).unwrap();
        let (mean, std) = window_stats(&raw).unwrap();
        let mut cb = vec![0.0; 24];
        let full = lb_keogh_query(&query, &raw, mean, std, &mut cb, f64::INFINITY);
        assert!(full > 0.0);
        let bsf = full / 4.0;
        let partial = lb_keogh_query(&query, &raw, mean, std, &mut cb, bsf);
        assert!(partial >= bsf, "should stop only once the bound reaches bsf");
        assert!(partial <= full + 1e-12);
    }

    #[test]
    fn test_keogh_data_bound() {
        let raw = signal(24, 0.1);
        let query = PreparedQuery::new(&signal(24, 2.3), 3).unwrap();
        let (mean, std) = window_stats(&raw).unwrap();
        let env = Envelope::compute(&raw, 3);
        let mut cb = vec![f64::NAN; 24];
        let lb = lb_keogh_data(&query, &env.lower, &env.upper, mean, std, &mut cb, f64::INFINITY);
        assert!(cb.iter().all(|v| v.is_finite() && *v >= 0.0));

        let t = z_normalize(&raw).unwrap();
        let d = dtw_distance(&t, &query.normalized, 3);
        assert!(lb <= d + 1e-9, "keogh data {lb} > dtw {d}");
    }

    #[test]
    fn test_remaining_bound() {
        let mut cb = vec![1.0, 0.0, 2.0, 0.5];
        into_remaining_bound(&mut cb);
        assert_eq!(cb, vec![3.5, 2.5, 2.5, 0.5]);
        for w in cb.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }
}
