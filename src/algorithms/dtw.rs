/// Reusable cost rows for [`banded_dtw`].
///
/// Two rows of width `2r + 1`, indexed so that cell `(i, j)` lives at
/// `j - i + r`: the band's diagonal always maps to index `r`.
#[derive(Debug, Clone)]
pub struct DtwWorkspace {
    radius: usize,
    cost: Vec<f64>,
    prev: Vec<f64>,
}

impl DtwWorkspace {
    pub fn new(radius: usize) -> Self {
        let width = 2 * radius + 1;
        Self {
            radius,
            cost: vec![f64::INFINITY; width],
            prev: vec![f64::INFINITY; width],
        }
    }
}

/// Squared-cost DTW between `a` (rows) and `b` (columns) within a
/// Sakoe-Chiba band, with early abandonment.
///
/// `remaining[k]` must lower-bound the cost that positions `k..m` still add
/// to any warping path (a suffix-summed LB_Keogh array; all zeros disables
/// the lookahead). After row `i`, if `row_min + remaining[i + r + 1] >= bsf`
/// that sum is returned immediately: it is a lower bound on the true distance
/// and already fails the `< bsf` test. Otherwise the exact distance is returned.
pub fn banded_dtw(a: &[f64], b: &[f64], remaining: &[f64], bsf: f64, ws: &mut DtwWorkspace) -> f64 {
    let m = a.len();
    let r = ws.radius;
    debug_assert_eq!(b.len(), m);
    debug_assert_eq!(remaining.len(), m);
    if m == 0 {
        return 0.0;
    }
    let width = 2 * r + 1;

    ws.cost.fill(f64::INFINITY);
    ws.prev.fill(f64::INFINITY);

    for i in 0..m {
        let mut k = r.saturating_sub(i);
        let mut row_min = f64::INFINITY;

        for j in i.saturating_sub(r)..=(i + r).min(m - 1) {
            let d = (a[i] - b[j]) * (a[i] - b[j]);
            if i == 0 && j == 0 {
                ws.cost[k] = d;
                row_min = d;
                k += 1;
                continue;
            }

            // (i, j-1)
            let left = if j == 0 || k == 0 {
                f64::INFINITY
            } else {
                ws.cost[k - 1]
            };
            // (i-1, j)
            let up = if i == 0 || k + 1 >= width {
                f64::INFINITY
            } else {
                ws.prev[k + 1]
            };
            // (i-1, j-1)
            let diag = if i == 0 || j == 0 {
                f64::INFINITY
            } else {
                ws.prev[k]
            };

            let c = left.min(up).min(diag) + d;
            ws.cost[k] = c;
            if c < row_min {
                row_min = c;
            }
            k += 1;
        }

        if i + r < m - 1 {
            let lb = row_min + remaining[i + r + 1];
            if lb >= bsf {
                return lb;
            }
        }

        std::mem::swap(&mut ws.cost, &mut ws.prev);
    }

    // Cell (m-1, m-1) sits on the diagonal of the last completed row.
    ws.prev[r]
}

/// Exact band-constrained DTW (squared costs), without early abandonment.
pub fn dtw_distance(a: &[f64], b: &[f64], radius: usize) -> f64 {
    let zeros = vec![0.0; a.len()];
    let mut ws = DtwWorkspace::new(radius.min(a.len().saturating_sub(1)));
    banded_dtw(a, b, &zeros, f64::INFINITY, &mut ws)
}
