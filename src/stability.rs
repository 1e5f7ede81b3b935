//! Stability of a partition within its dominance region.
//!
//! A dominance region is the part of resolution-parameter space where a
//! partition beats every other candidate on modularity. A partition is
//! *stable* when the resolution parameters it implies about itself (its
//! γ or `(γ, ω)` estimate) land inside its own dominance region: running the
//! detector at the estimated parameters would plausibly return the same
//! partition.
//!
//! Single-layer regions are closed intervals `[γ_start, γ_end]`. Multilayer
//! regions are convex polygons in the `(γ, ω)` plane.
//!
//! ## Polygon membership
//!
//! The polygon's vertices may come in either winding order. Each edge is
//! first oriented so that the vertex centroid falls on its negative side of
//! the sign test
//!
//! ```text
//! side(p1, p2, q) = (x − x1)(y2 − y1) − (y − y1)(x2 − x1) >= 0
//! ```
//!
//! and a point is inside when `side` agrees across every oriented edge.
//! Because the test is `>= 0`, a point exactly on an edge line scores `true`
//! on that edge and `false` on the others, so points on the boundary
//! (vertices included) are **outside**. Only strictly interior points are
//! stable.
//!
//! Polygons with fewer than three vertices, or whose area is negligible
//! next to their bounding box, contain no point. The threshold scales with
//! the polygon, so a small but well-formed region at a fine `(γ, ω)` scale
//! still counts.

use crate::resolution::GammaOmega;

/// Area, as a fraction of the squared longer side of the bounding box, at or
/// below which a polygon is treated as degenerate.
pub const DEGENERATE_AREA_RATIO: f64 = 1e-12;

/// A partition together with the γ interval over which it is optimal.
#[derive(Debug, Clone, PartialEq)]
pub struct DominanceRange {
    /// Lower end of the interval.
    pub gamma_start: f64,
    /// Upper end of the interval.
    pub gamma_end: f64,
    /// Partition.
    pub membership: Vec<usize>,
}

impl DominanceRange {
    /// Whether `gamma_start <= gamma <= gamma_end`.
    pub fn contains(&self, gamma: f64) -> bool {
        self.gamma_start <= gamma && gamma <= self.gamma_end
    }
}

/// A partition together with the `(γ, ω)` polygon over which it is optimal.
#[derive(Debug, Clone, PartialEq)]
pub struct DominanceDomain {
    /// Polygon vertices `(γ, ω)`, in either winding order.
    pub polygon: Vec<(f64, f64)>,
    /// Partition.
    pub membership: Vec<usize>,
}

/// A dominance interval with the partition's own γ estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEstimate {
    /// Interval and partition.
    pub range: DominanceRange,
    /// γ estimate of the partition.
    pub gamma: Option<f64>,
}

impl RangeEstimate {
    /// Whether the estimate exists and lies in the interval.
    pub fn is_stable(&self) -> bool {
        self.gamma.is_some_and(|gamma| self.range.contains(gamma))
    }
}

/// A dominance polygon with the partition's own `(γ, ω)` estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEstimate {
    /// Polygon and partition.
    pub domain: DominanceDomain,
    /// `(γ, ω)` estimate of the partition.
    pub estimate: GammaOmega,
}

impl DomainEstimate {
    /// Whether both estimates exist and the point is strictly inside.
    pub fn is_stable(&self) -> bool {
        match (self.estimate.gamma, self.estimate.omega) {
            (Some(gamma), Some(omega)) => polygon_contains(&self.domain.polygon, (gamma, omega)),
            _ => false,
        }
    }
}

/// Memberships of the stable entries, in input order.
pub fn gamma_estimates_to_stable_partitions(estimates: &[RangeEstimate]) -> Vec<Vec<usize>> {
    estimates
        .iter()
        .filter(|e| e.is_stable())
        .map(|e| e.range.membership.clone())
        .collect()
}

/// The stable entries, in input order.
pub fn gamma_omega_estimates_to_stable_partitions(
    estimates: Vec<DomainEstimate>,
) -> Vec<DomainEstimate> {
    estimates.into_iter().filter(DomainEstimate::is_stable).collect()
}

/// Sign test: is `q` on the non-negative side of the line `p1 -> p2`?
fn side(p1: (f64, f64), p2: (f64, f64), q: (f64, f64)) -> bool {
    (q.0 - p1.0) * (p2.1 - p1.1) - (q.1 - p1.1) * (p2.0 - p1.0) >= 0.0
}

/// Absolute area of a polygon (shoelace formula).
pub fn polygon_area(polygon: &[(f64, f64)]) -> f64 {
    let Some(&origin) = polygon.first() else {
        return 0.0;
    };
    // relative to the first vertex, so far-off small polygons keep precision
    let doubled: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| {
            let (ax, ay) = (a.0 - origin.0, a.1 - origin.1);
            let (bx, by) = (b.0 - origin.0, b.1 - origin.1);
            ax * by - bx * ay
        })
        .sum();
    doubled.abs() / 2.0
}

/// Fewer than three vertices, or area negligible next to the bounding box.
fn is_degenerate(polygon: &[(f64, f64)]) -> bool {
    if polygon.len() < 3 {
        return true;
    }
    let (mut lo, mut hi) = (polygon[0], polygon[0]);
    for &(x, y) in polygon {
        lo = (lo.0.min(x), lo.1.min(y));
        hi = (hi.0.max(x), hi.1.max(y));
    }
    let extent = (hi.0 - lo.0).max(hi.1 - lo.1);
    !(polygon_area(polygon) > DEGENERATE_AREA_RATIO * extent * extent)
}

/// Whether `point` lies strictly inside the convex `polygon`.
///
/// See the module docs for the orientation rule and boundary behaviour.
pub fn polygon_contains(polygon: &[(f64, f64)], point: (f64, f64)) -> bool {
    if is_degenerate(polygon) {
        return false;
    }
    if !(point.0.is_finite() && point.1.is_finite()) {
        return false;
    }

    let n = polygon.len() as f64;
    let centroid = (
        polygon.iter().map(|v| v.0).sum::<f64>() / n,
        polygon.iter().map(|v| v.1).sum::<f64>() / n,
    );

    let mut sides = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(&p1, &p2)| {
            let (p1, p2) = if side(p1, p2, centroid) { (p2, p1) } else { (p1, p2) };
            side(p1, p2, point)
        });

    match sides.next() {
        Some(first) => sides.all(|s| s == first),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

    #[test]
    fn test_square_inside_outside() {
        assert!(polygon_contains(&SQUARE, (0.5, 0.5)));
        assert!(polygon_contains(&SQUARE, (0.01, 0.99)));
        assert!(!polygon_contains(&SQUARE, (1.5, 0.5)));
        assert!(!polygon_contains(&SQUARE, (-0.01, 0.5)));
        assert!(!polygon_contains(&SQUARE, (0.5, 2.0)));
    }

    #[test]
    fn test_square_boundary_is_outside() {
        // on an edge
        assert!(!polygon_contains(&SQUARE, (1.0, 0.5)));
        assert!(!polygon_contains(&SQUARE, (0.5, 0.0)));
        // on a vertex
        assert!(!polygon_contains(&SQUARE, (1.0, 1.0)));
        assert!(!polygon_contains(&SQUARE, (0.0, 0.0)));
    }

    #[test]
    fn test_winding_order_irrelevant() {
        let mut clockwise = SQUARE.to_vec();
        clockwise.reverse();
        for &point in &[(0.5, 0.5), (0.2, 0.9), (1.2, 0.5), (1.0, 0.5)] {
            assert_eq!(
                polygon_contains(&SQUARE, point),
                polygon_contains(&clockwise, point)
            );
        }
    }

    #[test]
    fn test_degenerate_polygons() {
        assert!(!polygon_contains(&[], (0.0, 0.0)));
        assert!(!polygon_contains(&[(0.0, 0.0), (1.0, 1.0)], (0.5, 0.5)));
        // collinear, zero area
        let line = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)];
        assert!(!polygon_contains(&line, (1.0, 1.0)));
        assert!(!polygon_contains(&SQUARE, (f64::NAN, 0.5)));
        // a sliver far thinner than it is long
        let sliver = [(0.0, 0.0), (1.0, 0.0), (0.5, 1e-13)];
        assert!(!polygon_contains(&sliver, (0.5, 1e-14)));
    }

    #[test]
    fn test_small_polygon_is_not_degenerate() {
        // area 1e-14, well below any absolute cutoff
        let tiny: Vec<(f64, f64)> = SQUARE
            .iter()
            .map(|&(x, y)| (0.8 + 1e-7 * x, 40.0 + 1e-7 * y))
            .collect();
        assert!(polygon_contains(&tiny, (0.8 + 5e-8, 40.0 + 5e-8)));
        assert!(!polygon_contains(&tiny, (0.8 + 2e-7, 40.0 + 5e-8)));
        assert!((polygon_area(&tiny) - 1e-14).abs() < 1e-20);
    }

    #[test]
    fn test_polygon_area() {
        assert!((polygon_area(&SQUARE) - 1.0).abs() < 1e-12);
        let triangle = [(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)];
        assert!((polygon_area(&triangle) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_range_stability() {
        let range = DominanceRange {
            gamma_start: 0.5,
            gamma_end: 1.5,
            membership: vec![0, 1],
        };
        let estimate = |gamma| RangeEstimate {
            range: range.clone(),
            gamma,
        };
        assert!(estimate(Some(1.0)).is_stable());
        // interval ends are inclusive
        assert!(estimate(Some(0.5)).is_stable());
        assert!(estimate(Some(1.5)).is_stable());
        assert!(!estimate(Some(1.6)).is_stable());
        assert!(!estimate(None).is_stable());

        let stable =
            gamma_estimates_to_stable_partitions(&[estimate(Some(2.0)), estimate(Some(1.0))]);
        assert_eq!(stable, vec![vec![0, 1]]);
    }

    #[test]
    fn test_domain_stability() {
        let domain = DominanceDomain {
            polygon: SQUARE.to_vec(),
            membership: vec![0, 0, 1],
        };
        let with = |gamma, omega| DomainEstimate {
            domain: domain.clone(),
            estimate: GammaOmega { gamma, omega },
        };
        let kept = gamma_omega_estimates_to_stable_partitions(vec![
            with(Some(0.5), Some(0.5)),
            with(None, Some(0.5)),
            with(Some(0.5), None),
            with(Some(2.0), Some(0.5)),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].estimate.gamma, Some(0.5));
    }

    proptest! {
        #[test]
        fn regular_polygon_classification(
            sides in 3usize..12,
            radius in 0.1f64..10.0,
            cx in -5.0f64..5.0,
            cy in -5.0f64..5.0,
            angle in 0.0f64..std::f64::consts::TAU,
            frac in 0.0f64..0.8,
            reverse in any::<bool>(),
        ) {
            let mut polygon: Vec<(f64, f64)> = (0..sides)
                .map(|i| {
                    let t = std::f64::consts::TAU * i as f64 / sides as f64;
                    (cx + radius * t.cos(), cy + radius * t.sin())
                })
                .collect();
            if reverse {
                polygon.reverse();
            }
            // the inscribed circle has radius r cos(pi / n) >= r / 2
            let (dx, dy) = (radius * angle.cos(), radius * angle.sin());
            let inside = (cx + 0.5 * frac * dx, cy + 0.5 * frac * dy);
            let outside = (cx + 1.5 * dx, cy + 1.5 * dy);
            prop_assert!(polygon_contains(&polygon, inside));
            prop_assert!(!polygon_contains(&polygon, outside));
        }
    }
}
