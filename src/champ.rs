//! Single-layer dominance ranges (CHAMP in one dimension).
//!
//! For a fixed partition, modularity is linear in the resolution:
//!
//! ```text
//! Q(γ) = A − γ·P,    A = 2·m_in,    P = Σ_r κ_r² / 2m
//! ```
//!
//! so the best partition at each γ is the one on the upper envelope of these
//! lines. The envelope over `[γ_start, γ_end]` splits into consecutive
//! intervals, one per partition that ever reaches it; partitions that never
//! do are dropped.
//!
//! Every pairwise crossing inside the interval is a candidate breakpoint and
//! each gap between breakpoints is won by the line highest at its midpoint,
//! ties going to the earlier partition. Quadratic in the number of
//! partitions, which is fine for the candidate-set sizes this is used with.
//!
//! ## References
//!
//! Weir, Emmons, Gibson, Taylor, Mucha (2017). "Post-processing partitions to
//! identify domains of modularity optimization." Algorithms 10(3), 93.

use crate::error::{Error, Result};
use crate::graph::WeightedEdges;
use crate::partition::dense_labels;
use crate::pipeline::RangeFinder;
use crate::stability::DominanceRange;
use tracing::debug;

/// Breakpoints closer than this are merged.
const BREAKPOINT_EPS: f64 = 1e-12;

/// Upper-envelope range finder for single-layer networks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChampRanges;

/// Coefficients of `Q(γ) = a − γ·p` for one partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityLine {
    /// Intercept, twice the intra-community weight.
    pub a: f64,
    /// Slope magnitude, the null-model expectation.
    pub p: f64,
}

impl QualityLine {
    /// Coefficients for `membership` on `graph`.
    pub fn new<G: WeightedEdges + ?Sized>(graph: &G, membership: &[usize]) -> Result<Self> {
        if membership.len() != graph.vertex_count() {
            return Err(Error::DimensionMismatch {
                expected: graph.vertex_count(),
                found: membership.len(),
            });
        }
        let (labels, k) = dense_labels(membership);
        let mut m = 0.0;
        let mut m_in = 0.0;
        let mut kappa = vec![0.0; k];
        graph.for_each_edge(|i, j, w| {
            m += w;
            if labels[i] == labels[j] {
                m_in += w;
            }
            kappa[labels[i]] += w;
            kappa[labels[j]] += w;
        });
        let p = if m == 0.0 {
            0.0
        } else {
            kappa.iter().map(|k| k * k).sum::<f64>() / (2.0 * m)
        };
        Ok(Self { a: 2.0 * m_in, p })
    }

    /// Modularity (unnormalised) at `gamma`.
    pub fn at(&self, gamma: f64) -> f64 {
        self.a - gamma * self.p
    }
}

impl RangeFinder for ChampRanges {
    fn ranges<G: WeightedEdges + ?Sized>(
        &self,
        graph: &G,
        partitions: &[Vec<usize>],
        gamma_start: f64,
        gamma_end: f64,
    ) -> Result<Vec<DominanceRange>> {
        if !(gamma_start.is_finite() && gamma_end.is_finite()) || gamma_start >= gamma_end {
            return Err(Error::InvalidParameter {
                name: "gamma_start",
                message: "must be finite and below gamma_end",
            });
        }
        if partitions.is_empty() {
            return Ok(Vec::new());
        }

        let lines = partitions
            .iter()
            .map(|membership| QualityLine::new(graph, membership))
            .collect::<Result<Vec<_>>>()?;

        let mut breaks = vec![gamma_start, gamma_end];
        for (i, li) in lines.iter().enumerate() {
            for lj in &lines[i + 1..] {
                if li.p == lj.p {
                    continue;
                }
                let x = (li.a - lj.a) / (li.p - lj.p);
                if x > gamma_start && x < gamma_end {
                    breaks.push(x);
                }
            }
        }
        breaks.sort_by(f64::total_cmp);
        breaks.dedup_by(|a, b| (*a - *b).abs() <= BREAKPOINT_EPS);

        let mut ranges: Vec<(usize, f64, f64)> = Vec::new();
        for window in breaks.windows(2) {
            let (lo, hi) = (window[0], window[1]);
            let mid = 0.5 * (lo + hi);
            let mut best = 0;
            for (idx, line) in lines.iter().enumerate().skip(1) {
                if line.at(mid) > lines[best].at(mid) {
                    best = idx;
                }
            }
            match ranges.last_mut() {
                Some(last) if last.0 == best => last.2 = hi,
                _ => ranges.push((best, lo, hi)),
            }
        }

        debug!(
            candidates = partitions.len(),
            dominant = ranges.len(),
            "computed dominance ranges"
        );
        Ok(ranges
            .into_iter()
            .map(|(idx, lo, hi)| DominanceRange {
                gamma_start: lo,
                gamma_end: hi,
                membership: partitions[idx].clone(),
            })
            .collect())
    }
}
