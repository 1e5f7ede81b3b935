//! Layer persistence.
//!
//! In a multilayer network every vertex has one copy per layer, and the
//! copies are joined by interlayer edges. *Persistence* is the fraction of
//! those interlayer edges whose two endpoints carry the same community label.
//! How the edges are laid out, and therefore how the fraction is normalised,
//! depends on the layer topology:
//!
//! | Topology | Interlayer edges | Normaliser |
//! |----------|------------------|------------|
//! | temporal | copy in layer t → copy in layer t+1 | `N·(T−1)` |
//! | multilevel | into each layer, from the layer above | `N_t` per layer, then `T−1` |
//! | multiplex | between every pair of layers | `N·T·(T−1)` |
//!
//! The multiplex normaliser counts ordered layer pairs, so the interlayer
//! graph is expected to hold each pair of copies in both directions.
//!
//! The planted multilayer SBM ties persistence to the label-copy probability
//! `p`. For the temporal and multilevel models the relation is linear,
//! `pers = p + (1 − p)/K`, and inverts in closed form. For the multiplex
//! model persistence averages a geometric decay over all layer pairs:
//!
//! ```text
//! pers(p) = 2(1 − 1/K) / (T(T−1)) · Σ_{n=1}^{T−1} (T−n)·pⁿ + 1/K
//! ```
//!
//! which is inverted with a Newton iteration safeguarded by bisection on
//! `[0, 1]` ([`RootFinder`]).

use crate::error::{Error, Result};
use crate::graph::WeightedEdges;
use std::fmt;
use std::str::FromStr;

/// Interlayer topology of a multilayer network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerTopology {
    /// Ordered layers, each vertex copy linked to its copy in the next layer.
    Temporal,
    /// Ordered levels with possibly different vertex counts per level.
    Multilevel,
    /// Unordered layers, each vertex copy linked to all of its other copies.
    Multiplex,
}

impl LayerTopology {
    /// Tag name.
    pub fn as_str(self) -> &'static str {
        match self {
            LayerTopology::Temporal => "temporal",
            LayerTopology::Multilevel => "multilevel",
            LayerTopology::Multiplex => "multiplex",
        }
    }

    /// Recover the label-copy probability `p` from a persistence value.
    ///
    /// Saturated persistence (`pers >= 1`) and single-community partitions
    /// (`k <= 1`) give `p = 1`. Inversions that would land below zero are
    /// clamped to `0`.
    ///
    /// # Errors
    ///
    /// `ConvergenceFailure` when the multiplex root-find does not settle
    /// within `root_finder`'s iteration cap.
    pub fn copy_probability(
        self,
        pers: f64,
        k: usize,
        n_layers: usize,
        root_finder: &RootFinder,
    ) -> Result<f64> {
        if pers >= 1.0 || k <= 1 {
            return Ok(1.0);
        }
        let k_f = k as f64;
        match self {
            LayerTopology::Temporal | LayerTopology::Multilevel => {
                Ok(((k_f * pers - 1.0) / (k_f - 1.0)).max(0.0))
            }
            LayerTopology::Multiplex => {
                if pers <= 1.0 / k_f {
                    return Ok(0.0);
                }
                let curve = MultiplexCurve::new(k_f, n_layers as f64, pers);
                root_finder.solve(|x| curve.eval(x))
            }
        }
    }
}

impl fmt::Display for LayerTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerTopology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "temporal" => Ok(LayerTopology::Temporal),
            "multilevel" => Ok(LayerTopology::Multilevel),
            "multiplex" => Ok(LayerTopology::Multiplex),
            other => Err(Error::UnknownModel(other.to_string())),
        }
    }
}

/// `pers(x) − pers` for the multiplex model, with its derivative.
struct MultiplexCurve {
    coeff: f64,
    offset: f64,
    n_layers: f64,
}

impl MultiplexCurve {
    fn new(k: f64, n_layers: f64, pers: f64) -> Self {
        Self {
            coeff: 2.0 * (1.0 - 1.0 / k) / (n_layers * (n_layers - 1.0)),
            offset: 1.0 / k - pers,
            n_layers,
        }
    }

    /// Returns `(f(x), f'(x))`.
    fn eval(&self, x: f64) -> (f64, f64) {
        let t = self.n_layers as usize;
        let mut value = 0.0;
        let mut slope = 0.0;
        // x^(n-1), starting at n = 1
        let mut pow = 1.0;
        for n in 1..t {
            let c = (t - n) as f64;
            slope += c * n as f64 * pow;
            pow *= x;
            value += c * pow;
        }
        (self.coeff * value + self.offset, self.coeff * slope)
    }
}

/// Newton iteration safeguarded by bisection, used to invert the multiplex
/// persistence curve.
///
/// The root must be bracketed by a sign change over `[lo, hi]`, which holds
/// for the persistence curve on `[0, 1]` whenever `1/K < pers < 1`. Every
/// evaluation shrinks the bracket, and a Newton step that leaves it (or is
/// not finite) is replaced by the bracket midpoint, so the iteration cannot
/// run away however steep the curve is.
#[derive(Debug, Clone)]
pub struct RootFinder {
    /// Starting point.
    x0: f64,
    /// Interval known to contain the root.
    bracket: (f64, f64),
    /// Absolute tolerance on the step, the bracket width and `|f(x)|`.
    tol: f64,
    /// Iteration cap.
    max_iter: usize,
}

impl RootFinder {
    /// Start at `0.5` inside `[0, 1]`, tolerance `1e-12`, at most 100
    /// iterations.
    pub fn new() -> Self {
        Self {
            x0: 0.5,
            bracket: (0.0, 1.0),
            tol: 1e-12,
            max_iter: 100,
        }
    }

    /// Set the starting point. Points outside the bracket start at its
    /// midpoint.
    pub fn with_start(mut self, x0: f64) -> Self {
        self.x0 = x0;
        self
    }

    /// Set the interval searched for the root.
    pub fn with_bracket(mut self, lo: f64, hi: f64) -> Self {
        self.bracket = (lo, hi);
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Find a root of `f`, which returns `(value, derivative)`.
    ///
    /// # Errors
    ///
    /// `ConvergenceFailure` when `f` does not change sign over the bracket
    /// (reported with zero iterations), is not finite inside it, or the
    /// iteration cap is reached.
    pub fn solve<F: Fn(f64) -> (f64, f64)>(&self, f: F) -> Result<f64> {
        let (mut lo, mut hi) = self.bracket;
        let f_lo = f(lo).0;
        let f_hi = f(hi).0;
        if f_lo.abs() <= self.tol {
            return Ok(lo);
        }
        if f_hi.abs() <= self.tol {
            return Ok(hi);
        }
        if !(f_lo.is_finite() && f_hi.is_finite()) || (f_lo < 0.0) == (f_hi < 0.0) {
            return Err(Error::ConvergenceFailure { iterations: 0 });
        }
        let rising = f_lo < 0.0;

        let mut x = if self.x0 > lo && self.x0 < hi {
            self.x0
        } else {
            0.5 * (lo + hi)
        };
        for iteration in 0..self.max_iter {
            let (value, slope) = f(x);
            if !value.is_finite() {
                return Err(Error::ConvergenceFailure {
                    iterations: iteration + 1,
                });
            }
            if value.abs() <= self.tol {
                return Ok(x);
            }
            if (value < 0.0) == rising {
                lo = x;
            } else {
                hi = x;
            }

            let newton = x - value / slope;
            let next = if newton.is_finite() && newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };
            if (next - x).abs() <= self.tol || hi - lo <= self.tol {
                return Ok(next);
            }
            x = next;
        }
        Err(Error::ConvergenceFailure {
            iterations: self.max_iter,
        })
    }
}

impl Default for RootFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs a persistence model may need. Unset fields are `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceParams<'a> {
    /// Vertices per layer (`N`), for uniform layers.
    pub n_per_layer: Option<usize>,
    /// Number of layers (`T`).
    pub n_layers: Option<usize>,
    /// Vertices in each layer (`N_t`).
    pub nodes_per_layer: Option<&'a [usize]>,
    /// Layer of each vertex.
    pub layer_vec: Option<&'a [usize]>,
}

/// A persistence statistic bound to the layer counts it normalises by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PersistenceModel<'a> {
    /// Ordinal persistence.
    Temporal {
        /// Vertices per layer.
        n_per_layer: usize,
        /// Number of layers.
        n_layers: usize,
    },
    /// Per-level persistence, averaged over the `T − 1` transitions.
    Multilevel {
        /// Layer of each vertex.
        layer_vec: &'a [usize],
        /// Vertices in each layer.
        nodes_per_layer: &'a [usize],
        /// Number of layers.
        n_layers: usize,
    },
    /// Categorical persistence.
    Multiplex {
        /// Vertices per layer.
        n_per_layer: usize,
        /// Number of layers.
        n_layers: usize,
    },
}

impl<'a> PersistenceModel<'a> {
    /// Bind `topology` to the parameters it needs.
    ///
    /// # Errors
    ///
    /// `MissingParameter` naming the first required input that is unset,
    /// `InvalidParameter` for fewer than two layers or empty layers.
    pub fn new(topology: LayerTopology, params: PersistenceParams<'a>) -> Result<Self> {
        let model = topology.as_str();
        let require_n = || {
            params.n_per_layer.ok_or(Error::MissingParameter {
                model,
                name: "n_per_layer",
            })
        };
        let n_layers = params.n_layers.ok_or(Error::MissingParameter {
            model,
            name: "n_layers",
        })?;
        if n_layers < 2 {
            return Err(Error::InvalidParameter {
                name: "n_layers",
                message: "persistence needs at least two layers",
            });
        }

        let built = match topology {
            LayerTopology::Temporal => PersistenceModel::Temporal {
                n_per_layer: require_n()?,
                n_layers,
            },
            LayerTopology::Multiplex => PersistenceModel::Multiplex {
                n_per_layer: require_n()?,
                n_layers,
            },
            LayerTopology::Multilevel => {
                let layer_vec = params.layer_vec.ok_or(Error::MissingParameter {
                    model,
                    name: "layer_vec",
                })?;
                let nodes_per_layer = params.nodes_per_layer.ok_or(Error::MissingParameter {
                    model,
                    name: "nodes_per_layer",
                })?;
                if nodes_per_layer.len() != n_layers {
                    return Err(Error::DimensionMismatch {
                        expected: n_layers,
                        found: nodes_per_layer.len(),
                    });
                }
                PersistenceModel::Multilevel {
                    layer_vec,
                    nodes_per_layer,
                    n_layers,
                }
            }
        };

        if let PersistenceModel::Temporal { n_per_layer: 0, .. }
        | PersistenceModel::Multiplex { n_per_layer: 0, .. } = built
        {
            return Err(Error::InvalidParameter {
                name: "n_per_layer",
                message: "layers must contain at least one vertex",
            });
        }
        Ok(built)
    }

    /// Persistence of `membership` over the interlayer edges.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `membership` (or the model's `layer_vec`) does
    /// not cover every vertex of `interlayer`.
    pub fn persistence<G: WeightedEdges + ?Sized>(
        &self,
        interlayer: &G,
        membership: &[usize],
    ) -> Result<f64> {
        if membership.len() != interlayer.vertex_count() {
            return Err(Error::DimensionMismatch {
                expected: interlayer.vertex_count(),
                found: membership.len(),
            });
        }

        match *self {
            PersistenceModel::Temporal {
                n_per_layer,
                n_layers,
            } => {
                let kept = retained_edges(interlayer, membership);
                Ok(kept / (n_per_layer * (n_layers - 1)) as f64)
            }
            PersistenceModel::Multiplex {
                n_per_layer,
                n_layers,
            } => {
                let kept = retained_edges(interlayer, membership);
                Ok(kept / (n_per_layer * n_layers * (n_layers - 1)) as f64)
            }
            PersistenceModel::Multilevel {
                layer_vec,
                nodes_per_layer,
                n_layers,
            } => {
                if layer_vec.len() != membership.len() {
                    return Err(Error::DimensionMismatch {
                        expected: membership.len(),
                        found: layer_vec.len(),
                    });
                }
                let mut per_layer = vec![0.0; n_layers];
                interlayer.for_each_edge(|i, j, _| {
                    let layer = layer_vec[j];
                    if membership[i] == membership[j] && layer < n_layers {
                        per_layer[layer] += 1.0;
                    }
                });
                let total: f64 = per_layer
                    .iter()
                    .zip(nodes_per_layer)
                    .filter(|(_, &nt)| nt > 0)
                    .map(|(&kept, &nt)| kept / nt as f64)
                    .sum();
                Ok(total / (n_layers - 1) as f64)
            }
        }
    }
}

/// Count of interlayer edges whose endpoints share a community.
fn retained_edges<G: WeightedEdges + ?Sized>(interlayer: &G, membership: &[usize]) -> f64 {
    let mut kept = 0usize;
    interlayer.for_each_edge(|i, j, _| {
        if membership[i] == membership[j] {
            kept += 1;
        }
    });
    kept as f64
}
