//! Resolution parameters matched to SBM parameters.
//!
//! Modularity with resolution γ (and, for multilayer networks, interlayer
//! coupling ω) is equivalent to the log-likelihood of a planted-partition SBM
//! for one particular choice of `(γ, ω)`. Given the SBM parameters a
//! partition implies, the matching resolution parameters are:
//!
//! ```text
//! γ = (ω_in − ω_out) / (ln ω_in − ln ω_out)
//!
//! ω = ln(1 + p·K / (1 − p)) / (2·(ln θ_in − ln θ_out))     temporal, multilevel
//! ω = ln(1 + p·K / (1 − p)) / (T·(ln θ_in − ln θ_out))     multiplex
//! ```
//!
//! γ is the logarithmic mean of `ω_in` and `ω_out`, so it is symmetric in its
//! two arguments and lies between them. It is undefined when either density
//! is zero; that case is reported as `None`, never as an error, because the
//! caller's only sensible reaction is to drop the partition.
//!
//! The temporal/multilevel divisor uses 2 where the multiplex one uses T:
//! each vertex copy has one successor in the former and `T − 1` partners in
//! the latter.
//!
//! ## References
//!
//! - Newman (2016). "Equivalence between modularity optimization and maximum
//!   likelihood methods for community detection." Phys. Rev. E 94, 052315.
//! - Pamfil, Howison, Lambiotte, Porter (2019). "Relating modularity
//!   maximization and stochastic block models in multilayer networks."
//!   SIAM J. Math. Data Sci. 1(4).

use crate::error::{Error, Result};
use crate::graph::WeightedEdges;
use crate::persistence::LayerTopology;
use crate::sbm::{
    estimate_multilayer_parameters, estimate_singlelayer_parameters, MultilayerConfig,
    MultilayerParameters,
};
use tracing::{debug, warn};

/// A `(γ, ω)` estimate. Either half is `None` when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GammaOmega {
    /// Intralayer resolution.
    pub gamma: Option<f64>,
    /// Interlayer coupling.
    pub omega: Option<f64>,
}

/// γ matched to single-layer SBM densities.
///
/// Returns `None` if either density is zero (a degenerate partition, such as
/// a single community). When `omega_in == omega_out` the formula is `0/0`;
/// its limit, `omega_in`, is returned.
///
/// ```rust
/// use sbmprune::resolution::gamma_estimate_from_parameters;
///
/// let gamma = gamma_estimate_from_parameters(12.0 / 7.0, 2.0 / 7.0).unwrap();
/// assert!(gamma > 2.0 / 7.0 && gamma < 12.0 / 7.0);
/// assert_eq!(gamma_estimate_from_parameters(1.0, 0.0), None);
/// ```
pub fn gamma_estimate_from_parameters(omega_in: f64, omega_out: f64) -> Option<f64> {
    if omega_in <= 0.0 || omega_out <= 0.0 {
        return None;
    }
    if omega_in == omega_out {
        return Some(omega_in);
    }
    finite((omega_in - omega_out) / (omega_in.ln() - omega_out.ln()))
}

/// ω for the multiplex model.
///
/// Saturated persistence (`p >= 1`) or `θ_in == 1` gives `omega_max`. When
/// `θ_out == 0` only `ln θ_in` is used in the divisor.
pub fn multiplex_omega_estimate_from_parameters(
    theta_in: f64,
    theta_out: f64,
    p: f64,
    k: usize,
    n_layers: usize,
    omega_max: f64,
) -> Option<f64> {
    if p >= 1.0 || theta_in == 1.0 {
        return Some(omega_max);
    }
    let log_ratio = log_density_ratio(theta_in, theta_out);
    finite(copy_log_odds(p, k) / (n_layers as f64 * log_ratio))
}

/// ω for the temporal and multilevel models.
///
/// Saturated persistence (`p >= 1`) gives `omega_max`. When `θ_out == 0` only
/// `ln θ_in` is used in the divisor.
pub fn temporal_multilevel_omega_estimate_from_parameters(
    theta_in: f64,
    theta_out: f64,
    p: f64,
    k: usize,
    omega_max: f64,
) -> Option<f64> {
    if p >= 1.0 {
        return Some(omega_max);
    }
    let log_ratio = log_density_ratio(theta_in, theta_out);
    finite(copy_log_odds(p, k) / (2.0 * log_ratio))
}

fn copy_log_odds(p: f64, k: usize) -> f64 {
    (1.0 + p * k as f64 / (1.0 - p)).ln()
}

fn log_density_ratio(theta_in: f64, theta_out: f64) -> f64 {
    if theta_out == 0.0 {
        theta_in.ln()
    } else {
        theta_in.ln() - theta_out.ln()
    }
}

fn finite(x: f64) -> Option<f64> {
    Some(x).filter(|x| x.is_finite())
}

/// ω estimator bound to a layer topology and layer count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OmegaModel {
    /// Layer topology.
    pub topology: LayerTopology,
    /// Number of layers.
    pub n_layers: usize,
    /// Value returned when persistence is saturated.
    pub omega_max: f64,
}

impl OmegaModel {
    /// ω for a set of multilayer SBM parameters.
    pub fn estimate(&self, params: &MultilayerParameters) -> Option<f64> {
        match self.topology {
            LayerTopology::Multiplex => multiplex_omega_estimate_from_parameters(
                params.theta_in,
                params.theta_out,
                params.p,
                params.k,
                self.n_layers,
                self.omega_max,
            ),
            LayerTopology::Temporal | LayerTopology::Multilevel => {
                temporal_multilevel_omega_estimate_from_parameters(
                    params.theta_in,
                    params.theta_out,
                    params.p,
                    params.k,
                    self.omega_max,
                )
            }
        }
    }
}

/// γ estimate for a single-layer graph and a partition.
///
/// # Errors
///
/// `DimensionMismatch` if `membership` does not cover every vertex.
pub fn gamma_estimate<G: WeightedEdges + ?Sized>(
    graph: &G,
    membership: &[usize],
) -> Result<Option<f64>> {
    let params = estimate_singlelayer_parameters(graph, membership)?;
    Ok(gamma_estimate_from_parameters(
        params.omega_in,
        params.omega_out,
    ))
}

/// `(γ, ω)` estimate for a multilayer network and a partition.
///
/// A multiplex copy probability that cannot be solved for yields
/// `(None, None)` rather than an error, so a single partition cannot abort
/// a batch.
///
/// # Errors
///
/// Input-shape and configuration errors from
/// [`estimate_multilayer_parameters`].
pub fn gamma_omega_estimate<G, H>(
    intralayer: &G,
    interlayer: &H,
    layer_vec: &[usize],
    membership: &[usize],
    config: &MultilayerConfig,
) -> Result<GammaOmega>
where
    G: WeightedEdges + ?Sized,
    H: WeightedEdges + ?Sized,
{
    let params =
        match estimate_multilayer_parameters(intralayer, interlayer, layer_vec, membership, config)
        {
            Ok(params) => params,
            Err(Error::ConvergenceFailure { iterations }) => {
                warn!(iterations, "copy probability root-find did not converge");
                return Ok(GammaOmega::default());
            }
            Err(e) => return Err(e),
        };

    let omega_model = OmegaModel {
        topology: config.model(),
        n_layers: config.resolve_n_layers(layer_vec),
        omega_max: config.omega_max(),
    };
    let estimate = GammaOmega {
        gamma: gamma_estimate_from_parameters(params.theta_in, params.theta_out),
        omega: omega_model.estimate(&params),
    };
    debug!(gamma = ?estimate.gamma, omega = ?estimate.omega, "multilayer resolution estimate");
    Ok(estimate)
}

/// Fixed-point iteration between a community detector and the γ estimate.
///
/// Starting from `gamma_0`, the detector is run at γ, γ is replaced by the
/// estimate for the partition it returns, and the loop stops once γ moves
/// by less than `tol`. The detector is any closure `γ -> membership`, so a
/// modularity heuristic from another crate plugs in directly.
#[derive(Debug, Clone)]
pub struct IterativeEstimation {
    gamma_0: f64,
    tol: f64,
    max_iter: usize,
}

/// Result of [`IterativeEstimation`].
#[derive(Debug, Clone, PartialEq)]
pub struct IterativeOutcome {
    /// Converged γ.
    pub gamma: f64,
    /// Partition found at the last detector run.
    pub membership: Vec<usize>,
    /// Detector runs performed.
    pub iterations: usize,
}

impl IterativeEstimation {
    /// Start at γ = 1 with tolerance `1e-2` and at most 25 iterations.
    pub fn new() -> Self {
        Self {
            gamma_0: 1.0,
            tol: 1e-2,
            max_iter: 25,
        }
    }

    /// Set the starting γ.
    pub fn with_gamma_0(mut self, gamma_0: f64) -> Self {
        self.gamma_0 = gamma_0;
        self
    }

    /// Set the convergence tolerance on γ.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Run the iteration with `detect(γ)` producing a partition of `graph`.
    ///
    /// # Errors
    ///
    /// - Errors returned by `detect`.
    /// - `InvalidParameter` when a partition has no γ estimate.
    /// - `ConvergenceFailure` after `max_iter` runs without settling.
    pub fn run<G, F>(&self, graph: &G, mut detect: F) -> Result<IterativeOutcome>
    where
        G: WeightedEdges + ?Sized,
        F: FnMut(f64) -> Result<Vec<usize>>,
    {
        let mut gamma = self.gamma_0;
        for iteration in 1..=self.max_iter {
            let membership = detect(gamma)?;
            let next = gamma_estimate(graph, &membership)?.ok_or(Error::InvalidParameter {
                name: "gamma",
                message: "detected partition has no gamma estimate",
            })?;
            debug!(iteration, gamma, next, "iterative gamma estimation");

            if (next - gamma).abs() < self.tol {
                return Ok(IterativeOutcome {
                    gamma: next,
                    membership,
                    iterations: iteration,
                });
            }
            gamma = next;
        }
        Err(Error::ConvergenceFailure {
            iterations: self.max_iter,
        })
    }
}

impl Default for IterativeEstimation {
    fn default() -> Self {
        Self::new()
    }
}
