//! Planted-partition SBM parameters implied by a partition.
//!
//! ## Single layer
//!
//! For a graph with total weight `m` and a partition with communities `r`:
//!
//! ```text
//! m_in  = weight of edges inside communities
//! κ_r   = Σ weighted degrees of community r
//!
//! ω_in  = 2·m_in / (Σ_r κ_r² / 2m)
//! ω_out = (2m − 2·m_in) / (2m − Σ_r κ_r² / 2m)
//! ```
//!
//! `ω_in` is the observed intra-community weight relative to the
//! configuration-model expectation, `ω_out` the same ratio for edges between
//! communities. These are the maximum-likelihood block densities of a
//! degree-corrected planted-partition model, and they determine the
//! resolution γ at which the partition maximises modularity.
//!
//! ## Multilayer
//!
//! The same accounting is done per layer `t` and pooled:
//!
//! ```text
//! θ_in  = Σ_t 2·m_t_in / Σ_t (Σ_r κ_{t,r}² / 2m_t)
//! θ_out = Σ_t (2m_t − 2·m_t_in) / Σ_t (2m_t − Σ_r κ_{t,r}² / 2m_t)
//! ```
//!
//! and the label-copy probability `p` is read off the persistence of the
//! partition across layers (see [`crate::persistence`]).
//!
//! ## Degenerate partitions
//!
//! A single community has no inter-community edges, so `ω_out` / `θ_out`
//! are `0` by convention. Empty graphs and empty layers contribute nothing
//! instead of dividing by zero.

use crate::error::{Error, Result};
use crate::graph::{layer_count, layer_weights, nodes_per_layer, WeightedEdges};
use crate::partition::dense_labels;
use crate::persistence::{LayerTopology, PersistenceModel, PersistenceParams, RootFinder};
use tracing::debug;

/// Default upper bound on ω estimates.
pub const DEFAULT_OMEGA_MAX: f64 = 1000.0;

/// Block densities of a single-layer planted-partition SBM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleLayerParameters {
    /// Intra-community density relative to the null model.
    pub omega_in: f64,
    /// Inter-community density relative to the null model.
    pub omega_out: f64,
}

/// Parameters of a multilayer planted-partition SBM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultilayerParameters {
    /// Pooled intralayer intra-community density.
    pub theta_in: f64,
    /// Pooled intralayer inter-community density.
    pub theta_out: f64,
    /// Label-copy probability between layers, in `[0, 1]`.
    pub p: f64,
    /// Number of communities of the partition these were estimated from.
    pub k: usize,
}

/// Settings for multilayer estimation.
///
/// Only `model` is mandatory. Layer counts and per-layer weights default to
/// values derived from the layer vector and the intralayer graph; set them to
/// reuse precomputed values across many partitions of the same network.
#[derive(Debug, Clone)]
pub struct MultilayerConfig {
    model: LayerTopology,
    n_per_layer: Option<usize>,
    n_layers: Option<usize>,
    nodes_per_layer: Option<Vec<usize>>,
    layer_weights: Option<Vec<f64>>,
    omega_max: f64,
    root_finder: RootFinder,
}

impl MultilayerConfig {
    /// Create a config for the given layer topology.
    pub fn new(model: LayerTopology) -> Self {
        Self {
            model,
            n_per_layer: None,
            n_layers: None,
            nodes_per_layer: None,
            layer_weights: None,
            omega_max: DEFAULT_OMEGA_MAX,
            root_finder: RootFinder::new(),
        }
    }

    /// Vertices per layer (`N`).
    pub fn with_n_per_layer(mut self, n: usize) -> Self {
        self.n_per_layer = Some(n);
        self
    }

    /// Number of layers (`T`).
    pub fn with_n_layers(mut self, t: usize) -> Self {
        self.n_layers = Some(t);
        self
    }

    /// Vertices in each layer (`N_t`).
    pub fn with_nodes_per_layer(mut self, nt: Vec<usize>) -> Self {
        self.nodes_per_layer = Some(nt);
        self
    }

    /// Total intralayer weight of each layer (`m_t`).
    pub fn with_layer_weights(mut self, m_t: Vec<f64>) -> Self {
        self.layer_weights = Some(m_t);
        self
    }

    /// Cap on ω estimates (returned when persistence is saturated).
    pub fn with_omega_max(mut self, omega_max: f64) -> Self {
        self.omega_max = omega_max;
        self
    }

    /// Root finder for the multiplex copy probability.
    pub fn with_root_finder(mut self, root_finder: RootFinder) -> Self {
        self.root_finder = root_finder;
        self
    }

    /// Layer topology.
    pub fn model(&self) -> LayerTopology {
        self.model
    }

    /// Cap on ω estimates.
    pub fn omega_max(&self) -> f64 {
        self.omega_max
    }

    /// Number of layers, falling back to `max(layer_vec) + 1`.
    pub fn resolve_n_layers(&self, layer_vec: &[usize]) -> usize {
        self.n_layers.unwrap_or_else(|| layer_count(layer_vec))
    }

    /// Copy with every network-derived value filled in.
    ///
    /// Estimating many partitions of one network against the prepared config
    /// derives the per-layer weights once instead of once per partition.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `layer_vec` does not cover every vertex.
    pub fn prepared<G: WeightedEdges + ?Sized>(
        &self,
        intralayer: &G,
        layer_vec: &[usize],
    ) -> Result<Self> {
        check_len(intralayer.vertex_count(), layer_vec.len())?;
        let n_layers = self.resolve_n_layers(layer_vec);
        let mut prepared = self.clone();
        prepared.n_layers = Some(n_layers);
        prepared
            .nodes_per_layer
            .get_or_insert_with(|| nodes_per_layer(layer_vec, n_layers));
        prepared
            .layer_weights
            .get_or_insert_with(|| layer_weights(intralayer, layer_vec, n_layers));
        Ok(prepared)
    }
}

/// Estimate `(ω_in, ω_out)` for a single-layer graph and a partition.
///
/// # Errors
///
/// `DimensionMismatch` if `membership` does not have one entry per vertex.
pub fn estimate_singlelayer_parameters<G: WeightedEdges + ?Sized>(
    graph: &G,
    membership: &[usize],
) -> Result<SingleLayerParameters> {
    check_len(graph.vertex_count(), membership.len())?;

    let (labels, k) = dense_labels(membership);
    let mut m = 0.0;
    let mut m_in = 0.0;
    let mut kappa = vec![0.0; k];
    graph.for_each_edge(|i, j, w| {
        let (ci, cj) = (labels[i], labels[j]);
        m += w;
        if ci == cj {
            m_in += w;
        }
        kappa[ci] += w;
        kappa[cj] += w;
    });

    if m == 0.0 {
        return Ok(SingleLayerParameters {
            omega_in: 0.0,
            omega_out: 0.0,
        });
    }

    let expected_in = kappa.iter().map(|k| k * k).sum::<f64>() / (2.0 * m);
    let omega_in = 2.0 * m_in / expected_in;
    let expected_out = 2.0 * m - expected_in;
    let omega_out = if k > 1 && expected_out != 0.0 {
        (2.0 * m - 2.0 * m_in) / expected_out
    } else {
        0.0
    };

    debug!(omega_in, omega_out, "single-layer SBM estimate");
    Ok(SingleLayerParameters {
        omega_in,
        omega_out,
    })
}

/// Estimate `(θ_in, θ_out, p, K)` for a multilayer network and a partition.
///
/// `intralayer` holds the edges inside layers, `interlayer` the edges between
/// copies of a vertex; both index the same vertex set, whose layers are given
/// by `layer_vec`.
///
/// # Errors
///
/// - `DimensionMismatch` when `layer_vec`, `membership` and the graphs
///   disagree on the vertex count.
/// - `MissingParameter` / `InvalidParameter` from the persistence model.
/// - `ConvergenceFailure` when the multiplex copy probability cannot be
///   solved for.
pub fn estimate_multilayer_parameters<G, H>(
    intralayer: &G,
    interlayer: &H,
    layer_vec: &[usize],
    membership: &[usize],
    config: &MultilayerConfig,
) -> Result<MultilayerParameters>
where
    G: WeightedEdges + ?Sized,
    H: WeightedEdges + ?Sized,
{
    let n = intralayer.vertex_count();
    check_len(n, layer_vec.len())?;
    check_len(n, membership.len())?;

    let n_layers = config.resolve_n_layers(layer_vec);
    if n_layers == 0 {
        return Err(Error::EmptyInput);
    }
    if layer_vec.iter().any(|&t| t >= n_layers) {
        return Err(Error::InvalidParameter {
            name: "layer_vec",
            message: "layer id exceeds the number of layers",
        });
    }
    let n_per_layer = config.n_per_layer.unwrap_or(n / n_layers);
    let m_t = match &config.layer_weights {
        Some(m_t) => {
            check_len(n_layers, m_t.len())?;
            m_t.clone()
        }
        None => layer_weights(intralayer, layer_vec, n_layers),
    };
    let nt = match &config.nodes_per_layer {
        Some(nt) => nt.clone(),
        None => nodes_per_layer(layer_vec, n_layers),
    };

    let (labels, k) = dense_labels(membership);

    let mut m_t_in = vec![0.0; n_layers];
    // kappa[t * k + r]
    let mut kappa = vec![0.0; n_layers * k];
    intralayer.for_each_edge(|i, j, w| {
        let layer = layer_vec[i];
        let (ci, cj) = (labels[i], labels[j]);
        if ci == cj && layer == layer_vec[j] {
            m_t_in[layer] += w;
        }
        kappa[layer * k + ci] += w;
        kappa[layer * k + cj] += w;
    });

    let mut in_num = 0.0;
    let mut in_den = 0.0;
    let mut out_num = 0.0;
    let mut out_den = 0.0;
    for t in 0..n_layers {
        if m_t[t] == 0.0 {
            continue;
        }
        let two_m = 2.0 * m_t[t];
        let expected_in = kappa[t * k..(t + 1) * k]
            .iter()
            .map(|x| x * x)
            .sum::<f64>()
            / two_m;
        in_num += 2.0 * m_t_in[t];
        in_den += expected_in;
        out_num += two_m - 2.0 * m_t_in[t];
        out_den += two_m - expected_in;
    }

    let theta_in = if in_den == 0.0 { 0.0 } else { in_num / in_den };
    let theta_out = if k <= 1 || out_den == 0.0 {
        0.0
    } else {
        out_num / out_den
    };

    let persistence = PersistenceModel::new(
        config.model,
        PersistenceParams {
            n_per_layer: Some(n_per_layer),
            n_layers: Some(n_layers),
            nodes_per_layer: Some(&nt),
            layer_vec: Some(layer_vec),
        },
    )?;
    let pers = persistence.persistence(interlayer, &labels)?;
    let p = config
        .model
        .copy_probability(pers, k, n_layers, &config.root_finder)?;

    debug!(theta_in, theta_out, pers, p, k, model = %config.model, "multilayer SBM estimate");
    Ok(MultilayerParameters {
        theta_in,
        theta_out,
        p,
        k,
    })
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeList;
    use petgraph::graph::UnGraph;

    /// Two triangles joined by one bridge.
    fn two_triangles() -> UnGraph<(), ()> {
        UnGraph::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
    }

    #[test]
    fn test_singlelayer_two_triangles() {
        let graph = two_triangles();
        let est = estimate_singlelayer_parameters(&graph, &[0, 0, 0, 1, 1, 1]).unwrap();

        // m = 7, m_in = 6, kappa = [7, 7], sum kappa^2 / 2m = 7
        assert!((est.omega_in - 12.0 / 7.0).abs() < 1e-12);
        assert!((est.omega_out - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_singlelayer_single_community() {
        let graph = two_triangles();
        let est = estimate_singlelayer_parameters(&graph, &[3; 6]).unwrap();
        assert!((est.omega_in - 1.0).abs() < 1e-12);
        assert_eq!(est.omega_out, 0.0);
    }

    #[test]
    fn test_singlelayer_weighted_and_empty() {
        let weighted = EdgeList::from_edges(3, [(0, 1, 2.0), (1, 2, 1.0)]).unwrap();
        let est = estimate_singlelayer_parameters(&weighted, &[0, 0, 1]).unwrap();
        // m = 3, m_in = 2, kappa = [5, 1], sum kappa^2 / 2m = 26/6
        assert!((est.omega_in - 4.0 / (26.0 / 6.0)).abs() < 1e-12);
        assert!((est.omega_out - 2.0 / (6.0 - 26.0 / 6.0)).abs() < 1e-12);

        let empty = EdgeList::new(3);
        let est = estimate_singlelayer_parameters(&empty, &[0, 1, 2]).unwrap();
        assert_eq!((est.omega_in, est.omega_out), (0.0, 0.0));
    }

    #[test]
    fn test_sparse_labels_match_dense_labels() {
        let graph = two_triangles();
        let dense = estimate_singlelayer_parameters(&graph, &[0, 0, 0, 1, 1, 1]).unwrap();
        let huge = 1_000_000_000_000;
        let far = usize::MAX;
        let sparse =
            estimate_singlelayer_parameters(&graph, &[huge, huge, huge, far, far, far]).unwrap();
        assert_eq!(dense, sparse);

        let (intra, inter, layer_vec) = two_layer_network();
        let config = MultilayerConfig::new(LayerTopology::Temporal);
        let membership = [0, 0, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1];
        let relabelled: Vec<usize> = membership
            .iter()
            .map(|&c| if c == 0 { usize::MAX } else { huge })
            .collect();
        let a = estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &config)
            .unwrap();
        let b = estimate_multilayer_parameters(&intra, &inter, &layer_vec, &relabelled, &config)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singlelayer_length_mismatch() {
        let graph = two_triangles();
        assert_eq!(
            estimate_singlelayer_parameters(&graph, &[0, 1]),
            Err(Error::DimensionMismatch {
                expected: 6,
                found: 2
            })
        );
    }

    /// Two layers holding the same two-triangle graph; copies linked 0..6 -> 6..12.
    fn two_layer_network() -> (EdgeList, EdgeList, Vec<usize>) {
        let base = [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)];
        let intra = EdgeList::from_edges(
            12,
            base.iter()
                .flat_map(|&(i, j)| [(i, j, 1.0), (i + 6, j + 6, 1.0)]),
        )
        .unwrap();
        let inter = EdgeList::from_edges(12, (0..6).map(|v| (v, v + 6, 1.0))).unwrap();
        let layer_vec = (0..12).map(|v| v / 6).collect();
        (intra, inter, layer_vec)
    }

    #[test]
    fn test_multilayer_matches_singlelayer_per_layer() {
        let (intra, inter, layer_vec) = two_layer_network();
        let membership = [0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1];
        let config = MultilayerConfig::new(LayerTopology::Temporal);
        let est =
            estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &config)
                .unwrap();

        // identical layers pool to the single-layer values
        assert!((est.theta_in - 12.0 / 7.0).abs() < 1e-12);
        assert!((est.theta_out - 2.0 / 7.0).abs() < 1e-12);
        assert_eq!(est.k, 2);
        // every label persists
        assert_eq!(est.p, 1.0);
    }

    #[test]
    fn test_multilayer_partial_persistence() {
        let (intra, inter, layer_vec) = two_layer_network();
        // vertices 2 and 3 swap communities in layer 1
        let membership = [0, 0, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1];
        let config = MultilayerConfig::new(LayerTopology::Temporal);
        let est =
            estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &config)
                .unwrap();

        // pers = 4/6, p = (2 * 4/6 - 1) / 1
        assert!((est.p - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(est.k, 2);
    }

    #[test]
    fn test_multilayer_single_community() {
        let (intra, inter, layer_vec) = two_layer_network();
        let config = MultilayerConfig::new(LayerTopology::Temporal);
        let est =
            estimate_multilayer_parameters(&intra, &inter, &layer_vec, &[0; 12], &config).unwrap();
        assert_eq!(est.theta_out, 0.0);
        assert_eq!(est.p, 1.0);
        assert_eq!(est.k, 1);
    }

    #[test]
    fn test_multilayer_empty_layer_is_skipped() {
        // layer 1 has no intralayer edges
        let intra = EdgeList::from_edges(4, [(0, 1, 1.0)]).unwrap();
        let inter = EdgeList::from_edges(4, [(0, 2, 1.0), (1, 3, 1.0)]).unwrap();
        let layer_vec = [0, 0, 1, 1];
        let config = MultilayerConfig::new(LayerTopology::Temporal);
        let est =
            estimate_multilayer_parameters(&intra, &inter, &layer_vec, &[0, 1, 0, 1], &config)
                .unwrap();
        assert!(est.theta_in.is_finite());
        assert!(est.theta_out.is_finite());
    }

    #[test]
    fn test_multilayer_input_validation() {
        let (intra, inter, layer_vec) = two_layer_network();
        let config = MultilayerConfig::new(LayerTopology::Temporal);
        assert!(matches!(
            estimate_multilayer_parameters(&intra, &inter, &layer_vec[..5], &[0; 12], &config),
            Err(Error::DimensionMismatch { .. })
        ));

        let config = MultilayerConfig::new(LayerTopology::Temporal).with_n_layers(1);
        assert!(matches!(
            estimate_multilayer_parameters(&intra, &inter, &layer_vec, &[0; 12], &config),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_precomputed_layer_statistics_agree() {
        let (intra, inter, layer_vec) = two_layer_network();
        let membership = [0, 0, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1];
        let derived = MultilayerConfig::new(LayerTopology::Temporal);
        let explicit = MultilayerConfig::new(LayerTopology::Temporal)
            .with_n_layers(2)
            .with_n_per_layer(6)
            .with_nodes_per_layer(vec![6, 6])
            .with_layer_weights(vec![7.0, 7.0]);

        let a = estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &derived)
            .unwrap();
        let b = estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &explicit)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_prepared_config() {
        let (intra, inter, layer_vec) = two_layer_network();
        let membership = [0, 0, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1];
        let config = MultilayerConfig::new(LayerTopology::Multiplex);
        let prepared = config.prepared(&intra, &layer_vec).unwrap();
        assert_eq!(prepared.layer_weights, Some(vec![7.0, 7.0]));
        assert_eq!(prepared.nodes_per_layer, Some(vec![6, 6]));

        let a = estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &config)
            .unwrap();
        let b = estimate_multilayer_parameters(&intra, &inter, &layer_vec, &membership, &prepared)
            .unwrap();
        assert_eq!(a, b);

        assert!(config.prepared(&intra, &layer_vec[..3]).is_err());
    }
}
