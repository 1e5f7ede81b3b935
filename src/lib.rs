//! # sbmprune
//!
//! Stochastic-block-model parameter estimation for network partitions, and
//! pruning of candidate partitions down to the *stable* ones.
//!
//! Modularity maximisation with resolution γ (plus interlayer coupling ω for
//! multilayer networks) is equivalent to fitting a planted-partition SBM.
//! Each partition therefore implies its own `(γ, ω)`. A partition is stable
//! when that estimate falls inside the region of parameter space where the
//! partition is the best of the candidates.
//!
//! - [`sbm`]: `(ω_in, ω_out)` and `(θ_in, θ_out, p, K)` of a partition.
//! - [`persistence`]: label persistence across layers and the copy
//!   probability it implies, for temporal, multilevel and multiplex networks.
//! - [`resolution`]: γ and ω from SBM parameters, and iterative γ estimation.
//! - [`stability`]: dominance intervals and polygons, and the stability filter.
//! - [`champ`]: single-layer dominance intervals.
//! - [`pipeline`]: deduplicate, find dominance regions, estimate, filter.
//!
//! Candidate partitions are an input; any modularity heuristic can produce
//! them.
//!
//! Graphs are `petgraph` graphs (directed or undirected, any edge payload
//! implementing [`graph::EdgeWeight`]) or a plain [`graph::EdgeList`].
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use sbmprune::prune_to_stable_partitions;
//!
//! let graph = UnGraph::<(), ()>::from_edges([
//!     (0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3),
//! ]);
//! let candidates = vec![vec![0; 6], vec![0, 0, 0, 1, 1, 1], (0..6).collect()];
//! let stable = prune_to_stable_partitions(&graph, &candidates, 0.0, 4.0, None).unwrap();
//! assert_eq!(stable.len(), 1);
//! ```

pub mod champ;
/// Error types used across `sbmprune`.
pub mod error;
pub mod graph;
pub mod partition;
pub mod persistence;
pub mod pipeline;
pub mod resolution;
pub mod sbm;
pub mod stability;

pub use champ::ChampRanges;
pub use error::{Error, Result};
pub use graph::{EdgeList, EdgeWeight, WeightedEdges};
pub use partition::{canonical_membership, num_communities};
pub use persistence::{LayerTopology, RootFinder};
pub use pipeline::{
    domains_to_gamma_omega_estimates, prune_to_multilayer_stable_partitions,
    prune_to_stable_partitions, prune_to_stable_partitions_with, ranges_to_gamma_estimates,
    DomainFinder, RangeFinder,
};
pub use resolution::{
    gamma_estimate, gamma_omega_estimate, GammaOmega, IterativeEstimation, IterativeOutcome,
};
pub use sbm::{
    estimate_multilayer_parameters, estimate_singlelayer_parameters, MultilayerConfig,
    MultilayerParameters, SingleLayerParameters,
};
pub use stability::{
    gamma_estimates_to_stable_partitions, gamma_omega_estimates_to_stable_partitions,
    DomainEstimate, DominanceDomain, DominanceRange, RangeEstimate,
};
