//! Pruning a candidate set down to its stable partitions.
//!
//! The candidate partitions usually come from running a heuristic detector
//! over a grid of resolution values. The pipeline:
//!
//! 1. deduplicates them by canonical labelling (and optionally keeps only
//!    those with a given number of communities),
//! 2. asks a dominance finder where in parameter space each survivor is
//!    optimal,
//! 3. estimates the partition's own resolution parameters,
//! 4. keeps the partitions whose estimate falls inside their own region.
//!
//! Step 2 is pluggable through [`RangeFinder`] and [`DomainFinder`]. A
//! single-layer finder is built in ([`ChampRanges`]); multilayer callers
//! supply their own polygon finder.
//!
//! With the `parallel` feature, step 3 runs on the rayon pool. The output is
//! a `BTreeSet` (or, for multilayer networks, a `BTreeMap` from partition to
//! its `(γ, ω)` estimate), so it does not depend on scheduling.

use crate::champ::ChampRanges;
use crate::error::Result;
use crate::graph::WeightedEdges;
use crate::partition::{canonical_membership, num_communities};
use crate::resolution::{gamma_estimate, gamma_omega_estimate, GammaOmega};
use crate::sbm::MultilayerConfig;
use crate::stability::{
    gamma_estimates_to_stable_partitions, gamma_omega_estimates_to_stable_partitions,
    DomainEstimate, DominanceDomain, DominanceRange, RangeEstimate,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Finds the γ intervals over which partitions are optimal.
pub trait RangeFinder {
    /// One entry per partition that is optimal somewhere in
    /// `[gamma_start, gamma_end]`. Partitions never optimal are omitted.
    fn ranges<G: WeightedEdges + ?Sized>(
        &self,
        graph: &G,
        partitions: &[Vec<usize>],
        gamma_start: f64,
        gamma_end: f64,
    ) -> Result<Vec<DominanceRange>>;
}

/// Finds the `(γ, ω)` polygons over which multilayer partitions are optimal.
pub trait DomainFinder {
    /// One entry per partition with a non-empty dominance domain.
    fn domains<G, H>(
        &self,
        intralayer: &G,
        interlayer: &H,
        layer_vec: &[usize],
        partitions: &[Vec<usize>],
    ) -> Result<Vec<DominanceDomain>>
    where
        G: WeightedEdges + ?Sized,
        H: WeightedEdges + ?Sized;
}

/// Map over candidates, in parallel when the `parallel` feature is on.
fn map_candidates<T, U, F>(items: Vec<T>, f: F) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn(T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.into_iter().map(f).collect()
    }
}

/// Attach the γ estimate of each range's partition.
///
/// Order is preserved.
pub fn ranges_to_gamma_estimates<G>(
    graph: &G,
    ranges: Vec<DominanceRange>,
) -> Result<Vec<RangeEstimate>>
where
    G: WeightedEdges + Sync + ?Sized,
{
    map_candidates(ranges, |range| -> Result<RangeEstimate> {
        let gamma = gamma_estimate(graph, &range.membership)?;
        if gamma.is_none() {
            debug!(
                gamma_start = range.gamma_start,
                gamma_end = range.gamma_end,
                "partition has no gamma estimate"
            );
        }
        Ok(RangeEstimate { range, gamma })
    })
    .into_iter()
    .collect()
}

/// Attach the `(γ, ω)` estimate of each domain's partition.
///
/// Order is preserved.
pub fn domains_to_gamma_omega_estimates<G, H>(
    intralayer: &G,
    interlayer: &H,
    layer_vec: &[usize],
    domains: Vec<DominanceDomain>,
    config: &MultilayerConfig,
) -> Result<Vec<DomainEstimate>>
where
    G: WeightedEdges + Sync + ?Sized,
    H: WeightedEdges + Sync + ?Sized,
{
    let config = config.prepared(intralayer, layer_vec)?;
    map_candidates(domains, |domain| -> Result<DomainEstimate> {
        let estimate =
            gamma_omega_estimate(intralayer, interlayer, layer_vec, &domain.membership, &config)?;
        Ok(DomainEstimate { domain, estimate })
    })
    .into_iter()
    .collect()
}

/// Canonical, deduplicated candidates, optionally restricted to `k`
/// communities.
fn distinct_candidates(partitions: &[Vec<usize>], restrict: Option<usize>) -> Vec<Vec<usize>> {
    let distinct: BTreeSet<Vec<usize>> = partitions
        .iter()
        .map(|p| canonical_membership(p))
        .filter(|p| restrict.map_or(true, |k| num_communities(p) == k))
        .collect();
    distinct.into_iter().collect()
}

/// Stable partitions of a single-layer graph, using [`ChampRanges`].
///
/// See [`prune_to_stable_partitions_with`].
pub fn prune_to_stable_partitions<G>(
    graph: &G,
    partitions: &[Vec<usize>],
    gamma_start: f64,
    gamma_end: f64,
    restrict_num_communities: Option<usize>,
) -> Result<BTreeSet<Vec<usize>>>
where
    G: WeightedEdges + Sync + ?Sized,
{
    prune_to_stable_partitions_with(
        &ChampRanges,
        graph,
        partitions,
        gamma_start,
        gamma_end,
        restrict_num_communities,
    )
}

/// Stable partitions of a single-layer graph, with a custom range finder.
///
/// A partition is kept when its γ estimate lies in the interval over which
/// it is optimal among the candidates. The result holds canonical
/// memberships. When no candidate survives deduplication and the
/// community-count restriction, the finder is not called.
///
/// # Errors
///
/// Errors from the finder and `DimensionMismatch` for partitions that do not
/// cover every vertex.
#[instrument(skip_all)]
pub fn prune_to_stable_partitions_with<F, G>(
    finder: &F,
    graph: &G,
    partitions: &[Vec<usize>],
    gamma_start: f64,
    gamma_end: f64,
    restrict_num_communities: Option<usize>,
) -> Result<BTreeSet<Vec<usize>>>
where
    F: RangeFinder + ?Sized,
    G: WeightedEdges + Sync + ?Sized,
{
    let candidates = distinct_candidates(partitions, restrict_num_communities);
    if candidates.is_empty() {
        info!(input = partitions.len(), "no candidate partitions");
        return Ok(BTreeSet::new());
    }

    let ranges = finder.ranges(graph, &candidates, gamma_start, gamma_end)?;
    let dominant = ranges.len();
    let estimates = ranges_to_gamma_estimates(graph, ranges)?;
    let stable: BTreeSet<Vec<usize>> = gamma_estimates_to_stable_partitions(&estimates)
        .into_iter()
        .collect();

    info!(
        input = partitions.len(),
        candidates = candidates.len(),
        dominant,
        stable = stable.len(),
        "pruned single-layer partitions"
    );
    Ok(stable)
}

/// Stable partitions of a multilayer network, each with its `(γ, ω)`
/// estimate.
///
/// A partition is kept when its `(γ, ω)` estimate lies strictly inside the
/// polygon over which it is optimal among the candidates. Deduplication and
/// the community-count restriction work as in
/// [`prune_to_stable_partitions_with`]. Partitions whose estimate is
/// undefined, including multiplex ones whose copy probability cannot be
/// solved for, are dropped without affecting the others.
///
/// # Errors
///
/// Errors from the finder and from [`gamma_omega_estimate`].
#[instrument(skip_all, fields(model = %config.model()))]
pub fn prune_to_multilayer_stable_partitions<F, G, H>(
    finder: &F,
    intralayer: &G,
    interlayer: &H,
    layer_vec: &[usize],
    partitions: &[Vec<usize>],
    config: &MultilayerConfig,
    restrict_num_communities: Option<usize>,
) -> Result<BTreeMap<Vec<usize>, GammaOmega>>
where
    F: DomainFinder + ?Sized,
    G: WeightedEdges + Sync + ?Sized,
    H: WeightedEdges + Sync + ?Sized,
{
    let candidates = distinct_candidates(partitions, restrict_num_communities);
    if candidates.is_empty() {
        info!(input = partitions.len(), "no candidate partitions");
        return Ok(BTreeMap::new());
    }

    let domains = finder.domains(intralayer, interlayer, layer_vec, &candidates)?;
    let dominant = domains.len();
    let estimates =
        domains_to_gamma_omega_estimates(intralayer, interlayer, layer_vec, domains, config)?;
    let stable: BTreeMap<Vec<usize>, GammaOmega> =
        gamma_omega_estimates_to_stable_partitions(estimates)
            .into_iter()
            .map(|e| (e.domain.membership, e.estimate))
            .collect();

    info!(
        input = partitions.len(),
        candidates = candidates.len(),
        dominant,
        stable = stable.len(),
        "pruned multilayer partitions"
    );
    Ok(stable)
}
