//! Membership vectors.
//!
//! A partition is a plain `Vec<usize>` (`membership[v]` = community of
//! vertex `v`), as modularity heuristics usually report them.
//! Two memberships describe the same partition when they differ only by a
//! relabelling of communities; [`canonical_membership`] picks one
//! representative so candidate sets can be deduplicated.

use std::collections::HashMap;

/// Number of distinct community labels in use.
pub fn num_communities(membership: &[usize]) -> usize {
    let mut labels: Vec<usize> = membership.to_vec();
    labels.sort_unstable();
    labels.dedup();
    labels.len()
}

/// Relabel communities `0, 1, 2, ...` in order of first appearance.
///
/// ```rust
/// use sbmprune::partition::canonical_membership;
///
/// assert_eq!(canonical_membership(&[7, 7, 3, 9, 3]), vec![0, 0, 1, 2, 1]);
/// assert_eq!(canonical_membership(&[1, 0]), canonical_membership(&[5, 2]));
/// ```
pub fn canonical_membership(membership: &[usize]) -> Vec<usize> {
    let mut relabel: HashMap<usize, usize> = HashMap::new();
    membership
        .iter()
        .map(|&c| {
            let next = relabel.len();
            *relabel.entry(c).or_insert(next)
        })
        .collect()
}

/// Labels relabelled to `0..k`, and `k`.
///
/// Per-community arrays are indexed by the dense labels, so their length
/// never depends on how large the caller's labels are.
pub(crate) fn dense_labels(membership: &[usize]) -> (Vec<usize>, usize) {
    let dense = canonical_membership(membership);
    let k = dense.iter().copied().max().map_or(0, |c| c + 1);
    (dense, k)
}
