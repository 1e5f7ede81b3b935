use petgraph::graph::UnGraph;
use sbmprune::{
    canonical_membership, gamma_estimate, prune_to_stable_partitions, ChampRanges,
    IterativeEstimation, RangeFinder,
};

/// Two triangles joined by the bridge 2-3.
fn two_triangles() -> UnGraph<(), ()> {
    UnGraph::from_edges([(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
}

/// Four 4-cliques joined in a ring.
fn ring_of_cliques() -> UnGraph<(), ()> {
    let mut edges = Vec::new();
    for c in 0..4u32 {
        let base = 4 * c;
        for i in 0..4 {
            for j in i + 1..4 {
                edges.push((base + i, base + j));
            }
        }
        edges.push((base + 3, (base + 4) % 16));
    }
    UnGraph::from_edges(edges)
}

/// Partitions of the ring at several granularities, relabelled variants
/// included.
fn ring_candidates() -> Vec<Vec<usize>> {
    let cliques: Vec<usize> = (0..16).map(|v| v / 4).collect();
    let mut moved = cliques.clone();
    moved[3] = 1;
    vec![
        vec![0; 16],
        (0..16).map(|v| v / 8).collect(),
        (0..16).map(|v| 3 - v / 4).collect(),
        cliques,
        moved,
        (0..16).map(|v| v / 2).collect(),
        (0..16).collect(),
    ]
}

#[test]
fn two_triangles_prune_to_planted_partition() {
    let graph = two_triangles();
    let candidates = vec![
        vec![0; 6],
        vec![0, 0, 0, 1, 1, 1],
        vec![0, 0, 1, 1, 2, 2],
        (0..6).collect(),
    ];
    let stable = prune_to_stable_partitions(&graph, &candidates, 0.0, 3.0, None).unwrap();
    assert!(stable.contains(&vec![0, 0, 0, 1, 1, 1]));

    let ranges = ChampRanges.ranges(&graph, &candidates, 0.0, 3.0).unwrap();
    for membership in &stable {
        let gamma = gamma_estimate(&graph, membership).unwrap().unwrap();
        let range = ranges
            .iter()
            .find(|r| canonical_membership(&r.membership) == *membership)
            .unwrap();
        assert!(range.contains(gamma));
    }
}

#[test]
fn ring_of_cliques_keeps_clique_partition() {
    let graph = ring_of_cliques();
    let cliques: Vec<usize> = (0..16).map(|v| v / 4).collect();
    let candidates = ring_candidates();

    let stable = prune_to_stable_partitions(&graph, &candidates, 0.0, 4.0, None).unwrap();
    assert!(stable.contains(&cliques));
    assert!(!stable.contains(&vec![0; 16]));

    let four = prune_to_stable_partitions(&graph, &candidates, 0.0, 4.0, Some(4)).unwrap();
    assert!(four.contains(&cliques));
    assert!(four.iter().all(|p| p.iter().max() == Some(&3)));
}

#[test]
fn pruning_is_idempotent() {
    let graph = ring_of_cliques();
    let once = prune_to_stable_partitions(&graph, &ring_candidates(), 0.0, 4.0, None).unwrap();
    let survivors: Vec<Vec<usize>> = once.iter().cloned().collect();
    let twice = prune_to_stable_partitions(&graph, &survivors, 0.0, 4.0, None).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn relabelled_duplicates_collapse() {
    let graph = two_triangles();
    let candidates = vec![
        vec![0, 0, 0, 1, 1, 1],
        vec![1, 1, 1, 0, 0, 0],
        vec![7, 7, 7, 3, 3, 3],
    ];
    let stable = prune_to_stable_partitions(&graph, &candidates, 0.0, 2.0, None).unwrap();
    assert_eq!(
        stable.into_iter().collect::<Vec<_>>(),
        vec![vec![0, 0, 0, 1, 1, 1]]
    );
}

#[test]
fn iterative_estimation_settles_on_ring_of_cliques() {
    let graph = ring_of_cliques();
    let candidates = ring_candidates();
    let ranges = ChampRanges.ranges(&graph, &candidates, 0.0, 4.0).unwrap();

    // the optimal candidate at γ stands in for a modularity heuristic
    let outcome = IterativeEstimation::new()
        .run(&graph, |gamma| {
            Ok(ranges
                .iter()
                .find(|r| r.contains(gamma))
                .map(|r| r.membership.clone())
                .unwrap_or_else(|| vec![0; 16]))
        })
        .unwrap();
    assert_eq!(
        canonical_membership(&outcome.membership),
        (0..16).map(|v| v / 4).collect::<Vec<_>>()
    );
    let expected = (48.0 / 14.0 - 8.0 / 42.0) / ((48.0f64 / 14.0).ln() - (8.0f64 / 42.0).ln());
    assert!((outcome.gamma - expected).abs() < 1e-12);
}
