//! Read-only weighted-graph access.
//!
//! Every estimator in this crate only needs three things from a graph: its
//! vertex count, its edges as `(source, target, weight)` triples, and (for
//! multilayer networks) a layer id per vertex. [`WeightedEdges`] is that
//! contract. It is implemented for any `petgraph::Graph` whose edge payload
//! implements [`EdgeWeight`], and for the plain [`EdgeList`].
//!
//! Edges without a weight (`()` or `None`) count as weight `1.0`. The graph
//! itself is never written to.
//!
//! Each stored edge is visited exactly once, whatever the graph's
//! `EdgeType`. A directed graph that stores both `u -> v` and `v -> u`
//! therefore carries twice the weight of its undirected counterpart; every
//! density ratio computed from it is unchanged.

use crate::error::{Error, Result};
use petgraph::graph::{Graph, IndexType};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;

/// Effective scalar weight of an edge payload.
pub trait EdgeWeight {
    /// Weight used by the estimators.
    fn weight(&self) -> f64;
}

impl EdgeWeight for () {
    fn weight(&self) -> f64 {
        1.0
    }
}

impl EdgeWeight for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}

impl EdgeWeight for f32 {
    fn weight(&self) -> f64 {
        f64::from(*self)
    }
}

impl EdgeWeight for u32 {
    fn weight(&self) -> f64 {
        f64::from(*self)
    }
}

impl EdgeWeight for usize {
    fn weight(&self) -> f64 {
        *self as f64
    }
}

impl<W: EdgeWeight> EdgeWeight for Option<W> {
    fn weight(&self) -> f64 {
        self.as_ref().map_or(1.0, EdgeWeight::weight)
    }
}

impl<W: EdgeWeight + ?Sized> EdgeWeight for &W {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

/// A graph viewed as a weighted edge list over vertices `0..vertex_count()`.
pub trait WeightedEdges {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Visit every edge once as `(source, target, weight)`.
    fn for_each_edge<F: FnMut(usize, usize, f64)>(&self, f: F);

    /// Sum of all edge weights.
    fn total_weight(&self) -> f64 {
        let mut m = 0.0;
        self.for_each_edge(|_, _, w| m += w);
        m
    }

    /// Collect the edges into a vector.
    fn weighted_edge_vec(&self) -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::new();
        self.for_each_edge(|i, j, w| edges.push((i, j, w)));
        edges
    }
}

impl<N, E, Ty, Ix> WeightedEdges for Graph<N, E, Ty, Ix>
where
    E: EdgeWeight,
    Ty: EdgeType,
    Ix: IndexType,
{
    fn vertex_count(&self) -> usize {
        self.node_count()
    }

    fn for_each_edge<F: FnMut(usize, usize, f64)>(&self, mut f: F) {
        for edge in self.edge_references() {
            f(
                edge.source().index(),
                edge.target().index(),
                EdgeWeight::weight(edge.weight()),
            );
        }
    }
}

impl<G: WeightedEdges + ?Sized> WeightedEdges for &G {
    fn vertex_count(&self) -> usize {
        (**self).vertex_count()
    }

    fn for_each_edge<F: FnMut(usize, usize, f64)>(&self, f: F) {
        (**self).for_each_edge(f)
    }
}

/// Minimal owned weighted edge list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeList {
    n: usize,
    edges: Vec<(usize, usize, f64)>,
}

impl EdgeList {
    /// Create an edge list with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            edges: Vec::new(),
        }
    }

    /// Build from `(source, target, weight)` triples.
    ///
    /// Fails if an endpoint is `>= n` or a weight is negative or not finite.
    pub fn from_edges(
        n: usize,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let mut list = Self::new(n);
        for (i, j, w) in edges {
            list.add_edge(i, j, w)?;
        }
        Ok(list)
    }

    /// Append one edge.
    pub fn add_edge(&mut self, source: usize, target: usize, weight: f64) -> Result<()> {
        if source >= self.n || target >= self.n {
            return Err(Error::InvalidParameter {
                name: "edges",
                message: "edge endpoint out of range",
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidParameter {
                name: "weight",
                message: "edge weights must be finite and non-negative",
            });
        }
        self.edges.push((source, target, weight));
        Ok(())
    }

    /// Number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl WeightedEdges for EdgeList {
    fn vertex_count(&self) -> usize {
        self.n
    }

    fn for_each_edge<F: FnMut(usize, usize, f64)>(&self, mut f: F) {
        for &(i, j, w) in &self.edges {
            f(i, j, w);
        }
    }
}

/// Number of layers implied by a layer-membership vector (`max + 1`).
pub fn layer_count(layer_vec: &[usize]) -> usize {
    layer_vec.iter().copied().max().map_or(0, |t| t + 1)
}

/// Vertex count of each layer.
pub fn nodes_per_layer(layer_vec: &[usize], n_layers: usize) -> Vec<usize> {
    let mut nt = vec![0; n_layers];
    for &layer in layer_vec {
        if layer < n_layers {
            nt[layer] += 1;
        }
    }
    nt
}

/// Total intralayer edge weight of each layer, attributed by source vertex.
pub fn layer_weights<G: WeightedEdges + ?Sized>(
    intralayer: &G,
    layer_vec: &[usize],
    n_layers: usize,
) -> Vec<f64> {
    let mut m_t = vec![0.0; n_layers];
    intralayer.for_each_edge(|i, _, w| {
        let layer = layer_vec[i];
        if layer < n_layers {
            m_t[layer] += w;
        }
    });
    m_t
}
