use std::collections::HashMap;

use bit_set::BitSet;
use tracing::info;

/** Vertex Id (index of the vertex in insertion order) */
pub type VertexId = usize;

/** identity of a node as given by the input (DIMACS ids start at 1) */
pub type NodeLabel = usize;

/** models an undirected simple graph.
Nodes are stored in first-seen order. Adjacency is symmetric and loop-free.
The node set only grows.
*/
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// labels[v]: input identity of vertex v
    labels: Vec<NodeLabel>,
    /// index[l]: vertex of label l
    index: HashMap<NodeLabel, VertexId>,
    /// adj_list[v]: list of vertices adjacent to v
    adj_list: Vec<Vec<VertexId>>,
    /// adj_matrix[v]: bitset of the neighbors of v
    adj_matrix: Vec<BitSet>,
    /// nb edges
    m: usize,
}

impl Graph {
    /// creates an empty graph
    pub fn new() -> Self { Self::default() }

    /// builds a graph from an edge list (given as labels)
    pub fn from_edges(edges:&[(NodeLabel, NodeLabel)]) -> Self {
        let mut res = Self::new();
        for (u,v) in edges {
            res.add_edge(*u, *v);
        }
        res
    }

    /// complete graph on labels 1..=n
    pub fn complete(n:usize) -> Self {
        let mut res = Self::new();
        for u in 1..=n {
            res.add_node(u);
            for v in 1..u {
                res.add_edge(v, u);
            }
        }
        res
    }

    /** random graph on labels 1..=n, each pair is an edge with probability `density`.
    Deterministic for a given seed.
    */
    pub fn random(n:usize, density:f64, seed:u64) -> Self {
        let rng = fastrand::Rng::with_seed(seed);
        let mut res = Self::new();
        for u in 1..=n {
            res.add_node(u);
        }
        for u in 1..=n {
            for v in u+1..=n {
                if rng.f64() < density {
                    res.add_edge(u, v);
                }
            }
        }
        res
    }

    /// returns the vertex of a label, creating it if needed
    pub fn add_node(&mut self, label:NodeLabel) -> VertexId {
        if let Some(v) = self.index.get(&label) {
            return *v;
        }
        let v = self.labels.len();
        self.labels.push(label);
        self.index.insert(label, v);
        self.adj_list.push(Vec::new());
        self.adj_matrix.push(BitSet::new());
        v
    }

    /** links u and v (creating them if needed). Adding an existing edge does nothing,
    a self loop only registers the node.
    */
    pub fn add_edge(&mut self, u:NodeLabel, v:NodeLabel) {
        let a = self.add_node(u);
        let b = self.add_node(v);
        if a == b || self.adj_matrix[a].contains(b) {
            return;
        }
        self.adj_list[a].push(b);
        self.adj_list[b].push(a);
        self.adj_matrix[a].insert(b);
        self.adj_matrix[b].insert(a);
        self.m += 1;
    }

    /// number of vertices
    pub fn nb_vertices(&self) -> usize { self.labels.len() }

    /// number of edges
    pub fn nb_edges(&self) -> usize { self.m }

    /// all vertices, in insertion order
    pub fn nodes(&self) -> std::ops::Range<VertexId> { 0..self.nb_vertices() }

    /// list of vertices adjacent to v
    pub fn neighbors(&self, v:VertexId) -> &[VertexId] { &self.adj_list[v] }

    /// bitset of the vertices adjacent to v
    pub fn neighborhood(&self, v:VertexId) -> &BitSet { &self.adj_matrix[v] }

    /// degree of v
    pub fn degree(&self, v:VertexId) -> usize { self.adj_list[v].len() }

    /// returns if a and b are adjacent (O(1))
    pub fn are_adjacent(&self, a:VertexId, b:VertexId) -> bool {
        self.adj_matrix[a].contains(b)
    }

    /// vertex corresponding to a label
    pub fn index_of(&self, label:NodeLabel) -> Option<VertexId> {
        self.index.get(&label).copied()
    }

    /// label of a vertex
    pub fn label(&self, v:VertexId) -> NodeLabel { self.labels[v] }

    /// converts vertices to labels
    pub fn labels_of(&self, vertices:&[VertexId]) -> Vec<NodeLabel> {
        vertices.iter().map(|v| self.labels[*v]).collect()
    }

    /// edge list (u < v)
    pub fn edges(&self) -> Vec<(VertexId,VertexId)> {
        let mut res = Vec::with_capacity(self.m);
        for (u,l) in self.adj_list.iter().enumerate() {
            for v in l {
                if u < *v { res.push((u,*v)); }
            }
        }
        res
    }

    /// logs statistics of the graph
    pub fn display_statistics(&self) {
        let min_degree = self.nodes().map(|v| self.degree(v)).min().unwrap_or(0);
        let max_degree = self.nodes().map(|v| self.degree(v)).max().unwrap_or(0);
        info!(
            vertices = self.nb_vertices(),
            edges = self.nb_edges(),
            min_degree,
            max_degree,
            "graph statistics"
        );
    }
}
