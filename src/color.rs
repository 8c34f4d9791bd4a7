use std::collections::BTreeMap;

use bit_set::BitSet;
use serde::Serialize;

use crate::graph::{Graph, NodeLabel, VertexId};
use crate::independent_set::IndependentSet;
use crate::relaxation::{RelaxationOracle, VarHandle};


/** Solution of a graph coloring problem (represented as a partition).
classes[k]: vertices of color k (keys start at 1)
*/
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Coloring {
    /// color key -> vertices
    pub classes: BTreeMap<usize, Vec<VertexId>>,
}

impl Coloring {
    /// builds a coloring from a list of classes (keys 1..=k, empty classes dropped)
    pub fn from_classes(classes:Vec<Vec<VertexId>>) -> Self {
        let classes = classes.into_iter()
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(i,c)| (i+1, c))
            .collect();
        Self { classes }
    }

    /// number of colors
    pub fn nb_colors(&self) -> usize { self.classes.len() }

    /// classes expressed with node labels
    pub fn to_labels(&self, graph:&Graph) -> BTreeMap<usize, Vec<NodeLabel>> {
        self.classes.iter().map(|(k,c)| (*k, graph.labels_of(c))).collect()
    }

    /// classes as a vector of vectors
    pub fn to_vec(&self) -> Vec<Vec<VertexId>> {
        self.classes.values().cloned().collect()
    }
}


/// result of a checker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerResult {
    /// feasible solution (objective: nb colors or clique size)
    Ok(usize),
    /// vertex not colored
    NotColored(VertexId),
    /// vertex colored more than once
    ColoredTwice(VertexId),
    /// two adjacent vertices share a color
    Conflict(VertexId, VertexId),
    /// two non-adjacent vertices in a clique
    NotAdjacent(VertexId, VertexId),
    /// vertex that does not belong to the graph
    UnknownVertex(VertexId),
}

impl CheckerResult {
    /// true iff the solution is feasible
    pub fn is_ok(&self) -> bool { matches!(self, CheckerResult::Ok(_)) }
}


/**
returns Ok(nb colors) if the coloring is a partition of the vertices into independent sets,
the reason of the infeasibility otherwise
*/
pub fn check_coloring(graph:&Graph, coloring:&Coloring) -> CheckerResult {
    // check that all vertices are added exactly once
    let n = graph.nb_vertices();
    let mut visited = BitSet::with_capacity(n);
    for c in coloring.classes.values() {
        for v in c {
            if *v >= n { return CheckerResult::UnknownVertex(*v); }
            if visited.contains(*v) { return CheckerResult::ColoredTwice(*v); }
            visited.insert(*v);
        }
    }
    if let Some(v) = graph.nodes().find(|v| !visited.contains(*v)) {
        return CheckerResult::NotColored(v);
    }
    // check conflicts
    for c in coloring.classes.values() {
        for (i,v1) in c.iter().enumerate() {
            for v2 in &c[i+1..] {
                if graph.are_adjacent(*v1, *v2) { return CheckerResult::Conflict(*v1, *v2); }
            }
        }
    }
    CheckerResult::Ok(coloring.nb_colors())
}

/**
returns Ok(clique size) if the vertices are pairwise adjacent,
the first non-adjacent pair otherwise
*/
pub fn check_clique(graph:&Graph, clique:&[VertexId]) -> CheckerResult {
    let n = graph.nb_vertices();
    if let Some(v) = clique.iter().find(|v| **v >= n) {
        return CheckerResult::UnknownVertex(*v);
    }
    for (i,u) in clique.iter().enumerate() {
        for v in &clique[i+1..] {
            if u == v { return CheckerResult::ColoredTwice(*u); }
            if !graph.are_adjacent(*u, *v) { return CheckerResult::NotAdjacent(*u, *v); }
        }
    }
    CheckerResult::Ok(clique.len())
}

/// true iff x is within eps of 1
pub fn is_one(x:f64, eps:f64) -> bool { (x - 1.).abs() <= eps }

/// true iff x is within eps of an integer
pub fn is_integral(x:f64, eps:f64) -> bool { (x - x.round()).abs() <= eps }

/// vertices whose selection variable is (approximately) 1
pub fn extract_clique<O: RelaxationOracle + ?Sized>(oracle:&O, vars:&[VarHandle], eps:f64) -> Vec<VertexId> {
    vars.iter().enumerate()
        .filter(|(_,x)| is_one(oracle.value_of(**x), eps))
        .map(|(v,_)| v)
        .collect()
}

/// indices of the columns whose variable is (approximately) 1
pub fn extract_cover<O: RelaxationOracle + ?Sized>(oracle:&O, vars:&[VarHandle], eps:f64) -> Vec<usize> {
    vars.iter().enumerate()
        .filter(|(_,x)| is_one(oracle.value_of(**x), eps))
        .map(|(i,_)| i)
        .collect()
}

/** turns a cover by independent sets into a partition: each vertex stays in the first set
containing it. Vertices covered by no set are returned as singletons (never happens for a
solution of the covering model).
*/
pub fn cover_to_coloring(graph:&Graph, sets:&[&IndependentSet]) -> Coloring {
    let mut assigned = BitSet::with_capacity(graph.nb_vertices());
    let mut classes = Vec::with_capacity(sets.len());
    for s in sets {
        let mut class = Vec::with_capacity(s.len());
        for v in s.members() {
            if !assigned.contains(*v) {
                assigned.insert(*v);
                class.push(*v);
            }
        }
        classes.push(class);
    }
    for v in graph.nodes() {
        if !assigned.contains(v) { classes.push(vec![v]); }
    }
    Coloring::from_classes(classes)
}
