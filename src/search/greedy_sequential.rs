use std::cmp::Reverse;

use bit_set::BitSet;
use priority_queue::PriorityQueue;
use tracing::debug;

use crate::color::Coloring;
use crate::graph::{Graph, VertexId};
use crate::independent_set::IndependentSet;


/// output of the sequential greedy coloring
#[derive(Debug, Clone)]
pub struct SequentialColoring {
    /// color classes after the extension pass (keys 1..=k). They may overlap.
    pub classes: Vec<IndependentSet>,
    /// proper coloring before the extension pass
    pub partition: Coloring,
}

impl SequentialColoring {
    /// number of colors used (upper bound on the chromatic number)
    pub fn nb_colors(&self) -> usize { self.classes.len() }
}


/** implements a greedy sequential coloring. That colors vertices one at a time
    1. chooses the uncolored vertex with the fewest uncolored neighbors (ties: smallest index)
    2. assigns it the first color whose vertices are all non-adjacent to it
    3. opens a new color if none is available
then an extension pass: color k absorbs every vertex of the colors 1..k-1 that has no
neighbor in color k (colors are considered in increasing order).
*/
pub fn greedy_sequential(graph:&Graph) -> SequentialColoring {
    let n = graph.nb_vertices();
    let mut remaining_vertices:PriorityQueue<VertexId, Reverse<(usize, VertexId)>> = PriorityQueue::new();
    let mut nb_uncolored_neighbors:Vec<usize> = graph.nodes().map(|v| graph.degree(v)).collect();
    for v in graph.nodes() {
        remaining_vertices.push(v, Reverse((nb_uncolored_neighbors[v], v)));
    }
    let mut colors:Vec<Option<usize>> = vec![None ; n]; // colors[v] -> color assigned to vertex v
    let mut adj_colors:Vec<BitSet> = vec![BitSet::default() ; n]; // adj_colors[v] -> colors v sees
    let mut classes:Vec<Vec<VertexId>> = Vec::new();
    while let Some((current_vertex, _)) = remaining_vertices.pop() {
        // assign it a color
        let mut color:usize = 0;
        while adj_colors[current_vertex].contains(color) { color += 1; }
        if color == classes.len() { classes.push(Vec::new()); }
        classes[color].push(current_vertex);
        colors[current_vertex] = Some(color);
        // update the neighbors
        for w in graph.neighbors(current_vertex) {
            adj_colors[*w].insert(color);
            if colors[*w].is_none() {
                nb_uncolored_neighbors[*w] -= 1;
                remaining_vertices.change_priority(w, Reverse((nb_uncolored_neighbors[*w], *w)));
            }
        }
    }
    // extension pass
    let mut extended = Vec::with_capacity(classes.len());
    for (k, class) in classes.iter().enumerate() {
        let mut set = IndependentSet::new(k+1, graph, class);
        let nb_absorbed = set.extend(graph, classes[..k].iter().flatten().copied());
        if nb_absorbed > 0 {
            debug!(class = k+1, nb_absorbed, "extension pass");
        }
        extended.push(set);
    }
    debug!(nb_colors = classes.len(), "greedy sequential coloring");
    SequentialColoring {
        classes: extended,
        partition: Coloring::from_classes(classes),
    }
}
