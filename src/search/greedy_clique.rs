use bit_set::BitSet;
use tracing::debug;

use crate::graph::{Graph, VertexId};

/** implements a greedy algorithm that finds a "large" size clique.
The algorithm chooses the vertex with the largest degree. It marks as "candidates" its neighbors.
Then, while the set of candidates is not empty, choose the candidate with the largest number of
neighbors among the candidates (ties: largest degree, then smallest index).
*/
pub fn greedy_clique(graph:&Graph) -> Vec<VertexId> {
    let mut candidates:BitSet = graph.nodes().collect();
    let mut res = Vec::new();
    loop {
        let best = candidates.iter().max_by(|a,b| {
            let da = graph.neighborhood(*a).intersection(&candidates).count();
            let db = graph.neighborhood(*b).intersection(&candidates).count();
            da.cmp(&db)
                .then_with(|| graph.degree(*a).cmp(&graph.degree(*b)))
                .then_with(|| b.cmp(a))
        });
        match best {
            None => break,
            Some(current_vertex) => {
                // insert the current vertex as part of the clique solution
                res.push(current_vertex);
                // keep only its neighbors as candidates
                candidates.intersect_with(graph.neighborhood(current_vertex));
            }
        }
    }
    debug!(size = res.len(), "greedy clique");
    res
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::color::check_clique;

    #[test]
    fn test_triangle_with_tail() {
        let g = Graph::from_edges(&[(1,2), (2,3), (1,3), (3,4)]);
        let sol = greedy_clique(&g);
        assert_eq!(sol.len(), 3);
        assert!(check_clique(&g, &sol).is_ok());
    }

    #[test]
    fn test_empty_graph() {
        assert!(greedy_clique(&Graph::new()).is_empty());
        let mut g = Graph::new();
        g.add_node(1);
        g.add_node(2);
        assert_eq!(greedy_clique(&g).len(), 1);
    }

    #[test]
    fn test_random_graphs_valid() {
        for seed in 0..10 {
            let g = Graph::random(40, 0.5, seed);
            let sol = greedy_clique(&g);
            assert!(!sol.is_empty());
            assert!(check_clique(&g, &sol).is_ok());
        }
    }
}
