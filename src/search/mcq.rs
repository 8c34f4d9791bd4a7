use std::time::Instant;

use tracing::info;

use crate::config::SearchConfig;
use crate::graph::{Graph, VertexId};
use crate::search::{Incumbent, SearchContext, SearchResult};
use crate::search::greedy_clique::greedy_clique;


/**
Combinatorial branch & bound for the maximum clique problem (MCQ).
Candidates are greedily colored; a candidate with color c can extend the current clique Q
to at most |Q| + c vertices, so the candidates are expanded by decreasing color and the
node is pruned as soon as |Q| + c <= |Q_max|.
*/
#[derive(Debug)]
pub struct CliqueColoringSearch<'g> {
    /// graph
    graph: &'g Graph,
}

impl<'g> CliqueColoringSearch<'g> {
    /** creates the search */
    pub fn new(graph:&'g Graph) -> Self { Self { graph } }

    /** greedily colors the candidates (in order). Returns the candidates sorted by
    non-decreasing color, and their colors (starting at 1) */
    fn color_sort(&self, candidates:&[VertexId]) -> (Vec<VertexId>, Vec<usize>) {
        let mut classes:Vec<Vec<VertexId>> = Vec::new();
        for v in candidates {
            let free = classes.iter_mut()
                .find(|c| c.iter().all(|u| !self.graph.are_adjacent(*u, *v)));
            match free {
                Some(c) => c.push(*v),
                None => classes.push(vec![*v]),
            }
        }
        let mut order = Vec::with_capacity(candidates.len());
        let mut colors = Vec::with_capacity(candidates.len());
        for (k, c) in classes.into_iter().enumerate() {
            for v in c {
                order.push(v);
                colors.push(k+1);
            }
        }
        (order, colors)
    }

    /// expands the clique with the candidates (sorted by color)
    fn expand(&self, ctx:&mut SearchContext<Vec<VertexId>>, clique:&mut Vec<VertexId>,
        candidates:&[VertexId], colors:&[usize]) {
        if !ctx.enter_node(clique.len()) { return; }
        for i in (0..candidates.len()).rev() {
            if clique.len() + colors[i] <= ctx.incumbent.size() {
                ctx.stats.nb_pruned += 1;
                return;
            }
            let v = candidates[i];
            clique.push(v);
            let next:Vec<VertexId> = candidates[..i].iter()
                .copied()
                .filter(|u| self.graph.are_adjacent(*u, v))
                .collect();
            if next.is_empty() {
                let size = clique.len();
                ctx.incumbent.offer_larger(clique.clone(), size);
            } else {
                let (order, next_colors) = self.color_sort(&next);
                self.expand(ctx, clique, &order, &next_colors);
            }
            clique.pop();
            if ctx.timed_out() { return; }
        }
    }

    /** runs the search from the given incumbent */
    pub fn solve(&self, initial:Vec<VertexId>, deadline:Option<Instant>, start:Instant) -> SearchResult<Vec<VertexId>> {
        let size = initial.len();
        let mut ctx = SearchContext::new(Incumbent::new(initial, size), deadline, start);
        info!(initial = size, "combinatorial clique search");
        let mut vertices:Vec<VertexId> = self.graph.nodes().collect();
        vertices.sort_by_key(|v| (std::cmp::Reverse(self.graph.degree(*v)), *v));
        let (order, colors) = self.color_sort(&vertices);
        let mut clique = Vec::new();
        self.expand(&mut ctx, &mut clique, &order, &colors);
        ctx.finish()
    }
}


/** finds a maximum clique with the coloring based branch & bound */
pub fn solve_mcq(graph:&Graph, config:&SearchConfig) -> SearchResult<Vec<VertexId>> {
    let start = Instant::now();
    let initial = if config.initial_clique_heuristic { greedy_clique(graph) } else { Vec::new() };
    CliqueColoringSearch::new(graph).solve(initial, config.deadline(start), start)
}
