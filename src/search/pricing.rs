use std::collections::HashSet;

use bit_set::BitSet;
use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::graph::{Graph, VertexId};
use crate::independent_set::Fingerprint;


/// result of a pricing round
#[derive(Debug, Clone, Default)]
pub struct PricingOutcome {
    /// independent sets of weight > 1 + ε (sorted vertices)
    pub sets: Vec<Vec<VertexId>>,
    /// true iff it is proven that no admissible set of weight > 1 + ε exists
    pub exhausted: bool,
    /// true if the exact search ran
    pub used_exact: bool,
}


/** finds independent sets of weight larger than 1 + ε (maximum weight independent set pricing).
 - greedy weighted pass, started from several seeds
 - exact depth-first branch & bound (remaining weight bound) when the greedy finds nothing
Sets rejected by the `excluded` predicate are never returned.
*/
#[derive(Debug)]
pub struct PricingSolver<'g> {
    /// graph
    graph: &'g Graph,
    /// tolerance
    epsilon: f64,
    /// maximum number of sets returned by the greedy pass
    max_sets: usize,
    /// if true, run the exact search when the greedy fails
    exact: bool,
    /// node limit of the exact search
    node_limit: usize,
}

impl<'g> PricingSolver<'g> {
    /** creates a pricing solver for a graph */
    pub fn new(graph:&'g Graph, config:&SearchConfig) -> Self {
        Self {
            graph,
            epsilon: config.epsilon,
            max_sets: config.max_pricing_sets,
            exact: config.exact_pricing,
            node_limit: config.exact_pricing_node_limit,
        }
    }

    /// a set is improving iff its weight exceeds this value
    pub fn threshold(&self) -> f64 { 1. + self.epsilon }

    /// runs the greedy pass, then the exact search if needed
    pub fn price(&self, weights:&[f64], excluded:&dyn Fn(&Fingerprint) -> bool) -> PricingOutcome {
        let sets = self.greedy(weights, excluded);
        if !sets.is_empty() || !self.exact {
            return PricingOutcome { sets, exhausted: false, used_exact: false };
        }
        let (best, complete) = self.exact(weights, excluded);
        match best {
            Some(s) => PricingOutcome { sets: vec![s], exhausted: false, used_exact: true },
            None => PricingOutcome { sets: Vec::new(), exhausted: complete, used_exact: true },
        }
    }

    /// vertices of positive weight, sorted by decreasing weight (ties: smallest index)
    fn positive_order(&self, weights:&[f64]) -> Vec<VertexId> {
        let mut res:Vec<VertexId> = self.graph.nodes().filter(|v| weights[*v] > self.epsilon).collect();
        res.sort_by_key(|v| (std::cmp::Reverse(OrderedFloat(weights[*v])), *v));
        res
    }

    /// adds the zero weight vertices compatible with the set
    fn extend_with_zero_weights(&self, set:&[VertexId], weights:&[f64]) -> Vec<VertexId> {
        let mut forbidden = BitSet::with_capacity(self.graph.nb_vertices());
        for v in set {
            forbidden.insert(*v);
            forbidden.union_with(self.graph.neighborhood(*v));
        }
        let mut res = set.to_vec();
        for v in self.graph.nodes() {
            if weights[v] <= self.epsilon && !forbidden.contains(v) {
                res.push(v);
                forbidden.insert(v);
                forbidden.union_with(self.graph.neighborhood(v));
            }
        }
        res.sort_unstable();
        res
    }

    /** returns an admissible set made of the support and zero weight vertices, if any.
    The maximal extension is tried first, then the zero weight completions of the support
    (depth first, each completion once) until one is not excluded.
    */
    fn admissible(&self, support:&[VertexId], weights:&[f64], excluded:&dyn Fn(&Fingerprint) -> bool)
    -> Option<Vec<VertexId>> {
        let extended = self.extend_with_zero_weights(support, weights);
        if !excluded(&Fingerprint::of(&extended)) {
            return Some(extended);
        }
        let mut forbidden = BitSet::with_capacity(self.graph.nb_vertices());
        for v in support {
            forbidden.insert(*v);
            forbidden.union_with(self.graph.neighborhood(*v));
        }
        let zeros:Vec<VertexId> = self.graph.nodes()
            .filter(|v| weights[*v] <= self.epsilon && !forbidden.contains(*v))
            .collect();
        let mut current = support.to_vec();
        self.complete(&zeros, 0, &mut current, &forbidden, excluded)
    }

    /// zero weight completions of `current` using the candidates from position `pos`.
    /// Every visited completion but the returned one is excluded.
    fn complete(&self, zeros:&[VertexId], pos:usize, current:&mut Vec<VertexId>, forbidden:&BitSet,
        excluded:&dyn Fn(&Fingerprint) -> bool) -> Option<Vec<VertexId>> {
        let fp = Fingerprint::of(current);
        if !excluded(&fp) {
            return Some(fp.vertices().to_vec());
        }
        for (i,v) in zeros.iter().enumerate().skip(pos) {
            if forbidden.contains(*v) { continue; }
            let mut next_forbidden = forbidden.clone();
            next_forbidden.insert(*v);
            next_forbidden.union_with(self.graph.neighborhood(*v));
            current.push(*v);
            let res = self.complete(zeros, i+1, current, &next_forbidden, excluded);
            current.pop();
            if res.is_some() { return res; }
        }
        None
    }

    /** greedy weighted pass. For each seed (by decreasing weight), builds a set starting from
    the seed then adding the heaviest compatible vertices. Returns up to `max_sets` distinct
    admissible sets of weight > 1 + ε.
    */
    pub fn greedy(&self, weights:&[f64], excluded:&dyn Fn(&Fingerprint) -> bool) -> Vec<Vec<VertexId>> {
        let order = self.positive_order(weights);
        let mut res = Vec::new();
        let mut seen:HashSet<Fingerprint> = HashSet::new();
        for seed in &order {
            if res.len() >= self.max_sets { break; }
            let mut chosen = vec![*seed];
            let mut forbidden = self.graph.neighborhood(*seed).clone();
            forbidden.insert(*seed);
            for v in &order {
                if !forbidden.contains(*v) {
                    chosen.push(*v);
                    forbidden.insert(*v);
                    forbidden.union_with(self.graph.neighborhood(*v));
                }
            }
            let weight:f64 = chosen.iter().map(|v| weights[*v]).sum();
            if weight <= self.threshold() { continue; }
            if let Some(set) = self.admissible(&chosen, weights, excluded) {
                if seen.insert(Fingerprint::of(&set)) {
                    trace!(weight, size = set.len(), "greedy pricing set");
                    res.push(set);
                }
            }
        }
        res
    }

    /** exact maximum weight independent set among admissible sets of weight > 1 + ε.
    Returns the best set found and true if the search was complete (node limit not reached).
    */
    pub fn exact(&self, weights:&[f64], excluded:&dyn Fn(&Fingerprint) -> bool) -> (Option<Vec<VertexId>>, bool) {
        let order = self.positive_order(weights);
        let mut search = ExactSearch {
            pricing: self,
            graph: self.graph,
            weights,
            order,
            excluded,
            threshold: self.threshold(),
            best: None,
            nb_nodes: 0,
            node_limit: self.node_limit,
            aborted: false,
        };
        let mut chosen = Vec::new();
        let forbidden = BitSet::with_capacity(self.graph.nb_vertices());
        search.dfs(0, &mut chosen, 0., &forbidden);
        debug!(
            nodes = search.nb_nodes,
            aborted = search.aborted,
            found = search.best.is_some(),
            "exact pricing"
        );
        (search.best.map(|(_, s)| s), !search.aborted)
    }
}


/// state of the exact pricing search
struct ExactSearch<'a> {
    pricing: &'a PricingSolver<'a>,
    graph: &'a Graph,
    weights: &'a [f64],
    /// positive weight vertices, by decreasing weight
    order: Vec<VertexId>,
    excluded: &'a dyn Fn(&Fingerprint) -> bool,
    threshold: f64,
    /// best admissible set (weight of its support, vertices with the zero weight completion)
    best: Option<(f64, Vec<VertexId>)>,
    nb_nodes: usize,
    node_limit: usize,
    aborted: bool,
}

impl<'a> ExactSearch<'a> {
    /// value a set has to exceed to be recorded
    fn target(&self) -> f64 {
        match &self.best {
            None => self.threshold,
            Some((w,_)) => w.max(self.threshold),
        }
    }

    fn dfs(&mut self, pos:usize, chosen:&mut Vec<VertexId>, weight:f64, forbidden:&BitSet) {
        if self.aborted { return; }
        self.nb_nodes += 1;
        if self.nb_nodes > self.node_limit {
            self.aborted = true;
            return;
        }
        if weight > self.target() {
            if let Some(set) = self.pricing.admissible(chosen, self.weights, self.excluded) {
                self.best = Some((weight, set));
            }
        }
        if pos == self.order.len() { return; }
        // remaining weight bound
        let remaining:f64 = self.order[pos..].iter()
            .filter(|v| !forbidden.contains(**v))
            .map(|v| self.weights[*v])
            .sum();
        if weight + remaining <= self.target() { return; }
        let v = self.order[pos];
        if !forbidden.contains(v) {
            let mut next_forbidden = forbidden.clone();
            next_forbidden.insert(v);
            next_forbidden.union_with(self.graph.neighborhood(v));
            chosen.push(v);
            self.dfs(pos+1, chosen, weight + self.weights[v], &next_forbidden);
            chosen.pop();
        }
        self.dfs(pos+1, chosen, weight, forbidden);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn never(_:&Fingerprint) -> bool { false }

    fn config() -> SearchConfig { SearchConfig::default() }

    #[test]
    fn test_greedy_finds_heavy_set() {
        // path 1-2-3: {1,3} has weight 1.2
        let g = Graph::from_edges(&[(1,2), (2,3)]);
        let conf = config();
        let p = PricingSolver::new(&g, &conf);
        let sets = p.greedy(&[0.6, 0.5, 0.6], &never);
        assert_eq!(sets[0], vec![0,2]);
        assert!(sets.iter().all(|s| s.iter().map(|v| [0.6, 0.5, 0.6][*v]).sum::<f64>() > 1.));
    }

    #[test]
    fn test_nothing_within_epsilon() {
        let g = Graph::from_edges(&[(1,2), (2,3)]);
        let conf = config();
        let p = PricingSolver::new(&g, &conf);
        let out = p.price(&[0.5, 0.5, 0.50004], &never);
        assert!(out.sets.is_empty());
        assert!(out.exhausted);
    }

    #[test]
    fn test_extension_with_zero_weights() {
        // 4 is isolated with weight 0, it is added to the column
        let mut g = Graph::from_edges(&[(1,2), (2,3)]);
        g.add_node(4);
        let conf = config();
        let p = PricingSolver::new(&g, &conf);
        let sets = p.greedy(&[0.6, 0.5, 0.6, 0.], &never);
        assert_eq!(sets[0], vec![0,2,3]);
    }

    #[test]
    fn test_excluded_sets_are_skipped() {
        // C4: {1,3} and {2,4} are the only maximal independent sets
        let g = Graph::from_edges(&[(1,2), (2,3), (3,4), (4,1)]);
        let conf = config();
        let p = PricingSolver::new(&g, &conf);
        let weights = [0.7, 0.6, 0.7, 0.6];
        let first = Fingerprint::of(&[0,2]);
        let excluded = |f:&Fingerprint| *f == first;
        let out = p.price(&weights, &excluded);
        assert_eq!(out.sets, vec![vec![1,3]]);
        let both = |f:&Fingerprint| *f == first || *f == Fingerprint::of(&[1,3]);
        let out = p.price(&weights, &both);
        assert!(out.sets.is_empty());
        assert!(out.exhausted);
    }

    #[test]
    fn test_other_zero_weight_completion() {
        // 1 and 2 isolated (weight 0.6), edge 3-4 (weight 0)
        // {1,2} and {1,2,3} are excluded, {1,2,4} is still improving
        let mut g = Graph::new();
        g.add_node(1);
        g.add_node(2);
        g.add_edge(3, 4);
        let conf = config();
        let p = PricingSolver::new(&g, &conf);
        let weights = [0.6, 0.6, 0., 0.];
        let excluded = |f:&Fingerprint| *f == Fingerprint::of(&[0,1]) || *f == Fingerprint::of(&[0,1,2]);
        assert_eq!(p.greedy(&weights, &excluded), vec![vec![0,1,3]]);
        let (best, complete) = p.exact(&weights, &excluded);
        assert!(complete);
        assert_eq!(best, Some(vec![0,1,3]));
        let conf = SearchConfig { max_pricing_sets: 0, ..config() };
        let out = PricingSolver::new(&g, &conf).price(&weights, &excluded);
        assert_eq!(out.sets, vec![vec![0,1,3]]);
        assert!(!out.exhausted);
        // every completion excluded: nothing left
        let all = |f:&Fingerprint| excluded(f) || *f == Fingerprint::of(&[0,1,3]);
        let out = PricingSolver::new(&g, &conf).price(&weights, &all);
        assert!(out.sets.is_empty());
        assert!(out.exhausted);
    }

    #[test]
    fn test_star_leaves() {
        // star: center 1 (weight 0.9) with leaves 2,3,4 (weight 0.4 each)
        // the center alone is not improving, the leaves give 1.2
        let g = Graph::from_edges(&[(1,2), (1,3), (1,4)]);
        let conf = SearchConfig { max_pricing_sets: 1, ..config() };
        let p = PricingSolver::new(&g, &conf);
        let weights = [0.9, 0.4, 0.4, 0.4];
        assert_eq!(p.greedy(&weights, &never), vec![vec![1,2,3]]);
        let (best, complete) = p.exact(&weights, &never);
        assert!(complete);
        assert_eq!(best, Some(vec![1,2,3]));
    }

    #[test]
    fn test_exact_optimal_on_random_graphs() {
        // compares the exact search with a brute force enumeration
        for seed in 0..5 {
            let g = Graph::random(12, 0.4, seed);
            let rng = fastrand::Rng::with_seed(seed + 100);
            let weights:Vec<f64> = g.nodes().map(|_| rng.f64() * 0.6).collect();
            let n = g.nb_vertices();
            let mut best = 0.;
            for mask in 0u32..(1 << n) {
                let set:Vec<usize> = (0..n).filter(|v| mask & (1 << v) != 0).collect();
                let independent = set.iter().all(|u| set.iter().all(|v| !g.are_adjacent(*u, *v)));
                if independent {
                    let w:f64 = set.iter().map(|v| weights[*v]).sum();
                    if w > best { best = w; }
                }
            }
            let conf = config();
            let p = PricingSolver::new(&g, &conf);
            let (found, complete) = p.exact(&weights, &never);
            assert!(complete);
            match found {
                Some(s) => {
                    let w:f64 = s.iter().map(|v| weights[*v]).sum();
                    assert!((w - best).abs() < 1e-9);
                }
                None => assert!(best <= p.threshold()),
            }
        }
    }

    #[test]
    fn test_node_limit() {
        let g = Graph::random(30, 0.1, 3);
        let conf = SearchConfig { exact_pricing_node_limit: 10, ..config() };
        let p = PricingSolver::new(&g, &conf);
        let weights = vec![0.2 ; 30];
        let (_, complete) = p.exact(&weights, &never);
        assert!(!complete);
        let conf = SearchConfig { exact_pricing_node_limit: 10, max_pricing_sets: 0, ..config() };
        let p = PricingSolver::new(&g, &conf);
        assert!(!p.price(&weights, &never).exhausted);
    }
}
