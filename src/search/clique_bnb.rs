use std::time::Instant;

use ordered_float::OrderedFloat;
use tracing::{debug, info, trace, warn};

use crate::color::{check_clique, extract_clique, is_integral};
use crate::config::SearchConfig;
use crate::graph::{Graph, VertexId};
use crate::relaxation::{ModelScope, RelaxationOracle, Relation, Sense, SolveStatus, Term, VarHandle};
use crate::search::{Incumbent, SearchContext, SearchResult};
use crate::search::greedy_clique::greedy_clique;
use crate::search::greedy_sequential::greedy_sequential;
use crate::search::pricing::PricingSolver;


/**
LP based branch & bound for the maximum clique problem.

model: max Σ x_v, x_v ∈ [0,1]
 - root: Σ_{v ∈ S} x_v <= 1 for each color class S of the greedy coloring (|S| >= 2)
 - integral solution that is not a clique: x_u + x_v <= 1 for its non-adjacent pairs
 - fractional solution: independent set cuts separated by the pricing solver
 - otherwise, branch on the fractional variable with the largest value (x_v = 1 first)
*/
#[derive(Debug)]
pub struct CliqueBranchAndBound<'g> {
    /// graph
    graph: &'g Graph,
    /// parameters
    config: SearchConfig,
    /// vars[v]: selection variable of v
    vars: Vec<VarHandle>,
    /// independent set separation
    separator: PricingSolver<'g>,
}

impl<'g> CliqueBranchAndBound<'g> {
    /** creates the selection variables and the objective in the oracle */
    pub fn new<O: RelaxationOracle + ?Sized>(graph:&'g Graph, oracle:&mut O, config:SearchConfig) -> Self {
        let vars:Vec<VarHandle> = graph.nodes()
            .map(|v| oracle.add_variable(0., 1., &format!("x_{}", graph.label(v))))
            .collect();
        let objective:Vec<Term> = vars.iter().map(|x| (1., *x)).collect();
        oracle.set_objective(Sense::Maximize, &objective);
        let separator = PricingSolver::new(graph, &config);
        Self { graph, config, vars, separator }
    }

    /** runs the search. The oracle is left without constraints when it returns. */
    pub fn solve<O: RelaxationOracle + ?Sized>(&self, oracle:&mut O) -> SearchResult<Vec<VertexId>> {
        let start = Instant::now();
        let initial = if self.config.initial_clique_heuristic {
            greedy_clique(self.graph)
        } else { Vec::new() };
        let size = initial.len();
        let mut ctx = SearchContext::new(Incumbent::new(initial, size), self.config.deadline(start), start);
        info!(initial = size, "clique branch & bound");
        if self.graph.nb_vertices() == 0 {
            return ctx.finish();
        }
        let mut root = ModelScope::new(oracle);
        let nb_root = self.add_root_constraints(&mut root);
        debug!(nb_root, "root constraints");
        self.explore(&mut *root, &mut ctx, 0);
        ctx.finish()
    }

    /// independent set constraints from the greedy coloring, and non-edges if required
    fn add_root_constraints<O: RelaxationOracle + ?Sized>(&self, root:&mut ModelScope<O>) -> usize {
        let coloring = greedy_sequential(self.graph);
        for class in coloring.classes.iter().filter(|c| c.len() >= 2) {
            let terms:Vec<Term> = class.members().iter().map(|v| (1., self.vars[*v])).collect();
            root.add_scoped_constraint(&terms, Relation::LessEq, 1.);
        }
        if self.config.eager_pair_constraints {
            for u in self.graph.nodes() {
                for v in u+1..self.graph.nb_vertices() {
                    if !self.graph.are_adjacent(u, v) {
                        root.add_scoped_constraint(
                            &[(1., self.vars[u]), (1., self.vars[v])], Relation::LessEq, 1.
                        );
                    }
                }
            }
        }
        root.nb_owned()
    }

    /// non-adjacent pairs among the selected vertices
    fn missing_edges(&self, selected:&[VertexId]) -> Vec<(VertexId, VertexId)> {
        let mut res = Vec::new();
        for (i,u) in selected.iter().enumerate() {
            for v in &selected[i+1..] {
                if !self.graph.are_adjacent(*u, *v) { res.push((*u, *v)); }
            }
        }
        res
    }

    /// explores a search tree node. Constraints added here are removed on return.
    fn explore<O: RelaxationOracle + ?Sized>(&self, oracle:&mut O, ctx:&mut SearchContext<Vec<VertexId>>, depth:usize) {
        if !ctx.enter_node(depth) { return; }
        let eps = self.config.epsilon;
        let mut scope = ModelScope::new(oracle);
        loop {
            ctx.stats.nb_solves += 1;
            let z = match scope.solve() {
                Ok(SolveStatus::Optimal(z)) => z,
                Ok(SolveStatus::Infeasible) => {
                    trace!(depth, "infeasible node");
                    ctx.stats.nb_pruned += 1;
                    return;
                }
                Err(e) => {
                    warn!(depth, error = %e, "relaxation failure, node pruned");
                    ctx.stats.nb_oracle_faults += 1;
                    ctx.stats.nb_unproven += 1;
                    ctx.stats.nb_pruned += 1;
                    return;
                }
            };
            // bound
            if (z + eps).floor() <= ctx.incumbent.size() as f64 {
                trace!(depth, z, "bound prune");
                ctx.stats.nb_pruned += 1;
                return;
            }
            let values:Vec<f64> = self.vars.iter().map(|x| scope.value_of(*x)).collect();
            if values.iter().all(|x| is_integral(*x, eps)) {
                let selected = extract_clique(&*scope, &self.vars, eps);
                let missing = self.missing_edges(&selected);
                if missing.is_empty() {
                    let size = selected.len();
                    assert!(check_clique(self.graph, &selected).is_ok(), "accepted an invalid clique");
                    ctx.incumbent.offer_larger(selected, size);
                    return;
                }
                trace!(depth, nb = missing.len(), "pair cuts");
                for (u,v) in missing {
                    scope.add_scoped_constraint(&[(1., self.vars[u]), (1., self.vars[v])], Relation::LessEq, 1.);
                    ctx.stats.nb_cuts += 1;
                }
                continue;
            }
            // independent set separation
            let separation = self.separator.price(&values, &|_| false);
            if separation.used_exact { ctx.stats.nb_exact_pricing += 1; }
            if !separation.sets.is_empty() {
                trace!(depth, nb = separation.sets.len(), "independent set cuts");
                for s in &separation.sets {
                    let terms:Vec<Term> = s.iter().map(|v| (1., self.vars[*v])).collect();
                    scope.add_scoped_constraint(&terms, Relation::LessEq, 1.);
                    ctx.stats.nb_cuts += 1;
                }
                continue;
            }
            // branching
            let branch_var = self.graph.nodes()
                .filter(|v| !is_integral(values[*v], eps))
                .max_by_key(|v| (OrderedFloat(values[*v]), std::cmp::Reverse(*v)));
            let v = match branch_var {
                Some(v) => v,
                None => unreachable!("fractional solution without fractional variable"),
            };
            debug!(depth, var = scope.name_of(self.vars[v]), value = values[v], z, "branching");
            for (relation, rhs) in &[(Relation::GreaterEq, 1.), (Relation::LessEq, 0.)] {
                let mut child = ModelScope::new(&mut *scope);
                child.add_scoped_constraint(&[(1., self.vars[v])], *relation, *rhs);
                self.explore(&mut *child, ctx, depth+1);
                if ctx.timed_out() { break; }
            }
            return;
        }
    }
}


/** finds a maximum clique with the LP based branch & bound */
pub fn solve_clique<O: RelaxationOracle + ?Sized>(graph:&Graph, oracle:&mut O, config:&SearchConfig) -> SearchResult<Vec<VertexId>> {
    let bnb = CliqueBranchAndBound::new(graph, oracle, config.clone());
    bnb.solve(oracle)
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::dimacs;
    use crate::relaxation::{ConstraintHandle, LpOracle, OracleError};
    use crate::search::mcq::solve_mcq;

    /// model whose solver always fails
    #[derive(Debug, Default)]
    struct FailingOracle {
        model: LpOracle,
    }

    impl RelaxationOracle for FailingOracle {
        fn add_variable(&mut self, lb:f64, ub:f64, name:&str) -> VarHandle { self.model.add_variable(lb, ub, name) }
        fn set_objective(&mut self, sense:Sense, terms:&[Term]) { self.model.set_objective(sense, terms) }
        fn add_constraint(&mut self, terms:&[Term], relation:Relation, rhs:f64) -> ConstraintHandle {
            self.model.add_constraint(terms, relation, rhs)
        }
        fn remove_constraint(&mut self, constraint:ConstraintHandle) { self.model.remove_constraint(constraint) }
        fn set_coefficient(&mut self, constraint:ConstraintHandle, var:VarHandle, coef:f64) {
            self.model.set_coefficient(constraint, var, coef)
        }
        fn solve(&mut self) -> Result<SolveStatus, OracleError> {
            Err(OracleError::Numerical("singular basis".to_string()))
        }
        fn value_of(&self, var:VarHandle) -> f64 { self.model.value_of(var) }
        fn dual_of(&self, constraint:ConstraintHandle) -> f64 { self.model.dual_of(constraint) }
        fn name_of(&self, var:VarHandle) -> &str { self.model.name_of(var) }
    }

    fn no_heuristic() -> SearchConfig {
        SearchConfig { initial_clique_heuristic: false, ..SearchConfig::default() }
    }

    fn run(g:&Graph, config:&SearchConfig) -> SearchResult<Vec<VertexId>> {
        let mut lp = LpOracle::new();
        let res = solve_clique(g, &mut lp, config);
        assert_eq!(lp.nb_live_constraints(), 0);
        assert!(check_clique(g, &res.solution).is_ok());
        assert_eq!(res.size, res.solution.len());
        res
    }

    fn isolated(n:usize) -> Graph {
        let mut g = Graph::new();
        for l in 1..=n { g.add_node(l); }
        g
    }

    #[test]
    fn test_small_scenarios() {
        let scenarios = vec![
            (Graph::from_edges(&[(1,2), (2,3), (1,3)]), 3),
            (Graph::from_edges(&[(1,2), (2,3), (3,4), (4,1)]), 2),
            (Graph::complete(5), 5),
            (isolated(5), 1),
            (Graph::from_edges(&[(1,2), (2,3)]), 2),
        ];
        for (g, expected) in scenarios {
            for config in &[SearchConfig::default(), no_heuristic()] {
                let res = run(&g, config);
                assert_eq!(res.size, expected);
                assert!(res.proved_optimal);
            }
        }
    }

    #[test]
    fn test_empty_graph() {
        let res = run(&Graph::new(), &SearchConfig::default());
        assert_eq!(res.size, 0);
        assert!(res.solution.is_empty());
    }

    #[test]
    fn test_petersen() {
        let g = dimacs::read_from_file("insts/petersen.col").unwrap();
        let res = run(&g, &no_heuristic());
        assert_eq!(res.size, 2);
    }

    #[test]
    fn test_agrees_with_combinatorial_search() {
        for seed in 0..6 {
            let g = Graph::random(16, 0.5, seed);
            let expected = solve_mcq(&g, &SearchConfig::default()).size;
            assert_eq!(run(&g, &no_heuristic()).size, expected);
            let eager = SearchConfig { eager_pair_constraints: true, ..no_heuristic() };
            assert_eq!(run(&g, &eager).size, expected);
        }
    }

    #[test]
    fn test_adding_edges_never_decreases() {
        let g = Graph::random(12, 0.3, 7);
        let base = run(&g, &SearchConfig::default()).size;
        let mut denser = g.clone();
        for (u,v) in Graph::random(12, 0.3, 8).edges() {
            denser.add_edge(g.label(u), g.label(v));
        }
        assert!(run(&denser, &SearchConfig::default()).size >= base);
    }

    #[test]
    fn test_repeated_runs_same_size() {
        for seed in 0..4 {
            let g = Graph::random(14, 0.5, seed);
            let first = run(&g, &no_heuristic());
            for _ in 0..3 {
                let again = run(&g, &no_heuristic());
                assert_eq!(again.size, first.size);
                assert!(again.proved_optimal);
            }
        }
    }

    #[test]
    fn test_solver_fault_keeps_heuristic() {
        let g = Graph::from_edges(&[(1,2), (2,3), (1,3), (3,4)]);
        let mut lp = FailingOracle::default();
        let res = solve_clique(&g, &mut lp, &SearchConfig::default());
        assert_eq!(res.size, 3);
        assert!(res.stats.nb_oracle_faults >= 1);
        assert!(!res.proved_optimal);
        assert_eq!(lp.model.nb_live_constraints(), 0);
    }

    #[test]
    fn test_time_limit() {
        let g = Graph::random(20, 0.5, 1);
        let config = SearchConfig::default().with_time_limit(0.);
        let res = run(&g, &config);
        assert!(res.stats.timed_out);
        assert!(!res.proved_optimal);
        assert_eq!(res.size, greedy_clique(&g).len());
    }
}
