use std::collections::HashSet;
use std::time::Instant;

use ordered_float::OrderedFloat;
use tracing::{debug, info, trace, warn};

use crate::color::{Coloring, check_coloring, cover_to_coloring, extract_cover, is_integral};
use crate::config::SearchConfig;
use crate::graph::{Graph, VertexId};
use crate::independent_set::{ExcludedSetRegistry, Fingerprint, IndependentSet};
use crate::relaxation::{ConstraintHandle, ModelScope, RelaxationOracle, Relation, Sense, SolveStatus, Term, VarHandle};
use crate::search::{Incumbent, SearchContext, SearchResult};
use crate::search::greedy_sequential::greedy_sequential;
use crate::search::pricing::PricingSolver;


/** columns of the restricted master problem */
#[derive(Debug, Default)]
struct ColumnPool {
    /// independent sets (column i)
    sets: Vec<IndependentSet>,
    /// vars[i]: variable of column i
    vars: Vec<VarHandle>,
    /// fingerprints of the columns
    fingerprints: HashSet<Fingerprint>,
}


/**
Branch & price for the graph coloring problem.

restricted master: min Σ λ_s, λ_s ∈ [0,1], Σ_{s ∋ v} λ_s >= 1 for each vertex v.
Each covering row also holds an "uncovered" variable with a cost larger than any coloring,
so that the restricted master stays feasible when branching forbids the columns of a vertex.
 - pricing: independent sets whose dual weight exceeds 1 + ε
 - the master value is a lower bound once pricing is proven exhausted
 - branching on the fractional column with the largest value:
   λ_s = 1 first, then λ_s = 0 (s is forbidden from pricing in that subtree)
*/
#[derive(Debug)]
pub struct ColoringBranchAndPrice<'g> {
    /// graph
    graph: &'g Graph,
    /// parameters
    config: SearchConfig,
    /// column generation
    pricing: PricingSolver<'g>,
    /// generated columns
    pool: ColumnPool,
    /// columns forbidden on the current branch (λ_s <= 0 rows). They stay in the pool, so the
    /// pool fingerprints keep pricing from generating them again; the stack is empty between
    /// two searches.
    registry: ExcludedSetRegistry,
    /// covering[v]: covering row of vertex v
    covering: Vec<ConstraintHandle>,
    /// uncovered[v]: artificial variable of the covering row of v
    uncovered: Vec<VarHandle>,
}

impl<'g> ColoringBranchAndPrice<'g> {
    /** creates the search (the model is built by `solve`) */
    pub fn new(graph:&'g Graph, config:SearchConfig) -> Self {
        let pricing = PricingSolver::new(graph, &config);
        Self {
            graph,
            config,
            pricing,
            pool: ColumnPool::default(),
            registry: ExcludedSetRegistry::new(),
            covering: Vec::new(),
            uncovered: Vec::new(),
        }
    }

    /// cost of an uncovered vertex
    fn uncovered_cost(&self) -> f64 { (self.graph.nb_vertices() + 1) as f64 }

    /// rebuilds the objective from the columns and the artificial variables
    fn update_objective<O: RelaxationOracle + ?Sized>(&self, oracle:&mut O) {
        let cost = self.uncovered_cost();
        let mut terms:Vec<Term> = self.pool.vars.iter().map(|x| (1., *x)).collect();
        terms.extend(self.uncovered.iter().map(|a| (cost, *a)));
        oracle.set_objective(Sense::Minimize, &terms);
    }

    /// adds a column to the model. The covering rows must exist.
    fn add_column<O: RelaxationOracle + ?Sized>(&mut self, oracle:&mut O, members:&[VertexId]) {
        let set = IndependentSet::new(self.pool.sets.len(), self.graph, members);
        let var = oracle.add_variable(0., 1., &format!("lambda_{}", set.key()));
        for v in set.members() {
            oracle.set_coefficient(self.covering[*v], var, 1.);
        }
        self.pool.fingerprints.insert(set.fingerprint());
        self.pool.sets.push(set);
        self.pool.vars.push(var);
    }

    /** runs the search. Covering rows are removed from the oracle when it returns. */
    pub fn solve<O: RelaxationOracle + ?Sized>(&mut self, oracle:&mut O) -> SearchResult<Coloring> {
        let start = Instant::now();
        let greedy = greedy_sequential(self.graph);
        let size = greedy.partition.nb_colors();
        let mut ctx = SearchContext::new(Incumbent::new(greedy.partition, size), self.config.deadline(start), start);
        info!(initial = size, "coloring branch & price");
        if self.graph.nb_vertices() == 0 {
            return ctx.finish();
        }
        let mut root = ModelScope::new(oracle);
        // initial columns: extended greedy classes, covering rows
        for class in &greedy.classes {
            // two classes may share the same extension
            if !self.pool.fingerprints.insert(class.fingerprint()) { continue; }
            let var = root.add_variable(0., 1., &format!("lambda_{}", self.pool.sets.len()));
            self.pool.sets.push(IndependentSet::new(self.pool.sets.len(), self.graph, class.members()));
            self.pool.vars.push(var);
        }
        for v in self.graph.nodes() {
            let a = root.add_variable(0., f64::INFINITY, &format!("uncovered_{}", self.graph.label(v)));
            let mut terms:Vec<Term> = self.pool.sets.iter().zip(self.pool.vars.iter())
                .filter(|(s,_)| s.contains(v))
                .map(|(_,x)| (1., *x))
                .collect();
            terms.push((1., a));
            let row = root.add_scoped_constraint(&terms, Relation::GreaterEq, 1.);
            self.uncovered.push(a);
            self.covering.push(row);
        }
        self.update_objective(&mut *root);
        self.explore(&mut *root, &mut ctx, 0);
        debug_assert_eq!(self.registry.depth(), 0);
        debug!(columns = self.pool.sets.len(), "column pool");
        ctx.finish()
    }

    /// true iff no vertex is left uncovered in the last solution
    fn fully_covered<O: RelaxationOracle + ?Sized>(&self, oracle:&O) -> bool {
        self.uncovered.iter().all(|a| oracle.value_of(*a) <= self.config.epsilon)
    }

    /// if the last master solution is integral, turns it into a coloring and offers it
    fn offer_integral<O: RelaxationOracle + ?Sized>(&self, oracle:&O, ctx:&mut SearchContext<Coloring>) {
        let eps = self.config.epsilon;
        if !self.fully_covered(oracle) { return; }
        if !self.pool.vars.iter().all(|x| is_integral(oracle.value_of(*x), eps)) { return; }
        let selected:Vec<&IndependentSet> = extract_cover(oracle, &self.pool.vars, eps).into_iter()
            .map(|i| &self.pool.sets[i])
            .collect();
        let coloring = cover_to_coloring(self.graph, &selected);
        assert!(check_coloring(self.graph, &coloring).is_ok(), "extracted an invalid coloring");
        let size = coloring.nb_colors();
        ctx.incumbent.offer_smaller(coloring, size);
    }

    /// explores a search tree node. Constraints added here are removed on return.
    fn explore<O: RelaxationOracle + ?Sized>(&mut self, oracle:&mut O, ctx:&mut SearchContext<Coloring>, depth:usize) {
        if !ctx.enter_node(depth) { return; }
        let eps = self.config.epsilon;
        let mut scope = ModelScope::new(oracle);
        // column generation
        let (z, exhausted) = loop {
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
            self.offer_integral(&*scope, ctx);
            if ctx.timed_out() { return; }
            let duals:Vec<f64> = self.covering.iter().map(|c| scope.dual_of(*c)).collect();
            let outcome = {
                let fingerprints = &self.pool.fingerprints;
                self.pricing.price(&duals, &|f| fingerprints.contains(f))
            };
            if outcome.used_exact { ctx.stats.nb_exact_pricing += 1; }
            if outcome.sets.is_empty() { break (z, outcome.exhausted); }
            trace!(depth, z, nb = outcome.sets.len(), "new columns");
            for s in &outcome.sets {
                self.add_column(&mut *scope, s);
                ctx.stats.nb_columns += 1;
            }
            self.update_objective(&mut *scope);
        };
        if exhausted {
            if (z - eps).ceil() >= ctx.incumbent.size() as f64 {
                trace!(depth, z, "bound prune");
                ctx.stats.nb_pruned += 1;
                return;
            }
            if !self.fully_covered(&*scope) {
                // every column able to cover some vertex is forbidden on this branch
                trace!(depth, "uncoverable node");
                ctx.stats.nb_pruned += 1;
                return;
            }
        }
        let values:Vec<f64> = self.pool.vars.iter().map(|x| scope.value_of(*x)).collect();
        let branch_column = (0..values.len())
            .filter(|i| !is_integral(values[*i], eps))
            .max_by_key(|i| (OrderedFloat(values[*i]), std::cmp::Reverse(*i)));
        let column = match branch_column {
            Some(i) => i,
            None => {
                // integral master solution (already offered)
                if !exhausted { ctx.stats.nb_unproven += 1; }
                return;
            }
        };
        let var = self.pool.vars[column];
        debug!(depth, var = scope.name_of(var), value = values[column], z, "branching");
        {
            let mut child = ModelScope::new(&mut *scope);
            child.add_scoped_constraint(&[(1., var)], Relation::GreaterEq, 1.);
            self.explore(&mut *child, ctx, depth+1);
        }
        if ctx.timed_out() { return; }
        {
            let fingerprint = self.pool.sets[column].fingerprint();
            debug_assert!(!self.registry.contains(&fingerprint), "column forbidden twice on a branch");
            self.registry.push(fingerprint);
            let mut child = ModelScope::new(&mut *scope);
            child.add_scoped_constraint(&[(1., var)], Relation::LessEq, 0.);
            self.explore(&mut *child, ctx, depth+1);
            drop(child);
            self.registry.pop();
        }
    }
}


/** finds a minimum coloring with the branch & price */
pub fn solve_coloring<O: RelaxationOracle + ?Sized>(graph:&Graph, oracle:&mut O, config:&SearchConfig) -> SearchResult<Coloring> {
    ColoringBranchAndPrice::new(graph, config.clone()).solve(oracle)
}
