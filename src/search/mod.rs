//! Heuristics, pricing and tree searches for the clique and coloring problems.

use std::time::Instant;

use serde::Serialize;
use tracing::info;

/// greedy sequential coloring (initial independent sets)
pub mod greedy_sequential;

/// greedy that finds a "large" clique
pub mod greedy_clique;

/// pricing (maximum weight independent set) heuristics and exact search
pub mod pricing;

/// LP-based branch & bound for the maximum clique problem
pub mod clique_bnb;

/// branch & price for the graph coloring problem
pub mod coloring_bnp;

/// combinatorial branch & bound for the maximum clique problem (coloring bounds)
pub mod mcq;


/** best feasible solution found so far.
Replaced only by a strictly better solution.
*/
#[derive(Debug, Clone)]
pub struct Incumbent<S> {
    /// solution
    solution: S,
    /// objective value (clique size, nb colors)
    size: usize,
    /// number of improvements since the beginning of the search
    nb_improvements: usize,
}

impl<S> Incumbent<S> {
    /// creates an incumbent from an initial solution
    pub fn new(solution:S, size:usize) -> Self {
        Self { solution, size, nb_improvements: 0 }
    }

    /// objective of the incumbent
    pub fn size(&self) -> usize { self.size }

    /// incumbent solution
    pub fn solution(&self) -> &S { &self.solution }

    /// number of improvements
    pub fn nb_improvements(&self) -> usize { self.nb_improvements }

    /// consumes the incumbent
    pub fn into_solution(self) -> S { self.solution }

    /// replaces the incumbent if size is larger (maximization). Returns true if replaced
    pub fn offer_larger(&mut self, solution:S, size:usize) -> bool {
        if size > self.size {
            self.replace(solution, size);
            true
        } else { false }
    }

    /// replaces the incumbent if size is smaller (minimization). Returns true if replaced
    pub fn offer_smaller(&mut self, solution:S, size:usize) -> bool {
        if size < self.size {
            self.replace(solution, size);
            true
        } else { false }
    }

    fn replace(&mut self, solution:S, size:usize) {
        info!(previous = self.size, size, "new best solution");
        self.solution = solution;
        self.size = size;
        self.nb_improvements += 1;
    }
}


/// statistics collected during a tree search
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStatistics {
    /// number of search tree nodes
    pub nb_nodes: usize,
    /// number of relaxation solves
    pub nb_solves: usize,
    /// number of cuts added (clique model)
    pub nb_cuts: usize,
    /// number of columns generated (coloring model)
    pub nb_columns: usize,
    /// number of exact pricing calls
    pub nb_exact_pricing: usize,
    /// number of solver faults (treated as pruned nodes)
    pub nb_oracle_faults: usize,
    /// number of pruned nodes (infeasible, bound, fault)
    pub nb_pruned: usize,
    /// number of nodes closed without a proven bound (solver fault, pricing node limit)
    pub nb_unproven: usize,
    /// maximum depth reached
    pub max_depth: usize,
    /// true if the time limit stopped the search
    pub timed_out: bool,
    /// search duration (seconds)
    pub time_searched: f64,
    /// objective of the initial heuristic solution
    pub initial_objective: usize,
    /// objective of the final solution
    pub final_objective: usize,
}


/** state shared by the whole recursion: incumbent, statistics and deadline */
#[derive(Debug)]
pub struct SearchContext<S> {
    /// best solution so far
    pub incumbent: Incumbent<S>,
    /// statistics
    pub stats: SearchStatistics,
    /// the search stops after this instant
    deadline: Option<Instant>,
    /// instant at which the search started
    start: Instant,
}

impl<S> SearchContext<S> {
    /// creates a context from the initial solution
    pub fn new(incumbent:Incumbent<S>, deadline:Option<Instant>, start:Instant) -> Self {
        let stats = SearchStatistics { initial_objective: incumbent.size(), ..SearchStatistics::default() };
        Self { incumbent, stats, deadline, start }
    }

    /// registers a new search tree node. Returns false if the deadline is reached
    pub fn enter_node(&mut self, depth:usize) -> bool {
        if let Some(d) = self.deadline {
            if Instant::now() >= d {
                self.stats.timed_out = true;
                return false;
            }
        }
        self.stats.nb_nodes += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        true
    }

    /// true if the deadline has been reached
    pub fn timed_out(&self) -> bool { self.stats.timed_out }

    /// closes the search and returns its result
    pub fn finish(mut self) -> SearchResult<S> {
        self.stats.time_searched = self.start.elapsed().as_secs_f64();
        self.stats.final_objective = self.incumbent.size();
        let proved_optimal = !self.stats.timed_out && self.stats.nb_unproven == 0;
        info!(
            objective = self.stats.final_objective,
            nodes = self.stats.nb_nodes,
            time = self.stats.time_searched,
            proved_optimal,
            "search finished"
        );
        SearchResult {
            size: self.incumbent.size(),
            solution: self.incumbent.into_solution(),
            stats: self.stats,
            proved_optimal,
        }
    }
}


/// result of a tree search
#[derive(Debug, Clone)]
pub struct SearchResult<S> {
    /// best solution found
    pub solution: S,
    /// its objective value
    pub size: usize,
    /// search statistics
    pub stats: SearchStatistics,
    /// true if the search tree was fully explored with proven bounds
    pub proved_optimal: bool,
}
