//! Linear relaxation oracle.
//!
//! The tree searches only talk to the relaxation through [`RelaxationOracle`]. Constraints
//! added by a search node are owned by a [`scope::ModelScope`] so that they are removed on
//! every exit path of that node.

use thiserror::Error;

/// scoped constraint ownership
pub mod scope;

/// oracle backed by good_lp
pub mod lp;

pub use scope::ModelScope;
pub use lp::LpOracle;


/// opaque handle on a variable of the relaxation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarHandle(pub(crate) usize);

/// opaque handle on a constraint of the relaxation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintHandle {
    /// slot of the constraint in the model
    pub(crate) slot: usize,
    /// generation of the slot when the constraint was added
    pub(crate) generation: usize,
}

/// optimization direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// minimize the objective
    Minimize,
    /// maximize the objective
    Maximize,
}

/// relation between the linear expression and the right hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// expr <= rhs
    LessEq,
    /// expr >= rhs
    GreaterEq,
    /// expr = rhs
    Equal,
}

/// result of a successful call to the solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveStatus {
    /// optimal solution found (objective value)
    Optimal(f64),
    /// the relaxation has no feasible point
    Infeasible,
}

/// solver faults. The searches treat them as a pruned node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    /// the objective is unbounded in the optimization direction
    #[error("unbounded relaxation")]
    Unbounded,
    /// numerical trouble (NaN, inconsistent bounds, ...)
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// linear term (coefficient, variable)
pub type Term = (f64, VarHandle);


/** contract of the linear relaxation solver consumed by the searches.

Values and duals are only meaningful right after a successful `solve`.
Dual prices are the derivative of the optimal objective with respect to the right hand side,
in the model's own direction (covering rows of a minimization have non-negative duals).
Removing a constraint twice, or using a handle after its removal, is a programmer error.
*/
pub trait RelaxationOracle {
    /// creates a continuous variable bounded by [lb, ub]
    fn add_variable(&mut self, lb:f64, ub:f64, name:&str) -> VarHandle;

    /// builds (or replaces) the linear objective
    fn set_objective(&mut self, sense:Sense, terms:&[Term]);

    /// adds a linear constraint and returns a handle to remove it later
    fn add_constraint(&mut self, terms:&[Term], relation:Relation, rhs:f64) -> ConstraintHandle;

    /// removes a constraint
    fn remove_constraint(&mut self, constraint:ConstraintHandle);

    /// sets the coefficient of a variable in an existing constraint
    fn set_coefficient(&mut self, constraint:ConstraintHandle, var:VarHandle, coef:f64);

    /// solves the current model
    fn solve(&mut self) -> Result<SolveStatus, OracleError>;

    /// value of a variable in the last solution
    fn value_of(&self, var:VarHandle) -> f64;

    /// dual price of a constraint in the last solution
    fn dual_of(&self, constraint:ConstraintHandle) -> f64;

    /// name given to a variable
    fn name_of(&self, var:VarHandle) -> &str;
}
