use good_lp::constraint::{geq, leq};
use good_lp::solvers::clarabel::clarabel;
use good_lp::solvers::{DualValues, ResolutionError, Solution, SolutionWithDual, SolverModel};
use good_lp::{variable, Expression, ProblemVariables, Variable};
use tracing::trace;

use super::{ConstraintHandle, OracleError, RelaxationOracle, Relation, Sense, SolveStatus, Term, VarHandle};

/// tolerance used to decide constant rows
const CONSTANT_ROW_TOL:f64 = 1e-9;

/// variable of the model
#[derive(Debug, Clone)]
struct VarDef {
    lb: f64,
    ub: f64,
    name: String,
}

/// constraint of the model (sparse)
#[derive(Debug, Clone)]
struct Row {
    coefs: Vec<(usize, f64)>,
    relation: Relation,
    rhs: f64,
}

/// constraint slot, reused once its constraint is removed
#[derive(Debug, Clone, Default)]
struct Slot {
    /// incremented at each removal, stale handles no longer match
    generation: usize,
    row: Option<Row>,
}


/** [`RelaxationOracle`] on top of `good_lp` (clarabel backend).

The oracle keeps the model (bounds, objective, sparse rows) and hands a fresh `good_lp`
problem to the solver at each `solve`. Removed constraints free their slot, the next
`add_constraint` reuses it, so the slot table stays as large as the deepest set of live
constraints.

Equality rows are given to the solver as a pair of inequalities. Inequality duals have a
known sign (non-negative when the row restricts the optimization direction), which makes
the reported prices independent of the sign convention of the backend.
*/
#[derive(Debug, Default)]
pub struct LpOracle {
    /// variables of the model
    vars: Vec<VarDef>,
    /// optimization direction
    sense: Option<Sense>,
    /// objective[j]: objective coefficient of variable j
    objective: Vec<f64>,
    /// constraint slots
    slots: Vec<Slot>,
    /// free slots (removed constraints)
    free: Vec<usize>,
    /// values[j]: value of variable j in the last solution
    values: Vec<f64>,
    /// duals[s]: dual price of the constraint in slot s in the last solution
    duals: Vec<f64>,
}

impl LpOracle {
    /// creates an empty model (minimization of 0)
    pub fn new() -> Self { Self::default() }

    /// number of constraints currently in the model
    pub fn nb_live_constraints(&self) -> usize {
        self.slots.iter().filter(|s| s.row.is_some()).count()
    }

    /// number of constraint slots allocated so far
    pub fn nb_slots(&self) -> usize { self.slots.len() }

    /// live row of a handle, panics on a stale handle
    fn row_mut(&mut self, constraint:ConstraintHandle) -> &mut Row {
        match self.slots.get_mut(constraint.slot) {
            Some(Slot { generation, row: Some(row) }) if *generation == constraint.generation => row,
            _ => panic!("constraint {:?} is not in the model", constraint),
        }
    }

    /// checks that the model only contains numbers the solver can use
    fn validate(&self) -> Result<bool, OracleError> {
        let mut consistent_bounds = true;
        for v in &self.vars {
            if v.lb.is_nan() || v.ub.is_nan() || v.lb == f64::INFINITY || v.ub == f64::NEG_INFINITY {
                return Err(OracleError::Numerical(format!("invalid bounds for {}", v.name)));
            }
            if v.lb > v.ub { consistent_bounds = false; }
        }
        let finite_rows = self.slots.iter().filter_map(|s| s.row.as_ref()).all(|r| {
            r.rhs.is_finite() && r.coefs.iter().all(|(_,c)| c.is_finite())
        });
        if !finite_rows || self.objective.iter().any(|c| !c.is_finite()) {
            return Err(OracleError::Numerical("non finite coefficient".to_string()));
        }
        Ok(consistent_bounds)
    }

    /// sign of the dual of an inequality row in the model's direction
    fn dual_sign(&self, relation:Relation) -> f64 {
        match (self.sense.unwrap_or(Sense::Minimize), relation) {
            (Sense::Minimize, Relation::GreaterEq) | (Sense::Maximize, Relation::LessEq) => 1.,
            _ => -1.,
        }
    }

    /// true if a row without variables is violated
    fn violated_constant_row(row:&Row) -> bool {
        match row.relation {
            Relation::LessEq => row.rhs < -CONSTANT_ROW_TOL,
            Relation::GreaterEq => row.rhs > CONSTANT_ROW_TOL,
            Relation::Equal => row.rhs.abs() > CONSTANT_ROW_TOL,
        }
    }
}


impl RelaxationOracle for LpOracle {
    fn add_variable(&mut self, lb:f64, ub:f64, name:&str) -> VarHandle {
        self.vars.push(VarDef { lb, ub, name: name.to_string() });
        self.objective.push(0.);
        VarHandle(self.vars.len()-1)
    }

    fn set_objective(&mut self, sense:Sense, terms:&[Term]) {
        self.sense = Some(sense);
        self.objective = vec![0. ; self.vars.len()];
        for (coef, var) in terms {
            self.objective[var.0] += coef;
        }
    }

    fn add_constraint(&mut self, terms:&[Term], relation:Relation, rhs:f64) -> ConstraintHandle {
        let coefs = terms.iter().map(|(coef, var)| (var.0, *coef)).collect();
        let row = Some(Row { coefs, relation, rhs });
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                self.slots.len()-1
            }
        };
        self.slots[slot].row = row;
        ConstraintHandle { slot, generation: self.slots[slot].generation }
    }

    fn remove_constraint(&mut self, constraint:ConstraintHandle) {
        self.row_mut(constraint);
        let slot = &mut self.slots[constraint.slot];
        slot.row = None;
        slot.generation += 1;
        self.free.push(constraint.slot);
    }

    fn set_coefficient(&mut self, constraint:ConstraintHandle, var:VarHandle, coef:f64) {
        let row = self.row_mut(constraint);
        match row.coefs.iter_mut().find(|(j,_)| *j == var.0) {
            Some(entry) => entry.1 = coef,
            None => row.coefs.push((var.0, coef)),
        }
    }

    fn solve(&mut self) -> Result<SolveStatus, OracleError> {
        self.values = self.vars.iter().map(|v| if v.lb.is_finite() { v.lb } else { 0. }).collect();
        self.duals = vec![0. ; self.slots.len()];
        if !self.validate()? {
            return Ok(SolveStatus::Infeasible);
        }
        let live_rows = || self.slots.iter().enumerate().filter_map(|(s,slot)| slot.row.as_ref().map(|r| (s,r)));
        if live_rows().any(|(_,r)| r.coefs.is_empty() && Self::violated_constant_row(r)) {
            trace!("constant row violated");
            return Ok(SolveStatus::Infeasible);
        }
        if self.vars.is_empty() {
            return Ok(SolveStatus::Optimal(0.));
        }
        // fresh good_lp problem
        let mut problem_vars = ProblemVariables::new();
        let x:Vec<Variable> = self.vars.iter()
            .map(|v| problem_vars.add(variable().min(v.lb).max(v.ub)))
            .collect();
        let mut obj_expr = Expression::with_capacity(x.len());
        for (j,coef) in self.objective.iter().enumerate() {
            if *coef != 0. { obj_expr.add_mul(*coef, x[j]); }
        }
        let mut problem = match self.sense.unwrap_or(Sense::Minimize) {
            Sense::Minimize => problem_vars.minimise(obj_expr),
            Sense::Maximize => problem_vars.maximise(obj_expr),
        }.using(clarabel);
        // (slot, reference of the >= or <= row, reference of the <= half of an equality)
        let mut references = Vec::new();
        for (s,row) in live_rows().filter(|(_,r)| !r.coefs.is_empty()) {
            let expr = || {
                let mut e = Expression::with_capacity(row.coefs.len());
                for (j,coef) in &row.coefs { e.add_mul(*coef, x[*j]); }
                e
            };
            match row.relation {
                Relation::LessEq => references.push((s, problem.add_constraint(leq(expr(), row.rhs)), None)),
                Relation::GreaterEq => references.push((s, problem.add_constraint(geq(expr(), row.rhs)), None)),
                Relation::Equal => {
                    let lower = problem.add_constraint(geq(expr(), row.rhs));
                    let upper = problem.add_constraint(leq(expr(), row.rhs));
                    references.push((s, lower, Some(upper)));
                }
            }
        }
        let mut solution = match problem.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                trace!("relaxation infeasible");
                return Ok(SolveStatus::Infeasible);
            }
            Err(ResolutionError::Unbounded) => return Err(OracleError::Unbounded),
            Err(e) => return Err(OracleError::Numerical(format!("{:?}", e))),
        };
        // primal values, clamped to the bounds (interior point tolerance)
        for (j,v) in self.vars.iter().enumerate() {
            self.values[j] = solution.value(x[j]).max(v.lb).min(v.ub);
        }
        let objective_value:f64 = self.objective.iter().zip(&self.values).map(|(c,x)| c * x).sum();
        if objective_value.is_nan() {
            return Err(OracleError::Numerical("NaN objective".to_string()));
        }
        let ge_sign = self.dual_sign(Relation::GreaterEq);
        let le_sign = self.dual_sign(Relation::LessEq);
        let duals = solution.compute_dual();
        for (s, first, second) in references {
            let relation = match self.slots[s].row.as_ref() {
                Some(row) => row.relation,
                None => continue,
            };
            self.duals[s] = match (relation, second) {
                (Relation::Equal, Some(upper)) => {
                    ge_sign * duals.dual(first).abs() + le_sign * duals.dual(upper).abs()
                }
                (Relation::GreaterEq, _) => ge_sign * duals.dual(first).abs(),
                _ => le_sign * duals.dual(first).abs(),
            };
        }
        trace!(objective_value, nb_rows = self.duals.len(), "relaxation solved");
        Ok(SolveStatus::Optimal(objective_value))
    }

    fn value_of(&self, var:VarHandle) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.)
    }

    fn dual_of(&self, constraint:ConstraintHandle) -> f64 {
        self.duals.get(constraint.slot).copied().unwrap_or(0.)
    }

    fn name_of(&self, var:VarHandle) -> &str { &self.vars[var.0].name }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn optimal(lp:&mut LpOracle) -> f64 {
        match lp.solve() {
            Ok(SolveStatus::Optimal(z)) => z,
            r => panic!("expected an optimal solution, got {:?}", r),
        }
    }

    fn assert_close(a:f64, b:f64) {
        assert!((a-b).abs() < 1e-5, "{} != {}", a, b);
    }

    #[test]
    fn test_bounded_maximization() {
        // max x1 + 4x2 + 2x3
        // -x1 + x2 + x3 <= 30
        // x1 - 3x2 + x3 <= 40
        // 0 <= x1 <= 50, 0 <= x2 <= 40, 0 <= x3
        let mut lp = LpOracle::new();
        let x1 = lp.add_variable(0., 50., "x1");
        let x2 = lp.add_variable(0., 40., "x2");
        let x3 = lp.add_variable(0., f64::INFINITY, "x3");
        lp.set_objective(Sense::Maximize, &[(1., x1), (4., x2), (2., x3)]);
        let c1 = lp.add_constraint(&[(-1., x1), (1., x2), (1., x3)], Relation::LessEq, 30.);
        let c2 = lp.add_constraint(&[(1., x1), (-3., x2), (1., x3)], Relation::LessEq, 40.);
        assert_close(optimal(&mut lp), 290.);
        assert_close(lp.value_of(x1), 50.);
        assert_close(lp.value_of(x2), 40.);
        assert_close(lp.value_of(x3), 40.);
        assert_close(lp.dual_of(c1), 2.);
        assert_close(lp.dual_of(c2), 0.);
        assert_eq!(lp.name_of(x3), "x3");
    }

    #[test]
    fn test_covering_duals() {
        // min a + b + c, each of the three elements covered by two of the three sets
        // (the fractional optimum is 1.5 with duals 0.5)
        let mut lp = LpOracle::new();
        let a = lp.add_variable(0., 1., "a");
        let b = lp.add_variable(0., 1., "b");
        let c = lp.add_variable(0., 1., "c");
        lp.set_objective(Sense::Minimize, &[(1., a), (1., b), (1., c)]);
        let e1 = lp.add_constraint(&[(1., a), (1., b)], Relation::GreaterEq, 1.);
        let e2 = lp.add_constraint(&[(1., b), (1., c)], Relation::GreaterEq, 1.);
        let e3 = lp.add_constraint(&[(1., a), (1., c)], Relation::GreaterEq, 1.);
        assert_close(optimal(&mut lp), 1.5);
        for e in [e1, e2, e3].iter() {
            assert_close(lp.dual_of(*e), 0.5);
        }
        for v in [a, b, c].iter() {
            assert_close(lp.value_of(*v), 0.5);
        }
    }

    #[test]
    fn test_new_column_in_existing_row() {
        let mut lp = LpOracle::new();
        let a = lp.add_variable(0., 1., "a");
        let e1 = lp.add_constraint(&[(1., a)], Relation::GreaterEq, 1.);
        let e2 = lp.add_constraint(&[(1., a)], Relation::GreaterEq, 1.);
        let e3 = lp.add_constraint(&[], Relation::GreaterEq, 1.);
        lp.set_objective(Sense::Minimize, &[(1., a)]);
        assert_eq!(lp.solve(), Ok(SolveStatus::Infeasible));
        let b = lp.add_variable(0., 1., "b");
        lp.set_coefficient(e3, b, 1.);
        lp.set_coefficient(e2, b, 1.);
        lp.set_objective(Sense::Minimize, &[(1., a), (1., b)]);
        assert_close(optimal(&mut lp), 2.);
        for e in [e1, e2, e3].iter() {
            assert!(lp.dual_of(*e) >= 0.);
        }
    }

    #[test]
    fn test_equality_and_negative_rhs() {
        // min x + y, x - y = -1 (i.e. y = x + 1), x in [0, 5], y in [0, 5]
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., 5., "x");
        let y = lp.add_variable(0., 5., "y");
        lp.set_objective(Sense::Minimize, &[(1., x), (1., y)]);
        let c = lp.add_constraint(&[(1., x), (-1., y)], Relation::Equal, -1.);
        assert_close(optimal(&mut lp), 1.);
        assert_close(lp.value_of(y), 1.);
        // relaxing the rhs towards 0 decreases the objective: dual of -1
        assert_close(lp.dual_of(c), -1.);
    }

    #[test]
    fn test_non_zero_lower_bounds() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(1., 3., "x");
        let y = lp.add_variable(2., 4., "y");
        lp.set_objective(Sense::Maximize, &[(1., x), (1., y)]);
        lp.add_constraint(&[(1., x), (1., y)], Relation::LessEq, 5.5);
        assert_close(optimal(&mut lp), 5.5);
        lp.add_constraint(&[(1., y)], Relation::GreaterEq, 3.);
        assert_close(optimal(&mut lp), 5.5);
        assert!(lp.value_of(y) >= 3. - 1e-5);
    }

    #[test]
    fn test_infeasible_and_removal() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., 1., "x");
        lp.set_objective(Sense::Maximize, &[(1., x)]);
        let c1 = lp.add_constraint(&[(1., x)], Relation::GreaterEq, 1.);
        let c2 = lp.add_constraint(&[(1., x)], Relation::LessEq, 0.);
        assert_eq!(lp.solve(), Ok(SolveStatus::Infeasible));
        lp.remove_constraint(c2);
        assert_close(optimal(&mut lp), 1.);
        lp.remove_constraint(c1);
        assert_eq!(lp.nb_live_constraints(), 0);
    }

    #[test]
    fn test_inconsistent_bounds_infeasible() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(1., 0., "x");
        lp.set_objective(Sense::Minimize, &[(1., x)]);
        assert_eq!(lp.solve(), Ok(SolveStatus::Infeasible));
    }

    #[test]
    fn test_unbounded_is_a_fault() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., f64::INFINITY, "x");
        lp.set_objective(Sense::Maximize, &[(1., x)]);
        assert!(lp.solve().is_err());
    }

    #[test]
    fn test_nan_coefficient_is_a_fault() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., 1., "x");
        lp.set_objective(Sense::Maximize, &[(1., x)]);
        lp.add_constraint(&[(f64::NAN, x)], Relation::LessEq, 1.);
        assert!(matches!(lp.solve(), Err(OracleError::Numerical(_))));
    }

    #[test]
    fn test_slots_reused_after_removal() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., 1., "x");
        lp.set_objective(Sense::Maximize, &[(1., x)]);
        let kept = lp.add_constraint(&[(1., x)], Relation::LessEq, 0.75);
        for i in 0..1000 {
            let c = lp.add_constraint(&[(1., x)], Relation::LessEq, 0.5);
            if i % 100 == 0 {
                assert_close(optimal(&mut lp), 0.5);
            }
            lp.remove_constraint(c);
        }
        assert_eq!(lp.nb_slots(), 2);
        assert_eq!(lp.nb_live_constraints(), 1);
        assert_close(optimal(&mut lp), 0.75);
        assert_close(lp.dual_of(kept), 1.);
    }

    #[test]
    #[should_panic]
    fn test_double_removal_panics() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., 1., "x");
        let c = lp.add_constraint(&[(1., x)], Relation::LessEq, 1.);
        lp.remove_constraint(c);
        lp.add_constraint(&[(1., x)], Relation::LessEq, 1.);
        // the slot now belongs to another constraint
        lp.remove_constraint(c);
    }
}
