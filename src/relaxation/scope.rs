use std::ops::{Deref, DerefMut};

use super::{ConstraintHandle, RelaxationOracle, Relation, Term};


/** borrows the oracle for one search node. Constraints added through the scope are removed
(last added first) when the scope is dropped, whatever the exit path of the node.
Recursive calls reborrow the oracle through `&mut *scope`.
*/
#[derive(Debug)]
pub struct ModelScope<'a, O: RelaxationOracle + ?Sized> {
    /// underlying model
    oracle: &'a mut O,
    /// constraints owned by this scope
    added: Vec<ConstraintHandle>,
}

impl<'a, O: RelaxationOracle + ?Sized> ModelScope<'a, O> {
    /// opens a scope on the oracle
    pub fn new(oracle:&'a mut O) -> Self {
        Self { oracle, added: Vec::new() }
    }

    /// adds a constraint owned by this scope
    pub fn add_scoped_constraint(&mut self, terms:&[Term], relation:Relation, rhs:f64) -> ConstraintHandle {
        let res = self.oracle.add_constraint(terms, relation, rhs);
        self.added.push(res);
        res
    }

    /// number of constraints owned by this scope
    pub fn nb_owned(&self) -> usize { self.added.len() }
}

impl<'a, O: RelaxationOracle + ?Sized> Deref for ModelScope<'a, O> {
    type Target = O;
    fn deref(&self) -> &O { self.oracle }
}

impl<'a, O: RelaxationOracle + ?Sized> DerefMut for ModelScope<'a, O> {
    fn deref_mut(&mut self) -> &mut O { self.oracle }
}

impl<'a, O: RelaxationOracle + ?Sized> Drop for ModelScope<'a, O> {
    fn drop(&mut self) {
        while let Some(c) = self.added.pop() {
            self.oracle.remove_constraint(c);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::relaxation::{LpOracle, Sense, SolveStatus};

    #[test]
    fn test_scope_removes_on_drop() {
        let mut lp = LpOracle::new();
        let x = lp.add_variable(0., 1., "x");
        lp.set_objective(Sense::Maximize, &[(1., x)]);
        {
            let mut scope = ModelScope::new(&mut lp);
            scope.add_scoped_constraint(&[(1., x)], Relation::LessEq, 0.25);
            assert_eq!(scope.nb_owned(), 1);
            {
                let mut inner = ModelScope::new(&mut *scope);
                inner.add_scoped_constraint(&[(1., x)], Relation::LessEq, 0.125);
                match inner.solve() {
                    Ok(SolveStatus::Optimal(z)) => assert!((z - 0.125).abs() < 1e-6),
                    r => panic!("unexpected result {:?}", r),
                }
            }
            match scope.solve() {
                Ok(SolveStatus::Optimal(z)) => assert!((z - 0.25).abs() < 1e-6),
                r => panic!("unexpected result {:?}", r),
            }
            assert_eq!(scope.nb_live_constraints(), 1);
        }
        assert_eq!(lp.nb_live_constraints(), 0);
        match lp.solve() {
            Ok(SolveStatus::Optimal(z)) => assert!((z - 1.).abs() < 1e-6),
            r => panic!("unexpected result {:?}", r),
        }
    }
}
