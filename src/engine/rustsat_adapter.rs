//! Adapter for rustsat solver backends

use super::{SATSolver, SolveOutcome};
use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Assignment, Clause, Lit, TernaryVal, Var};
use std::time::Instant;
use tracing::warn;

/// rustsat solvers that poll a stop predicate while searching
pub trait Interruptible {
    /// Installs the predicate; the search is interrupted once it returns true
    fn set_stop(&mut self, stop: impl Fn() -> bool + 'static);
}

impl Interruptible for rustsat_batsat::BasicSolver {
    fn set_stop(&mut self, stop: impl Fn() -> bool + 'static) {
        self.batsat_mut().cb_mut().set_stop(stop);
    }
}

/// Adapter that wraps rustsat solvers to implement our SATSolver trait
///
/// # Example
///
/// ```ignore
/// use rustsat_batsat::BasicSolver;
/// let solver = RustSatAdapter::new(BasicSolver::default());
/// ```
pub struct RustSatAdapter<S> {
    solver: S,
    num_vars: u32,
    num_clauses: u32,
    solution: Option<Assignment>,
}

impl<S> RustSatAdapter<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            num_clauses: 0,
            solution: None,
        }
    }
}

impl<S: Default> Default for RustSatAdapter<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

fn to_lit(lit: i32) -> Lit {
    let var = Var::new(lit.unsigned_abs() - 1);
    if lit > 0 { var.pos_lit() } else { var.neg_lit() }
}

fn from_lit(lit: Lit) -> i32 {
    let var = lit.var().idx32() as i32 + 1;
    if lit.is_neg() { -var } else { var }
}

impl<S: Solve + SolveIncremental + Interruptible> SATSolver for RustSatAdapter<S> {
    fn add_variables(&mut self, num_vars: u32) {
        // rustsat creates variables on first use
        self.num_vars += num_vars;
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        let lits: Vec<Lit> = lits.iter().map(|&l| to_lit(l)).collect();
        self.num_clauses += 1;
        self.solver.add_clause(Clause::from(&lits[..])).is_ok()
    }

    fn solve_with_assumptions(&mut self, assumptions: &[i32]) -> SolveOutcome {
        self.solution = None;
        let assumps: Vec<Lit> = assumptions.iter().map(|&l| to_lit(l)).collect();

        match self.solver.solve_assumps(&assumps) {
            Ok(SolverResult::Sat) => {
                if self.num_vars > 0 {
                    self.solution = self.solver.solution(Var::new(self.num_vars - 1)).ok();
                }
                SolveOutcome::Sat
            }
            Ok(SolverResult::Unsat) => SolveOutcome::Unsat,
            Ok(SolverResult::Interrupted) => SolveOutcome::Unknown,
            Err(err) => {
                warn!(%err, "sat backend failed");
                SolveOutcome::Unknown
            }
        }
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => self.solver.set_stop(move || Instant::now() >= deadline),
            None => self.solver.set_stop(|| false),
        }
    }

    fn unsat_core(&mut self) -> Vec<i32> {
        // rustsat reports the negations of the failed assumptions
        match self.solver.core() {
            Ok(core) => core.into_iter().map(|lit| from_lit(!lit)).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.num_vars {
            return false;
        }
        self.solution
            .as_ref()
            .is_some_and(|s| matches!(s.var_value(Var::new(var - 1)), TernaryVal::True))
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }
}
