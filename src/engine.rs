//! SAT solver trait and implementations

pub mod rustsat_adapter;

pub use rustsat_adapter::{Interruptible, RustSatAdapter};

use std::time::Instant;

/// Backend used when no other solver is requested
pub type DefaultBackend = RustSatAdapter<rustsat_batsat::BasicSolver>;

/// Result of a satisfiability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A model exists
    Sat,
    /// No model exists (under the given assumptions)
    Unsat,
    /// The backend failed or was interrupted
    Unknown,
}

/// Core SAT solver trait
///
/// This trait defines the interface that all SAT solver backends must implement.
/// Variables are 1-indexed, and literals are represented as signed integers
/// (positive for true, negative for false).
pub trait SATSolver {
    /// Adds the given number of variables to the solver
    fn add_variables(&mut self, num_vars: u32);

    /// Adds a clause to the solver
    ///
    /// Returns false if the backend rejected the clause
    ///
    /// # Arguments
    /// * `lits` - Slice of literals (1-indexed, negated by sign)
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Solves the current formula
    fn solve(&mut self) -> SolveOutcome {
        self.solve_with_assumptions(&[])
    }

    /// Solves the current formula with every assumption literal forced true
    ///
    /// Assumptions hold for this call only; the clause set is left unchanged.
    fn solve_with_assumptions(&mut self, assumptions: &[i32]) -> SolveOutcome;

    /// Makes every following solve give up with [`SolveOutcome::Unknown`]
    /// once `deadline` has passed; `None` clears it
    fn set_deadline(&mut self, deadline: Option<Instant>);

    /// Returns the failed assumptions after an unsatisfiable assumption solve
    ///
    /// The result is a subset of the assumptions passed to the last call.
    fn unsat_core(&mut self) -> Vec<i32>;

    /// Returns the assignment of a variable in the solution
    ///
    /// Only valid after a solve returned [`SolveOutcome::Sat`].
    /// Variables are 1-indexed.
    fn value_of(&self, var: u32) -> bool;

    /// Returns the number of variables in the solver
    fn num_variables(&self) -> u32;

    /// Returns the number of clauses added
    fn num_clauses(&self) -> u32;
}
