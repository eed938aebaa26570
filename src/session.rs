//! Axiomatized solver session
//!
//! A [`Session`] owns a backend loaded with the ground topology of a domain.
//! Scenarios are checked inside a [`Scope`]: literals asserted in a scope are
//! passed to the backend as assumptions and vanish when the scope is checked
//! or dropped, so the permanent clause set is only ever the axioms (plus any
//! explicit [`Session::assert_part_of`] constraints).

use crate::engine::{DefaultBackend, SATSolver, SolveOutcome};
use crate::error::Result;
use crate::rcc5::Rcc5;
use crate::topology::{ground_theory, Axioms, Domain, VarTable};
use crate::cnf::CNF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Session options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Primitive of the ground theory
    pub axioms: Axioms,
    /// Fresh subregions asserted as parts of each primary region
    pub subregions_per_region: usize,
    /// Per-check timeout in milliseconds (None = no timeout)
    pub timeout_ms: Option<u64>,
    /// Extract the failed scenario literals of unsatisfiable checks
    pub capture_cores: bool,
    /// Capture the satisfying assignment of satisfiable checks
    pub capture_models: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            axioms: Axioms::default(),
            subregions_per_region: 2,
            timeout_ms: None,
            capture_cores: true,
            capture_models: false,
        }
    }
}

/// Satisfiability verdict of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The scenario is consistent with the theory
    Sat,
    /// The scenario contradicts the theory
    Unsat,
    /// The check timed out or the backend failed
    Unknown,
}

impl From<SolveOutcome> for Verdict {
    fn from(outcome: SolveOutcome) -> Self {
        match outcome {
            SolveOutcome::Sat => Verdict::Sat,
            SolveOutcome::Unsat => Verdict::Unsat,
            SolveOutcome::Unknown => Verdict::Unknown,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Sat => "sat",
            Verdict::Unsat => "unsat",
            Verdict::Unknown => "unknown",
        })
    }
}

/// A possibly negated relation between two named regions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Literal {
    /// The relation
    pub relation: Rcc5,
    /// First argument
    pub first: String,
    /// Second argument
    pub second: String,
    /// False for `¬relation(first, second)`
    pub positive: bool,
}

impl Literal {
    /// `relation(first, second)`
    pub fn holds(relation: Rcc5, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            relation,
            first: first.into(),
            second: second.into(),
            positive: true,
        }
    }

    /// `¬relation(first, second)`
    pub fn fails(relation: Rcc5, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            positive: false,
            ..Self::holds(relation, first, second)
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}({}, {})", self.relation, self.first, self.second)
        } else {
            write!(f, "Not({}({}, {}))", self.relation, self.first, self.second)
        }
    }
}

/// Satisfying assignment of a check, restricted to the theory's predicates
#[derive(Debug, Clone)]
pub struct Model {
    names: Vec<String>,
    part: Vec<bool>,
    identity: Vec<bool>,
    relations: [Vec<bool>; 5],
}

impl Model {
    fn capture<S: SATSolver>(backend: &S, domain: &Domain, vars: &VarTable) -> Self {
        let n = domain.len();
        let grid = |var: &dyn Fn(usize, usize) -> i32| -> Vec<bool> {
            (0..n * n)
                .map(|i| backend.value_of(var(i / n, i % n) as u32))
                .collect()
        };
        Self {
            names: domain.names().to_vec(),
            part: grid(&|x, y| vars.part(x, y)),
            identity: grid(&|x, y| vars.identity(x, y)),
            relations: Rcc5::ALL.map(|r| grid(&|x, y| vars.relation(r, x, y))),
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn cell(&self, grid: &[bool], a: &str, b: &str) -> Option<bool> {
        let (x, y) = (self.index(a)?, self.index(b)?);
        Some(grid[x * self.names.len() + y])
    }

    /// Names of all domain constants
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `P(a,b)` in this model
    pub fn part_of(&self, a: &str, b: &str) -> Option<bool> {
        self.cell(&self.part, a, b)
    }

    /// Whether `a` and `b` denote the same constant in this model
    pub fn equal(&self, a: &str, b: &str) -> Option<bool> {
        if a == b {
            return self.index(a).map(|_| true);
        }
        self.cell(&self.identity, a, b)
    }

    /// Every RCC5 relation true between `a` and `b`
    pub fn relations(&self, a: &str, b: &str) -> Vec<Rcc5> {
        Rcc5::ALL
            .into_iter()
            .filter(|r| self.cell(&self.relations[r.index()], a, b) == Some(true))
            .collect()
    }

    /// The RCC5 relation between `a` and `b`, if exactly one holds
    pub fn relation(&self, a: &str, b: &str) -> Option<Rcc5> {
        match self.relations(a, b).as_slice() {
            [r] => Some(*r),
            _ => None,
        }
    }
}

/// Result of checking one scope
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The verdict
    pub verdict: Verdict,
    /// Scenario literals that failed together (unsat only, when captured)
    pub core: Option<Vec<Literal>>,
    /// Satisfying assignment (sat only, when captured)
    pub model: Option<Model>,
}

/// Counters describing a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    /// Constants in the domain, subregions included
    pub domain_size: usize,
    /// SAT variables of the ground theory
    pub variables: u32,
    /// Clauses of the ground theory
    pub axiom_clauses: usize,
    /// Checks performed
    pub checks: u64,
    /// Checks interrupted by the timeout
    pub timeouts: u64,
}

/// A backend loaded with the ground topology of a domain
pub struct Session<S = DefaultBackend> {
    domain: Domain,
    vars: VarTable,
    backend: S,
    options: SessionOptions,
    stats: SessionStatistics,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("domain", &self.domain.names())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Session<DefaultBackend> {
    /// Axiomatizes `regions` on the default backend
    pub fn new<N: AsRef<str>>(regions: &[N], options: &SessionOptions) -> Result<Self> {
        Self::axiomatize(regions, options)
    }
}

impl<S: SATSolver + Default> Session<S> {
    /// Grounds the topology over `regions` plus their subregions
    ///
    /// # Errors
    /// Fails on an empty or duplicated region set, or a domain too large to
    /// address with SAT literals.
    pub fn axiomatize<N: AsRef<str>>(regions: &[N], options: &SessionOptions) -> Result<Self> {
        let domain = Domain::new(regions, options.subregions_per_region)?;
        let (vars, axioms) = ground_theory(&domain, options.axioms)?;
        let stats = SessionStatistics {
            domain_size: domain.len(),
            variables: vars.total_variables(),
            axiom_clauses: axioms.num_clauses(),
            ..SessionStatistics::default()
        };
        debug!(
            regions = domain.primary_len(),
            domain = stats.domain_size,
            variables = stats.variables,
            clauses = stats.axiom_clauses,
            "session axiomatized"
        );

        let backend = load(&axioms);
        Ok(Self {
            domain,
            vars,
            backend,
            options: options.clone(),
            stats,
        })
    }

    /// Permanently asserts `P(part, whole)`
    pub fn assert_part_of(&mut self, part: &str, whole: &str) -> Result<()> {
        let lit = self
            .vars
            .part(self.domain.index_of(part)?, self.domain.index_of(whole)?);
        self.backend.add_clause(&[lit]);
        self.stats.axiom_clauses += 1;
        Ok(())
    }

    /// Replaces the per-check timeout of later checks
    pub fn set_timeout(&mut self, timeout_ms: Option<u64>) {
        self.options.timeout_ms = timeout_ms;
    }

    /// Opens a scope; literals asserted in it are retracted when it ends
    pub fn scope(&mut self) -> Scope<'_, S> {
        Scope {
            session: self,
            assumptions: Vec::new(),
            literals: Vec::new(),
        }
    }

    /// Checks a conjunction of literals in a fresh scope
    pub fn try_scenario(&mut self, literals: &[Literal]) -> Result<Outcome> {
        let mut scope = self.scope();
        for literal in literals {
            scope.assert(literal.clone())?;
        }
        Ok(scope.check())
    }

    /// The domain, subregions included
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Session counters
    pub fn statistics(&self) -> &SessionStatistics {
        &self.stats
    }

    fn literal_var(&self, literal: &Literal) -> Result<i32> {
        let x = self.domain.index_of(&literal.first)?;
        let y = self.domain.index_of(&literal.second)?;
        let var = self.vars.relation(literal.relation, x, y);
        Ok(if literal.positive { var } else { -var })
    }

    fn check(&mut self, assumptions: Vec<i32>, literals: Vec<Literal>) -> Outcome {
        self.stats.checks += 1;

        let backend = &mut self.backend;
        let deadline = self
            .options
            .timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        backend.set_deadline(deadline);
        let verdict = Verdict::from(backend.solve_with_assumptions(&assumptions));

        if verdict == Verdict::Unknown && deadline.is_some_and(|d| Instant::now() >= d) {
            self.stats.timeouts += 1;
            warn!(timeout_ms = ?self.options.timeout_ms, "scenario check timed out");
        }
        let core = (verdict == Verdict::Unsat && self.options.capture_cores).then(|| {
            let failed = backend.unsat_core();
            assumptions
                .iter()
                .zip(&literals)
                .filter(|(lit, _)| failed.contains(*lit))
                .map(|(_, literal)| literal.clone())
                .collect()
        });
        let model = (verdict == Verdict::Sat && self.options.capture_models)
            .then(|| Model::capture(&*backend, &self.domain, &self.vars));

        Outcome {
            verdict,
            core,
            model,
        }
    }
}

fn load<S: SATSolver + Default>(cnf: &CNF) -> S {
    let mut backend = S::default();
    backend.add_variables(cnf.num_variables);
    for clause in &cnf.clauses {
        backend.add_clause(clause);
    }
    backend
}

/// A pushed solver scope
///
/// The scope mutably borrows its session, so no other scope can be opened
/// until this one is checked (consumed) or dropped.
pub struct Scope<'s, S: SATSolver + Default> {
    session: &'s mut Session<S>,
    assumptions: Vec<i32>,
    literals: Vec<Literal>,
}

impl<S: SATSolver + Default> Scope<'_, S> {
    /// Asserts a literal for the lifetime of this scope
    pub fn assert(&mut self, literal: Literal) -> Result<&mut Self> {
        let var = self.session.literal_var(&literal)?;
        self.assumptions.push(var);
        self.literals.push(literal);
        Ok(self)
    }

    /// Literals asserted so far
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Checks the scope and pops it
    pub fn check(self) -> Outcome {
        self.session.check(self.assumptions, self.literals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Session {
        Session::new(&["A", "B", "C"], &SessionOptions::default()).unwrap()
    }

    #[test]
    fn cyclic_proper_parts_are_unsat() {
        let mut session = triangle();
        let outcome = session
            .try_scenario(&[
                Literal::holds(Rcc5::Pp, "A", "B"),
                Literal::holds(Rcc5::Pp, "B", "C"),
                Literal::holds(Rcc5::Pp, "C", "A"),
            ])
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Unsat);
        let core = outcome.core.unwrap();
        assert!(!core.is_empty());
        assert!(core.iter().all(|l| l.relation == Rcc5::Pp));
    }

    #[test]
    fn scopes_leave_no_trace() {
        let mut session = triangle();
        let clauses = session.statistics().axiom_clauses;

        let mut scope = session.scope();
        scope.assert(Literal::holds(Rcc5::Dr, "A", "B")).unwrap();
        assert_eq!(scope.check().verdict, Verdict::Sat);

        // DR(A,B) is gone, so EQ(A,B) is satisfiable again
        let outcome = session
            .try_scenario(&[Literal::holds(Rcc5::Eq, "A", "B")])
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Sat);
        assert_eq!(session.statistics().axiom_clauses, clauses);
        assert_eq!(session.statistics().checks, 2);
    }

    #[test]
    fn negative_literals() {
        let mut session = triangle();
        let mut scope = session.scope();
        for r in Rcc5::ALL {
            scope.assert(Literal::fails(r, "A", "B")).unwrap();
        }
        assert_eq!(scope.check().verdict, Verdict::Unsat);
    }

    #[test]
    fn unknown_region_is_an_error() {
        let mut session = triangle();
        let err = session.try_scenario(&[Literal::holds(Rcc5::Eq, "A", "Z")]);
        assert!(err.is_err());
    }

    #[test]
    fn permanent_parthood() {
        let mut session = triangle();
        session.assert_part_of("A", "B").unwrap();
        let outcome = session
            .try_scenario(&[Literal::holds(Rcc5::Dr, "A", "B")])
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Unsat);
    }

    #[test]
    fn model_capture() {
        let options = SessionOptions {
            capture_models: true,
            ..SessionOptions::default()
        };
        let mut session = Session::new(&["A", "B"], &options).unwrap();
        let outcome = session
            .try_scenario(&[Literal::holds(Rcc5::Po, "A", "B")])
            .unwrap();
        let model = outcome.model.unwrap();
        assert_eq!(model.relation("A", "B"), Some(Rcc5::Po));
        assert_eq!(model.relation("B", "A"), Some(Rcc5::Po));
        assert_eq!(model.part_of("A", "A"), Some(true));
        assert_eq!(model.equal("A", "A"), Some(true));
        assert_eq!(model.part_of("A", "Q"), None);
    }

    #[test]
    fn literal_display() {
        assert_eq!(Literal::holds(Rcc5::Ppi, "A1", "B2").to_string(), "PPi(A1, B2)");
        assert_eq!(Literal::fails(Rcc5::Dr, "A1", "B2").to_string(), "Not(DR(A1, B2))");
    }

    #[test]
    fn timeout_option_still_answers_quick_checks() {
        let options = SessionOptions {
            timeout_ms: Some(10_000),
            ..SessionOptions::default()
        };
        let mut session = Session::new(&["A", "B"], &options).unwrap();
        let outcome = session
            .try_scenario(&[Literal::holds(Rcc5::Pp, "A", "B")])
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Sat);
        assert_eq!(session.statistics().timeouts, 0);
    }

    #[test]
    fn expired_timeout_gives_unknown_and_keeps_the_session() {
        let options = SessionOptions {
            timeout_ms: Some(0),
            capture_models: true,
            ..SessionOptions::default()
        };
        let mut session = Session::new(&["A", "B", "C"], &options).unwrap();
        let scenario = [
            Literal::holds(Rcc5::Pp, "A", "B"),
            Literal::holds(Rcc5::Pp, "B", "C"),
            Literal::holds(Rcc5::Pp, "C", "A"),
        ];

        let outcome = session.try_scenario(&scenario).unwrap();
        assert_eq!(outcome.verdict, Verdict::Unknown);
        assert!(outcome.core.is_none());
        assert!(outcome.model.is_none());
        assert_eq!(session.statistics().timeouts, 1);

        session.set_timeout(None);
        let outcome = session.try_scenario(&scenario).unwrap();
        assert_eq!(outcome.verdict, Verdict::Unsat);
        assert!(outcome.core.is_some_and(|c| !c.is_empty()));

        let outcome = session
            .try_scenario(&[Literal::holds(Rcc5::Po, "A", "B")])
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Sat);
        assert_eq!(outcome.model.unwrap().relation("A", "B"), Some(Rcc5::Po));
        assert_eq!(session.statistics().checks, 3);
        assert_eq!(session.statistics().timeouts, 1);
    }
}
