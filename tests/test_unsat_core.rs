//! Tests for unsat core extraction using assumptions

use rcc5_risk::engine::{rustsat_adapter::RustSatAdapter, SATSolver, SolveOutcome};
use rcc5_risk::session::{Literal, Session, SessionOptions, Verdict};
use rcc5_risk::Rcc5;
use rustsat_batsat::BasicSolver;

#[test]
fn test_unsat_core_simple() {
    // (x1 ∨ x2) ∧ (¬x1 ∨ x3) ∧ (¬x2 ∨ x3), assuming x1, x2, ¬x3
    let mut solver = RustSatAdapter::new(BasicSolver::default());
    solver.add_variables(3);

    solver.add_clause(&[1, 2]);
    solver.add_clause(&[-1, 3]);
    solver.add_clause(&[-2, 3]);

    let assumptions = vec![1, 2, -3];
    assert_eq!(solver.solve_with_assumptions(&assumptions), SolveOutcome::Unsat);

    let core = solver.unsat_core();
    assert!(!core.is_empty(), "Core should not be empty");
    for lit in &core {
        assert!(assumptions.contains(lit), "Core literal {lit} should be an assumption");
    }
    assert!(core.contains(&-3));
}

#[test]
fn test_unsat_core_without_assumptions() {
    let mut solver = RustSatAdapter::new(BasicSolver::default());
    solver.add_variables(2);

    solver.add_clause(&[1]);
    solver.add_clause(&[-1]);

    assert_eq!(solver.solve(), SolveOutcome::Unsat);
    assert_eq!(solver.solve_with_assumptions(&[2]), SolveOutcome::Unsat);

    // x2 plays no part in the conflict
    assert!(!solver.unsat_core().contains(&2));
}

#[test]
fn test_unsat_core_partial() {
    // (x1 ∨ x2) ∧ (¬x1 ∨ ¬x2), assuming x1, x2, x3
    let mut solver = RustSatAdapter::new(BasicSolver::default());
    solver.add_variables(3);

    solver.add_clause(&[1, 2]);
    solver.add_clause(&[-1, -2]);

    assert_eq!(solver.solve_with_assumptions(&[1, 2, 3]), SolveOutcome::Unsat);

    let core = solver.unsat_core();
    assert!(core.contains(&1) || core.contains(&2));
    assert!(!core.contains(&3));
}

#[test]
fn test_scenario_core_names_the_cycle() {
    let mut session = Session::new(&["A", "B", "C", "D"], &SessionOptions::default()).unwrap();
    let outcome = session
        .try_scenario(&[
            Literal::holds(Rcc5::Pp, "A", "B"),
            Literal::holds(Rcc5::Pp, "B", "C"),
            Literal::holds(Rcc5::Pp, "C", "A"),
            Literal::holds(Rcc5::Dr, "C", "D"),
        ])
        .unwrap();

    assert_eq!(outcome.verdict, Verdict::Unsat);
    let core = outcome.core.expect("cores are captured by default");
    assert!(!core.is_empty());
    // DR(C, D) is consistent with the cycle's members and never needed
    assert!(core.iter().all(|l| l.relation == Rcc5::Pp));
}

#[test]
fn test_cores_can_be_disabled() {
    let options = SessionOptions {
        capture_cores: false,
        ..SessionOptions::default()
    };
    let mut session = Session::new(&["A", "B"], &options).unwrap();
    let outcome = session
        .try_scenario(&[Literal::holds(Rcc5::Pp, "A", "B"), Literal::holds(Rcc5::Pp, "B", "A")])
        .unwrap();
    assert_eq!(outcome.verdict, Verdict::Unsat);
    assert!(outcome.core.is_none());
}

#[test]
fn test_expired_timeout_reports_unknown() {
    let options = SessionOptions {
        timeout_ms: Some(0),
        ..SessionOptions::default()
    };
    let mut session = Session::new(&["A", "B", "C"], &options).unwrap();
    let cycle = [
        Literal::holds(Rcc5::Pp, "A", "B"),
        Literal::holds(Rcc5::Pp, "B", "C"),
        Literal::holds(Rcc5::Pp, "C", "A"),
    ];

    for r in Rcc5::ALL {
        let outcome = session.try_scenario(&[Literal::holds(r, "A", "B")]).unwrap();
        assert_eq!(outcome.verdict, Verdict::Unknown);
        assert!(outcome.core.is_none());
    }
    assert_eq!(session.try_scenario(&cycle).unwrap().verdict, Verdict::Unknown);
    assert_eq!(session.statistics().timeouts, 6);

    session.set_timeout(Some(60_000));
    let outcome = session.try_scenario(&cycle).unwrap();
    assert_eq!(outcome.verdict, Verdict::Unsat);
    assert!(outcome.core.is_some_and(|core| !core.is_empty()));
    assert_eq!(session.statistics().timeouts, 6);
    assert_eq!(session.statistics().checks, 7);
}
