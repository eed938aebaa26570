//! The grounded axioms classify every triangle exactly as the RCC5
//! composition table predicts, whichever primitive they are built on

use rcc5_risk::rcc5::consistent_triangle;
use rcc5_risk::session::{Literal, Session, SessionOptions, Verdict};
use rcc5_risk::topology::Axioms;
use rcc5_risk::Rcc5;

fn triangle_verdicts(axioms: Axioms) -> Vec<Verdict> {
    let options = SessionOptions {
        axioms,
        ..SessionOptions::default()
    };
    let mut session = Session::new(&["X", "Y", "Z"], &options).unwrap();
    let mut verdicts = Vec::with_capacity(125);

    for r in Rcc5::ALL {
        for s in Rcc5::ALL {
            for t in Rcc5::ALL {
                let outcome = session
                    .try_scenario(&[
                        Literal::holds(r, "X", "Y"),
                        Literal::holds(s, "Y", "Z"),
                        Literal::holds(t, "X", "Z"),
                    ])
                    .unwrap();
                let expected = if consistent_triangle(r, s, t) { Verdict::Sat } else { Verdict::Unsat };
                assert_eq!(outcome.verdict, expected, "{axioms:?}: {r}(X,Y) ∧ {s}(Y,Z) ∧ {t}(X,Z)");
                verdicts.push(outcome.verdict);
            }
        }
    }
    verdicts
}

#[test]
fn test_all_triangles_match_composition_table() {
    let verdicts = triangle_verdicts(Axioms::Mereology);
    assert_eq!(verdicts.iter().filter(|&&v| v == Verdict::Sat).count(), 54);
}

#[test]
fn test_mereotopology_agrees_with_mereology() {
    let mereology = triangle_verdicts(Axioms::Mereology);
    let mereotopology = triangle_verdicts(Axioms::Mereotopology);
    assert_eq!(mereology, mereotopology);
}
