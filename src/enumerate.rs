//! Scenario enumeration
//!
//! A sub-structure with `n` pairs has `5^n` scenarios, ordered
//! lexicographically over `[EQ, PP, PPi, PO, DR]` with the last pair varying
//! fastest. Every scenario is checked in its own session scope and logged
//! with its index, so an interrupted run can resume from any index.

use crate::builder::Parthood;
use crate::decompose::Substructure;
use crate::engine::{DefaultBackend, SATSolver};
use crate::error::{AnalysisError, Result};
use crate::rcc5::Rcc5;
use crate::region::{RegionPair, RegionTable};
use crate::report::{ScenarioRecord, ScenarioSink};
use crate::risk::Occurrences;
use crate::session::{Literal, Session, SessionOptions, SessionStatistics, Verdict};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::{debug, info};

/// Lexicographic product of RCC5 relations over `n` pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioSpace {
    pairs: usize,
}

impl ScenarioSpace {
    /// Space over `pairs` pairs
    pub fn new(pairs: usize) -> Self {
        Self { pairs }
    }

    /// `5^pairs`, or None if it overflows u64
    pub fn count(&self) -> Option<u64> {
        5u64.checked_pow(u32::try_from(self.pairs).ok()?)
    }

    /// The scenario at `index`, or None past the end
    pub fn decode(&self, index: u64) -> Option<Vec<Rcc5>> {
        if self.count().is_some_and(|count| index >= count) {
            return None;
        }
        let mut scenario = vec![Rcc5::Eq; self.pairs];
        let mut rest = index;
        for slot in scenario.iter_mut().rev() {
            *slot = Rcc5::ALL[(rest % 5) as usize];
            rest /= 5;
        }
        Some(scenario)
    }

    /// Iterates `(index, scenario)` starting at `start`
    pub fn iter_from(&self, start: u64) -> ScenarioIter {
        let digits = self
            .decode(start)
            .map(|s| s.iter().map(|r| r.index()).collect());
        ScenarioIter {
            digits,
            index: start,
        }
    }
}

/// Iterator over a [`ScenarioSpace`]
#[derive(Debug, Clone)]
pub struct ScenarioIter {
    digits: Option<Vec<usize>>,
    index: u64,
}

impl Iterator for ScenarioIter {
    type Item = (u64, Vec<Rcc5>);

    fn next(&mut self) -> Option<Self::Item> {
        let digits = self.digits.as_mut()?;
        let item = (self.index, digits.iter().map(|&d| Rcc5::ALL[d]).collect());

        // odometer increment, last position fastest
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            *d += 1;
            if *d < 5 {
                carry = false;
                break;
            }
            *d = 0;
        }
        if carry {
            self.digits = None;
        }
        self.index += 1;

        Some(item)
    }
}

/// Position to continue an interrupted run from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    /// Sub-structure id; earlier ones are skipped
    pub substructure: usize,
    /// First scenario index to check in that sub-structure
    pub index: u64,
}

impl ResumePoint {
    /// The scenario right after the last logged one
    pub fn after(records: &[ScenarioRecord]) -> Option<Self> {
        records.last().map(|r| Self {
            substructure: r.substructure,
            index: r.index + 1,
        })
    }
}

/// Tally of one enumerated sub-structure
#[derive(Debug, Clone, Default)]
pub struct SubstructureResult {
    /// Sub-structure id
    pub substructure: usize,
    /// First index checked
    pub start: u64,
    /// Scenarios checked
    pub scenarios: u64,
    /// Satisfiable scenarios
    pub sat: u64,
    /// Unsatisfiable scenarios
    pub unsat: u64,
    /// Scenarios without a verdict
    pub unknown: u64,
    /// Non-EQ relations of satisfiable scenarios
    pub occurrences: Occurrences,
    /// Counters of the session used
    pub session: SessionStatistics,
}

/// Formats a scenario as `And(PP(A1, B2), ...)`
pub fn formula_text(literals: &[Literal]) -> String {
    let parts: Vec<String> = literals.iter().map(Literal::to_string).collect();
    format!("And({})", parts.join(", "))
}

/// Enumerates the scenarios of sub-structures against fresh sessions
pub struct Enumerator<'a, S = DefaultBackend> {
    regions: &'a RegionTable,
    pairs: &'a [RegionPair],
    options: &'a SessionOptions,
    parthood: &'a [Parthood],
    backend: PhantomData<S>,
}

impl<'a> Enumerator<'a, DefaultBackend> {
    /// Creates an enumerator on the default backend
    pub fn new(regions: &'a RegionTable, pairs: &'a [RegionPair], options: &'a SessionOptions) -> Self {
        Self::with_backend(regions, pairs, options)
    }
}

impl<'a, S: SATSolver + Default> Enumerator<'a, S> {
    /// Creates an enumerator on backend `S`
    ///
    /// `pairs` is the pair list the sub-structures were decomposed from.
    pub fn with_backend(regions: &'a RegionTable, pairs: &'a [RegionPair], options: &'a SessionOptions) -> Self {
        Self {
            regions,
            pairs,
            options,
            parthood: &[],
            backend: PhantomData,
        }
    }

    /// Also asserts the ownership constraints touching each sub-structure
    pub fn with_parthood(mut self, parthood: &'a [Parthood]) -> Self {
        self.parthood = parthood;
        self
    }

    /// Checks every scenario of `sub` from index `start` on
    ///
    /// # Errors
    /// [`AnalysisError::InvalidResume`] if `start` is past the last scenario,
    /// or any error of the sink.
    pub fn run(&self, sub: &Substructure, start: u64, sink: &mut dyn ScenarioSink) -> Result<SubstructureResult> {
        let space = ScenarioSpace::new(sub.pairs.len());
        if space.decode(start).is_none() {
            return Err(AnalysisError::InvalidResume(format!(
                "sub-structure {} has {} scenarios, cannot start at {start}",
                sub.id,
                space.count().unwrap_or(u64::MAX)
            )));
        }

        let mut session = self.session(sub)?;
        let pairs: Vec<(RegionPair, &str, &str)> = sub
            .pairs
            .iter()
            .map(|&i| {
                let pair = self.pairs[i];
                (pair, self.regions.name(pair.first()), self.regions.name(pair.second()))
            })
            .collect();

        info!(
            substructure = sub.id,
            pairs = pairs.len(),
            scenarios = ?space.count(),
            start,
            "enumerating sub-structure"
        );

        let mut result = SubstructureResult {
            substructure: sub.id,
            start,
            ..SubstructureResult::default()
        };

        for (index, scenario) in space.iter_from(start) {
            let literals: Vec<Literal> = pairs
                .iter()
                .zip(&scenario)
                .map(|(&(_, a, b), &r)| Literal::holds(r, a, b))
                .collect();
            let outcome = session.try_scenario(&literals)?;
            debug!(substructure = sub.id, index, verdict = %outcome.verdict, "scenario checked");

            result.scenarios += 1;
            match outcome.verdict {
                Verdict::Sat => {
                    result.sat += 1;
                    for (&(pair, _, _), &r) in pairs.iter().zip(&scenario) {
                        if r != Rcc5::Eq {
                            result.occurrences.add(pair, r, 1);
                        }
                    }
                }
                Verdict::Unsat => result.unsat += 1,
                Verdict::Unknown => result.unknown += 1,
            }

            sink.record(&ScenarioRecord {
                substructure: sub.id,
                index,
                verdict: outcome.verdict,
                formula: formula_text(&literals),
                core: outcome
                    .core
                    .map(|core| core.iter().map(Literal::to_string).collect()),
            })?;
        }
        sink.finish_substructure(sub.id)?;

        result.session = session.statistics().clone();
        info!(
            substructure = sub.id,
            sat = result.sat,
            unsat = result.unsat,
            unknown = result.unknown,
            "sub-structure done"
        );
        Ok(result)
    }

    fn session(&self, sub: &Substructure) -> Result<Session<S>> {
        let mut names: Vec<&str> = sub.nodes.iter().map(|&r| self.regions.name(r)).collect();
        let constraints: Vec<&Parthood> = self
            .parthood
            .iter()
            .filter(|p| sub.nodes.contains(&p.part))
            .collect();
        for p in &constraints {
            let whole = self.regions.name(p.whole);
            if !names.contains(&whole) {
                names.push(whole);
            }
        }

        let mut session = Session::<S>::axiomatize(&names, self.options)?;
        for p in constraints {
            session.assert_part_of(self.regions.name(p.part), self.regions.name(p.whole))?;
        }
        Ok(session)
    }
}
