//! Analysis pipeline
//!
//! Model → region model → (ground theory, decomposition) → enumeration →
//! risk aggregation. Structural errors abort before any solving; everything
//! after that is recoverable per scenario.

use crate::builder::RegionModel;
use crate::decompose::{DependencyGraph, Substructure};
use crate::engine::{DefaultBackend, SATSolver};
use crate::enumerate::{Enumerator, ResumePoint, SubstructureResult};
use crate::error::Result;
use crate::model::ArchitectureModel;
use crate::region::RegionPair;
use crate::report::{render_dot, RiskRow, ScenarioSink, SkipReason, Skipped, Summary};
use crate::risk::{RiskAggregator, ScenarioCountPolicy, WeaknessRecord, WeightPolicy};
use crate::session::SessionOptions;
use crate::topology::Axioms;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::marker::PhantomData;
use tracing::{info, warn};

/// Analysis options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Primitive of the ground theory
    pub axioms: Axioms,
    /// Per-scenario timeout in milliseconds (None = no timeout)
    pub timeout_ms: Option<u64>,
    /// Subregions per region in each session domain
    pub subregions_per_region: usize,
    /// Skip sub-structures with more projected scenarios than this
    pub scenario_limit: Option<u64>,
    /// Continue an interrupted run
    pub resume: Option<ResumePoint>,
    /// Enumerate acyclic sub-structures too instead of weighting them uniformly
    pub include_acyclic: bool,
    /// Reroute direct output-port → input-port flows through synthesized channels
    pub synthesize_channels: bool,
    /// Log the failed literals of unsatisfiable scenarios
    pub capture_cores: bool,
    /// Assert agent ownership parthood in each session
    pub assert_ownership: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            axioms: Axioms::default(),
            timeout_ms: None,
            subregions_per_region: 2,
            scenario_limit: None,
            resume: None,
            include_acyclic: false,
            synthesize_channels: false,
            capture_cores: true,
            assert_ownership: false,
        }
    }
}

impl Options {
    /// Session options derived from these options
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            axioms: self.axioms,
            subregions_per_region: self.subregions_per_region,
            timeout_ms: self.timeout_ms,
            capture_cores: self.capture_cores,
            capture_models: false,
        }
    }
}

/// Result of a complete run
#[derive(Debug)]
pub struct AnalysisReport {
    /// Regions, pairs and constraints built from the model
    pub region_model: RegionModel,
    /// Sub-structures in discovery order
    pub substructures: Vec<Substructure>,
    /// Tallies of the enumerated sub-structures
    pub results: Vec<SubstructureResult>,
    /// Sub-structures left out, with the reason
    pub skipped: Vec<Skipped>,
    /// Weakness records in pair order
    pub records: Vec<WeaknessRecord>,
    /// Summary statistics
    pub summary: Summary,
}

impl AnalysisReport {
    /// Rows of the risk table, one per weakness record
    pub fn risk_table(&self) -> Vec<RiskRow> {
        self.records.iter().map(RiskRow::from).collect()
    }

    /// Graphviz rendering of the dependency graph
    pub fn to_dot(&self) -> String {
        render_dot(&self.region_model, &self.substructures)
    }
}

/// Runs the pipeline with a weighting policy on backend `S`
pub struct Analyzer<P = ScenarioCountPolicy, S = DefaultBackend> {
    options: Options,
    policy: P,
    backend: PhantomData<S>,
}

impl Analyzer<ScenarioCountPolicy, DefaultBackend> {
    /// Analyzer with the default policy and backend
    pub fn new(options: Options) -> Self {
        Self::with_policy(options, ScenarioCountPolicy::default())
    }
}

impl<P: WeightPolicy> Analyzer<P, DefaultBackend> {
    /// Analyzer with a custom weighting policy
    pub fn with_policy(options: Options, policy: P) -> Self {
        Self {
            options,
            policy,
            backend: PhantomData,
        }
    }
}

impl<P: WeightPolicy, S: SATSolver + Default> Analyzer<P, S> {
    /// Switches to another SAT backend
    pub fn with_backend<T: SATSolver + Default>(self) -> Analyzer<P, T> {
        Analyzer {
            options: self.options,
            policy: self.policy,
            backend: PhantomData,
        }
    }

    /// The options in use
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Analyzes `model`, streaming every checked scenario to `sink`
    ///
    /// # Errors
    /// Structural errors of the model, an invalid resume point, or sink
    /// failures. Timeouts are not errors; they count as `unknown`.
    pub fn run(&self, model: &ArchitectureModel, sink: &mut dyn ScenarioSink) -> Result<AnalysisReport> {
        let model = if self.options.synthesize_channels {
            let mut normalized = model.clone();
            let channels = normalized.synthesize_channels();
            info!(channels, "synthesized channels");
            Cow::Owned(normalized)
        } else {
            Cow::Borrowed(model)
        };

        let region_model = RegionModel::build(&model)?;
        let pairs: Vec<RegionPair> = region_model.pairs().iter().map(|p| p.pair).collect();
        let substructures = DependencyGraph::new(&pairs).decompose();

        let cyclic = substructures.iter().filter(|s| s.cyclic).count();
        info!(
            pairs = pairs.len(),
            substructures = substructures.len(),
            cyclic,
            "decomposed dependency graph"
        );
        for sub in &substructures {
            info!(
                substructure = sub.id,
                cyclic = sub.cyclic,
                regions = sub.size(),
                pairs = sub.pairs.len(),
                projected = ?sub.scenario_count(),
                "sub-structure"
            );
        }

        let session_options = self.options.session_options();
        let mut enumerator =
            Enumerator::<S>::with_backend(region_model.regions(), &pairs, &session_options);
        if self.options.assert_ownership {
            enumerator = enumerator.with_parthood(region_model.parthood());
        }

        let mut aggregator = RiskAggregator::new(&self.policy);
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for sub in &substructures {
            if !sub.cyclic && !self.options.include_acyclic {
                for &i in &sub.pairs {
                    aggregator.add_unenumerated(pairs[i]);
                }
                continue;
            }

            let start = match self.options.resume {
                Some(resume) if sub.id < resume.substructure => None,
                Some(resume) if sub.id == resume.substructure => {
                    // A log ending on the last scenario resumes past this sub-structure
                    match sub.scenario_count() {
                        Some(count) if resume.index >= count => None,
                        _ => Some(resume.index),
                    }
                }
                _ => Some(0),
            };
            let Some(start) = start else {
                skipped.push(Skipped {
                    substructure: sub.id,
                    pairs: sub.pairs.len(),
                    reason: SkipReason::BeforeResume,
                });
                continue;
            };

            let projected = sub.scenario_count();
            if let Some(limit) = self.options.scenario_limit {
                if !matches!(projected, Some(count) if count <= limit) {
                    warn!(substructure = sub.id, ?projected, limit, "sub-structure exceeds scenario limit, skipped");
                    skipped.push(Skipped {
                        substructure: sub.id,
                        pairs: sub.pairs.len(),
                        reason: SkipReason::ScenarioLimit { projected },
                    });
                    continue;
                }
            }

            let result = enumerator.run(sub, start, sink)?;
            aggregator.add_enumerated(&result.occurrences, result.sat);
            results.push(result);
        }

        let records = aggregator.records(&region_model);
        let summary = Summary {
            pairs: pairs.len(),
            substructures: substructures.len(),
            cyclic,
            scenarios: results.iter().map(|r| r.scenarios).sum(),
            sat: results.iter().map(|r| r.sat).sum(),
            unsat: results.iter().map(|r| r.unsat).sum(),
            unknown: results.iter().map(|r| r.unknown).sum(),
            skipped: skipped.len(),
            risk_score: aggregator.risk_score(),
        };
        if summary.unknown > 0 {
            warn!(unknown = summary.unknown, "some scenarios have no verdict");
        }
        info!(
            scenarios = summary.scenarios,
            sat = summary.sat,
            unsat = summary.unsat,
            unknown = summary.unknown,
            skipped = summary.skipped,
            weaknesses = records.len(),
            risk_score = summary.risk_score,
            "analysis complete"
        );

        Ok(AnalysisReport {
            region_model,
            substructures,
            results,
            skipped,
            records,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComponentKind;
    use crate::report::VecSink;

    fn block_loop() -> ArchitectureModel {
        let mut model = ArchitectureModel::new();
        model
            .agent("a", "controller")
            .component("f", "filter", ComponentKind::FunctionalBlock, "a")
            .component("g", "gain", ComponentKind::FunctionalBlock, "a")
            .flow("f", "g")
            .flow("g", "f");
        model
    }

    #[test]
    fn options_from_json() {
        let options: Options =
            serde_json::from_str(r#"{"scenario_limit": 100, "resume": {"substructure": 1, "index": 7}}"#)
                .unwrap();
        assert_eq!(options.scenario_limit, Some(100));
        assert_eq!(options.subregions_per_region, 2);
        assert_eq!(options.resume, Some(ResumePoint { substructure: 1, index: 7 }));
    }

    #[test]
    fn block_loop_is_enumerated() {
        let mut sink = VecSink::default();
        let report = Analyzer::new(Options::default())
            .run(&block_loop(), &mut sink)
            .unwrap();

        assert_eq!(report.summary.pairs, 4);
        assert_eq!(report.summary.cyclic, 1);
        assert_eq!(report.summary.scenarios, 625);
        assert_eq!(sink.records.len(), 625);
        assert_eq!(report.summary.sat + report.summary.unsat, 625);
        assert!(report.summary.unsat > 0);
        assert_eq!(report.summary.risk_score, report.summary.sat);
        assert!(report
            .risk_table()
            .iter()
            .all(|row| row.component_kind == ComponentKind::FunctionalBlock && row.status == "open"));
    }

    #[test]
    fn scenario_limit_skips() {
        let options = Options {
            scenario_limit: Some(100),
            ..Options::default()
        };
        let mut sink = VecSink::default();
        let report = Analyzer::new(options).run(&block_loop(), &mut sink).unwrap();
        assert_eq!(report.summary.scenarios, 0);
        assert_eq!(report.summary.skipped, 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::ScenarioLimit { projected: Some(625) }
        ));
        assert!(report.records.is_empty());
    }

    #[test]
    fn resume_continues_the_log() {
        let mut full = VecSink::default();
        Analyzer::new(Options::default()).run(&block_loop(), &mut full).unwrap();

        let options = Options {
            resume: Some(ResumePoint { substructure: 0, index: 600 }),
            ..Options::default()
        };
        let mut tail = VecSink::default();
        let report = Analyzer::new(options).run(&block_loop(), &mut tail).unwrap();

        assert_eq!(report.summary.scenarios, 25);
        let key = |r: &crate::report::ScenarioRecord| (r.index, r.verdict, r.formula.clone());
        let expected: Vec<_> = full.records[600..].iter().map(key).collect();
        let resumed: Vec<_> = tail.records.iter().map(key).collect();
        assert_eq!(resumed, expected);
    }

    #[test]
    fn resume_past_the_end_skips() {
        let options = Options {
            resume: Some(ResumePoint { substructure: 0, index: 625 }),
            ..Options::default()
        };
        let mut sink = VecSink::default();
        let report = Analyzer::new(options).run(&block_loop(), &mut sink).unwrap();
        assert_eq!(report.summary.scenarios, 0);
        assert!(matches!(report.skipped[0].reason, SkipReason::BeforeResume));
    }
}
