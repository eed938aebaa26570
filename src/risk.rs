//! Risk aggregation
//!
//! Satisfiable scenarios are folded into per-pair, per-relation occurrence
//! counts. A [`WeightPolicy`] turns counts into weights and each non-EQ
//! relation with a positive weight becomes a [`WeaknessRecord`], classified
//! by the region kinds of its pair.

use crate::builder::RegionModel;
use crate::model::ComponentKind;
use crate::rcc5::Rcc5;
use crate::region::{RegionKind, RegionPair};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occurrence counts per pair and relation
///
/// Relations are oriented as `relation(pair.first(), pair.second())`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occurrences {
    counts: FxHashMap<RegionPair, [u64; 5]>,
}

impl Occurrences {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` occurrences of `relation` on `pair`
    pub fn add(&mut self, pair: RegionPair, relation: Rcc5, count: u64) {
        self.counts.entry(pair).or_default()[relation.index()] += count;
    }

    /// Occurrences of `relation` on `pair`
    pub fn get(&self, pair: RegionPair, relation: Rcc5) -> u64 {
        self.counts.get(&pair).map_or(0, |c| c[relation.index()])
    }

    /// Adds every count of `other` into `self`
    pub fn merge(&mut self, other: &Occurrences) {
        for (&pair, counts) in &other.counts {
            let mine = self.counts.entry(pair).or_default();
            for (m, c) in mine.iter_mut().zip(counts) {
                *m += c;
            }
        }
    }

    /// Number of pairs with at least one entry
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Scoring of relation occurrences
pub trait WeightPolicy {
    /// Weight of `relation` on a pair of a sub-structure that was not enumerated
    fn acyclic_weight(&self, relation: Rcc5) -> u64;

    /// Weight of a relation seen in `occurrences` satisfiable scenarios
    fn cyclic_weight(&self, occurrences: u64) -> u64 {
        occurrences
    }

    /// Risk score contribution of one pair that was not enumerated
    fn acyclic_contribution(&self) -> u64;
}

/// Weights are satisfiable scenario counts; every relation of a
/// non-enumerated pair gets one uniform weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioCountPolicy {
    /// Uniform weight of non-enumerated pairs
    pub acyclic_weight: u64,
}

impl Default for ScenarioCountPolicy {
    fn default() -> Self {
        Self { acyclic_weight: 5 }
    }
}

impl WeightPolicy for ScenarioCountPolicy {
    fn acyclic_weight(&self, _relation: Rcc5) -> u64 {
        self.acyclic_weight
    }

    fn acyclic_contribution(&self) -> u64 {
        self.acyclic_weight
    }
}

/// Weakness class, chosen by the region kinds of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeaknessClass {
    /// belief ↔ assertion
    Port,
    /// belief ↔ fact
    FunctionalBlock,
    /// assertion ↔ assertion
    Channel,
}

impl WeaknessClass {
    /// Classifies a pair by the kinds of its regions
    pub fn classify(a: RegionKind, b: RegionKind) -> Option<Self> {
        use RegionKind::*;
        match (a, b) {
            (Belief, Assertion) | (Assertion, Belief) => Some(WeaknessClass::Port),
            (Belief, Fact) | (Fact, Belief) => Some(WeaknessClass::FunctionalBlock),
            (Assertion, Assertion) => Some(WeaknessClass::Channel),
            _ => None,
        }
    }

    /// Kebab-case name
    pub fn name(self) -> &'static str {
        match self {
            WeaknessClass::Port => "port",
            WeaknessClass::FunctionalBlock => "functional-block",
            WeaknessClass::Channel => "channel",
        }
    }
}

impl fmt::Display for WeaknessClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalogue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weakness {
    /// What can go wrong
    pub description: &'static str,
    /// Mitigation tag
    pub mitigation: &'static str,
}

/// Looks up the weakness of `relation` in `class`
///
/// Relations are read as `relation(belief, assertion)` for ports,
/// `relation(belief, fact)` for blocks and `relation(sent, delivered)` for
/// channels. EQ is the intended behaviour and has no entry.
pub fn weakness(class: WeaknessClass, relation: Rcc5) -> Option<Weakness> {
    use Rcc5::*;
    use WeaknessClass::*;

    let (description, mitigation) = match (class, relation) {
        (_, Eq) => return None,

        (Port, Pp) => ("information loss: the port passes on only part of the information", "completeness-check"),
        (Port, Ppi) => ("injection: the port adds information that was never asserted (spoofing)", "authentication"),
        (Port, Po) => ("tampering: the port alters part of the information it passes on", "integrity-protection"),
        (Port, Dr) => ("substitution: the information behind the port is unrelated to what is asserted", "input-validation"),

        (FunctionalBlock, Pp) => ("incomplete knowledge: the block believes only part of the ground truth", "redundancy"),
        (FunctionalBlock, Ppi) => ("false belief: the block believes more than what is true", "plausibility-check"),
        (FunctionalBlock, Po) => ("partially wrong belief: the block's belief is partly true and partly false", "cross-validation"),
        (FunctionalBlock, Dr) => ("contradiction: the block's belief shares nothing with the ground truth", "safe-state-fallback"),

        (Channel, Pp) => ("injection: the channel delivers more than was sent", "message-authentication"),
        (Channel, Ppi) => ("truncation: the channel delivers only part of what was sent", "acknowledgement"),
        (Channel, Po) => ("tampering: the channel modifies messages in transit", "message-integrity-code"),
        (Channel, Dr) => ("replacement: delivered messages are unrelated to those sent (loss or replay)", "sequence-numbering"),
    };
    Some(Weakness {
        description,
        mitigation,
    })
}

/// A satisfiable, non-EQ relation on a pair, tied to its component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaknessRecord {
    /// Relation, oriented as `relation(first, second)`
    pub relation: Rcc5,
    /// Display name of the leading region
    pub first: String,
    /// Display name of the other region
    pub second: String,
    /// Id of the component whose association created the pair
    pub component: String,
    /// Name of that component
    pub component_name: String,
    /// Kind of that component
    pub component_kind: ComponentKind,
    /// Name of the owning agent
    pub agent: String,
    /// Weakness class
    pub class: WeaknessClass,
    /// Weakness description
    pub description: String,
    /// Mitigation tag
    pub mitigation: String,
    /// Weight under the active policy
    pub weight: u64,
}

/// Folds sub-structure results into weights and a risk score
#[derive(Debug)]
pub struct RiskAggregator<'a, P: WeightPolicy> {
    policy: &'a P,
    enumerated: Occurrences,
    unenumerated: FxHashSet<RegionPair>,
    sat_scenarios: u64,
}

impl<'a, P: WeightPolicy> RiskAggregator<'a, P> {
    /// Creates an empty aggregator
    pub fn new(policy: &'a P) -> Self {
        Self {
            policy,
            enumerated: Occurrences::new(),
            unenumerated: FxHashSet::default(),
            sat_scenarios: 0,
        }
    }

    /// Adds the occurrences and satisfiable count of an enumerated sub-structure
    pub fn add_enumerated(&mut self, occurrences: &Occurrences, sat_scenarios: u64) {
        self.enumerated.merge(occurrences);
        self.sat_scenarios += sat_scenarios;
    }

    /// Adds a pair treated as realizable under every relation
    ///
    /// Adding a pair twice has no further effect.
    pub fn add_unenumerated(&mut self, pair: RegionPair) {
        self.unenumerated.insert(pair);
    }

    /// Weight of `relation(pair.first(), pair.second())`
    pub fn weight(&self, pair: RegionPair, relation: Rcc5) -> u64 {
        if self.unenumerated.contains(&pair) {
            self.policy.acyclic_weight(relation)
        } else {
            self.policy.cyclic_weight(self.enumerated.get(pair, relation))
        }
    }

    /// Satisfiable scenarios plus the contribution of every unenumerated pair
    pub fn risk_score(&self) -> u64 {
        self.sat_scenarios + self.unenumerated.len() as u64 * self.policy.acyclic_contribution()
    }

    /// Weakness records in pair order, then relation order
    pub fn records(&self, model: &RegionModel) -> Vec<WeaknessRecord> {
        let regions = model.regions();
        let mut records = Vec::new();

        for record in model.pairs() {
            let pair = record.pair;
            let (a, b) = (pair.first(), pair.second());
            let Some(class) = WeaknessClass::classify(regions.kind(a), regions.kind(b)) else {
                continue;
            };
            let flipped = record.lead != a;
            let (first, second) = if flipped { (b, a) } else { (a, b) };

            let component = &model.components()[record.origin];
            let agent = model.owner_of(record.origin);

            for relation in Rcc5::ALL {
                let weight = self.weight(pair, relation);
                let oriented = if flipped { relation.inverse() } else { relation };
                let Some(entry) = weakness(class, oriented) else { continue };
                if weight == 0 {
                    continue;
                }
                records.push(WeaknessRecord {
                    relation: oriented,
                    first: regions.name(first).to_string(),
                    second: regions.name(second).to_string(),
                    component: component.id.clone(),
                    component_name: component.name.clone(),
                    component_kind: component.kind,
                    agent: agent.name.clone(),
                    class,
                    description: entry.description.to_string(),
                    mitigation: entry.mitigation.to_string(),
                    weight,
                });
            }
        }

        records
    }
}
