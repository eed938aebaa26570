//! Analysis outputs: scenario log, risk table, summary and graph rendering

use crate::builder::{ComponentRegions, RegionModel};
use crate::decompose::Substructure;
use crate::error::{AnalysisError, Result};
use crate::model::ComponentKind;
use crate::region::{RegionId, RegionKind};
use crate::risk::WeaknessRecord;
use crate::session::Verdict;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::{BufRead, BufWriter, Write};

/// One checked scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Sub-structure id
    pub substructure: usize,
    /// Lexicographic index within the sub-structure's scenario space
    pub index: u64,
    /// Verdict
    pub verdict: Verdict,
    /// Ground formula, e.g. `And(PP(B3, A4), EQ(A4, A9))`
    pub formula: String,
    /// Failed literals of an unsatisfiable scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<Vec<String>>,
}

/// Append-only destination for scenario records
pub trait ScenarioSink {
    /// Appends one record
    fn record(&mut self, record: &ScenarioRecord) -> Result<()>;

    /// Called after the last scenario of a sub-structure
    fn finish_substructure(&mut self, _substructure: usize) -> Result<()> {
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    /// Records in arrival order
    pub records: Vec<ScenarioRecord>,
}

impl ScenarioSink for VecSink {
    fn record(&mut self, record: &ScenarioRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Writes one JSON object per line, flushing after every sub-structure
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Flushes and returns the inner writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| AnalysisError::Io(e.into_error()))
    }
}

impl<W: Write> ScenarioSink for JsonLinesSink<W> {
    fn record(&mut self, record: &ScenarioRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish_substructure(&mut self, _substructure: usize) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads a JSON-lines scenario log, ignoring blank lines
pub fn read_log<R: BufRead>(reader: R) -> Result<Vec<ScenarioRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// A row of the risk table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskRow {
    /// Owning agent
    pub agent: String,
    /// Component name
    pub component: String,
    /// Component kind
    pub component_kind: ComponentKind,
    /// Weakness description
    pub weakness: String,
    /// Mitigation tag
    pub mitigation: String,
    /// Weight
    pub weight: u64,
    /// Review status, always `open` when produced
    pub status: String,
}

impl From<&WeaknessRecord> for RiskRow {
    fn from(record: &WeaknessRecord) -> Self {
        Self {
            agent: record.agent.clone(),
            component: record.component_name.clone(),
            component_kind: record.component_kind,
            weakness: format!(
                "{}({}, {}): {}",
                record.relation, record.first, record.second, record.description
            ),
            mitigation: record.mitigation.clone(),
            weight: record.weight,
            status: "open".to_string(),
        }
    }
}

/// Why a sub-structure was not enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "reason")]
pub enum SkipReason {
    /// Its projected scenario count exceeds the configured limit
    ScenarioLimit {
        /// Projected count, None if it overflows u64
        projected: Option<u64>,
    },
    /// It lies before the resume point
    BeforeResume,
}

/// A sub-structure left out of enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// Sub-structure id
    pub substructure: usize,
    /// Number of pairs
    pub pairs: usize,
    /// Reason
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Summary statistics of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Region pairs
    pub pairs: usize,
    /// Sub-structures
    pub substructures: usize,
    /// Cyclic sub-structures
    pub cyclic: usize,
    /// Scenarios checked
    pub scenarios: u64,
    /// Satisfiable scenarios
    pub sat: u64,
    /// Unsatisfiable scenarios
    pub unsat: u64,
    /// Scenarios without a verdict
    pub unknown: u64,
    /// Sub-structures skipped
    pub skipped: usize,
    /// Aggregate risk score
    pub risk_score: u64,
}

/// Renders the dependency graph in Graphviz DOT
///
/// Nodes are regions. Solid edges are region pairs (red when their
/// sub-structure is cyclic), dashed edges are parthood towards agent
/// aggregates, dotted edges lead from a region replaced by a flow to its
/// representative.
pub fn render_dot(model: &RegionModel, substructures: &[Substructure]) -> String {
    let regions = model.regions();
    let mut used: FxHashSet<RegionId> = FxHashSet::default();
    for node in model.components() {
        match &node.regions {
            ComponentRegions::Agent(agent) => {
                used.insert(agent.belief);
                used.insert(agent.assertion);
                used.extend(agent.fact);
            }
            other => used.extend(other.own_regions()),
        }
    }
    for eq in model.equalities() {
        used.insert(eq.replaced);
    }

    let mut cyclic_pairs = FxHashSet::default();
    for sub in substructures.iter().filter(|s| s.cyclic) {
        cyclic_pairs.extend(sub.pairs.iter().copied());
    }

    let mut out = String::from("graph regions {\n");
    for region in regions.iter().filter(|r| used.contains(&r.id())) {
        let shape = match region.kind() {
            RegionKind::Assertion => "box",
            RegionKind::Belief => "ellipse",
            RegionKind::Fact => "diamond",
        };
        let style = if model.resolve(region.id()) == region.id() { "solid" } else { "dotted" };
        let _ = writeln!(out, "  {} [shape={shape}, style={style}];", region.name());
    }
    for (i, record) in model.pairs().iter().enumerate() {
        let color = if cyclic_pairs.contains(&i) { "red" } else { "black" };
        let origin = &model.components()[record.origin];
        let _ = writeln!(
            out,
            "  {} -- {} [label=\"{}\", color={color}];",
            regions.name(record.pair.first()),
            regions.name(record.pair.second()),
            origin.name
        );
    }
    for p in model.parthood() {
        let _ = writeln!(
            out,
            "  {} -- {} [style=dashed, label=\"P\"];",
            regions.name(p.part),
            regions.name(p.whole)
        );
    }
    for eq in model.equalities() {
        let _ = writeln!(
            out,
            "  {} -- {} [style=dotted, label=\"{}->{}\"];",
            regions.name(eq.replaced),
            regions.name(eq.by),
            eq.source,
            eq.target
        );
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record(index: u64, verdict: Verdict) -> ScenarioRecord {
        ScenarioRecord {
            substructure: 0,
            index,
            verdict,
            formula: "And(PP(A1, B2))".to_string(),
            core: None,
        }
    }

    #[test]
    fn json_lines_round_trip() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(&record(0, Verdict::Sat)).unwrap();
        sink.record(&record(1, Verdict::Unknown)).unwrap();
        sink.finish_substructure(0).unwrap();

        let bytes = sink.into_inner().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with(r#"{"substructure":0,"index":0,"verdict":"sat""#));

        let back = read_log(Cursor::new(bytes)).unwrap();
        assert_eq!(back, vec![record(0, Verdict::Sat), record(1, Verdict::Unknown)]);
    }

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink = VecSink::default();
        for i in 0..3 {
            sink.record(&record(i, Verdict::Unsat)).unwrap();
        }
        let indices: Vec<_> = sink.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn skipped_serializes_flat() {
        let skipped = Skipped {
            substructure: 2,
            pairs: 30,
            reason: SkipReason::ScenarioLimit { projected: None },
        };
        let json = serde_json::to_value(skipped).unwrap();
        assert_eq!(json["reason"], "scenario-limit");
        assert_eq!(json["pairs"], 30);
    }
}
