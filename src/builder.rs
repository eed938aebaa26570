//! Region model builder
//!
//! Maps every architecture component onto regions, substitutes regions along
//! information flows, collects each agent's belief/assertion sets and emits
//! the region pairs that need an RCC5 relation.

mod substitution;

pub use substitution::Substitution;

use crate::error::{AnalysisError, Result};
use crate::model::{ArchitectureModel, ComponentKind, ComponentSpec, ROOT};
use crate::region::{RegionId, RegionKind, RegionPair, RegionTable};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::{debug, info};

/// Direction of a port or socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Information flows into the agent
    Input,
    /// Information flows out of the agent
    Output,
}

/// Region sets held by an agent
///
/// `belief` and `assertion` (and `fact` for the root agent) are aggregate
/// regions; every member region is recorded as a part of its aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRegions {
    /// Aggregate belief region
    pub belief: RegionId,
    /// Aggregate assertion region
    pub assertion: RegionId,
    /// Aggregate fact region (root agent only)
    pub fact: Option<RegionId>,
    /// Beliefs of owned components
    pub beliefs: Vec<RegionId>,
    /// Assertions of owned components
    pub assertions: Vec<RegionId>,
    /// Ground-truth facts (root agent only)
    pub facts: Vec<RegionId>,
}

impl AgentRegions {
    fn insert(&mut self, kind: RegionKind, region: RegionId) {
        let set = match kind {
            RegionKind::Belief => &mut self.beliefs,
            RegionKind::Assertion => &mut self.assertions,
            RegionKind::Fact => &mut self.facts,
        };
        if !set.contains(&region) {
            set.push(region);
        }
    }

    fn aggregate(&self, kind: RegionKind) -> Option<RegionId> {
        match kind {
            RegionKind::Belief => Some(self.belief),
            RegionKind::Assertion => Some(self.assertion),
            RegionKind::Fact => self.fact,
        }
    }
}

/// Regions attached to a component, one variant per component role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentRegions {
    /// Agents aggregate the regions of what they own
    Agent(AgentRegions),
    /// Ports translate between an outer assertion and an inner belief
    Port {
        /// Input or output port
        direction: Direction,
        /// Outer-facing region
        assertion: RegionId,
        /// Inner-facing region
        belief: RegionId,
        /// Ground truth for what an input port delivers
        fact: Option<RegionId>,
    },
    /// Functional blocks turn input beliefs into output beliefs
    Block {
        /// Belief consumed
        input: RegionId,
        /// Belief produced
        output: RegionId,
        /// Ground truth for the block output
        fact: RegionId,
    },
    /// Sockets behave like blocks attached to a port
    Socket {
        /// Input or output socket
        direction: Direction,
        /// Belief consumed
        input: RegionId,
        /// Belief produced
        output: RegionId,
        /// Ground truth for the socket output
        fact: RegionId,
    },
    /// Channels carry assertions between ports
    Channel {
        /// Assertion sent
        input: RegionId,
        /// Assertion delivered
        output: RegionId,
    },
    /// External data sources and sinks
    Base {
        /// Belief read from or written to the base
        belief: RegionId,
        /// Ground truth held by the base
        fact: RegionId,
    },
}

impl ComponentRegions {
    /// Region receiving inbound flows
    pub fn input(&self) -> Option<RegionId> {
        match self {
            ComponentRegions::Agent(_) => None,
            ComponentRegions::Port { direction: Direction::Input, assertion, .. } => Some(*assertion),
            ComponentRegions::Port { direction: Direction::Output, belief, .. } => Some(*belief),
            ComponentRegions::Block { input, .. }
            | ComponentRegions::Socket { input, .. }
            | ComponentRegions::Channel { input, .. } => Some(*input),
            ComponentRegions::Base { belief, .. } => Some(*belief),
        }
    }

    /// Region feeding outbound flows
    pub fn output(&self) -> Option<RegionId> {
        match self {
            ComponentRegions::Agent(_) => None,
            ComponentRegions::Port { direction: Direction::Input, belief, .. } => Some(*belief),
            ComponentRegions::Port { direction: Direction::Output, assertion, .. } => Some(*assertion),
            ComponentRegions::Block { output, .. }
            | ComponentRegions::Socket { output, .. }
            | ComponentRegions::Channel { output, .. } => Some(*output),
            ComponentRegions::Base { belief, .. } => Some(*belief),
        }
    }

    /// Regions held by the component itself (agent aggregates excluded)
    pub fn own_regions(&self) -> Vec<RegionId> {
        match self {
            ComponentRegions::Agent(_) => Vec::new(),
            ComponentRegions::Port { assertion, belief, fact, .. } => {
                let mut own = vec![*assertion, *belief];
                own.extend(*fact);
                own
            }
            ComponentRegions::Block { input, output, fact }
            | ComponentRegions::Socket { input, output, fact, .. } => vec![*input, *output, *fact],
            ComponentRegions::Channel { input, output } => vec![*input, *output],
            ComponentRegions::Base { belief, fact } => vec![*belief, *fact],
        }
    }

    /// Region associations that need an RCC5 relation
    ///
    /// Ports relate their belief to their assertion, blocks and sockets relate
    /// both beliefs to the fact of their output, channels relate both ends.
    pub fn associations(&self) -> Vec<(RegionId, RegionId)> {
        match self {
            ComponentRegions::Port { assertion, belief, .. } => vec![(*belief, *assertion)],
            ComponentRegions::Block { input, output, fact }
            | ComponentRegions::Socket { input, output, fact, .. } => {
                vec![(*input, *fact), (*output, *fact)]
            }
            ComponentRegions::Channel { input, output } => vec![(*input, *output)],
            ComponentRegions::Agent(_) | ComponentRegions::Base { .. } => Vec::new(),
        }
    }

    fn substitute(&mut self, substitution: &Substitution) {
        let apply = |r: &mut RegionId| *r = substitution.find(*r);
        match self {
            ComponentRegions::Agent(_) => {}
            ComponentRegions::Port { assertion, belief, fact, .. } => {
                apply(assertion);
                apply(belief);
                if let Some(fact) = fact {
                    apply(fact);
                }
            }
            ComponentRegions::Block { input, output, fact }
            | ComponentRegions::Socket { input, output, fact, .. } => {
                apply(input);
                apply(output);
                apply(fact);
            }
            ComponentRegions::Channel { input, output } => {
                apply(input);
                apply(output);
            }
            ComponentRegions::Base { belief, fact } => {
                apply(belief);
                apply(fact);
            }
        }
    }
}

/// A component annotated with its regions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentNode {
    /// Component identifier
    pub id: String,
    /// Component name
    pub name: String,
    /// Component kind
    pub kind: ComponentKind,
    /// Owning agent id
    pub owner: String,
    /// Attached regions
    pub regions: ComponentRegions,
}

impl ComponentNode {
    fn root(table: &mut RegionTable) -> Self {
        let assertion = table.fresh(RegionKind::Assertion);
        let belief = table.fresh(RegionKind::Belief);
        let fact = table.fresh(RegionKind::Fact);
        Self {
            id: ROOT.to_string(),
            name: ROOT.to_string(),
            kind: ComponentKind::Agent,
            owner: ROOT.to_string(),
            regions: ComponentRegions::Agent(AgentRegions {
                belief,
                assertion,
                fact: Some(fact),
                beliefs: Vec::new(),
                assertions: Vec::new(),
                facts: Vec::new(),
            }),
        }
    }

    fn allocate(spec: &ComponentSpec, table: &mut RegionTable) -> Self {
        use RegionKind::*;

        let regions = match spec.kind {
            ComponentKind::Agent => {
                let assertion = table.fresh(Assertion);
                let belief = table.fresh(Belief);
                ComponentRegions::Agent(AgentRegions {
                    belief,
                    assertion,
                    fact: None,
                    beliefs: Vec::new(),
                    assertions: Vec::new(),
                    facts: Vec::new(),
                })
            }
            ComponentKind::InputPort => ComponentRegions::Port {
                direction: Direction::Input,
                assertion: table.fresh(Assertion),
                belief: table.fresh(Belief),
                fact: Some(table.fresh(Fact)),
            },
            ComponentKind::OutputPort => ComponentRegions::Port {
                direction: Direction::Output,
                belief: table.fresh(Belief),
                assertion: table.fresh(Assertion),
                fact: None,
            },
            ComponentKind::FunctionalBlock => ComponentRegions::Block {
                input: table.fresh(Belief),
                output: table.fresh(Belief),
                fact: table.fresh(Fact),
            },
            ComponentKind::InputSocket | ComponentKind::OutputSocket => ComponentRegions::Socket {
                direction: if spec.kind == ComponentKind::InputSocket {
                    Direction::Input
                } else {
                    Direction::Output
                },
                input: table.fresh(Belief),
                output: table.fresh(Belief),
                fact: table.fresh(Fact),
            },
            ComponentKind::Channel => ComponentRegions::Channel {
                input: table.fresh(Assertion),
                output: table.fresh(Assertion),
            },
            ComponentKind::Base => ComponentRegions::Base {
                belief: table.fresh(Belief),
                fact: table.fresh(Fact),
            },
        };

        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            kind: spec.kind,
            owner: spec.owner.clone(),
            regions,
        }
    }

    /// Returns the agent region sets if this is an agent
    pub fn agent_regions(&self) -> Option<&AgentRegions> {
        match &self.regions {
            ComponentRegions::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    fn agent_regions_mut(&mut self) -> Option<&mut AgentRegions> {
        match &mut self.regions {
            ComponentRegions::Agent(agent) => Some(agent),
            _ => None,
        }
    }
}

/// A region pair together with the component whose association created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairRecord {
    /// The pair
    pub pair: RegionPair,
    /// Index of the originating component in [`RegionModel::components`]
    pub origin: usize,
    /// Region the association reads first (belief of a port or block, sent end of a channel)
    pub lead: RegionId,
}

/// `part` is a part of `whole`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Parthood {
    /// Member region
    pub part: RegionId,
    /// Agent aggregate region
    pub whole: RegionId,
}

/// A region replaced by another because of an information flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Equality {
    /// The region that disappeared
    pub replaced: RegionId,
    /// The region standing in for it
    pub by: RegionId,
    /// Flow source id
    pub source: String,
    /// Flow target id
    pub target: String,
}

/// Components annotated with regions, plus pairs and constraints
#[derive(Debug, Clone)]
pub struct RegionModel {
    regions: RegionTable,
    components: Vec<ComponentNode>,
    index: FxHashMap<String, usize>,
    pairs: Vec<PairRecord>,
    parthood: Vec<Parthood>,
    equalities: Vec<Equality>,
    substitution: Substitution,
}

impl RegionModel {
    /// Builds the region model of an architecture
    ///
    /// # Errors
    /// Returns a structural error naming the offending component or flow if
    /// an id is duplicated or unknown, an owner is not an agent, or a flow
    /// joins components or regions that cannot exchange information.
    pub fn build(model: &ArchitectureModel) -> Result<Self> {
        let mut regions = RegionTable::new();
        let mut components = Vec::with_capacity(model.components.len() + 1);
        let mut index = FxHashMap::default();

        components.push(ComponentNode::root(&mut regions));
        index.insert(ROOT.to_string(), 0);

        for spec in &model.components {
            if index.contains_key(&spec.id) {
                return Err(AnalysisError::DuplicateComponent(spec.id.clone()));
            }
            index.insert(spec.id.clone(), components.len());
            components.push(ComponentNode::allocate(spec, &mut regions));
        }

        let mut owners = vec![0; components.len()];
        for (i, node) in components.iter().enumerate().skip(1) {
            let owner = lookup(&index, &node.owner, || format!("owner of `{}`", node.id))?;
            if components[owner].agent_regions().is_none() {
                return Err(AnalysisError::OwnerNotAgent {
                    component: node.id.clone(),
                    owner: node.owner.clone(),
                });
            }
            owners[i] = owner;
        }

        let mut substitution = Substitution::new(regions.len());
        let mut equalities = Vec::new();
        for (source, target) in model.edges() {
            let context = || format!("flow `{source}` -> `{target}`");
            let s = lookup(&index, source, context)?;
            let t = lookup(&index, target, context)?;
            let (replaced, by) = flow_regions(&components[s], &components[t], &regions)?;
            if substitution.substitute(replaced, by) {
                debug!(source, target, replaced = regions.name(replaced), by = regions.name(by), "flow substitution");
                equalities.push(Equality {
                    replaced,
                    by,
                    source: source.to_string(),
                    target: target.to_string(),
                });
            }
        }
        substitution.compress();

        for node in components.iter_mut() {
            node.regions.substitute(&substitution);
        }

        // Facts always belong to the root agent's ground-truth layer
        for i in 1..components.len() {
            if components[i].agent_regions().is_some() {
                continue;
            }
            for region in components[i].regions.own_regions() {
                let kind = regions.kind(region);
                let holder = if kind == RegionKind::Fact { 0 } else { owners[i] };
                if let Some(agent) = components[holder].agent_regions_mut() {
                    agent.insert(kind, region);
                }
            }
        }

        let mut parthood = Vec::new();
        for agent in components.iter().filter_map(ComponentNode::agent_regions) {
            for kind in [RegionKind::Assertion, RegionKind::Belief, RegionKind::Fact] {
                let Some(whole) = agent.aggregate(kind) else { continue };
                let members = match kind {
                    RegionKind::Assertion => &agent.assertions,
                    RegionKind::Belief => &agent.beliefs,
                    RegionKind::Fact => &agent.facts,
                };
                parthood.extend(members.iter().map(|&part| Parthood { part, whole }));
            }
        }

        let mut pairs = Vec::new();
        let mut seen = FxHashSet::default();
        for (origin, node) in components.iter().enumerate() {
            for (a, b) in node.regions.associations() {
                // Collapsed by substitution: trivially EQ
                if a == b {
                    continue;
                }
                let pair = RegionPair::new(a, b);
                if seen.insert(pair) {
                    pairs.push(PairRecord { pair, origin, lead: a });
                }
            }
        }

        info!(
            components = components.len() - 1,
            regions = regions.len(),
            substitutions = equalities.len(),
            pairs = pairs.len(),
            parthood = parthood.len(),
            "built region model"
        );

        Ok(Self {
            regions,
            components,
            index,
            pairs,
            parthood,
            equalities,
            substitution,
        })
    }

    /// All regions, including those replaced by substitution
    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    /// Components in model order, the synthetic root agent first
    pub fn components(&self) -> &[ComponentNode] {
        &self.components
    }

    /// The synthetic root agent
    pub fn root(&self) -> &ComponentNode {
        &self.components[0]
    }

    /// Looks up a component by id
    pub fn get(&self, id: &str) -> Option<&ComponentNode> {
        self.index.get(id).map(|&i| &self.components[i])
    }

    /// The agent owning the component at `index`
    pub fn owner_of(&self, index: usize) -> &ComponentNode {
        self.index
            .get(&self.components[index].owner)
            .map_or(&self.components[0], |&i| &self.components[i])
    }

    /// Region pairs requiring an RCC5 relation, in component order
    pub fn pairs(&self) -> &[PairRecord] {
        &self.pairs
    }

    /// Parthood constraints between member regions and agent aggregates
    pub fn parthood(&self) -> &[Parthood] {
        &self.parthood
    }

    /// Flow-induced substitutions in flow order
    pub fn equalities(&self) -> &[Equality] {
        &self.equalities
    }

    /// Returns the region standing in for `region` after substitution
    pub fn resolve(&self, region: RegionId) -> RegionId {
        self.substitution.find(region)
    }
}

fn lookup(
    index: &FxHashMap<String, usize>,
    id: &str,
    context: impl FnOnce() -> String,
) -> Result<usize> {
    index.get(id).copied().ok_or_else(|| AnalysisError::UnknownComponent {
        id: id.to_string(),
        context: context(),
    })
}

/// Returns `(replaced, by)` for a flow, or the structural error it causes
fn flow_regions(
    source: &ComponentNode,
    target: &ComponentNode,
    table: &RegionTable,
) -> Result<(RegionId, RegionId)> {
    use ComponentKind::*;

    let supported = match (source.kind, target.kind) {
        (Agent, _) | (_, Agent) => false,
        (Base, _) | (_, Base) => true,
        (s, Channel) => s.is_port(),
        (Channel, t) => t.is_port(),
        (s, t) => (s.is_port() || s.is_block_like()) && (t.is_port() || t.is_block_like()),
    };
    let unsupported = || AnalysisError::UnsupportedFlow {
        source_id: source.id.clone(),
        source_kind: source.kind.to_string(),
        target: target.id.clone(),
        target_kind: target.kind.to_string(),
    };
    if !supported {
        return Err(unsupported());
    }
    let (Some(output), Some(input)) = (source.regions.output(), target.regions.input()) else {
        return Err(unsupported());
    };

    // On base flows the non-base side keeps its region
    if target.kind == Base {
        return Ok((input, output));
    }
    if source.kind != Base && table.kind(output) != table.kind(input) {
        return Err(AnalysisError::RegionKindMismatch {
            source_id: source.id.clone(),
            target: target.id.clone(),
            source_region: table.kind(output).to_string(),
            target_region: table.kind(input).to_string(),
        });
    }
    Ok((output, input))
}
