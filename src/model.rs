//! Architecture model: components and information flows
//!
//! This is the shape produced by the model parser. Components are kept in
//! insertion order and flows keep the order of their targets, so region
//! numbering and pair order are deterministic for a given model.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

/// Owner id of top-level agents and of channels
pub const ROOT: &str = "root";

/// Semantic kind of an architecture component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    /// An agent owning ports, blocks, sockets and bases
    Agent,
    /// Port receiving assertions from a channel
    InputPort,
    /// Port emitting assertions onto a channel
    OutputPort,
    /// Functional block transforming beliefs
    FunctionalBlock,
    /// Internal end-point of an input port
    InputSocket,
    /// Internal end-point of an output port
    OutputSocket,
    /// Communication channel between two ports
    Channel,
    /// External data source or sink
    Base,
}

impl ComponentKind {
    /// Kebab-case name of the kind
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Agent => "agent",
            ComponentKind::InputPort => "input-port",
            ComponentKind::OutputPort => "output-port",
            ComponentKind::FunctionalBlock => "functional-block",
            ComponentKind::InputSocket => "input-socket",
            ComponentKind::OutputSocket => "output-socket",
            ComponentKind::Channel => "channel",
            ComponentKind::Base => "base",
        }
    }

    /// Returns true for input and output ports
    pub fn is_port(self) -> bool {
        matches!(self, ComponentKind::InputPort | ComponentKind::OutputPort)
    }

    /// Returns true for functional blocks and sockets
    pub fn is_block_like(self) -> bool {
        matches!(
            self,
            ComponentKind::FunctionalBlock | ComponentKind::InputSocket | ComponentKind::OutputSocket
        )
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn root_owner() -> String {
    ROOT.to_string()
}

/// A parsed architecture component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Semantic kind
    pub kind: ComponentKind,
    /// Owning agent id, or [`ROOT`]
    #[serde(default = "root_owner")]
    pub owner: String,
}

/// Information flows leaving one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// Source component id
    pub source: String,
    /// Target component ids, in order (parallel edges permitted)
    pub targets: Vec<String>,
}

/// Components plus information flows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureModel {
    /// Components in insertion order
    pub components: Vec<ComponentSpec>,
    /// Adjacency list of information flows
    #[serde(default)]
    pub flows: Vec<Flow>,
}

impl ArchitectureModel {
    /// Creates an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a model from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a model from a JSON reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Adds a top-level agent
    pub fn agent(&mut self, id: &str, name: &str) -> &mut Self {
        self.component(id, name, ComponentKind::Agent, ROOT)
    }

    /// Adds a component owned by `owner`
    pub fn component(&mut self, id: &str, name: &str, kind: ComponentKind, owner: &str) -> &mut Self {
        self.components.push(ComponentSpec {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            owner: owner.to_string(),
        });
        self
    }

    /// Adds a flow `source -> target`, appending to the source's adjacency list
    pub fn flow(&mut self, source: &str, target: &str) -> &mut Self {
        match self.flows.iter_mut().find(|f| f.source == source) {
            Some(flow) => flow.targets.push(target.to_string()),
            None => self.flows.push(Flow {
                source: source.to_string(),
                targets: vec![target.to_string()],
            }),
        }
        self
    }

    /// Looks up a component by id
    pub fn get(&self, id: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Iterates over every flow edge as `(source, target)`
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.flows
            .iter()
            .flat_map(|f| f.targets.iter().map(move |t| (f.source.as_str(), t.as_str())))
    }

    /// Reroutes every direct output-port -> input-port flow through a channel
    ///
    /// The channel is owned by [`ROOT`], has id `<source><target>` and name
    /// `<source name>2<target name>`. Returns the number of channels created.
    pub fn synthesize_channels(&mut self) -> usize {
        let mut rerouted = Vec::new();
        for flow in &self.flows {
            let Some(source) = self.get(&flow.source) else { continue };
            if source.kind != ComponentKind::OutputPort {
                continue;
            }
            for target in &flow.targets {
                if let Some(t) = self.get(target) {
                    if t.kind == ComponentKind::InputPort {
                        rerouted.push((source.clone(), t.clone()));
                    }
                }
            }
        }

        for (source, target) in &rerouted {
            let channel_id = format!("{}{}", source.id, target.id);
            if self.get(&channel_id).is_none() {
                let name = format!("{}2{}", source.name, target.name);
                self.component(&channel_id, &name, ComponentKind::Channel, ROOT);
            }
            if let Some(flow) = self.flows.iter_mut().find(|f| f.source == source.id) {
                for t in flow.targets.iter_mut().filter(|t| **t == target.id) {
                    *t = channel_id.clone();
                }
            }
            self.flow(&channel_id, &target.id);
        }

        rerouted.len()
    }
}
