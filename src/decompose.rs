//! Dependency graph decomposition
//!
//! Regions are nodes and region pairs are edges. Each maximal connected
//! cluster is a [`Substructure`]; relation choices in one never affect
//! satisfiability in another, so the global scenario space is the product
//! of the per-cluster spaces.

use crate::region::{RegionId, RegionPair};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// A maximal connected cluster of region pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substructure {
    /// Position in discovery order
    pub id: usize,
    /// Regions, in discovery order
    pub nodes: Vec<RegionId>,
    /// Indices into the pair list the graph was built from, ascending
    pub pairs: Vec<usize>,
    /// True if a traversal revisited a region on its current path
    pub cyclic: bool,
}

impl Substructure {
    /// Number of regions
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Projected scenario count `5^pairs`, or None if it overflows u64
    pub fn scenario_count(&self) -> Option<u64> {
        5u64.checked_pow(u32::try_from(self.pairs.len()).ok()?)
    }
}

/// Undirected multigraph view of a pair list
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<RegionId>,
    /// node -> (neighbour, pair index)
    adjacency: FxHashMap<RegionId, Vec<(RegionId, usize)>>,
}

impl DependencyGraph {
    /// Builds the graph; nodes keep the order of their first appearance
    pub fn new(pairs: &[RegionPair]) -> Self {
        let mut nodes = Vec::new();
        let mut adjacency: FxHashMap<RegionId, Vec<(RegionId, usize)>> = FxHashMap::default();

        for (i, pair) in pairs.iter().enumerate() {
            let (a, b) = (pair.first(), pair.second());
            for (from, to) in [(a, b), (b, a)] {
                adjacency
                    .entry(from)
                    .or_insert_with(|| {
                        nodes.push(from);
                        Vec::new()
                    })
                    .push((to, i));
            }
        }

        Self { nodes, adjacency }
    }

    /// Number of regions
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Splits the graph into sub-structures
    ///
    /// Iterative depth-first traversal from every unvisited node. A
    /// neighbour reached through a different edge while still on the
    /// current path closes a cycle.
    pub fn decompose(&self) -> Vec<Substructure> {
        let mut visited = FxHashSet::default();
        let mut substructures = Vec::new();

        for &start in &self.nodes {
            if visited.contains(&start) {
                continue;
            }

            let mut on_path = FxHashSet::default();
            let mut nodes = Vec::new();
            let mut pairs = FxHashSet::default();
            let mut cyclic = false;

            // (node, edge used to reach it, next neighbour to look at)
            let mut stack: Vec<(RegionId, Option<usize>, usize)> = vec![(start, None, 0)];
            visited.insert(start);
            on_path.insert(start);
            nodes.push(start);

            while let Some(frame) = stack.last_mut() {
                let (node, via, next) = *frame;
                let neighbours = &self.adjacency[&node];
                if next == neighbours.len() {
                    on_path.remove(&node);
                    stack.pop();
                    continue;
                }
                frame.2 += 1;

                let (neighbour, edge) = neighbours[next];
                pairs.insert(edge);
                if Some(edge) == via {
                    continue;
                }
                if on_path.contains(&neighbour) {
                    cyclic = true;
                } else if visited.insert(neighbour) {
                    on_path.insert(neighbour);
                    nodes.push(neighbour);
                    stack.push((neighbour, Some(edge), 0));
                }
            }

            let mut pairs: Vec<usize> = pairs.into_iter().collect();
            pairs.sort_unstable();
            substructures.push(Substructure {
                id: substructures.len(),
                nodes,
                pairs,
                cyclic,
            });
        }

        substructures
    }
}
