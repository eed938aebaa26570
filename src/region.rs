//! Region types: RegionKind, RegionId, Region, RegionTable and RegionPair
//!
//! A region is an opaque topological individual. Its only observable
//! structure is its semantic tag and the relations it takes part in.

use serde::Serialize;
use std::fmt;

/// Semantic role of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Information put on the wire by a port or carried by a channel
    Assertion,
    /// Information held inside an agent
    Belief,
    /// Ground truth against which beliefs are judged
    Fact,
}

impl RegionKind {
    /// Letter used as display prefix for regions of this kind
    pub fn prefix(self) -> char {
        match self {
            RegionKind::Assertion => 'A',
            RegionKind::Belief => 'B',
            RegionKind::Fact => 'F',
        }
    }

    /// Lower-case name of the kind
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Assertion => "assertion",
            RegionKind::Belief => "belief",
            RegionKind::Fact => "fact",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of a region in its [`RegionTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl RegionId {
    /// Returns the index as usize
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A region with its display name and immutable kind tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    id: RegionId,
    name: String,
    kind: RegionKind,
}

impl Region {
    /// Returns the id of this region
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Returns the display name (e.g. `B3`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic kind
    pub fn kind(&self) -> RegionKind {
        self.kind
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Append-only table of regions
///
/// Names are `<prefix><n>` with one running counter shared by all kinds, so
/// names stay unique while the kind is read from the tag, never the name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionTable {
    regions: Vec<Region>,
}

impl RegionTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh region of the given kind
    pub fn fresh(&mut self, kind: RegionKind) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        let name = format!("{}{}", kind.prefix(), id.0);
        self.regions.push(Region { id, name, kind });
        id
    }

    /// Returns the region with the given id
    ///
    /// # Panics
    /// Panics if the id was not produced by this table
    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id.index()]
    }

    /// Returns the kind of the region with the given id
    pub fn kind(&self, id: RegionId) -> RegionKind {
        self.get(id).kind
    }

    /// Returns the display name of the region with the given id
    pub fn name(&self, id: RegionId) -> &str {
        &self.get(id).name
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if the table holds no region
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterates over all regions in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }
}

/// An unordered pair of distinct regions requiring an RCC5 relation
///
/// Stored with the smaller id first, so `(a, b)` and `(b, a)` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionPair {
    first: RegionId,
    second: RegionId,
}

impl RegionPair {
    /// Creates a normalized pair
    ///
    /// # Panics
    /// Panics if both regions are the same
    pub fn new(a: RegionId, b: RegionId) -> Self {
        assert_ne!(a, b, "a region pair needs two distinct regions");
        if a < b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The region with the smaller id
    pub fn first(&self) -> RegionId {
        self.first
    }

    /// The region with the larger id
    pub fn second(&self) -> RegionId {
        self.second
    }

    /// Returns true if the pair contains the region
    pub fn contains(&self, region: RegionId) -> bool {
        self.first == region || self.second == region
    }
}
