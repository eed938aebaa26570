//! Finite domain of region constants

use crate::error::{AnalysisError, Result};
use rustc_hash::FxHashMap;

/// The constants a theory is grounded over
///
/// Primary regions come first, in the order given. Every primary region `r`
/// is followed by its subregions `r_0 .. r_{k-1}` at the end of the domain.
#[derive(Debug, Clone)]
pub struct Domain {
    names: Vec<String>,
    primary: usize,
    per_region: usize,
    index: FxHashMap<String, usize>,
}

impl Domain {
    /// Builds a domain of `regions` plus `subregions` fresh parts per region
    ///
    /// # Errors
    /// [`AnalysisError::EmptyDomain`] if no region is given,
    /// [`AnalysisError::DuplicateRegion`] if a name repeats (including a
    /// subregion name clashing with a primary name).
    pub fn new<N: AsRef<str>>(regions: &[N], subregions: usize) -> Result<Self> {
        if regions.is_empty() {
            return Err(AnalysisError::EmptyDomain);
        }

        let mut names: Vec<String> = regions.iter().map(|r| r.as_ref().to_string()).collect();
        for region in regions {
            for k in 0..subregions {
                names.push(format!("{}_{k}", region.as_ref()));
            }
        }

        let mut index = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(AnalysisError::DuplicateRegion(name.clone()));
            }
        }

        Ok(Self {
            names,
            primary: regions.len(),
            per_region: subregions,
            index,
        })
    }

    /// Total number of constants
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: construction rejects empty domains
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of primary regions
    pub fn primary_len(&self) -> usize {
        self.primary
    }

    /// Index of a constant by name
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| AnalysisError::UnknownRegion(name.to_string()))
    }

    /// Name of the constant at `index`
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// All names, primary regions first
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(subregion, region)` index pairs for every primary region
    pub fn subregion_parts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.primary).flat_map(move |r| {
            let first = self.primary + r * self.per_region;
            (first..first + self.per_region).map(move |s| (s, r))
        })
    }
}
