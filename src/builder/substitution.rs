//! Flow-induced region substitution
//!
//! Every information flow equates the output region of its source with the
//! input region of its target. Instead of emitting `x = y` constraints the
//! builder substitutes one region for the other, tracked with a union-find
//! whose representative is chosen by the caller.

use crate::region::RegionId;

/// Union-find over region ids with caller-chosen representatives
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    parent: Vec<u32>,
}

impl Substitution {
    /// Creates the identity substitution over `len` regions
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
        }
    }

    /// Returns the representative of a region
    pub fn find(&self, region: RegionId) -> RegionId {
        let mut current = region.0;
        while self.parent[current as usize] != current {
            current = self.parent[current as usize];
        }
        RegionId(current)
    }

    /// Replaces `replaced` (and everything equal to it) by `by`
    ///
    /// Returns false if both were already equal.
    pub fn substitute(&mut self, replaced: RegionId, by: RegionId) -> bool {
        let from = self.find(replaced);
        let to = self.find(by);
        if from == to {
            return false;
        }
        self.parent[from.index()] = to.0;
        true
    }

    /// Returns true if the region is its own representative
    pub fn is_representative(&self, region: RegionId) -> bool {
        self.find(region) == region
    }

    /// Compresses all paths so later lookups are a single hop
    pub fn compress(&mut self) {
        for i in 0..self.parent.len() {
            let root = self.find(RegionId(i as u32));
            self.parent[i] = root.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_by_default() {
        let s = Substitution::new(3);
        for i in 0..3 {
            assert_eq!(s.find(RegionId(i)), RegionId(i));
        }
    }

    #[test]
    fn substitution_is_transitive() {
        let mut s = Substitution::new(4);
        assert!(s.substitute(RegionId(0), RegionId(1)));
        assert!(s.substitute(RegionId(1), RegionId(2)));

        assert_eq!(s.find(RegionId(0)), RegionId(2));
        assert_eq!(s.find(RegionId(1)), RegionId(2));
        assert!(!s.substitute(RegionId(0), RegionId(2)));
        assert!(s.is_representative(RegionId(3)));
    }

    #[test]
    fn representative_is_the_replacement() {
        let mut s = Substitution::new(3);
        s.substitute(RegionId(2), RegionId(0));
        s.compress();
        assert_eq!(s.find(RegionId(2)), RegionId(0));
        assert!(!s.is_representative(RegionId(2)));
    }
}
