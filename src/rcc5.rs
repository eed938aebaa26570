//! The RCC5 relations
//!
//! RCC5 is jointly exhaustive and pairwise disjoint: between any two regions
//! exactly one of the five relations holds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five RCC5 relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rcc5 {
    /// Equal: `P(x,y) ∧ P(y,x)`
    #[serde(rename = "EQ")]
    Eq,
    /// Proper part: `P(x,y) ∧ ¬P(y,x)`
    #[serde(rename = "PP")]
    Pp,
    /// Inverse proper part: `PP(y,x)`
    #[serde(rename = "PPi")]
    Ppi,
    /// Partial overlap: `O(x,y) ∧ ¬P(x,y) ∧ ¬P(y,x)`
    #[serde(rename = "PO")]
    Po,
    /// Discrete: `¬O(x,y)`
    #[serde(rename = "DR")]
    Dr,
}

impl Rcc5 {
    /// All relations in enumeration order
    pub const ALL: [Rcc5; 5] = [Rcc5::Eq, Rcc5::Pp, Rcc5::Ppi, Rcc5::Po, Rcc5::Dr];

    /// Position of this relation in [`Rcc5::ALL`]
    pub fn index(self) -> usize {
        match self {
            Rcc5::Eq => 0,
            Rcc5::Pp => 1,
            Rcc5::Ppi => 2,
            Rcc5::Po => 3,
            Rcc5::Dr => 4,
        }
    }

    /// Symbol used in ground formulas
    pub fn symbol(self) -> &'static str {
        match self {
            Rcc5::Eq => "EQ",
            Rcc5::Pp => "PP",
            Rcc5::Ppi => "PPi",
            Rcc5::Po => "PO",
            Rcc5::Dr => "DR",
        }
    }

    /// The relation that holds between `y` and `x` when `self` holds between `x` and `y`
    pub fn inverse(self) -> Rcc5 {
        match self {
            Rcc5::Pp => Rcc5::Ppi,
            Rcc5::Ppi => Rcc5::Pp,
            other => other,
        }
    }
}

impl fmt::Display for Rcc5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Composition table: relations allowed for `t(x,z)` given `r(x,y)` and `s(y,z)`
pub fn compose(r: Rcc5, s: Rcc5) -> &'static [Rcc5] {
    use Rcc5::*;
    const ALL: &[Rcc5] = &Rcc5::ALL;

    match (r, s) {
        (Eq, Eq) => &[Eq],
        (Eq, Pp) => &[Pp],
        (Eq, Ppi) => &[Ppi],
        (Eq, Po) => &[Po],
        (Eq, Dr) => &[Dr],

        (Pp, Eq) => &[Pp],
        (Pp, Pp) => &[Pp],
        (Pp, Ppi) => ALL,
        (Pp, Po) => &[Pp, Po, Dr],
        (Pp, Dr) => &[Dr],

        (Ppi, Eq) => &[Ppi],
        (Ppi, Pp) => &[Eq, Pp, Ppi, Po],
        (Ppi, Ppi) => &[Ppi],
        (Ppi, Po) => &[Ppi, Po],
        (Ppi, Dr) => &[Ppi, Po, Dr],

        (Po, Eq) => &[Po],
        (Po, Pp) => &[Pp, Po],
        (Po, Ppi) => &[Ppi, Po, Dr],
        (Po, Po) => ALL,
        (Po, Dr) => &[Ppi, Po, Dr],

        (Dr, Eq) => &[Dr],
        (Dr, Pp) => &[Pp, Po, Dr],
        (Dr, Ppi) => &[Dr],
        (Dr, Po) => &[Pp, Po, Dr],
        (Dr, Dr) => ALL,
    }
}

/// Returns true if `r(x,y) ∧ s(y,z) ∧ t(x,z)` is consistent
pub fn consistent_triangle(r: Rcc5, s: Rcc5, t: Rcc5) -> bool {
    compose(r, s).contains(&t)
}
