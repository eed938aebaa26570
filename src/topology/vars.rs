//! Variable allocation for the ground theory
//!
//! Every predicate gets one contiguous block of SAT variables, laid out
//! row-major over domain indices. Allocation happens before any clause is
//! emitted, so variable ids are a pure function of the domain size and the
//! axiom set.

use super::Axioms;
use crate::error::{AnalysisError, Result};
use crate::rcc5::Rcc5;
use std::ops::Range;

/// Allocates contiguous variable ranges, starting at 1 (DIMACS convention)
#[derive(Debug, Clone)]
struct RangeAllocator {
    next_var: u32,
}

impl RangeAllocator {
    fn new() -> Self {
        Self { next_var: 1 }
    }

    /// None once the range would leave the positive `i32` literals
    fn allocate(&mut self, count: usize) -> Option<Range<u32>> {
        let start = self.next_var;
        let end = start.checked_add(u32::try_from(count).ok()?)?;
        i32::try_from(end - 1).ok()?;
        self.next_var = end;
        Some(start..end)
    }

    fn total_variables(&self) -> u32 {
        self.next_var - 1
    }
}

/// Variable layout of the ground theory over a domain of `n` constants
///
/// - `P(x,y)`, `O(x,y)` and each RCC5 relation: `n²` variables
/// - `x = y`: `n²` variables, only `x < y` is used
/// - overlap witness `P(z,x) ∧ P(z,y)`: `n³` variables
/// - mereotopology only: `C(x,y)` (`n²`) and `C(z,x) → C(z,y)` (`n³`)
///
/// Construction fails unless every variable fits in a positive `i32`, so the
/// index arithmetic of the accessors stays in range.
#[derive(Debug, Clone)]
pub struct VarTable {
    n: usize,
    part: Range<u32>,
    overlap: Range<u32>,
    identity: Range<u32>,
    relations: [Range<u32>; 5],
    witness: Range<u32>,
    connection: Range<u32>,
    bound: Range<u32>,
    total: u32,
}

impl VarTable {
    /// Lays out variables for a domain of `n` constants
    ///
    /// # Errors
    /// [`AnalysisError::DomainTooLarge`] if the layout needs more than
    /// `i32::MAX` variables.
    pub fn new(n: usize, axioms: Axioms) -> Result<Self> {
        let too_large = || AnalysisError::DomainTooLarge(n);
        let square = n.checked_mul(n).ok_or_else(too_large)?;
        let cube = square.checked_mul(n).ok_or_else(too_large)?;

        let mut allocator = RangeAllocator::new();
        let mut block = |count: usize| allocator.allocate(count).ok_or_else(too_large);

        let part = block(square)?;
        let overlap = block(square)?;
        let identity = block(square)?;
        let relations = [block(square)?, block(square)?, block(square)?, block(square)?, block(square)?];
        let witness = block(cube)?;
        let (connection, bound) = match axioms {
            Axioms::Mereology => (block(0)?, block(0)?),
            Axioms::Mereotopology => (block(square)?, block(cube)?),
        };

        Ok(Self {
            n,
            part,
            overlap,
            identity,
            relations,
            witness,
            connection,
            bound,
            total: allocator.total_variables(),
        })
    }

    fn at(&self, range: &Range<u32>, x: usize, y: usize) -> i32 {
        debug_assert!(x < self.n && y < self.n);
        (range.start + (x * self.n + y) as u32) as i32
    }

    fn at3(&self, range: &Range<u32>, z: usize, x: usize, y: usize) -> i32 {
        debug_assert!(z < self.n);
        let offset = (z * self.n * self.n + x * self.n + y) as u32;
        (range.start + offset) as i32
    }

    /// `P(x,y)`: `x` is part of `y`
    pub fn part(&self, x: usize, y: usize) -> i32 {
        self.at(&self.part, x, y)
    }

    /// `O(x,y)`: `x` and `y` share a part
    pub fn overlap(&self, x: usize, y: usize) -> i32 {
        self.at(&self.overlap, x, y)
    }

    /// `x = y` as domain constants (symmetric)
    pub fn identity(&self, x: usize, y: usize) -> i32 {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        self.at(&self.identity, a, b)
    }

    /// `relation(x,y)`
    pub fn relation(&self, relation: Rcc5, x: usize, y: usize) -> i32 {
        self.at(&self.relations[relation.index()], x, y)
    }

    /// `P(z,x) ∧ P(z,y)`
    pub fn witness(&self, z: usize, x: usize, y: usize) -> i32 {
        self.at3(&self.witness, z, x, y)
    }

    /// `C(x,y)`: `x` connects with `y` (mereotopology layouts only)
    pub fn connection(&self, x: usize, y: usize) -> i32 {
        debug_assert!(!self.connection.is_empty());
        self.at(&self.connection, x, y)
    }

    /// `C(z,x) → C(z,y)` (mereotopology layouts only)
    pub fn bound(&self, z: usize, x: usize, y: usize) -> i32 {
        debug_assert!(!self.bound.is_empty());
        self.at3(&self.bound, z, x, y)
    }

    /// Domain size
    pub fn domain_size(&self) -> usize {
        self.n
    }

    /// Total number of variables allocated
    pub fn total_variables(&self) -> u32 {
        self.total
    }
}
