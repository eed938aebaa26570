//! Ground topology and RCC5 axioms
//!
//! Every axiom is instantiated over the finite domain, so the backend only
//! ever sees propositional clauses. [`Axioms::Mereology`] takes parthood as
//! primitive:
//!
//! - reflexivity `P(x,x)`
//! - transitivity `P(x,y) ∧ P(y,z) → P(x,z)`
//!
//! [`Axioms::Mereotopology`] takes connection as primitive instead:
//!
//! - `C(x,x)` and `C(x,y) ↔ C(y,x)`
//! - `P(x,y) ↔ ∧z (C(z,x) → C(z,y))`
//!
//! Both then share:
//!
//! - antisymmetry `P(x,y) ∧ P(y,x) → x = y` and congruence `x = y → P(x,y) ∧ P(y,x)`
//! - overlap `O(x,y) ↔ ∨z (P(z,x) ∧ P(z,y))`
//! - `EQ`, `PP`, `PPi`, `PO` and `DR` as definitions over `P` and `O`
//!
//! Subregions are asserted as parts of their primary region.

pub mod domain;
pub mod vars;

pub use domain::Domain;
pub use vars::VarTable;

use crate::cnf::CNF;
use crate::error::Result;
use crate::rcc5::Rcc5;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Primitive the ground theory is built on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axioms {
    /// Parthood is primitive, a partial order
    #[default]
    Mereology,
    /// Connection is primitive, parthood is defined from it
    Mereotopology,
}

/// Emits the ground theory of a domain into a [`CNF`]
pub struct Axiomatizer<'a> {
    domain: &'a Domain,
    vars: &'a VarTable,
    axioms: Axioms,
    cnf: CNF,
}

impl<'a> Axiomatizer<'a> {
    /// Creates an axiomatizer for `domain` using the variable layout `vars`
    ///
    /// `vars` must have been laid out for the same `axioms`.
    pub fn new(domain: &'a Domain, vars: &'a VarTable, axioms: Axioms) -> Self {
        debug_assert_eq!(domain.len(), vars.domain_size());
        let mut cnf = CNF::new();
        cnf.reserve_variables(vars.total_variables());
        Self {
            domain,
            vars,
            axioms,
            cnf,
        }
    }

    /// Emits every axiom and returns the clause set
    pub fn axiomatize(mut self) -> CNF {
        match self.axioms {
            Axioms::Mereology => {
                self.reflexivity();
                self.transitivity();
            }
            Axioms::Mereotopology => {
                self.connection();
                self.parthood_from_connection();
            }
        }
        self.antisymmetry();
        self.overlap();
        self.derived_relations();
        self.subregions();

        debug!(
            axioms = ?self.axioms,
            domain = self.domain.len(),
            variables = self.cnf.num_variables,
            clauses = self.cnf.num_clauses(),
            "axiomatized topology"
        );
        self.cnf
    }

    fn reflexivity(&mut self) {
        for x in 0..self.domain.len() {
            self.cnf.assert_lit(self.vars.part(x, x));
        }
    }

    fn antisymmetry(&mut self) {
        let v = self.vars;
        for x in 0..self.domain.len() {
            for y in x + 1..self.domain.len() {
                let same = v.identity(x, y);
                self.cnf.add_clause(vec![-v.part(x, y), -v.part(y, x), same]);
                self.cnf.implies(same, v.part(x, y));
                self.cnf.implies(same, v.part(y, x));
            }
        }
    }

    fn transitivity(&mut self) {
        let v = self.vars;
        let n = self.domain.len();
        for x in 0..n {
            for y in 0..n {
                if x == y {
                    continue;
                }
                for z in 0..n {
                    // x == z is implied by reflexivity, y == z is a tautology
                    if z == x || z == y {
                        continue;
                    }
                    self.cnf
                        .add_clause(vec![-v.part(x, y), -v.part(y, z), v.part(x, z)]);
                }
            }
        }
    }

    fn connection(&mut self) {
        let v = self.vars;
        let n = self.domain.len();
        for x in 0..n {
            self.cnf.assert_lit(v.connection(x, x));
            for y in x + 1..n {
                self.cnf.define_iff(v.connection(x, y), v.connection(y, x));
            }
        }
    }

    fn parthood_from_connection(&mut self) {
        let v = self.vars;
        let n = self.domain.len();
        let mut bounds = Vec::with_capacity(n);
        for x in 0..n {
            for y in 0..n {
                bounds.clear();
                for z in 0..n {
                    let b = v.bound(z, x, y);
                    self.cnf.define_or(b, &[-v.connection(z, x), v.connection(z, y)]);
                    bounds.push(b);
                }
                self.cnf.define_and(v.part(x, y), &bounds);
            }
        }
    }

    fn overlap(&mut self) {
        let v = self.vars;
        let n = self.domain.len();
        let mut witnesses = Vec::with_capacity(n);
        for x in 0..n {
            for y in 0..n {
                witnesses.clear();
                for z in 0..n {
                    let w = v.witness(z, x, y);
                    self.cnf.define_and(w, &[v.part(z, x), v.part(z, y)]);
                    witnesses.push(w);
                }
                self.cnf.define_or(v.overlap(x, y), &witnesses);
            }
        }
    }

    fn derived_relations(&mut self) {
        let v = self.vars;
        let n = self.domain.len();
        for x in 0..n {
            for y in 0..n {
                let pxy = v.part(x, y);
                let pyx = v.part(y, x);
                let oxy = v.overlap(x, y);

                self.cnf.define_and(v.relation(Rcc5::Eq, x, y), &[pxy, pyx]);
                self.cnf.define_and(v.relation(Rcc5::Pp, x, y), &[pxy, -pyx]);
                self.cnf
                    .define_iff(v.relation(Rcc5::Ppi, x, y), v.relation(Rcc5::Pp, y, x));
                self.cnf.define_and(v.relation(Rcc5::Po, x, y), &[oxy, -pxy, -pyx]);
                self.cnf.define_not(v.relation(Rcc5::Dr, x, y), oxy);
            }
        }
    }

    fn subregions(&mut self) {
        for (sub, region) in self.domain.subregion_parts() {
            self.cnf.assert_lit(self.vars.part(sub, region));
        }
    }
}

/// Builds the domain layout and ground theory in one step
///
/// # Errors
/// [`AnalysisError::DomainTooLarge`](crate::AnalysisError::DomainTooLarge)
/// if the domain needs more variables than a literal can address.
pub fn ground_theory(domain: &Domain, axioms: Axioms) -> Result<(VarTable, CNF)> {
    let vars = VarTable::new(domain.len(), axioms)?;
    let cnf = Axiomatizer::new(domain, &vars, axioms).axiomatize();
    Ok((vars, cnf))
}
