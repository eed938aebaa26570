//! Clause store and Tseitin gate definitions
//!
//! Literals are DIMACS-style signed integers: variables start at 1 and a
//! negative literal is the negation of its variable.

/// CNF representation
#[derive(Debug, Clone, Default)]
pub struct CNF {
    /// Highest variable mentioned (or reserved)
    pub num_variables: u32,
    /// CNF clauses (each clause is a vec of literals, negative = negated)
    pub clauses: Vec<Vec<i32>>,
}

impl CNF {
    /// Creates a new empty CNF
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves variables up to `num_variables` even if no clause mentions them
    pub fn reserve_variables(&mut self, num_variables: u32) {
        self.num_variables = self.num_variables.max(num_variables);
    }

    /// Adds a clause to the CNF
    pub fn add_clause(&mut self, clause: Vec<i32>) {
        for &lit in &clause {
            self.num_variables = self.num_variables.max(lit.unsigned_abs());
        }
        self.clauses.push(clause);
    }

    /// Adds the unit clause `lit`
    pub fn assert_lit(&mut self, lit: i32) {
        self.add_clause(vec![lit]);
    }

    /// Adds `a → b`
    pub fn implies(&mut self, a: i32, b: i32) {
        self.add_clause(vec![-a, b]);
    }

    /// Defines `output ↔ a1 ∧ a2 ∧ ... ∧ an`
    ///
    /// - `(¬a1 ∨ ... ∨ ¬an ∨ output)`: all inputs true forces the output
    /// - `(ai ∨ ¬output)`: a true output forces every input
    pub fn define_and(&mut self, output: i32, inputs: &[i32]) {
        let mut clause: Vec<i32> = inputs.iter().map(|&l| -l).collect();
        clause.push(output);
        self.add_clause(clause);

        for &input in inputs {
            self.add_clause(vec![input, -output]);
        }
    }

    /// Defines `output ↔ a1 ∨ a2 ∨ ... ∨ an`
    ///
    /// An empty disjunction defines `output` as false.
    pub fn define_or(&mut self, output: i32, inputs: &[i32]) {
        let mut clause = inputs.to_vec();
        clause.push(-output);
        self.add_clause(clause);

        for &input in inputs {
            self.add_clause(vec![-input, output]);
        }
    }

    /// Defines `output ↔ ¬input`
    pub fn define_not(&mut self, output: i32, input: i32) {
        self.add_clause(vec![input, output]);
        self.add_clause(vec![-input, -output]);
    }

    /// Defines `output ↔ input`
    pub fn define_iff(&mut self, output: i32, input: i32) {
        self.add_clause(vec![-input, output]);
        self.add_clause(vec![input, -output]);
    }

    /// Number of clauses
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfied(cnf: &CNF, assignment: &[bool]) -> bool {
        cnf.clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                let value = assignment[(lit.unsigned_abs() - 1) as usize];
                if lit > 0 { value } else { !value }
            })
        })
    }

    #[test]
    fn cnf_empty() {
        let cnf = CNF::new();
        assert_eq!(cnf.num_variables, 0);
        assert_eq!(cnf.num_clauses(), 0);
    }

    #[test]
    fn cnf_add_clause() {
        let mut cnf = CNF::new();
        cnf.add_clause(vec![1, -2, 3]);
        assert_eq!(cnf.num_variables, 3);
        assert_eq!(cnf.num_clauses(), 1);

        cnf.reserve_variables(2);
        assert_eq!(cnf.num_variables, 3);
        cnf.reserve_variables(7);
        assert_eq!(cnf.num_variables, 7);
    }

    #[test]
    fn and_gate_truth_table() {
        let mut cnf = CNF::new();
        cnf.define_and(3, &[1, -2]);

        for bits in 0..4u8 {
            let a = bits & 1 != 0;
            let b = bits & 2 != 0;
            let expected = a && !b;
            assert!(satisfied(&cnf, &[a, b, expected]));
            assert!(!satisfied(&cnf, &[a, b, !expected]));
        }
    }

    #[test]
    fn or_gate_truth_table() {
        let mut cnf = CNF::new();
        cnf.define_or(3, &[1, 2]);

        for bits in 0..4u8 {
            let a = bits & 1 != 0;
            let b = bits & 2 != 0;
            assert!(satisfied(&cnf, &[a, b, a || b]));
            assert!(!satisfied(&cnf, &[a, b, !(a || b)]));
        }
    }

    #[test]
    fn empty_or_is_false() {
        let mut cnf = CNF::new();
        cnf.define_or(1, &[]);
        assert!(satisfied(&cnf, &[false]));
        assert!(!satisfied(&cnf, &[true]));
    }

    #[test]
    fn not_and_iff_gates() {
        let mut cnf = CNF::new();
        cnf.define_not(2, 1);
        cnf.define_iff(3, 1);

        assert!(satisfied(&cnf, &[true, false, true]));
        assert!(satisfied(&cnf, &[false, true, false]));
        assert!(!satisfied(&cnf, &[true, true, true]));
        assert!(!satisfied(&cnf, &[true, false, false]));
    }
}
