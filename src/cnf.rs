//! Turn a combinational AIG into an equisatisfiable CNF (Tseitin transformation).
//!
//! To query a SAT solver about a circuit:
//! - build (or parse) the circuit as an [`Aig`]
//! - call [`aig2cnf`] (or [`Aig::to_cnf`]) to get a [`Cnf`]
//! - use [`Cnf::input2lit`] and [`Cnf::output2lit`] to map circuit signals to SAT literals,
//!   and hand [`Cnf::clauses`] (or [`Cnf::to_dimacs`]) to the solver.
//!
//! By default, every output is forced to true, so the CNF is SAT iff all outputs can be true at
//! once. Use [`Options::force_true`] to get the plain circuit encoding and pass outputs values as
//! assumptions instead.
//!
//! ```rust
//! use aigcnf::{Aig, Lit, cnf::{Options, aig2cnf}};
//! let mut aig = Aig::new();
//! let x = aig.add_input("x").unwrap();
//! let y = aig.add_input("y").unwrap();
//! let z = aig.new_or(x, y).unwrap();
//! aig.add_output("z", z).unwrap();
//!
//! let cnf = aig2cnf(&aig, Options::new()).unwrap();
//! assert_eq!(cnf.input2lit().get("x"), Some(Lit::from(1)));
//! assert_eq!(cnf.output2lit().get("z"), Some(Lit::from(4)));
//! assert_eq!(cnf.clauses().len(), 6);
//! ```
//!
//! [`Aig`]: crate::Aig
//! [`Aig::to_cnf`]: crate::Aig::to_cnf

pub mod alloc;
pub mod symbol;
pub mod tseitin;

use std::{
    collections::HashMap,
    fmt::{self, Display},
    io,
    ops::Not,
};

use thiserror::Error;

use crate::NodeId;

pub use alloc::{AllocContext, Allocator, VarAllocator};
pub use symbol::SymbolTable;
pub use tseitin::{Options, aig2cnf, aig2cnf_single};

/// Error returned when the CNF transformation failed.
///
/// These are caller errors: the input must be fixed, retrying won't help.
#[derive(Debug, Error)]
pub enum CnfError {
    /// The single output entry point was used on a circuit without exactly one output.
    #[error("expected a circuit with exactly one output, found {0}")]
    NotSingleOutput(usize),

    /// A name selected to be forced true is not an output of the circuit.
    #[error("{0:?} is not an output of the circuit")]
    UnknownOutput(String),

    /// The allocator returned a variable which cannot be used.
    #[error("the allocator returned {0}, variables must be positive")]
    InvalidVariable(i64),

    /// The allocator returned a variable already used by a seeded input.
    #[error("the allocator returned {0}, which is already used by a seeded input")]
    SeedClash(i64),

    /// Two inputs would share the same literal.
    #[error("inputs {0:?} and {1:?} are both mapped to literal {2}")]
    DuplicateInputLiteral(String, String, Lit),

    /// A node was not mapped to any SAT literal.
    #[error("node id {0} is not mapped to any literal")]
    UnmappedNodeToLit(NodeId),

    /// A node was needed while its own literal was being computed.
    #[error("node id {0} depends on itself")]
    CycleDetected(NodeId),
}

/// A SAT literal, as in the DIMACS format: the absolute value is the variable, the sign is the
/// polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(i64);

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl From<i64> for Lit {
    fn from(value: i64) -> Self {
        if value == 0 {
            panic!("Tried to create a Lit from 0. 0 is not a valid literal in DIMACS format.");
        }
        Lit(value)
    }
}

impl From<Lit> for i64 {
    fn from(value: Lit) -> Self {
        value.0
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Lit {
    /// The variable of the literal (always positive).
    pub fn var(&self) -> i64 {
        self.0.abs()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

/// A SAT clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause(Vec<Lit>);

impl From<Vec<Lit>> for Clause {
    fn from(value: Vec<Lit>) -> Self {
        Clause(value)
    }
}

impl Clause {
    pub fn lits(&self) -> &[Lit] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Clause {
    /// DIMACS clause, `0` terminated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lit in &self.0 {
            write!(f, "{} ", lit)?;
        }
        write!(f, "0")
    }
}

/// Names mapped to literals, in insertion order, with reverse lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LitMap {
    entries: Vec<(String, Lit)>,
    by_name: HashMap<String, usize>,
    /// First name inserted for each literal.
    by_lit: HashMap<Lit, usize>,
}

impl LitMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `name` to `lit`, names are expected to be unique.
    pub(crate) fn insert(&mut self, name: String, lit: Lit) {
        let idx = self.entries.len();
        self.by_name.insert(name.clone(), idx);
        self.by_lit.entry(lit).or_insert(idx);
        self.entries.push((name, lit));
    }

    pub fn get(&self, name: &str) -> Option<Lit> {
        self.by_name.get(name).map(|&idx| self.entries[idx].1)
    }

    /// Name mapped to the literal (the first one inserted, if several names share it).
    pub fn name_of(&self, lit: Lit) -> Option<&str> {
        self.by_lit.get(&lit).map(|&idx| self.entries[idx].0.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Lit)> {
        self.entries.iter().map(|(name, lit)| (name.as_str(), *lit))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A SAT CNF that can be passed to a SAT solver, along with the literals of the circuit inputs
/// and outputs.
///
/// It is produced by [`aig2cnf`] and cannot be modified afterwards.
///
/// Invariants:
/// - no clause contains a literal whose variable is above [`Cnf::max_var`]
/// - two inputs never share a literal
/// - output literals are always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
    input2lit: LitMap,
    output2lit: LitMap,
    comments: Vec<String>,
    max_var: i64,
}

impl Cnf {
    pub(crate) fn new(
        clauses: Vec<Clause>,
        input2lit: LitMap,
        output2lit: LitMap,
        comments: Vec<String>,
        max_var: i64,
    ) -> Self {
        Cnf {
            clauses,
            input2lit,
            output2lit,
            comments,
            max_var,
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Literal of every input of the circuit, in declaration order.
    pub fn input2lit(&self) -> &LitMap {
        &self.input2lit
    }

    /// Positive literal of every output of the circuit, in declaration order.
    pub fn output2lit(&self) -> &LitMap {
        &self.output2lit
    }

    /// Comments of the circuit, untouched.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// The highest variable in use.
    pub fn max_var(&self) -> i64 {
        self.max_var
    }

    /// Writes the CNF in DIMACS format.
    pub fn write_dimacs<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self)
    }

    /// Returns the CNF in DIMACS format.
    pub fn to_dimacs(&self) -> String {
        self.to_string()
    }
}

impl Display for Cnf {
    /// DIMACS: comments, `p cnf` header then one clause per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for comment in &self.comments {
            writeln!(f, "c {}", comment)?;
        }
        writeln!(f, "p cnf {} {}", self.max_var, self.clauses.len())?;
        for clause in &self.clauses {
            writeln!(f, "{}", clause)?;
        }
        Ok(())
    }
}
