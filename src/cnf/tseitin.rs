//! The Tseitin transformation: one variable per and gate, three clauses to define it.
//!
//! The transformation goes through the following steps:
//! - check the circuit is combinational and the options are valid (nothing is emitted before that)
//! - visit reachable nodes in topological order, giving each node its literal (see [`SymbolTable`])
//!   and emitting the clauses of each and gate
//! - give a literal to the inputs no output depends on
//! - make sure every output has a positive literal
//! - (optional) force outputs to true with unit clauses.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::{
    Aig, AigError, AigNode, NodeId, Result,
    cnf::{AllocContext, Allocator, Clause, Cnf, CnfError, Lit, LitMap, SymbolTable, VarAllocator},
};

/// Options of the transformation, see [`aig2cnf`].
///
/// ```rust
/// use aigcnf::cnf::{Options, VarAllocator};
/// let mut alloc = VarAllocator::starting_at(100);
/// let options = Options::new()
///     .force_true(true)
///     .outputs(["o1", "o2"])
///     .fresh(&mut alloc);
/// ```
pub struct Options<'a> {
    outputs: Option<Vec<String>>,
    fresh: Option<&'a mut dyn Allocator>,
    force_true: bool,
    seed: HashMap<String, Lit>,
}

impl Default for Options<'_> {
    fn default() -> Self {
        Options {
            outputs: None,
            fresh: None,
            force_true: true,
            seed: HashMap::new(),
        }
    }
}

impl<'a> Options<'a> {
    /// Default options: all outputs forced to true, variables counted from 1, no seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Outputs to force to true (all of them by default).
    pub fn outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether to add a unit clause for each selected output (true by default).
    pub fn force_true(mut self, force_true: bool) -> Self {
        self.force_true = force_true;
        self
    }

    /// Allocator to use instead of a new [`VarAllocator`].
    pub fn fresh(mut self, alloc: &'a mut dyn Allocator) -> Self {
        self.fresh = Some(alloc);
        self
    }

    /// Literals to use for inputs, by name (instead of fresh variables).
    pub fn seed(mut self, seed: HashMap<String, Lit>) -> Self {
        self.seed = seed;
        self
    }
}

/// Collects the clauses, and checks the variables handed out by the allocator.
struct Emitter<'a> {
    alloc: &'a mut dyn Allocator,
    clauses: Vec<Clause>,
    /// Variables of seeded inputs, the allocator must not return them.
    reserved: HashSet<i64>,
    max_var: i64,
}

impl<'a> Emitter<'a> {
    fn new(alloc: &'a mut dyn Allocator, reserved: HashSet<i64>) -> Self {
        let max_var = reserved.iter().copied().max().unwrap_or(0);
        Emitter {
            alloc,
            clauses: Vec::new(),
            reserved,
            max_var,
        }
    }

    fn fresh(&mut self, context: AllocContext<'_>) -> Result<Lit> {
        let var = self.alloc.alloc(context);
        if var <= 0 {
            return Err(CnfError::InvalidVariable(var).into());
        }
        if self.reserved.contains(&var) {
            return Err(CnfError::SeedClash(var).into());
        }
        self.max_var = self.max_var.max(var);
        Ok(Lit::from(var))
    }

    fn add_clause(&mut self, lits: Vec<Lit>) {
        self.clauses.push(Clause::from(lits));
    }
}

/// Gives its literal to a node, emitting the clauses defining it.
/// Fanins must have been encoded before.
fn encode_node(
    aig: &Aig,
    id: NodeId,
    table: &mut SymbolTable,
    emitter: &mut Emitter<'_>,
) -> Result<Lit> {
    let node = aig.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
    table.resolve_with(id, |table| match node {
        // False is the negation of a variable forced to true.
        AigNode::False => {
            let t = emitter.fresh(AllocContext::ConstTrue)?;
            emitter.add_clause(vec![t]);
            trace!("constant false -> {}", !t);
            Ok(!t)
        }
        AigNode::Input { name, .. } => match table.seeded(name) {
            Some(lit) => Ok(lit),
            None => emitter.fresh(AllocContext::Input(name)),
        },
        // out <=> a & b
        AigNode::And {
            id,
            fanin0,
            fanin1,
        } => {
            let a = table.get(*fanin0)?;
            let b = table.get(*fanin1)?;
            let out = emitter.fresh(AllocContext::And(*id))?;
            emitter.add_clause(vec![!a, !b, out]);
            emitter.add_clause(vec![a, !out]);
            emitter.add_clause(vec![b, !out]);
            trace!("and gate {}: {} <=> {} & {}", id, out, a, b);
            Ok(out)
        }
        AigNode::Latch { .. } => Err(AigError::Sequential(aig.get_latches_id().len())),
    })
}

/// Every output gets a positive literal: a negative literal `old` is replaced
/// by a new variable `v` with `v <=> old`.
///
/// Outputs pointing at the same positive literal share it, but each negative output gets its own
/// variable.
fn normalize_outputs(aig: &Aig, table: &SymbolTable, emitter: &mut Emitter<'_>) -> Result<LitMap> {
    let mut output2lit = LitMap::new();
    for (name, edge) in aig.get_outputs() {
        let old = table.get(*edge)?;
        let lit = if old.is_positive() {
            old
        } else {
            let v = emitter.fresh(AllocContext::Output(name))?;
            emitter.add_clause(vec![!old, v]);
            emitter.add_clause(vec![old, !v]);
            trace!("output {:?}: {} <=> {}", name, v, old);
            v
        };
        output2lit.insert(name.clone(), lit);
    }
    Ok(output2lit)
}

fn force_outputs_true(
    names: &[String],
    output2lit: &LitMap,
    emitter: &mut Emitter<'_>,
) -> Result<()> {
    for name in names {
        let lit = output2lit
            .get(name)
            .ok_or(CnfError::UnknownOutput(name.clone()))?;
        emitter.add_clause(vec![lit]);
    }
    Ok(())
}

/// Checks the seed does not map two inputs of the circuit to the same variable,
/// and returns the seeded variables.
fn check_seed(aig: &Aig, table: &SymbolTable) -> Result<HashSet<i64>> {
    let mut owners: HashMap<i64, &str> = HashMap::new();
    for name in aig.get_input_names() {
        if let Some(lit) = table.seeded(name) {
            if let Some(other) = owners.insert(lit.var(), name) {
                let (other, name) = (other.to_string(), name.to_string());
                return Err(CnfError::DuplicateInputLiteral(other, name, lit).into());
            }
        }
    }
    Ok(owners.into_keys().collect())
}

/// Converts a combinational AIG into an equisatisfiable CNF.
///
/// Fails before doing anything if:
/// - the AIG has latches ([`AigError::Sequential`])
/// - a name given to [`Options::outputs`] is not an output ([`CnfError::UnknownOutput`])
/// - the seed maps two inputs on the same variable ([`CnfError::DuplicateInputLiteral`]).
///
/// The allocator returning an invalid variable also fails the transformation. In all cases, no CNF
/// is returned.
///
/// The result is deterministic: nodes are visited as in [`Aig::get_topological_sort`], then unused
/// inputs (in declaration order), then outputs (in declaration order).
pub fn aig2cnf(aig: &Aig, options: Options<'_>) -> Result<Cnf> {
    let Options {
        outputs,
        fresh,
        force_true,
        seed,
    } = options;

    if !aig.get_latches_id().is_empty() {
        return Err(AigError::Sequential(aig.get_latches_id().len()));
    }

    let forced: Vec<String> = match outputs {
        None => aig
            .get_outputs()
            .iter()
            .map(|(name, _)| name.clone())
            .collect(),
        Some(names) => {
            if let Some(unknown) = names.iter().find(|name| aig.get_output(name).is_none()) {
                return Err(CnfError::UnknownOutput(unknown.clone()).into());
            }
            names
        }
    };

    let mut table = SymbolTable::with_seed(seed);
    let reserved = check_seed(aig, &table)?;

    let mut default_alloc = VarAllocator::new();
    let alloc: &mut dyn Allocator = match fresh {
        Some(alloc) => alloc,
        None => &mut default_alloc,
    };
    let mut emitter = Emitter::new(alloc, reserved);

    let order = aig.get_topological_sort()?;
    debug!(
        "encoding {} reachable nodes ({} and gates, {} inputs, {} outputs)",
        order.len(),
        aig.num_ands(),
        aig.get_inputs_id().len(),
        aig.get_outputs().len()
    );
    for id in order {
        encode_node(aig, id, &mut table, &mut emitter)?;
    }

    // Inputs no output depends on still get a literal
    let mut input2lit = LitMap::new();
    for &id in aig.get_inputs_id() {
        let lit = encode_node(aig, id, &mut table, &mut emitter)?;
        let name = aig
            .get_node(id)
            .and_then(|node| node.get_name())
            .ok_or(AigError::InvalidState(format!("input {} has no name", id)))?;
        if let Some(other) = input2lit.name_of(lit) {
            let (other, name) = (other.to_string(), name.to_string());
            return Err(CnfError::DuplicateInputLiteral(other, name, lit).into());
        }
        input2lit.insert(name.to_string(), lit);
    }

    let output2lit = normalize_outputs(aig, &table, &mut emitter)?;

    if force_true {
        force_outputs_true(&forced, &output2lit, &mut emitter)?;
    }

    debug!(
        "cnf has {} clauses over {} variables",
        emitter.clauses.len(),
        emitter.max_var
    );

    Ok(Cnf::new(
        emitter.clauses,
        input2lit,
        output2lit,
        aig.get_comments().to_vec(),
        emitter.max_var,
    ))
}

/// Same as [`aig2cnf`] for a circuit with exactly one output, whose literal is also returned.
pub fn aig2cnf_single(aig: &Aig, options: Options<'_>) -> Result<(Cnf, Lit)> {
    let name = match aig.get_outputs() {
        [(name, _)] => name,
        outputs => return Err(CnfError::NotSingleOutput(outputs.len()).into()),
    };
    let cnf = aig2cnf(aig, options)?;
    let lit = cnf
        .output2lit()
        .get(name)
        .ok_or(CnfError::UnknownOutput(name.clone()))?;
    Ok((cnf, lit))
}

impl Aig {
    /// Converts the AIG into a CNF with default [`Options`] (all outputs forced to true).
    pub fn to_cnf(&self) -> Result<Cnf> {
        aig2cnf(self, Options::default())
    }
}
