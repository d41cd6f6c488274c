use std::collections::{HashMap, HashSet};

use crate::{AigEdge, NodeId, Result, cnf::CnfError, cnf::Lit};

/// Maps AIG nodes to SAT literals.
///
/// Each node is given its literal exactly once, through [`SymbolTable::resolve_with`],
/// and keeps it. Inverters being carried by edges, [`SymbolTable::get`] simply negates the
/// literal of the node for a complemented edge: inverters never cost any variable nor clause.
///
/// The table can be seeded with literals for some input names, so that several circuits
/// share the same literals for their common inputs.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    lits: HashMap<NodeId, Lit>,
    /// Nodes whose literal is being computed.
    in_progress: HashSet<NodeId>,
    seed: HashMap<String, Lit>,
}

impl SymbolTable {
    /// A table where inputs named in `seed` will use the given literal.
    pub fn with_seed(seed: HashMap<String, Lit>) -> Self {
        SymbolTable {
            seed,
            ..Default::default()
        }
    }

    /// The literal the input `name` was seeded with.
    pub fn seeded(&self, name: &str) -> Option<Lit> {
        self.seed.get(name).copied()
    }

    /// The literal of an edge, negated if the edge is complemented.
    /// The node must have been resolved already.
    pub fn get(&self, edge: AigEdge) -> Result<Lit> {
        let id = edge.get_node_id();
        let lit = match self.lits.get(&id) {
            Some(&lit) => lit,
            None if self.in_progress.contains(&id) => {
                return Err(CnfError::CycleDetected(id).into());
            }
            None => return Err(CnfError::UnmappedNodeToLit(id).into()),
        };
        Ok(if edge.get_complement() { !lit } else { lit })
    }

    /// Returns the literal of the node, computing it with `f` if this is the first time.
    ///
    /// `f` can look up the literals of other nodes, but asking for the node being resolved
    /// is an error.
    /// If `f` fails, nothing is recorded.
    pub fn resolve_with<F>(&mut self, id: NodeId, f: F) -> Result<Lit>
    where
        F: FnOnce(&Self) -> Result<Lit>,
    {
        if let Some(&lit) = self.lits.get(&id) {
            return Ok(lit);
        }
        if !self.in_progress.insert(id) {
            return Err(CnfError::CycleDetected(id).into());
        }

        let res = f(self);
        self.in_progress.remove(&id);
        let lit = res?;
        self.lits.insert(id, lit);
        Ok(lit)
    }
}
