//! Module defining the [`Aig`] struct, as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! To turn a circuit into a SAT formula, check [`crate::cnf`] docs.

pub mod edge;
pub mod error;
mod eval;
pub mod node;
mod parser;

use std::collections::{HashMap, HashSet};

pub use edge::AigEdge;
pub use error::{AigError, ParserError, Result};
pub use node::{AigNode, NodeId};

/// A whole, structurally hashed, AIG.
///
/// Nodes are stored in an append-only arena: the id of a node is its index, and the constant node
/// [`AigNode::False`] always exists with id 0. Nodes are never removed nor rewritten, so fanins
/// always have a lower id than the and gates using them.
///
/// Creating a node which already exists gives back the existing one:
/// - an input is identified by its name
/// - an and gate is identified by its (ordered) pair of fanins.
///
/// This way, two structurally identical gates are the same node, and a node shared by several
/// fanouts is really shared (which matters for the CNF transformation to stay linear).
///
/// Inverters are not nodes: they are carried by the edges, see [`AigEdge`].
///
/// ```rust
/// use aigcnf::{Aig, AigEdge};
/// let mut aig = Aig::new();
/// let x = aig.add_input("x").unwrap();
/// let y = aig.add_input("y").unwrap();
/// let a = aig.new_and(x, !y).unwrap();
/// assert_eq!(a, aig.new_and(x, !y).unwrap());
/// assert_ne!(a, aig.new_and(!y, x).unwrap());
/// aig.add_output("z", !a).unwrap();
/// assert_eq!(aig.get_output("z"), Some(!a));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aig {
    nodes: Vec<AigNode>,
    /// Structural hashing of and gates.
    strash: HashMap<(AigEdge, AigEdge), NodeId>,
    /// Names of inputs and latches.
    names: HashMap<String, NodeId>,
    /// Inputs in declaration order.
    inputs: Vec<NodeId>,
    /// Latches in declaration order.
    latches: Vec<NodeId>,
    /// Outputs in declaration order, along with an index on their names.
    outputs: Vec<(String, AigEdge)>,
    outputs_idx: HashMap<String, usize>,
    comments: Vec<String>,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Create a brand new AIG (constant node [`AigNode::False`] included).
    pub fn new() -> Self {
        Aig {
            nodes: vec![AigNode::False],
            strash: HashMap::new(),
            names: HashMap::new(),
            inputs: Vec::new(),
            latches: Vec::new(),
            outputs: Vec::new(),
            outputs_idx: HashMap::new(),
            comments: Vec::new(),
        }
    }

    /// Retrieves a node from its id.
    pub fn get_node(&self, id: NodeId) -> Option<&AigNode> {
        let idx = usize::try_from(id).ok()?;
        self.nodes.get(idx)
    }

    /// Number of and gates.
    pub fn num_ands(&self) -> usize {
        self.strash.len()
    }

    fn next_id(&self) -> NodeId {
        self.nodes.len() as NodeId
    }

    fn check_edge(&self, edge: AigEdge) -> Result<()> {
        match self.get_node(edge.node) {
            Some(_) => Ok(()),
            None => Err(AigError::NodeDoesNotExist(edge.node)),
        }
    }

    /// Create a new input (or retrieve the existing input with the same name).
    /// This will fail if a latch already uses this name.
    pub fn add_input(&mut self, name: impl Into<String>) -> Result<AigEdge> {
        let name = name.into();
        if let Some(&id) = self.names.get(&name) {
            return match self.get_node(id) {
                Some(AigNode::Input { .. }) => Ok(AigEdge::new(id, false)),
                _ => Err(AigError::DuplicateInput(name)),
            };
        }

        let id = self.next_id();
        self.names.insert(name.clone(), id);
        self.nodes.push(AigNode::Input { id, name });
        self.inputs.push(id);
        Ok(AigEdge::new(id, false))
    }

    /// Create a new latch, its next state is the constant false until [`Aig::set_latch_next`] is called.
    /// Latch names share their namespace with inputs, and must be unique.
    pub fn add_latch(&mut self, name: impl Into<String>, init: Option<bool>) -> Result<AigEdge> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(AigError::DuplicateInput(name));
        }

        let id = self.next_id();
        self.names.insert(name.clone(), id);
        self.nodes.push(AigNode::Latch {
            id,
            name,
            next: AigEdge::FALSE,
            init,
        });
        self.latches.push(id);
        Ok(AigEdge::new(id, false))
    }

    /// Set the next state of an existing latch.
    pub fn set_latch_next(&mut self, latch: NodeId, next_state: AigEdge) -> Result<()> {
        self.check_edge(next_state)?;
        let idx = usize::try_from(latch).map_err(|_| AigError::NodeDoesNotExist(latch))?;
        match self.nodes.get_mut(idx) {
            Some(AigNode::Latch { next, .. }) => {
                *next = next_state;
                Ok(())
            }
            Some(_) => Err(AigError::NotALatch(latch)),
            None => Err(AigError::NodeDoesNotExist(latch)),
        }
    }

    /// Create a new and gate (or retrieve it if the exact same gate already exists).
    ///
    /// No simplification is performed: `x & !x` or `x & false` are regular and gates.
    pub fn new_and(&mut self, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigEdge> {
        self.check_edge(fanin0)?;
        self.check_edge(fanin1)?;

        if let Some(&id) = self.strash.get(&(fanin0, fanin1)) {
            return Ok(AigEdge::new(id, false));
        }

        let id = self.next_id();
        self.nodes.push(AigNode::and(id, fanin0, fanin1));
        self.strash.insert((fanin0, fanin1), id);
        Ok(AigEdge::new(id, false))
    }

    /// Create `a | b` as `!(!a & !b)`.
    pub fn new_or(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        Ok(!self.new_and(!a, !b)?)
    }

    /// Mark an existing node as an output.
    pub fn add_output(&mut self, name: impl Into<String>, edge: AigEdge) -> Result<()> {
        let name = name.into();
        self.check_edge(edge)?;
        if self.outputs_idx.contains_key(&name) {
            return Err(AigError::DuplicateOutput(name));
        }
        self.outputs_idx.insert(name.clone(), self.outputs.len());
        self.outputs.push((name, edge));
        Ok(())
    }

    /// Attach a comment to the circuit. Comments are opaque and passed along to the CNF.
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Retrieves inputs id, in declaration order.
    pub fn get_inputs_id(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Retrieves inputs name, in declaration order.
    pub fn get_input_names(&self) -> Vec<&str> {
        self.inputs
            .iter()
            .filter_map(|&id| self.get_node(id)?.get_name())
            .collect()
    }

    /// Retrieves the input with the given name.
    pub fn get_input(&self, name: &str) -> Option<AigEdge> {
        let &id = self.names.get(name)?;
        self.get_node(id)?
            .is_input()
            .then_some(AigEdge::new(id, false))
    }

    /// Retrieves latches id, in declaration order.
    pub fn get_latches_id(&self) -> &[NodeId] {
        &self.latches
    }

    /// Retrieves outputs, in declaration order.
    pub fn get_outputs(&self) -> &[(String, AigEdge)] {
        &self.outputs
    }

    /// Retrieves the output with the given name.
    pub fn get_output(&self, name: &str) -> Option<AigEdge> {
        let &idx = self.outputs_idx.get(name)?;
        Some(self.outputs[idx].1)
    }

    pub fn get_comments(&self) -> &[String] {
        &self.comments
    }

    fn topological_visit(
        &self,
        start: NodeId,
        sort: &mut Vec<NodeId>,
        seen: &mut HashSet<NodeId>,
        done: &mut HashSet<NodeId>,
        roots_to_visit: &mut Vec<NodeId>,
    ) -> Result<()> {
        let mut stack: Vec<(NodeId, bool)> = vec![(start, false)];

        while let Some((id, last_time)) = stack.pop() {
            // Post order
            if last_time {
                done.insert(id);
                sort.push(id);
                continue;
            }

            if done.contains(&id) {
                continue;
            } else if seen.contains(&id) {
                return Err(AigError::InvalidState(format!(
                    "found a cycle through node {}",
                    id
                )));
            }

            seen.insert(id);
            stack.push((id, true));

            let node = self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
            // Latches are allowed to create cycles so their next state is visited later on.
            let pending = node.get_fanins().into_iter().filter(|f| !done.contains(&f.node));
            if let AigNode::Latch { .. } = node {
                roots_to_visit.extend(pending.map(|f| f.node));
            } else {
                // Pushing fanin1 first so that fanin0 gets visited first.
                stack.extend(pending.rev().map(|f| (f.node, false)));
            }
        }

        Ok(())
    }

    /// Returns a topological sort of the nodes reachable from the outputs (children first).
    ///
    /// The sort is deterministic: outputs are visited in declaration order, and `fanin0` is visited
    /// before `fanin1`. The traversal uses an explicit stack, so deep circuits are fine.
    ///
    /// The "topological" sort makes sense only for the purely combinational part of the AIG,
    /// ie only without latches. Indeed, latches are allowed to create cycles through their next-state fanin.
    pub fn get_topological_sort(&self) -> Result<Vec<NodeId>> {
        self.topological_sort_from(self.outputs.iter().map(|(_, edge)| *edge))
    }

    /// Same as [`Aig::get_topological_sort`], but starting from the given edges instead of the outputs.
    pub(crate) fn topological_sort_from(
        &self,
        roots: impl DoubleEndedIterator<Item = AigEdge>,
    ) -> Result<Vec<NodeId>> {
        let mut sort = Vec::new();
        let mut seen = HashSet::new();
        let mut done = HashSet::new();
        let mut roots_to_visit: Vec<NodeId> = roots.rev().map(|edge| edge.node).collect();

        while let Some(id) = roots_to_visit.pop() {
            self.topological_visit(id, &mut sort, &mut seen, &mut done, &mut roots_to_visit)?;
        }
        Ok(sort)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_input_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let y = aig.add_input("y").unwrap();
        assert_ne!(x, y);
        // Same name, same node
        assert_eq!(aig.add_input("x").unwrap(), x);
        assert_eq!(aig.get_inputs_id(), &[1, 2]);
        assert_eq!(aig.get_input_names(), vec!["x", "y"]);
        assert_eq!(aig.get_input("y"), Some(y));
        assert_eq!(aig.get_input("z"), None);
    }

    #[test]
    fn add_latch_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let l = aig.add_latch("l", None).unwrap();
        assert!(aig.add_latch("l", None).is_err());
        assert!(aig.add_latch("x", None).is_err());
        assert!(aig.add_input("l").is_err());
        assert_eq!(aig.get_input("l"), None);

        aig.set_latch_next(l.get_node_id(), !x).unwrap();
        match aig.get_node(l.get_node_id()).unwrap() {
            AigNode::Latch { next, .. } => assert_eq!(*next, !x),
            _ => panic!("Test failed."),
        }
        assert!(matches!(
            aig.set_latch_next(x.get_node_id(), x),
            Err(AigError::NotALatch(1))
        ));
        assert!(matches!(
            aig.set_latch_next(l.get_node_id(), AigEdge::new(42, false)),
            Err(AigError::NodeDoesNotExist(42))
        ));
        assert_eq!(aig.get_latches_id(), &[2]);
    }

    #[test]
    fn new_and_strash_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let y = aig.add_input("y").unwrap();

        let a = aig.new_and(x, y).unwrap();
        assert_eq!(aig.new_and(x, y).unwrap(), a);
        assert_ne!(aig.new_and(x, !y).unwrap(), a);
        assert_ne!(aig.new_and(y, x).unwrap(), a);
        assert_eq!(aig.num_ands(), 3);

        // No simplification
        let f = aig.new_and(x, AigEdge::FALSE).unwrap();
        assert!(matches!(
            aig.get_node(f.get_node_id()),
            Some(AigNode::And { .. })
        ));

        // Dangling fanin
        assert!(matches!(
            aig.new_and(x, AigEdge::new(100, false)),
            Err(AigError::NodeDoesNotExist(100))
        ));
    }

    #[test]
    fn new_or_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let y = aig.add_input("y").unwrap();
        let o = aig.new_or(x, y).unwrap();
        assert!(o.get_complement());
        assert_eq!(
            aig.get_node(o.get_node_id()).unwrap().get_fanins(),
            vec![!x, !y]
        );
    }

    #[test]
    fn add_output_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        aig.add_output("o", !x).unwrap();
        aig.add_output("p", !x).unwrap();
        assert!(matches!(
            aig.add_output("o", x),
            Err(AigError::DuplicateOutput(_))
        ));
        assert!(aig.add_output("q", AigEdge::new(7, false)).is_err());
        assert_eq!(aig.get_output("o"), Some(!x));
        assert_eq!(aig.get_output("q"), None);
        assert_eq!(aig.get_outputs().len(), 2);
    }

    #[test]
    fn topological_sort_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let y = aig.add_input("y").unwrap();
        let z = aig.add_input("z").unwrap();
        let a = aig.new_and(x, y).unwrap();
        let b = aig.new_and(!a, z).unwrap();
        let c = aig.new_and(a, b).unwrap();
        aig.add_output("c", c).unwrap();
        aig.add_output("b", !b).unwrap();

        let sort = aig.get_topological_sort().unwrap();
        assert_eq!(
            sort,
            vec![
                x.get_node_id(),
                y.get_node_id(),
                a.get_node_id(),
                z.get_node_id(),
                b.get_node_id(),
                c.get_node_id()
            ]
        );
        // Deterministic
        assert_eq!(sort, aig.get_topological_sort().unwrap());
    }

    #[test]
    fn topological_sort_skips_unreachable_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let y = aig.add_input("y").unwrap();
        let _unused = aig.new_and(x, y).unwrap();
        aig.add_output("o", AigEdge::TRUE).unwrap();
        assert_eq!(aig.get_topological_sort().unwrap(), vec![0]);
    }

    #[test]
    fn topological_sort_latch_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let l = aig.add_latch("l", Some(false)).unwrap();
        let a = aig.new_and(x, l).unwrap();
        aig.set_latch_next(l.get_node_id(), a).unwrap();
        aig.add_output("o", l).unwrap();

        // The cycle through the latch is not an error
        let sort = aig.get_topological_sort().unwrap();
        assert_eq!(
            sort,
            vec![l.get_node_id(), x.get_node_id(), a.get_node_id()]
        );
    }

    #[test]
    fn topological_sort_deep_test() {
        let mut aig = Aig::new();
        let x = aig.add_input("x").unwrap();
        let mut acc = x;
        for _ in 0..100_000 {
            acc = aig.new_and(acc, !x).unwrap();
        }
        aig.add_output("o", acc).unwrap();
        assert_eq!(aig.get_topological_sort().unwrap().len(), 100_001);
    }
}
