//! Bottom-up evaluation of an [`Aig`] with user provided combinators.
//!
//! [`Aig::fold`] is the generic evaluator, [`Aig::simulate`] the boolean one.

use std::collections::HashMap;

use crate::{Aig, AigEdge, AigError, AigNode, NodeId, Result};

fn edge_value<T: Clone>(
    values: &HashMap<NodeId, T>,
    edge: AigEdge,
    not: &mut impl FnMut(&T) -> Result<T>,
) -> Result<T> {
    let value = values.get(&edge.node).ok_or(AigError::InvalidState(format!(
        "node {} evaluated before its fanins",
        edge.node
    )))?;
    if edge.complement {
        not(value)
    } else {
        Ok(value.clone())
    }
}

impl Aig {
    /// Evaluates the given edges bottom-up, with:
    /// - `konst` producing the value of the constant false node (only called if it is reachable)
    /// - `lift` producing the value of an input from its name
    /// - `and` and `not` combining values.
    ///
    /// Each node is evaluated exactly once (results are cached by node id), whatever the number of
    /// paths leading to it. Complemented edges apply `not` at each use.
    ///
    /// Fails with [`AigError::Sequential`] on circuits with latches.
    pub fn fold<T, K, L, A, N>(
        &self,
        roots: &[AigEdge],
        mut konst: K,
        mut lift: L,
        mut and: A,
        mut not: N,
    ) -> Result<Vec<T>>
    where
        T: Clone,
        K: FnMut() -> Result<T>,
        L: FnMut(&str) -> Result<T>,
        A: FnMut(&T, &T) -> Result<T>,
        N: FnMut(&T) -> Result<T>,
    {
        if !self.latches.is_empty() {
            return Err(AigError::Sequential(self.latches.len()));
        }

        let order = self.topological_sort_from(roots.iter().copied())?;
        let mut values: HashMap<NodeId, T> = HashMap::with_capacity(order.len());

        for id in order {
            let value = match self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))? {
                AigNode::False => konst()?,
                AigNode::Input { name, .. } => lift(name)?,
                AigNode::And { fanin0, fanin1, .. } => {
                    let a = edge_value(&values, *fanin0, &mut not)?;
                    let b = edge_value(&values, *fanin1, &mut not)?;
                    and(&a, &b)?
                }
                AigNode::Latch { .. } => return Err(AigError::Sequential(self.latches.len())),
            };
            values.insert(id, value);
        }

        roots
            .iter()
            .map(|&edge| edge_value(&values, edge, &mut not))
            .collect()
    }

    /// Computes the value of every output (in declaration order) for the given input values.
    ///
    /// Only inputs the outputs depend on need to be assigned.
    pub fn simulate(&self, assignment: &HashMap<String, bool>) -> Result<Vec<(String, bool)>> {
        let roots: Vec<AigEdge> = self.outputs.iter().map(|(_, edge)| *edge).collect();
        let values = self.fold(
            &roots,
            || Ok(false),
            |name| {
                assignment
                    .get(name)
                    .copied()
                    .ok_or_else(|| AigError::UnassignedInput(name.to_string()))
            },
            |a, b| Ok(*a && *b),
            |a| Ok(!*a),
        )?;

        Ok(self
            .outputs
            .iter()
            .map(|(name, _)| name.clone())
            .zip(values)
            .collect())
    }
}
