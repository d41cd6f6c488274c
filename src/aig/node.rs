use super::AigEdge;

/// A node id.
///
/// The constant node [`AigNode::False`] has id 0 by convention. Also, id must be unique.
pub type NodeId = u64;

/// An AIG node.
///
/// Each node has an id. By convention, id for constant node `False` is 0. The id must be unique.
///
/// There is no inverter node: inverters are carried by edges, see [`AigEdge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AigNode {
    /// The constant low/false signal.
    False,
    /// A named primary input.
    Input { id: NodeId, name: String },
    /// A latch (for sequential circuits).
    ///
    /// Latches can be represented, but the CNF transformation rejects them.
    Latch {
        id: NodeId,
        name: String,
        next: AigEdge,
        init: Option<bool>,
    },
    /// An AND gate with two fanins.
    And {
        id: NodeId,
        fanin0: AigEdge,
        fanin1: AigEdge,
    },
}

impl AigNode {
    /// Returns a new and gate.
    pub fn and(id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Self {
        if id == 0 {
            panic!(
                "Hey, you are trying to create an AND gate with id=0. \
                Id=0 is reserved for the constant node AigNode::False."
            )
        }
        AigNode::And { id, fanin0, fanin1 }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, AigNode::Input { .. })
    }

    /// Name of an input or a latch, [`None`] for other nodes.
    pub fn get_name(&self) -> Option<&str> {
        match self {
            AigNode::Input { name, .. } | AigNode::Latch { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Fanins of the node: both fanins of an and gate, the next state of a latch.
    pub fn get_fanins(&self) -> Vec<AigEdge> {
        match self {
            AigNode::Latch { next, .. } => vec![*next],
            AigNode::And { fanin0, fanin1, .. } => vec![*fanin0, *fanin1],
            _ => vec![],
        }
    }
}
