//! An [`AigEdge`] points at an [`AigNode`] and can be complemented (indicates the presence of a
//! NOT gate).
//!
//! [`AigNode`]: crate::AigNode

use std::ops::Not;

use crate::NodeId;

/// A directed edge representing a fanin for AIG nodes, or an output.
///
/// The edge can carry an inverter according to the value of `complement`.
/// Inverting an edge is free: it creates no node, and inverting twice gives back the same edge.
///
/// For example:
///
/// ```rust
/// use aigcnf::AigEdge;
/// let fanin_false = AigEdge::FALSE;
/// let fanin_true = AigEdge::TRUE;
/// assert_eq!(fanin_false, !fanin_true);
/// assert_eq!(fanin_false, !!fanin_false);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AigEdge {
    /// The id of the node the edge is refering to.
    pub(super) node: NodeId,
    /// Set to true if signal should be inverted.
    pub(super) complement: bool,
}

impl Not for AigEdge {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

impl AigEdge {
    /// Edge to the constant node.
    pub const FALSE: AigEdge = AigEdge {
        node: 0,
        complement: false,
    };

    /// Complemented edge to the constant node.
    pub const TRUE: AigEdge = AigEdge {
        node: 0,
        complement: true,
    };

    pub fn new(node: NodeId, complement: bool) -> Self {
        AigEdge { node, complement }
    }

    pub fn get_node_id(&self) -> NodeId {
        self.node
    }

    pub fn get_complement(&self) -> bool {
        self.complement
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edge_not_test() {
        let e = AigEdge::new(3, false);
        assert_eq!(!e, AigEdge::new(3, true));
        assert_eq!(!!e, e);
        assert_eq!((!e).get_node_id(), 3);
        assert!((!e).get_complement());
    }

    #[test]
    fn edge_cst_test() {
        assert_eq!(AigEdge::FALSE, AigEdge::new(0, false));
        assert_eq!(AigEdge::TRUE, AigEdge::new(0, true));
        assert_ne!(AigEdge::TRUE, AigEdge::new(1, true));
    }
}
