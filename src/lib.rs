pub mod aig;
pub mod cnf;

// Re-exporting symbols and modules.
pub use aig::{Aig, AigEdge, AigError, AigNode, NodeId, ParserError, Result};
pub use cnf::{Clause, Cnf, CnfError, Lit, LitMap};
