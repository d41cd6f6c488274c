use thiserror::Error;

use crate::cnf::CnfError;

use super::NodeId;

/// The result of an AIG operation.
pub type Result<T> = std::result::Result<T, AigError>;

/// Error returned when an AIG operation failed.
#[derive(Debug, Error)]
pub enum AigError {
    /// The node with given id does not exist.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// The name is already used by another input or latch.
    #[error("name {0:?} is already used by a latch or an input")]
    DuplicateInput(String),

    /// An output with the same name was already registered.
    #[error("output {0:?} already exists")]
    DuplicateOutput(String),

    /// The node is not a latch, so it has no next state.
    #[error("node with id={0} is not a latch")]
    NotALatch(NodeId),

    /// The circuit holds latches, only combinational circuits are supported here.
    #[error("circuit has {0} latch(es), only combinational circuits are supported")]
    Sequential(usize),

    /// An input was not given any value when evaluating the circuit.
    #[error("input {0:?} is not assigned")]
    UnassignedInput(String),

    /// The AIG has reached an invalid state, for example a cycle was found.
    #[error("the AIG has reached an invalid state - error: {0}")]
    InvalidState(String),

    /// Just forwarding a [`CnfError`].
    #[error("{0}")]
    CnfError(#[from] CnfError),

    /// Just forwarding a [`ParserError`].
    #[error("{0}")]
    ParserError(#[from] ParserError),
}

/// Error returned when parsing from file failed.
///
/// It is defined here because the `parser` module is private.
#[derive(Debug, Error)]
pub enum ParserError {
    /// All features are not supported (only the basics in fact).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Invalid token, something else was expected.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// An IO error occured (file doesn't exist, or doesn't have the right extension, ...).
    #[error("io error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ParserError {
    fn from(value: std::io::Error) -> Self {
        ParserError::IoError(value.to_string())
    }
}
