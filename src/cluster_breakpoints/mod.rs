mod cluster_breakpoint_pairs;
mod hierarchical_merge;
pub mod interval_pair;
mod maximal_cliques;
mod proximity_graph;

use std::fmt;

pub use cluster_breakpoint_pairs::*;

use crate::breakpoint::BreakpointPairError;
use crate::interval::EmptyInputError;

#[derive(Clone, Debug, PartialEq)]
pub enum ClusterError {
    /// Invalid clustering parameter
    InvalidArgument(String),

    /// A consensus breakpoint pair could not be constructed from its bucket's classification
    InvalidRearrangement(BreakpointPairError),

    EmptyInput(EmptyInputError),
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClusterError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            ClusterError::InvalidRearrangement(e) => {
                write!(f, "Invalid consensus breakpoint pair: {e}")
            }
            ClusterError::EmptyInput(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ClusterError {}

impl From<BreakpointPairError> for ClusterError {
    fn from(e: BreakpointPairError) -> Self {
        ClusterError::InvalidRearrangement(e)
    }
}

impl From<EmptyInputError> for ClusterError {
    fn from(e: EmptyInputError) -> Self {
        ClusterError::EmptyInput(e)
    }
}
