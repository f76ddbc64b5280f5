//! Debug views of built partition trees
//!
//! Produces data for an external renderer; nothing in this module draws.

pub mod partition_debug;

pub use partition_debug::{
    CellInstance, CellView, ObjectView, PartitionDebugColors, PartitionDebugVisualizer,
};
