//! Build statistics shared by the partition trees

use std::fmt;

/// Shape of a built tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes in the tree, root included
    pub node_count: usize,
    /// Nodes without children
    pub leaf_count: usize,
    /// Stored leaf payloads
    pub object_count: usize,
    /// Triangles across all stored payloads
    pub triangle_count: usize,
    /// Deepest node level (root = 0)
    pub max_depth: u32,
    /// Splits abandoned because clipping did not shrink the input
    pub bail_outs: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} leaves), {} objects, {} triangles, depth {}, {} bail-outs",
            self.node_count,
            self.leaf_count,
            self.object_count,
            self.triangle_count,
            self.max_depth,
            self.bail_outs
        )
    }
}
