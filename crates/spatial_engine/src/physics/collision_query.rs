//! Box queries against built partition trees
//!
//! A query walks the tree top-down, pruning subtrees whose box misses the
//! query with the broad phase and running GJK against the bounding box of
//! each stored object. The first object hit is flagged as colliding and the
//! walk stops.

use super::broad_phase::box_box;
use super::gjk::gjk_intersect;
use crate::debug::CellView;
use crate::foundation::math::{Transform, Vec3};
use crate::geometry::BoundingBox;
use crate::spatial::octree::depth_color;
use crate::spatial::{BspNodeKey, BspTree, Octree, OctreeNode, PartitionObject, TreeStats};

/// Common query and inspection surface of the partition trees
///
/// Queries take `&self`; the only mutation is the per-object colliding flag,
/// so several queries may run over one tree at once.
pub trait PartitionTree {
    /// True when `query` overlaps the bounds of some stored object
    ///
    /// Marks the first object found as colliding.
    fn collision_test(&self, query: &BoundingBox) -> bool;

    /// Every stored object
    fn objects(&self) -> Vec<&PartitionObject>;

    /// Shape of the tree
    fn stats(&self) -> TreeStats;

    /// Cells for debug display
    fn cells(&self) -> Vec<CellView>;

    /// Query with a box placed by a world transform
    ///
    /// Only translation and scale are honored; rotation is ignored.
    fn collision_test_at(&self, half_extent: Vec3, transform: &Transform) -> bool {
        self.collision_test(&BoundingBox::from_transform(half_extent, transform))
    }

    /// Objects whose colliding flag is set
    fn colliding_objects(&self) -> Vec<&PartitionObject> {
        self.objects().into_iter().filter(|object| object.is_colliding()).collect()
    }

    /// Reset every colliding flag
    fn clear_collisions(&self) {
        for object in self.objects() {
            object.clear_colliding();
        }
    }
}

/// Flag and report the first object whose bounds GJK-intersect `query`
fn first_hit(objects: &[PartitionObject], query: &BoundingBox, max_iterations: u32) -> bool {
    match objects
        .iter()
        .find(|object| gjk_intersect(object.bounds(), query, max_iterations))
    {
        Some(object) => {
            log::trace!("Query hit object at {:?}", object.bounds().position);
            object.mark_colliding();
            true
        }
        None => false,
    }
}

fn octree_node_test(node: &OctreeNode, query: &BoundingBox, max_iterations: u32) -> bool {
    if !box_box(node.bounds(), query) {
        return false;
    }
    if first_hit(node.objects(), query, max_iterations) {
        return true;
    }
    node.children()
        .any(|(_, child)| octree_node_test(child, query, max_iterations))
}

impl PartitionTree for Octree {
    fn collision_test(&self, query: &BoundingBox) -> bool {
        octree_node_test(self.root(), query, self.config().max_gjk_iterations)
    }

    fn objects(&self) -> Vec<&PartitionObject> {
        Octree::objects(self)
    }

    fn stats(&self) -> TreeStats {
        Octree::stats(self)
    }

    fn cells(&self) -> Vec<CellView> {
        self.nodes()
            .into_iter()
            .map(|node| CellView {
                bounds: *node.bounds(),
                color: node.color(),
                depth: node.depth(),
                is_leaf: node.is_leaf(),
            })
            .collect()
    }
}

fn bsp_node_test(tree: &BspTree, key: BspNodeKey, query: &BoundingBox, max_iterations: u32) -> bool {
    let Some(node) = tree.node(key) else {
        return false;
    };
    match node.bounds() {
        Some(bounds) if box_box(bounds, query) => {}
        _ => return false,
    }
    if first_hit(node.objects(), query, max_iterations) {
        return true;
    }
    [node.left(), node.right()]
        .into_iter()
        .flatten()
        .any(|child| bsp_node_test(tree, child, query, max_iterations))
}

impl PartitionTree for BspTree {
    fn collision_test(&self, query: &BoundingBox) -> bool {
        match self.root_key() {
            Some(root) => bsp_node_test(self, root, query, self.config().max_gjk_iterations),
            None => false,
        }
    }

    fn objects(&self) -> Vec<&PartitionObject> {
        BspTree::objects(self)
    }

    fn stats(&self) -> TreeStats {
        BspTree::stats(self)
    }

    fn cells(&self) -> Vec<CellView> {
        self.nodes()
            .into_iter()
            .filter_map(|node| {
                node.bounds().map(|bounds| CellView {
                    bounds: *bounds,
                    color: depth_color(node.depth()),
                    depth: node.depth(),
                    is_leaf: node.is_leaf(),
                })
            })
            .collect()
    }
}
