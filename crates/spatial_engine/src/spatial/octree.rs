//! Octree spatial partitioning structure
//!
//! Divides a cubic region into hierarchical octants by clipping scene
//! geometry against the three axis-aligned planes through each cell center.
//! A fragment keeps being split until it falls under the configured
//! triangle floor or until clipping stops making it smaller.

use bitflags::bitflags;

use super::object::PartitionObject;
use super::stats::TreeStats;
use crate::config::PartitionConfig;
use crate::foundation::math::Vec3;
use crate::geometry::{clip, Axis, BoundingBox, Fragment, Plane, Straddle, PLANE_THICKNESS};

bitflags! {
    /// Octant of a cell; a set bit selects the positive half of that axis
    ///
    /// Octant layout:
    /// 0: -X, -Y, -Z
    /// 1: +X, -Y, -Z
    /// 2: -X, +Y, -Z
    /// 3: +X, +Y, -Z
    /// 4: -X, -Y, +Z
    /// 5: +X, -Y, +Z
    /// 6: -X, +Y, +Z
    /// 7: +X, +Y, +Z
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Octant: u8 {
        /// Positive X half
        const X = 0b001;
        /// Positive Y half
        const Y = 0b010;
        /// Positive Z half
        const Z = 0b100;
    }
}

impl Octant {
    /// Bit for the positive half of `axis`
    pub fn for_axis(axis: Axis) -> Octant {
        match axis {
            Axis::X => Octant::X,
            Axis::Y => Octant::Y,
            Axis::Z => Octant::Z,
        }
    }

    /// Octant from its child slot index (0-7)
    pub fn from_index(index: usize) -> Octant {
        Octant::from_bits_truncate(index as u8)
    }

    /// Child slot index (0-7)
    pub fn index(self) -> usize {
        self.bits() as usize
    }

    /// Box of this octant within `parent`
    pub fn child_bounds(self, parent: &BoundingBox) -> BoundingBox {
        let step = parent.half_extent * 0.5;
        let mut center = parent.position;
        for axis in Axis::ALL {
            let i = axis.index();
            if self.contains(Octant::for_axis(axis)) {
                center[i] += step[i];
            } else {
                center[i] -= step[i];
            }
        }
        BoundingBox::new(center, step)
    }
}

/// Cell colors cycled by depth for debug views
const DEPTH_PALETTE: [[f32; 3]; 6] = [
    [1.0, 1.0, 1.0],
    [1.0, 0.35, 0.35],
    [0.35, 1.0, 0.35],
    [0.35, 0.55, 1.0],
    [1.0, 0.85, 0.2],
    [0.85, 0.35, 1.0],
];

pub(crate) fn depth_color(depth: u32) -> Vec3 {
    let [r, g, b] = DEPTH_PALETTE[depth as usize % DEPTH_PALETTE.len()];
    Vec3::new(r, g, b)
}

/// Single node in the octree hierarchy
///
/// A node can hold objects and children at the same time: a bail-out
/// stores the unclipped fragment on a node that may already have children
/// from earlier insertions.
#[derive(Debug)]
pub struct OctreeNode {
    bounds: BoundingBox,
    children: [Option<Box<OctreeNode>>; 8],
    objects: Vec<PartitionObject>,
    color: Vec3,
    leaf: bool,
    depth: u32,
}

impl OctreeNode {
    /// Create an empty node
    pub fn new(bounds: BoundingBox, depth: u32) -> Self {
        Self {
            bounds,
            children: Default::default(),
            objects: Vec::new(),
            color: depth_color(depth),
            leaf: false,
            depth,
        }
    }

    /// World-space cell of this node
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Debug color of this cell
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether any fragment has been stored on this node
    pub fn holds_objects(&self) -> bool {
        self.leaf
    }

    /// Check if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Objects stored directly on this node
    pub fn objects(&self) -> &[PartitionObject] {
        &self.objects
    }

    /// Child in `octant`, if it was ever created
    pub fn child(&self, octant: Octant) -> Option<&OctreeNode> {
        self.children[octant.index()].as_deref()
    }

    /// Existing children with their octants
    pub fn children(&self) -> impl Iterator<Item = (Octant, &OctreeNode)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.as_deref().map(|c| (Octant::from_index(i), c)))
    }

    fn child_or_insert(&mut self, octant: Octant) -> &mut OctreeNode {
        let bounds = octant.child_bounds(&self.bounds);
        let depth = self.depth + 1;
        self.children[octant.index()].get_or_insert_with(|| Box::new(OctreeNode::new(bounds, depth)))
    }

    fn store(&mut self, fragment: Fragment) {
        self.objects.push(PartitionObject::new(fragment));
        self.leaf = true;
    }

    /// Collect all nodes, parents before children
    pub fn collect_nodes<'a>(&'a self, nodes: &mut Vec<&'a OctreeNode>) {
        nodes.push(self);
        for (_, child) in self.children() {
            child.collect_nodes(nodes);
        }
    }

    /// Get all leaf nodes (for visualization)
    pub fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode>) {
        if self.is_leaf() {
            leaves.push(self);
        } else {
            for (_, child) in self.children() {
                child.collect_leaves(leaves);
            }
        }
    }

    fn accumulate_stats(&self, stats: &mut TreeStats) {
        stats.node_count += 1;
        if self.is_leaf() {
            stats.leaf_count += 1;
        }
        stats.object_count += self.objects.len();
        stats.triangle_count += self.objects.iter().map(PartitionObject::triangle_count).sum::<usize>();
        stats.max_depth = stats.max_depth.max(self.depth);
        for (_, child) in self.children() {
            child.accumulate_stats(stats);
        }
    }

    /// Drop children bottom-up, returning how many nodes were removed
    fn destroy_children(&mut self) -> usize {
        let mut removed = 0;
        for slot in self.children.iter_mut() {
            if let Some(mut child) = slot.take() {
                removed += child.destroy_children() + 1;
                child.objects.clear();
            }
        }
        removed
    }
}

/// Octree over static scene geometry
#[derive(Debug)]
pub struct Octree {
    root: OctreeNode,
    stop_depth: u32,
    config: PartitionConfig,
    bail_outs: usize,
}

impl Octree {
    /// Build an octree over the cube `position ± half_extent`
    ///
    /// `stop_depth` is recorded and reported but never enforced; recursion
    /// ends through the triangle floor and the bail-out rule.
    pub fn create<I>(
        position: Vec3,
        half_extent: f32,
        stop_depth: u32,
        fragments: I,
        config: &PartitionConfig,
    ) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut octree = Self {
            root: OctreeNode::new(BoundingBox::cube(position, half_extent), 0),
            stop_depth,
            config: config.clone(),
            bail_outs: 0,
        };

        for fragment in fragments {
            octree.insert_object(fragment);
        }

        let stats = octree.stats();
        log::info!("Octree built: {}", stats);
        if stats.max_depth > stop_depth {
            log::debug!(
                "Octree depth {} exceeds requested stop depth {}",
                stats.max_depth,
                stop_depth
            );
        }

        octree
    }

    /// Insert one world-space fragment starting at the root
    pub fn insert_object(&mut self, fragment: Fragment) {
        let mut builder = OctreeBuilder {
            minimum_triangles: self.config.minimum_triangles as usize,
            bail_outs: 0,
        };
        builder.insert_into(&mut self.root, fragment);
        self.bail_outs += builder.bail_outs;
    }

    /// Root node covering the whole region
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Region covered by the root
    pub fn bounds(&self) -> &BoundingBox {
        &self.root.bounds
    }

    /// Requested depth hint
    pub fn stop_depth(&self) -> u32 {
        self.stop_depth
    }

    /// Tunables this tree was built with
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// All nodes, parents before children
    pub fn nodes(&self) -> Vec<&OctreeNode> {
        let mut nodes = Vec::new();
        self.root.collect_nodes(&mut nodes);
        nodes
    }

    /// Nodes without children
    pub fn leaves(&self) -> Vec<&OctreeNode> {
        let mut leaves = Vec::new();
        self.root.collect_leaves(&mut leaves);
        leaves
    }

    /// Every stored object
    pub fn objects(&self) -> Vec<&PartitionObject> {
        self.nodes().into_iter().flat_map(|node| node.objects.iter()).collect()
    }

    /// Current shape of the tree
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            bail_outs: self.bail_outs,
            ..TreeStats::default()
        };
        self.root.accumulate_stats(&mut stats);
        stats
    }

    /// Tear the tree down, leaving an empty root over the same region
    pub fn destroy(&mut self) {
        let removed = self.root.destroy_children();
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.bail_outs = 0;
        log::debug!("Octree destroyed: {} child nodes removed", removed);
    }
}

/// Recursive insertion state for one fragment
struct OctreeBuilder {
    minimum_triangles: usize,
    bail_outs: usize,
}

impl OctreeBuilder {
    fn insert_into(&mut self, node: &mut OctreeNode, fragment: Fragment) {
        if fragment.is_empty() {
            return;
        }

        if fragment.triangle_count() < self.minimum_triangles {
            node.store(fragment);
            return;
        }

        let cell = node.bounds;
        if cell.half_extent.max() <= PLANE_THICKNESS {
            log::debug!(
                "Octree cell at depth {} too small to split, storing {} triangles",
                node.depth,
                fragment.triangle_count()
            );
            node.store(fragment);
            return;
        }

        match split_into_octants(&fragment, &cell) {
            Some(pieces) => {
                for (octant, piece) in pieces {
                    self.insert_into(node.child_or_insert(octant), piece);
                }
            }
            None => {
                self.bail_outs += 1;
                log::debug!(
                    "Octree bail-out at depth {}: clipping {} triangles did not shrink them",
                    node.depth,
                    fragment.triangle_count()
                );
                node.store(fragment);
            }
        }
    }
}

/// Clip `fragment` against the three center planes of `cell`
///
/// Returns the surviving pieces merged per octant, or `None` when a clip
/// produced a side with more triangles than it started with.
fn split_into_octants(fragment: &Fragment, cell: &BoundingBox) -> Option<Vec<(Octant, Fragment)>> {
    let mut worklist = vec![(Octant::empty(), fragment.clone())];

    for axis in Axis::ALL {
        let plane = Plane::axis_aligned(axis, cell.position);
        let half_extent = cell.half_extent[axis.index()];
        let bit = Octant::for_axis(axis);
        let mut next = Vec::with_capacity(worklist.len() * 2);

        for (mask, piece) in worklist {
            let info = plane.straddle(piece.triangle_vertices());
            match info.side {
                Straddle::Straddling => {
                    let before = piece.triangle_count();
                    let (front, back) = clip(&piece, &plane);
                    if front.triangle_count() > before || back.triangle_count() > before {
                        return None;
                    }
                    if !front.is_empty() {
                        next.push((mask | bit, front));
                    }
                    if !back.is_empty() {
                        next.push((mask, back));
                    }
                }
                side => {
                    if info.min_distance > half_extent {
                        log::trace!(
                            "Discarding {} triangles outside the cell on {:?}",
                            piece.triangle_count(),
                            axis
                        );
                        continue;
                    }
                    let mask = if side == Straddle::AllFront { mask | bit } else { mask };
                    next.push((mask, piece));
                }
            }
        }

        worklist = next;
    }

    let mut grouped: [Option<Fragment>; 8] = Default::default();
    for (mask, piece) in worklist {
        match &mut grouped[mask.index()] {
            Some(existing) => existing.append(&piece),
            empty => *empty = Some(piece),
        }
    }

    Some(
        grouped
            .into_iter()
            .enumerate()
            .filter_map(|(i, piece)| piece.map(|p| (Octant::from_index(i), p)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strip(triangles: usize, origin: Vec3, width: f32) -> Fragment {
        // Row of thin triangles along X starting at `origin`
        let step = width / triangles as f32;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..triangles {
            let x = origin.x + i as f32 * step;
            let base = vertices.len() as u32;
            vertices.push(Vec3::new(x, origin.y, origin.z));
            vertices.push(Vec3::new(x + step, origin.y, origin.z));
            vertices.push(Vec3::new(x, origin.y + 0.5, origin.z + 0.25));
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }
        Fragment::new(vertices, indices).unwrap()
    }

    #[test]
    fn test_small_fragment_becomes_root_leaf() {
        let fragment = strip(10, Vec3::new(-1.0, 0.0, 0.0), 2.0);
        let octree = Octree::create(
            Vec3::zeros(),
            10.0,
            8,
            vec![fragment.clone()],
            &PartitionConfig::default(),
        );

        let root = octree.root();
        assert!(root.is_leaf());
        assert!(root.holds_objects());
        assert_eq!(root.children().count(), 0);
        assert_eq!(root.objects().len(), 1);
        assert_eq!(root.objects()[0].fragment(), &fragment);
        assert_eq!(octree.stats().node_count, 1);
    }

    #[test]
    fn test_child_bounds_tile_parent() {
        let parent = BoundingBox::new(Vec3::new(1.0, -2.0, 3.0), Vec3::new(4.0, 2.0, 6.0));
        let mut volume = 0.0;

        for i in 0..8 {
            let octant = Octant::from_index(i);
            let child = octant.child_bounds(&parent);
            assert_relative_eq!(child.half_extent, parent.half_extent * 0.5);
            for axis in Axis::ALL {
                let a = axis.index();
                let expected = if octant.contains(Octant::for_axis(axis)) {
                    parent.position[a] + parent.half_extent[a] * 0.5
                } else {
                    parent.position[a] - parent.half_extent[a] * 0.5
                };
                assert_relative_eq!(child.position[a], expected);
            }
            let size = child.half_extent * 2.0;
            volume += size.x * size.y * size.z;
        }

        let size = parent.half_extent * 2.0;
        assert_relative_eq!(volume, size.x * size.y * size.z, epsilon = 1e-3);
    }

    #[test]
    fn test_octant_bits() {
        assert_eq!(Octant::from_index(5), Octant::X | Octant::Z);
        assert_eq!((Octant::Y | Octant::Z).index(), 6);
        assert_eq!(Octant::for_axis(Axis::Y), Octant::Y);
    }

    #[test]
    fn test_large_fragment_subdivides() {
        // 64 cubes in a 4x4x4 grid, one per unit cell, none touching a center plane
        let cubes: Vec<Fragment> = (0..64)
            .map(|i| {
                let cell = Vec3::new((i % 4) as f32, ((i / 4) % 4) as f32, (i / 16) as f32);
                Fragment::cuboid(cell * 2.0 - Vec3::new(3.0, 3.0, 3.0), Vec3::new(0.4, 0.4, 0.4))
            })
            .collect();
        let scene = Fragment::merge(&cubes);
        let config = PartitionConfig::default().with_minimum_triangles(100);

        let octree = Octree::create(Vec3::zeros(), 4.0, 4, vec![scene], &config);
        let stats = octree.stats();

        assert_eq!(octree.root().children().count(), 8);
        assert!(octree.root().objects().is_empty());
        assert_eq!(stats.triangle_count, 64 * 12);
        assert_eq!(stats.bail_outs, 0);
        for leaf in octree.leaves() {
            let triangles: usize = leaf.objects().iter().map(PartitionObject::triangle_count).sum();
            assert!(triangles < 100);
            for object in leaf.objects() {
                for v in object.fragment().triangle_vertices() {
                    assert!(leaf.bounds().contains_point(v));
                }
            }
        }
    }

    #[test]
    fn test_children_are_octants_of_parent() {
        let scene = Fragment::merge(&[
            Fragment::cuboid(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(0.5, 0.5, 0.5)),
            Fragment::cuboid(Vec3::new(2.0, 2.0, -2.0), Vec3::new(0.5, 0.5, 0.5)),
            Fragment::cuboid(Vec3::new(2.0, -2.0, 2.0), Vec3::new(0.5, 0.5, 0.5)),
        ]);
        let config = PartitionConfig::default().with_minimum_triangles(20);
        let octree = Octree::create(Vec3::zeros(), 4.0, 2, vec![scene], &config);

        for node in octree.nodes() {
            for (octant, child) in node.children() {
                assert_eq!(child.bounds(), &octant.child_bounds(node.bounds()));
                assert_eq!(child.depth(), node.depth() + 1);
            }
        }
        let occupied: Vec<usize> = octree.root().children().map(|(o, _)| o.index()).collect();
        assert_eq!(occupied, vec![0, 3, 5]);
    }

    #[test]
    fn test_apex_on_plane_splits_without_loss() {
        let triangle = Fragment::new(
            vec![Vec3::new(-1.0, 0.5, 0.5), Vec3::new(1.0, 0.5, 0.5), Vec3::new(0.0, 1.5, 0.5)],
            vec![0, 1, 2],
        )
        .unwrap();
        let config = PartitionConfig::default().with_minimum_triangles(1);

        let octree = Octree::create(Vec3::zeros(), 4.0, 4, vec![triangle], &config);

        // The apex lies on the X plane, so the root split leaves one
        // triangle per side and both halves move down
        let root = octree.root();
        assert!(root.objects().is_empty());
        assert!(root.child(Octant::X | Octant::Y | Octant::Z).is_some());
        assert!(root.child(Octant::Y | Octant::Z).is_some());
        assert!(octree.stats().triangle_count >= 2);
        assert!(octree.objects().iter().all(|o| !o.fragment().is_empty()));
    }

    #[test]
    fn test_quad_producing_clip_stores_original() {
        // Plane x = 0 cuts off one corner, leaving a quad on the front side
        let triangle = Fragment::new(
            vec![Vec3::new(-1.0, 0.5, 0.5), Vec3::new(3.0, 0.5, 0.5), Vec3::new(3.0, 1.5, 0.5)],
            vec![0, 1, 2],
        )
        .unwrap();
        let config = PartitionConfig::default().with_minimum_triangles(1);

        let octree = Octree::create(Vec3::zeros(), 4.0, 4, vec![triangle.clone()], &config);

        let root = octree.root();
        assert_eq!(octree.stats().bail_outs, 1);
        assert!(root.is_leaf());
        assert_eq!(root.objects().len(), 1);
        assert_eq!(root.objects()[0].fragment(), &triangle);
    }

    #[test]
    fn test_geometry_outside_cell_is_discarded() {
        let scene = Fragment::merge(&[
            Fragment::cuboid(Vec3::new(-5.0, -5.0, -5.0), Vec3::new(0.5, 0.5, 0.5)),
            Fragment::cuboid(Vec3::new(100.0, 100.0, 100.0), Vec3::new(0.5, 0.5, 0.5)),
        ]);
        let config = PartitionConfig::default().with_minimum_triangles(13);

        let octree = Octree::create(Vec3::zeros(), 10.0, 4, vec![scene], &config);
        let root = octree.root();

        assert!(root.objects().is_empty());
        assert_eq!(root.children().count(), 1);
        let child = root.child(Octant::empty()).unwrap();
        assert_eq!(child.objects().len(), 1);
        assert_eq!(child.objects()[0].triangle_count(), 12);
        assert_eq!(octree.stats().triangle_count, 12);
    }

    #[test]
    fn test_stop_depth_is_advisory() {
        let cubes: Vec<Fragment> = (0..64)
            .map(|i| {
                let cell = Vec3::new((i % 4) as f32, ((i / 4) % 4) as f32, (i / 16) as f32);
                Fragment::cuboid(cell * 2.0 - Vec3::new(3.0, 3.0, 3.0), Vec3::new(0.4, 0.4, 0.4))
            })
            .collect();
        let config = PartitionConfig::default().with_minimum_triangles(13);

        let octree = Octree::create(Vec3::zeros(), 4.0, 0, vec![Fragment::merge(&cubes)], &config);

        assert_eq!(octree.stop_depth(), 0);
        assert!(octree.stats().max_depth > 0);
    }

    #[test]
    fn test_destroy_leaves_empty_root() {
        let scene = Fragment::merge(&[
            Fragment::cuboid(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(0.5, 0.5, 0.5)),
            Fragment::cuboid(Vec3::new(2.0, 2.0, 2.0), Vec3::new(0.5, 0.5, 0.5)),
        ]);
        let config = PartitionConfig::default().with_minimum_triangles(20);
        let mut octree = Octree::create(Vec3::zeros(), 4.0, 2, vec![scene], &config);
        assert!(octree.stats().node_count > 1);

        octree.destroy();

        let stats = octree.stats();
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.object_count, 0);
        assert!(!octree.root().holds_objects());
        assert_eq!(octree.bounds(), &BoundingBox::cube(Vec3::zeros(), 4.0));
    }

    #[test]
    fn test_depth_colors_cycle() {
        assert_eq!(depth_color(0), depth_color(DEPTH_PALETTE.len() as u32));
        assert_ne!(depth_color(0), depth_color(1));
    }
}
