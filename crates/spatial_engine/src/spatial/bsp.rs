//! Binary space partitioning over scene fragments
//!
//! Each large fragment picks its own splitting plane from a handful of
//! random candidates, each the perpendicular bisector of two of its
//! vertices. Front pieces build the left subtree, back pieces the right.
//! Nodes live in a slotmap arena owned by the tree.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::{new_key_type, SlotMap};

use super::object::PartitionObject;
use super::stats::TreeStats;
use crate::config::PartitionConfig;
use crate::geometry::{clip, BoundingBox, Fragment, Plane, Straddle};

new_key_type! {
    /// Handle of a node in a [`BspTree`] arena
    pub struct BspNodeKey;
}

/// Draws allowed per requested candidate plane before giving up
const ATTEMPTS_PER_SAMPLE: u32 = 4;

/// Node in the BSP arena
#[derive(Debug)]
pub struct BspNode {
    left: Option<BspNodeKey>,
    right: Option<BspNodeKey>,
    objects: Vec<PartitionObject>,
    bounds: Option<BoundingBox>,
    depth: u32,
}

impl BspNode {
    /// Subtree built from front pieces
    pub fn left(&self) -> Option<BspNodeKey> {
        self.left
    }

    /// Subtree built from back pieces
    pub fn right(&self) -> Option<BspNodeKey> {
        self.right
    }

    /// Objects stored on this node
    pub fn objects(&self) -> &[PartitionObject] {
        &self.objects
    }

    /// Union of every object box in this subtree
    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.bounds.as_ref()
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// True when the node has neither subtree
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn children(&self) -> impl Iterator<Item = BspNodeKey> {
        [self.left, self.right].into_iter().flatten()
    }
}

/// BSP tree over static scene geometry
#[derive(Debug)]
pub struct BspTree {
    nodes: SlotMap<BspNodeKey, BspNode>,
    root: Option<BspNodeKey>,
    depth: u32,
    config: PartitionConfig,
    bail_outs: usize,
}

impl BspTree {
    /// Build a tree from world-space fragments
    ///
    /// `depth` is recorded as a hint only. Plane sampling is seeded from
    /// `config.bsp_seed` when set, so seeded builds are reproducible.
    pub fn build<I>(fragments: I, depth: u32, config: &PartitionConfig) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let rng = match config.bsp_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut builder = BspBuilder {
            nodes: SlotMap::with_key(),
            rng,
            minimum_triangles: config.minimum_triangles as usize,
            split_blend: config.split_blend,
            plane_samples: config.plane_samples,
            bail_outs: 0,
        };

        let fragments: Vec<Fragment> = fragments.into_iter().filter(|f| !f.is_empty()).collect();
        let root = (!fragments.is_empty()).then(|| builder.build_node(fragments, 0));

        let tree = Self {
            nodes: builder.nodes,
            root,
            depth,
            config: config.clone(),
            bail_outs: builder.bail_outs,
        };

        let stats = tree.stats();
        log::info!("BSP built: {}", stats);
        if stats.max_depth > depth {
            log::debug!("BSP depth {} exceeds requested depth {}", stats.max_depth, depth);
        }

        tree
    }

    /// Root node, absent for an empty scene
    pub fn root(&self) -> Option<&BspNode> {
        self.root.and_then(|key| self.nodes.get(key))
    }

    /// Key of the root node
    pub fn root_key(&self) -> Option<BspNodeKey> {
        self.root
    }

    /// Look up a node by key
    pub fn node(&self, key: BspNodeKey) -> Option<&BspNode> {
        self.nodes.get(key)
    }

    /// Requested depth hint
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Tunables this tree was built with
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// All nodes, parents before children, left before right
    pub fn nodes(&self) -> Vec<&BspNode> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<BspNodeKey> = self.root.into_iter().collect();
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get(key) {
                nodes.push(node);
                stack.extend(node.right);
                stack.extend(node.left);
            }
        }
        nodes
    }

    /// Nodes without subtrees
    pub fn leaves(&self) -> Vec<&BspNode> {
        self.nodes().into_iter().filter(|node| node.is_leaf()).collect()
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
        for node in self.nodes() {
            stats.node_count += 1;
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
            stats.object_count += node.objects.len();
            stats.triangle_count += node.objects.iter().map(PartitionObject::triangle_count).sum::<usize>();
            stats.max_depth = stats.max_depth.max(node.depth);
        }
        stats
    }

    /// Remove every node, children before parents
    pub fn destroy(&mut self) {
        let removed = match self.root.take() {
            Some(root) => self.destroy_node(root),
            None => 0,
        };
        self.bail_outs = 0;
        log::debug!("BSP destroyed: {} nodes removed", removed);
    }

    fn destroy_node(&mut self, key: BspNodeKey) -> usize {
        let children: Vec<BspNodeKey> = match self.nodes.get(key) {
            Some(node) => node.children().collect(),
            None => return 0,
        };
        let removed: usize = children.into_iter().map(|child| self.destroy_node(child)).sum();
        self.nodes.remove(key);
        removed + 1
    }
}

/// Recursive build state
struct BspBuilder {
    nodes: SlotMap<BspNodeKey, BspNode>,
    rng: StdRng,
    minimum_triangles: usize,
    split_blend: f32,
    plane_samples: u32,
    bail_outs: usize,
}

impl BspBuilder {
    fn build_node(&mut self, fragments: Vec<Fragment>, depth: u32) -> BspNodeKey {
        let mut objects = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut split_any = false;

        for fragment in fragments {
            let before = fragment.triangle_count();
            if before < self.minimum_triangles {
                objects.push(PartitionObject::new(fragment));
                continue;
            }

            let Some(plane) = self.find_splitting_plane(&fragment) else {
                log::debug!("BSP: no usable splitting plane for {} triangles, storing as leaf", before);
                objects.push(PartitionObject::new(fragment));
                continue;
            };

            // Anything not straddling goes front, whichever side it is on
            if plane.straddle(fragment.triangle_vertices()).side != Straddle::Straddling {
                front.push(fragment);
                continue;
            }

            let (front_piece, back_piece) = clip(&fragment, &plane);
            if front_piece.triangle_count() >= before || back_piece.triangle_count() >= before {
                self.bail_outs += 1;
                log::debug!(
                    "BSP bail-out at depth {}: split of {} triangles gave {} / {}",
                    depth,
                    before,
                    front_piece.triangle_count(),
                    back_piece.triangle_count()
                );
                objects.push(PartitionObject::new(fragment));
                continue;
            }

            split_any = true;
            if !front_piece.is_empty() {
                front.push(front_piece);
            }
            if !back_piece.is_empty() {
                back.push(back_piece);
            }
        }

        if !split_any && back.is_empty() && !front.is_empty() {
            log::debug!(
                "BSP: {} fragments passed through unsplit at depth {}, storing as leaves",
                front.len(),
                depth
            );
            objects.extend(front.drain(..).map(PartitionObject::new));
        }

        let left = (!front.is_empty()).then(|| self.build_node(front, depth + 1));
        let right = (!back.is_empty()).then(|| self.build_node(back, depth + 1));

        let mut bounds = objects
            .iter()
            .map(|object: &PartitionObject| *object.bounds())
            .reduce(|a, b| a.union(&b));
        for child in [left, right].into_iter().flatten() {
            if let Some(child_bounds) = self.nodes.get(child).and_then(|node| node.bounds) {
                bounds = Some(match bounds {
                    Some(b) => b.union(&child_bounds),
                    None => child_bounds,
                });
            }
        }

        self.nodes.insert(BspNode {
            left,
            right,
            objects,
            bounds,
            depth,
        })
    }

    /// Best of `plane_samples` random bisector planes, lowest score wins
    fn find_splitting_plane(&mut self, fragment: &Fragment) -> Option<Plane> {
        let indices = fragment.indices();
        let vertices = fragment.vertices();
        if indices.is_empty() {
            return None;
        }

        let mut best: Option<(f32, Plane)> = None;
        let mut accepted = 0;
        let mut attempts = 0;

        while accepted < self.plane_samples && attempts < self.plane_samples * ATTEMPTS_PER_SAMPLE {
            attempts += 1;
            let a = vertices[indices[self.rng.gen_range(0..indices.len())] as usize];
            let b = vertices[indices[self.rng.gen_range(0..indices.len())] as usize];
            let Some(plane) = Plane::between_points(a, b) else {
                continue;
            };
            accepted += 1;

            let score = score_plane(fragment, &plane, self.split_blend);
            if best.map_or(true, |(best_score, _)| score < best_score) {
                best = Some((score, plane));
            }
        }

        best.map(|(_, plane)| plane)
    }
}

/// `blend * straddling + (1 - blend) * |front - back|` over whole triangles
fn score_plane(fragment: &Fragment, plane: &Plane, blend: f32) -> f32 {
    let mut front = 0i64;
    let mut back = 0i64;
    let mut straddling = 0i64;

    for triangle in fragment.triangles() {
        match plane.straddle(&triangle).side {
            Straddle::AllFront => front += 1,
            Straddle::AllBack => back += 1,
            Straddle::Straddling => straddling += 1,
        }
    }

    blend * straddling as f32 + (1.0 - blend) * (front - back).abs() as f32
}
