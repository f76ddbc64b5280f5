//! Partition tree debug views
//!
//! Read-only snapshots of a built tree for an external renderer: cell boxes
//! with colors, and stored fragments with their collision state. Nothing
//! here draws; [`CellInstance`] is laid out for direct upload as instance
//! data.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;
use crate::geometry::{BoundingBox, Fragment};
use crate::physics::PartitionTree;

/// One tree cell to outline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    /// Cell box
    pub bounds: BoundingBox,
    /// RGB color
    pub color: Vec3,
    /// Tree depth of the cell (root = 0)
    pub depth: u32,
    /// Whether the cell has no children
    pub is_leaf: bool,
}

/// One stored fragment to draw
#[derive(Debug, Clone, Copy)]
pub struct ObjectView<'a> {
    /// Stored geometry
    pub fragment: &'a Fragment,
    /// Cached object bounds
    pub bounds: BoundingBox,
    /// Colliding flag at snapshot time
    pub is_colliding: bool,
}

/// GPU instance record for a cell outline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CellInstance {
    /// Box center
    pub center: [f32; 3],
    /// Box half extent
    pub half_extent: [f32; 3],
    /// RGB color
    pub color: [f32; 3],
}

impl From<&CellView> for CellInstance {
    fn from(cell: &CellView) -> Self {
        Self {
            center: cell.bounds.position.into(),
            half_extent: cell.bounds.half_extent.into(),
            color: cell.color.into(),
        }
    }
}

/// Color scheme for partition visualization
#[derive(Clone, Debug)]
pub struct PartitionDebugColors {
    /// Color for objects that are not colliding
    pub object_default: Vec3,

    /// Color for objects flagged by the last query
    pub object_colliding: Vec3,

    /// Overrides the per-depth cell colors when set
    pub cell_override: Option<Vec3>,
}

impl Default for PartitionDebugColors {
    fn default() -> Self {
        Self {
            object_default: Vec3::new(0.0, 1.0, 0.0),   // Green
            object_colliding: Vec3::new(1.0, 0.0, 0.0), // Red
            cell_override: None,
        }
    }
}

/// Filters and colors tree snapshots for display
pub struct PartitionDebugVisualizer {
    colors: PartitionDebugColors,

    /// Master switch; when off every query returns nothing
    pub enabled: bool,

    /// Show only cells without children
    pub leaves_only: bool,

    /// Include stored objects
    pub show_objects: bool,
}

impl PartitionDebugVisualizer {
    /// Create a visualizer showing leaf cells and objects
    pub fn new() -> Self {
        Self {
            colors: PartitionDebugColors::default(),
            enabled: true,
            leaves_only: true,
            show_objects: true,
        }
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: PartitionDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Current color scheme
    pub fn colors(&self) -> &PartitionDebugColors {
        &self.colors
    }

    /// Cells to outline, after filtering and recoloring
    pub fn cells<T: PartitionTree + ?Sized>(&self, tree: &T) -> Vec<CellView> {
        if !self.enabled {
            return Vec::new();
        }
        tree.cells()
            .into_iter()
            .filter(|cell| !self.leaves_only || cell.is_leaf)
            .map(|mut cell| {
                if let Some(color) = self.colors.cell_override {
                    cell.color = color;
                }
                cell
            })
            .collect()
    }

    /// Cells packed for an instance buffer
    pub fn cell_instances<T: PartitionTree + ?Sized>(&self, tree: &T) -> Vec<CellInstance> {
        self.cells(tree).iter().map(CellInstance::from).collect()
    }

    /// Stored objects with their collision state
    pub fn objects<'a, T: PartitionTree + ?Sized>(&self, tree: &'a T) -> Vec<ObjectView<'a>> {
        if !self.enabled || !self.show_objects {
            return Vec::new();
        }
        tree.objects()
            .into_iter()
            .map(|object| ObjectView {
                fragment: object.fragment(),
                bounds: *object.bounds(),
                is_colliding: object.is_colliding(),
            })
            .collect()
    }

    /// Display color for an object view
    pub fn object_color(&self, object: &ObjectView<'_>) -> Vec3 {
        if object.is_colliding {
            self.colors.object_colliding
        } else {
            self.colors.object_default
        }
    }
}

impl Default for PartitionDebugVisualizer {
    fn default() -> Self {
        Self::new()
    }
}
