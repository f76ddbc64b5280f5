//! Demo settings loaded from TOML or RON

use serde::{Deserialize, Serialize};
use spatial_engine::config::{Config, ConfigError, PartitionConfig};

/// Procedural scene of scattered axis-aligned cubes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub cube_count: usize,
    /// Side length of the cubic region the cubes are scattered in
    pub region: f32,
    pub cube_half_extent: f32,
    pub seed: u64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            cube_count: 2000,
            region: 20.0,
            cube_half_extent: 0.5,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeSettings {
    pub position: [f32; 3],
    pub half_extent: f32,
    pub stop_depth: u32,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            half_extent: 10.0,
            stop_depth: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BspSettings {
    pub depth: u32,
}

impl Default for BspSettings {
    fn default() -> Self {
        Self { depth: 12 }
    }
}

/// Random query boxes thrown at both trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub count: usize,
    pub half_extent: f32,
    pub seed: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            count: 200,
            half_extent: 0.5,
            seed: 2,
        }
    }
}

/// Everything the demo reads from its config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub scene: SceneSettings,
    pub octree: OctreeSettings,
    pub bsp: BspSettings,
    pub queries: QuerySettings,
    pub partition: PartitionConfig,
}

impl Config for DemoConfig {}

impl DemoConfig {
    /// Check the nested tunables and the scene dimensions
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.partition.validate()?;
        if self.scene.region <= 2.0 * self.scene.cube_half_extent {
            return Err(ConfigError::Invalid(format!(
                "scene region {} cannot hold cubes of half extent {}",
                self.scene.region, self.scene.cube_half_extent
            )));
        }
        if self.octree.half_extent <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "octree half_extent must be positive, got {}",
                self.octree.half_extent
            )));
        }
        Ok(())
    }
}
