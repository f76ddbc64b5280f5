//! Tunables shared by the octree and BSP builders and the collision query

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Partitioning and collision tunables
///
/// Every builder takes one of these explicitly; there is no process-wide
/// state. Missing fields in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Fragments with fewer triangles than this are stored as leaves
    pub minimum_triangles: u32,

    /// Weight of straddling triangles versus front/back balance when
    /// scoring BSP splitting planes, in `[0, 1]`
    pub split_blend: f32,

    /// Candidate planes sampled per BSP split
    pub plane_samples: u32,

    /// Seed for BSP plane sampling; `None` draws from OS entropy
    pub bsp_seed: Option<u64>,

    /// GJK iterations before a query is reported as separated
    pub max_gjk_iterations: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            minimum_triangles: 500,
            split_blend: 0.8,
            plane_samples: 5,
            bsp_seed: None,
            max_gjk_iterations: 64,
        }
    }
}

impl Config for PartitionConfig {}

impl PartitionConfig {
    /// Builder-style override of the triangle floor
    pub fn with_minimum_triangles(mut self, minimum_triangles: u32) -> Self {
        self.minimum_triangles = minimum_triangles;
        self
    }

    /// Builder-style override of the BSP seed
    pub fn with_bsp_seed(mut self, seed: u64) -> Self {
        self.bsp_seed = Some(seed);
        self
    }

    /// Reject values the builders cannot terminate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_triangles == 0 {
            return Err(ConfigError::Invalid(
                "minimum_triangles must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.split_blend) {
            return Err(ConfigError::Invalid(format!(
                "split_blend must be within [0, 1], got {}",
                self.split_blend
            )));
        }
        if self.plane_samples == 0 {
            return Err(ConfigError::Invalid(
                "plane_samples must be at least 1".to_string(),
            ));
        }
        if self.max_gjk_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_gjk_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
