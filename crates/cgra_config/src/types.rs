//! Configuration schema for `place.toml`.

use serde::{Deserialize, Serialize};

/// The root placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceConfig {
    /// Whether a PE and a register may share a cell.
    #[serde(default = "default_fold_reg")]
    pub fold_reg: bool,
    /// Annealing schedule parameters.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Cluster-placer knobs.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Annealer seeding and parallelism.
    #[serde(default)]
    pub anneal: AnnealConfig,
}

fn default_fold_reg() -> bool {
    true
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            fold_reg: default_fold_reg(),
            schedule: ScheduleConfig::default(),
            cluster: ClusterConfig::default(),
            anneal: AnnealConfig::default(),
        }
    }
}

/// Cooling-schedule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Initial temperature.
    #[serde(default = "default_t_max")]
    pub t_max: f64,
    /// Final temperature.
    #[serde(default = "default_t_min")]
    pub t_min: f64,
    /// Number of annealing iterations.
    #[serde(default = "default_steps")]
    pub steps: usize,
}

fn default_t_max() -> f64 {
    25_000.0
}

fn default_t_min() -> f64 {
    2.5
}

fn default_steps() -> usize {
    50_000
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            t_max: default_t_max(),
            t_min: default_t_min(),
            steps: default_steps(),
        }
    }
}

/// Cluster-placer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    /// Allowed coarse overlap is `cluster_size / place_factor` cells.
    #[serde(default = "default_place_factor")]
    pub place_factor: usize,
    /// Number of center-squeeze sweeps after de-overlap.
    #[serde(default = "default_squeeze_iter")]
    pub squeeze_iter: usize,
}

fn default_place_factor() -> usize {
    6
}

fn default_squeeze_iter() -> usize {
    5
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            place_factor: default_place_factor(),
            squeeze_iter: default_squeeze_iter(),
        }
    }
}

/// Annealer seeding and parallelism.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnealConfig {
    /// RNG seed shared by both placement levels.
    #[serde(default)]
    pub seed: u64,
    /// Number of independent annealing chains.
    #[serde(default = "default_chains")]
    pub chains: usize,
}

fn default_chains() -> usize {
    1
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chains: default_chains(),
        }
    }
}
