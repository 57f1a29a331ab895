//! Configuration loading for the CGRA placement toolchain.
//!
//! A `place.toml` file tunes the annealing schedule and placer knobs.
//! Every field has a default, so an empty file (or no file at all) yields
//! a fully usable configuration.
//!
//! ```
//! use cgra_config::load_config_from_str;
//!
//! let config = load_config_from_str(
//!     r#"
//! fold_reg = true
//!
//! [schedule]
//! steps = 10000
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.schedule.steps, 10_000);
//! assert_eq!(config.cluster.place_factor, 6);
//! ```

#![warn(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{AnnealConfig, ClusterConfig, PlaceConfig, ScheduleConfig};
