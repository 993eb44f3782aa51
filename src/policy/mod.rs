//! Engine configuration and precedence policy.

pub mod config;
pub mod precedence;

pub use config::{AssayConfig, ConfigError, Viewport};
pub use precedence::{
    apply_rules, standard_rules, PartitionScope, PrecedenceRule, RecordSelector, RATING_CATEGORY,
};
