pub mod config;
pub mod constants;
pub mod organs;

pub use config::{
    ConfigError, DosePolicy, EngineConfig, ReportLayout, load_engine_config,
};
pub use organs::{OrganAlphaBeta, alpha_beta_for_organ, default_organ_table};
