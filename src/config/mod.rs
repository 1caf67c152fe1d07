pub mod advisor_config;
pub mod engine_config;
pub mod source_config;

pub use advisor_config::AdvisorConfig;
pub use engine_config::*;
pub use source_config::*;
