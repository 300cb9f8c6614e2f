pub mod config;
pub mod logging;

pub use config::{DashboardConfig, ENV_API_KEY, ENV_RPC_URL};
pub use logging::{DEFAULT_FILTER, filter_directives, init_logging, init_logging_to_dir};
