//! Headless token dashboard: session state over the wallet components,
//! plus the wiring the `tronmint` binary uses to build a provider from the
//! configuration file.

pub mod dashboard;
pub mod setup;

pub use dashboard::{Dashboard, DashboardError, DashboardState, TokenForm};
pub use setup::DashboardSettings;
