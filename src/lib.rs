pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

pub use adapters::session::Session;
pub use config::{trytond_config::TrytondConfig, ConnectionSettings, DemoSettings};
pub use core::fixtures::{FixturePlan, FixtureSequence};
pub use core::installer::install_modules;
pub use domain::model::InstallReport;
pub use utils::error::{Result, TaskError};
