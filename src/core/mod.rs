pub mod fixtures;
pub mod installer;
pub mod lifecycle;
#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{
    ChartSelection, CommandOutput, ConfigWizardItem, InstallReport, Module, ModuleState,
    ShellCommand,
};
pub use crate::domain::ports::{
    CommandRunner, ConfigWizardItems, DatabaseAdmin, DemoLoader, ModuleRepository,
};
pub use crate::utils::error::{Result, TaskError};
