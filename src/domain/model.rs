use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// `ir.module` 的安裝狀態
///
/// Only the `installed`/`to install` vocabulary is understood; it matches the
/// `install`/`upgrade` buttons and the `ir.module.install_upgrade` wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleState {
    #[serde(rename = "uninstalled")]
    NotInstalled,
    #[serde(rename = "to install")]
    ToInstall,
    #[serde(rename = "installed")]
    Installed,
    #[serde(rename = "to upgrade")]
    ToUpgrade,
    #[serde(rename = "to remove")]
    ToRemove,
}

impl ModuleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInstalled => "uninstalled",
            Self::ToInstall => "to install",
            Self::Installed => "installed",
            Self::ToUpgrade => "to upgrade",
            Self::ToRemove => "to remove",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: i64,
    pub name: String,
    pub state: ModuleState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardItemState {
    Open,
    Done,
}

/// `ir.module.config_wizard.item`: 安裝後的互動設定精靈項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWizardItem {
    pub id: i64,
    pub state: WizardItemState,
}

/// 一次 install 執行的結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Requested modules that were in `to install` state before the upgrade
    /// wizard ran. Modules already installed before this run are not listed.
    pub to_install: Vec<String>,
    /// Every module in `installed` state after the run.
    pub installed: Vec<String>,
    /// Modules the server scheduled as dependencies without being requested.
    pub dependencies: Vec<String>,
}

impl InstallReport {
    pub fn transitioned(&self, module: &str) -> bool {
        self.to_install.iter().any(|m| m == module)
    }

    pub fn is_installed(&self, module: &str) -> bool {
        self.installed.iter().any(|m| m == module)
    }
}

/// 會計科目表範本 (`ir.model.data` 的 module + fs_id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSelection {
    pub module: String,
    pub fs_id: String,
}

impl ChartSelection {
    pub fn select(to_install: &[String], language: &str) -> Self {
        let has = |name: &str| to_install.iter().any(|m| m == name);

        if has("account_es_pyme") {
            Self {
                module: "account_es_pyme".to_string(),
                fs_id: "es_pyme".to_string(),
            }
        } else if has("account_es") {
            Self {
                module: "account_es".to_string(),
                fs_id: "es".to_string(),
            }
        } else {
            let prefix: String = language.chars().take(2).collect();
            Self {
                module: "account".to_string(),
                fs_id: format!("account_template_root_{}", prefix),
            }
        }
    }
}

/// 待執行的外部命令，stdout 可導向檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdout_path: Option<PathBuf>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_path: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(path) = &self.stdout_path {
            write!(f, " > {}", path.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stderr: String,
}
