//! In-memory stand-ins for the remote server used by unit tests.

use crate::domain::model::{
    ChartSelection, CommandOutput, ConfigWizardItem, Module, ModuleState, ShellCommand,
    WizardItemState,
};
use crate::domain::ports::{
    CommandRunner, ConfigWizardItems, DatabaseAdmin, DemoLoader, ModuleRepository,
};
use crate::utils::error::{Result, TaskError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct ServerState {
    modules: Vec<Module>,
    depends: HashMap<String, Vec<String>>,
    wizard_items: Vec<ConfigWizardItem>,
    upgraded: Vec<String>,
    wizard_runs: usize,
}

#[derive(Default)]
pub struct FakeServer {
    state: Mutex<ServerState>,
}

impl FakeServer {
    pub fn with_modules(names: &[&str]) -> Self {
        let modules = names
            .iter()
            .enumerate()
            .map(|(i, name)| Module {
                id: i as i64 + 1,
                name: name.to_string(),
                state: ModuleState::NotInstalled,
            })
            .collect();
        let wizard_items = (1..=2)
            .map(|id| ConfigWizardItem {
                id,
                state: WizardItemState::Open,
            })
            .collect();
        Self {
            state: Mutex::new(ServerState {
                modules,
                wizard_items,
                ..ServerState::default()
            }),
        }
    }

    pub fn installed(self, names: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for module in state.modules.iter_mut() {
                if names.contains(&module.name.as_str()) {
                    module.state = ModuleState::Installed;
                }
            }
        }
        self
    }

    pub fn depends(self, module: &str, deps: &[&str]) -> Self {
        self.state.lock().unwrap().depends.insert(
            module.to_string(),
            deps.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    pub fn upgraded(&self) -> Vec<String> {
        self.state.lock().unwrap().upgraded.clone()
    }

    pub fn wizard_runs(&self) -> usize {
        self.state.lock().unwrap().wizard_runs
    }

    pub fn pending_wizard_items(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .wizard_items
            .iter()
            .filter(|i| i.state != WizardItemState::Done)
            .count()
    }
}

fn mark_to_install(state: &mut ServerState, name: &str) {
    let deps = state.depends.get(name).cloned().unwrap_or_default();
    if let Some(module) = state.modules.iter_mut().find(|m| m.name == name) {
        if module.state == ModuleState::NotInstalled {
            module.state = ModuleState::ToInstall;
        }
    }
    for dep in deps {
        mark_to_install(state, &dep);
    }
}

#[async_trait]
impl ModuleRepository for FakeServer {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Module>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .modules
            .iter()
            .filter(|m| names.contains(&m.name))
            .cloned()
            .collect())
    }

    async fn find_by_state(&self, wanted: ModuleState) -> Result<Vec<Module>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .modules
            .iter()
            .filter(|m| m.state == wanted)
            .cloned()
            .collect())
    }

    async fn request_install(&self, ids: &[i64]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let names: Vec<String> = state
            .modules
            .iter()
            .filter(|m| ids.contains(&m.id))
            .map(|m| m.name.clone())
            .collect();
        for name in names {
            mark_to_install(&mut state, &name);
        }
        Ok(())
    }

    async fn request_upgrade(&self, ids: &[i64]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let mut upgraded = Vec::new();
        for module in state.modules.iter_mut().filter(|m| ids.contains(&m.id)) {
            module.state = ModuleState::ToUpgrade;
            upgraded.push(module.name.clone());
        }
        state.upgraded.extend(upgraded);
        Ok(())
    }

    async fn apply_pending(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for module in state.modules.iter_mut() {
            if matches!(module.state, ModuleState::ToInstall | ModuleState::ToUpgrade) {
                module.state = ModuleState::Installed;
            }
        }
        state.wizard_runs += 1;
        Ok(())
    }
}

#[async_trait]
impl ConfigWizardItems for FakeServer {
    async fn find_pending(&self) -> Result<Vec<ConfigWizardItem>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .wizard_items
            .iter()
            .filter(|i| i.state != WizardItemState::Done)
            .cloned()
            .collect())
    }

    async fn mark_done(&self, ids: &[i64]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        for item in state.wizard_items.iter_mut().filter(|i| ids.contains(&i.id)) {
            item.state = WizardItemState::Done;
        }
        Ok(())
    }
}

/// Records every loader call so tests can check ordering.
#[derive(Default)]
pub struct RecordingLoader {
    calls: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl RecordingLoader {
    pub fn failing_on(call: &'static str) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    fn record(&self, call: String) -> Result<()> {
        if self.fail_on.is_some_and(|f| call.starts_with(f)) {
            return Err(TaskError::remote(call, "simulated failure"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl DemoLoader for RecordingLoader {
    async fn load_banks(&self) -> Result<()> {
        self.record("load_banks".into())
    }
    async fn load_subdivisions(&self) -> Result<()> {
        self.record("load_subdivisions".into())
    }
    async fn create_company(&self, name: &str) -> Result<()> {
        self.record(format!("create_company({})", name))
    }
    async fn create_fiscal_year(&self, year: i32) -> Result<()> {
        self.record(format!("create_fiscal_year({})", year))
    }
    async fn create_payment_terms(&self) -> Result<()> {
        self.record("create_payment_terms".into())
    }
    async fn create_account_chart(&self, chart: &ChartSelection) -> Result<()> {
        self.record(format!("create_account_chart({}/{})", chart.module, chart.fs_id))
    }
    async fn create_taxes(&self) -> Result<()> {
        self.record("create_taxes".into())
    }
    async fn create_payment_types(&self) -> Result<()> {
        self.record("create_payment_types".into())
    }
    async fn create_parties(&self) -> Result<()> {
        self.record("create_parties".into())
    }
    async fn create_product_categories(&self) -> Result<()> {
        self.record("create_product_categories".into())
    }
    async fn create_products(&self) -> Result<()> {
        self.record("create_products".into())
    }
    async fn create_price_lists(&self) -> Result<()> {
        self.record("create_price_lists".into())
    }
    async fn create_sales(&self) -> Result<()> {
        self.record("create_sales".into())
    }
    async fn process_sales(&self) -> Result<()> {
        self.record("process_sales".into())
    }
    async fn create_opportunities(&self) -> Result<()> {
        self.record("create_opportunities".into())
    }
    async fn process_opportunities(&self) -> Result<()> {
        self.record("process_opportunities".into())
    }
    async fn create_purchases(&self) -> Result<()> {
        self.record("create_purchases".into())
    }
    async fn process_purchases(&self) -> Result<()> {
        self.record("process_purchases".into())
    }
    async fn create_boms(&self) -> Result<()> {
        self.record("create_boms".into())
    }
    async fn create_production_requests(&self) -> Result<()> {
        self.record("create_production_requests".into())
    }
    async fn create_inventory(&self) -> Result<()> {
        self.record("create_inventory".into())
    }
    async fn process_customer_shipments(&self) -> Result<()> {
        self.record("process_customer_shipments".into())
    }
    async fn process_supplier_shipments(&self) -> Result<()> {
        self.record("process_supplier_shipments".into())
    }
    async fn process_customer_invoices(&self) -> Result<()> {
        self.record("process_customer_invoices".into())
    }
}

#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<ShellCommand>>,
    exit_code: Option<i32>,
}

impl RecordingRunner {
    pub fn exiting_with(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(CommandOutput {
            code: Some(self.exit_code.unwrap_or(0)),
            stderr: String::new(),
        })
    }
}

#[derive(Default)]
pub struct RecordingAdmin {
    pub created: Mutex<Vec<(String, String, String, String)>>,
}

#[async_trait]
impl DatabaseAdmin for RecordingAdmin {
    async fn create_database(
        &self,
        database: &str,
        password: &str,
        language: &str,
        admin_password: &str,
    ) -> Result<()> {
        self.created.lock().unwrap().push((
            database.to_string(),
            password.to_string(),
            language.to_string(),
            admin_password.to_string(),
        ));
        Ok(())
    }
}
