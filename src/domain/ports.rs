use crate::domain::model::{
    ChartSelection, CommandOutput, ConfigWizardItem, Module, ModuleState, ShellCommand,
};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Module>>;
    async fn find_by_state(&self, state: ModuleState) -> Result<Vec<Module>>;
    async fn request_install(&self, ids: &[i64]) -> Result<()>;
    async fn request_upgrade(&self, ids: &[i64]) -> Result<()>;
    /// Runs the server's install/upgrade wizard for every pending module.
    async fn apply_pending(&self) -> Result<()>;
}

#[async_trait]
pub trait ConfigWizardItems: Send + Sync {
    async fn find_pending(&self) -> Result<Vec<ConfigWizardItem>>;
    async fn mark_done(&self, ids: &[i64]) -> Result<()>;
}

#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    async fn create_database(
        &self,
        database: &str,
        password: &str,
        language: &str,
        admin_password: &str,
    ) -> Result<()>;
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput>;
}

/// Demo-data loaders called by the fixture steps.
#[async_trait]
pub trait DemoLoader: Send + Sync {
    async fn load_banks(&self) -> Result<()>;
    async fn load_subdivisions(&self) -> Result<()>;

    async fn create_company(&self, name: &str) -> Result<()>;
    async fn create_fiscal_year(&self, year: i32) -> Result<()>;
    async fn create_payment_terms(&self) -> Result<()>;
    async fn create_account_chart(&self, chart: &ChartSelection) -> Result<()>;
    async fn create_taxes(&self) -> Result<()>;
    async fn create_payment_types(&self) -> Result<()>;

    async fn create_parties(&self) -> Result<()>;
    async fn create_product_categories(&self) -> Result<()>;
    async fn create_products(&self) -> Result<()>;
    async fn create_price_lists(&self) -> Result<()>;

    async fn create_sales(&self) -> Result<()>;
    async fn process_sales(&self) -> Result<()>;
    async fn create_opportunities(&self) -> Result<()>;
    async fn process_opportunities(&self) -> Result<()>;

    async fn create_purchases(&self) -> Result<()>;
    async fn process_purchases(&self) -> Result<()>;
    async fn create_boms(&self) -> Result<()>;
    async fn create_production_requests(&self) -> Result<()>;
    async fn create_inventory(&self) -> Result<()>;
    async fn process_customer_shipments(&self) -> Result<()>;
    async fn process_supplier_shipments(&self) -> Result<()>;

    async fn process_customer_invoices(&self) -> Result<()>;
}
