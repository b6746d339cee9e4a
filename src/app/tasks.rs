use crate::adapters::loaders::RpcDemoLoader;
use crate::adapters::process::TokioCommandRunner;
use crate::adapters::rpc::RpcClient;
use crate::adapters::session::Session;
use crate::config::trytond_config::TrytondConfig;
use crate::config::{parse_server_url, ConnectionSettings, DemoSettings};
use crate::core::fixtures::{FixtureContext, FixturePlan, FixtureSequence, StepResult};
use crate::core::installer::{install_modules, parse_module_list};
use crate::core::lifecycle;
use crate::core::InstallReport;
use crate::utils::error::Result;
use crate::utils::validation::{validate_database_name, Validate};
use chrono::Local;
use std::path::{Path, PathBuf};

/// `install` 命令的參數
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub database: String,
    pub password: String,
    pub modules: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub report: InstallReport,
    pub steps: Vec<StepResult>,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<TrytondConfig> {
    let config = TrytondConfig::from_file(path)?;
    config.validate()?;
    Ok(config)
}

pub async fn create(
    config: &TrytondConfig,
    database: &str,
    language: &str,
    password: &str,
) -> Result<()> {
    validate_database_name("database", database)?;
    let client = RpcClient::new(parse_server_url(config.jsonrpc_url())?, config.timeout())?;
    lifecycle::create_database(&client, database, language, password).await
}

pub async fn install(config: &TrytondConfig, options: &InstallOptions) -> Result<InstallOutcome> {
    let settings = ConnectionSettings::new(config, &options.database, &options.password)?;
    let session = Session::connect(&settings).await?;
    let language = session.language()?;

    let modules = parse_module_list(&options.modules);
    println!("Modules to install: {}", modules.join(", "));

    let report = install_modules(&session, &session, &modules).await?;

    let today = Local::now().date_naive();
    let demo = DemoSettings::from_config(config);
    let context =
        FixtureContext::new(&report, &language, today).with_company_name(&demo.company_name);
    let plan = FixturePlan::standard()
        .with_extensions(config.extensions().iter().cloned())
        .with_extensions(options.extensions.iter().cloned());
    let loader = RpcDemoLoader::new(&session, demo, today).with_installed(&report.installed);

    let steps = FixtureSequence::new(plan)
        .execute_all(&context, &loader)
        .await?;
    tracing::debug!(
        "📊 Fixture summary: {:?}",
        FixtureSequence::get_execution_summary(&steps)
    );

    Ok(InstallOutcome { report, steps })
}

pub async fn dump(config: &TrytondConfig, database: &str) -> Result<PathBuf> {
    validate_database_name("database", database)?;
    let username = config.database_username()?;
    println!("Dump PSQL database: {}", database);
    lifecycle::dump_database(&TokioCommandRunner, database, username.as_deref()).await
}

pub async fn dropdb(config: &TrytondConfig, database: &str) -> Result<()> {
    validate_database_name("database", database)?;
    let username = config.database_username()?;
    println!("Drop PSQL database: {}", database);
    lifecycle::drop_database(&TokioCommandRunner, database, username.as_deref()).await
}
