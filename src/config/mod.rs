#[cfg(feature = "cli")]
pub mod cli;
pub mod trytond_config;

use crate::utils::error::{Result, TaskError};
use crate::utils::validation::{self, Validate};
use std::time::Duration;
use trytond_config::TrytondConfig;
use url::Url;

/// 一次命令執行所需的連線參數，明確傳遞而非寫入行程環境變數
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub database: String,
    pub user: String,
    pub password: String,
    pub server_url: Url,
    pub timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(config: &TrytondConfig, database: &str, password: &str) -> Result<Self> {
        let settings = Self {
            database: database.to_string(),
            user: config.user().to_string(),
            password: password.to_string(),
            server_url: parse_server_url(config.jsonrpc_url())?,
            timeout: config.timeout(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for ConnectionSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_database_name("database", &self.database)?;
        validation::validate_non_empty_string("user", &self.user)?;
        Ok(())
    }
}

/// Values the demo-data loaders need besides the session.
#[derive(Debug, Clone)]
pub struct DemoSettings {
    pub company_name: String,
    pub currency: String,
}

impl DemoSettings {
    pub fn from_config(config: &TrytondConfig) -> Self {
        Self {
            company_name: config.company_name().to_string(),
            currency: config.currency().to_string(),
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            company_name: trytond_config::DEFAULT_COMPANY_NAME.to_string(),
            currency: trytond_config::DEFAULT_CURRENCY.to_string(),
        }
    }
}

pub fn parse_server_url(url: &str) -> Result<Url> {
    validation::validate_url("jsonrpc.url", url)?;
    Url::parse(url).map_err(|e| TaskError::InvalidConfigValueError {
        field: "jsonrpc.url".to_string(),
        value: url.to_string(),
        reason: e.to_string(),
    })
}
