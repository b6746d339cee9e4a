use crate::config::trytond_config::DEFAULT_CONFIG_PATH;
use crate::core::installer::DEFAULT_MODULES;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "tryton-demo-tasks")]
#[command(about = "Create and seed Tryton demo databases")]
pub struct Cli {
    /// Path to the trytond configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a new database on the Tryton server
    Create {
        database: String,
        #[arg(long, default_value = "en_US")]
        language: String,
        #[arg(long, default_value = "admin")]
        password: String,
    },
    /// Install modules and create demo data
    Install {
        database: String,
        #[arg(long, default_value = "admin")]
        password: String,
        /// Whitespace separated module names
        #[arg(long, default_value = DEFAULT_MODULES)]
        modules: String,
        /// Enable a disabled fixture step (price_lists, purchases, productions, stock)
        #[arg(long = "extension")]
        extensions: Vec<String>,
    },
    /// Dump the PostgreSQL database to ./psql_<database>.sql
    Dump { database: String },
    /// Drop the PostgreSQL database
    Dropdb { database: String },
}
