use clap::Parser;
use tryton_demo_tasks::app::tasks::{self, InstallOptions};
use tryton_demo_tasks::utils::logger;
use tryton_demo_tasks::{Cli, Command, TaskError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("🚀 Starting tryton-demo-tasks");
    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Task failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), TaskError> {
    tracing::info!("📁 Loading configuration from: {}", cli.config);
    let config = tasks::load_config(&cli.config)?;

    match cli.command {
        Command::Create {
            database,
            language,
            password,
        } => {
            tasks::create(&config, &database, &language, &password).await?;
            println!("✅ Database {} created", database);
        }
        Command::Install {
            database,
            password,
            modules,
            extensions,
        } => {
            let options = InstallOptions {
                database,
                password,
                modules,
                extensions,
            };
            let outcome = tasks::install(&config, &options).await?;
            let executed = outcome.steps.iter().filter(|s| s.executed()).count();
            println!(
                "✅ {} modules installed, {} fixture steps executed",
                outcome.report.to_install.len(),
                executed
            );
        }
        Command::Dump { database } => {
            let path = tasks::dump(&config, &database).await?;
            println!("📁 Dump saved to: {}", path.display());
        }
        Command::Dropdb { database } => {
            tasks::dropdb(&config, &database).await?;
            println!("✅ Database {} dropped", database);
        }
    }

    Ok(())
}
