use crate::core::{CommandRunner, DatabaseAdmin, Result, ShellCommand, TaskError};
use std::path::PathBuf;

pub fn dump_path(database: &str) -> PathBuf {
    PathBuf::from(format!("./psql_{}.sql", database))
}

pub fn dump_command(database: &str, username: Option<&str>) -> ShellCommand {
    let command = ShellCommand::new("pg_dump").arg("-d").arg(database);
    with_user(command, username).stdout_to(dump_path(database))
}

pub fn dropdb_command(database: &str, username: Option<&str>) -> ShellCommand {
    with_user(ShellCommand::new("dropdb").arg(database), username)
}

fn with_user(command: ShellCommand, username: Option<&str>) -> ShellCommand {
    match username {
        Some(user) => command.arg("-U").arg(user),
        None => command,
    }
}

pub async fn create_database(
    admin: &dyn DatabaseAdmin,
    database: &str,
    language: &str,
    password: &str,
) -> Result<()> {
    tracing::info!("🗄️ Create database: {} ({})", database, language);
    admin
        .create_database(database, password, language, password)
        .await
}

pub async fn dump_database(
    runner: &dyn CommandRunner,
    database: &str,
    username: Option<&str>,
) -> Result<PathBuf> {
    let command = dump_command(database, username);
    run_checked(runner, &command).await?;
    Ok(dump_path(database))
}

pub async fn drop_database(
    runner: &dyn CommandRunner,
    database: &str,
    username: Option<&str>,
) -> Result<()> {
    let command = dropdb_command(database, username);
    run_checked(runner, &command).await
}

async fn run_checked(runner: &dyn CommandRunner, command: &ShellCommand) -> Result<()> {
    tracing::debug!("🐚 {}", command);
    let output = runner.run(command).await?;
    match output.code {
        Some(0) => Ok(()),
        code => Err(TaskError::CommandError {
            command: command.to_string(),
            code,
            stderr: output.stderr.trim().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{RecordingAdmin, RecordingRunner};
    use std::path::Path;

    #[tokio::test]
    async fn test_dump_writes_to_psql_file() {
        let runner = RecordingRunner::default();

        let path = dump_database(&runner, "test_db", Some("tryton")).await.unwrap();

        assert_eq!(path, Path::new("./psql_test_db.sql"));
        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program, "pg_dump");
        assert_eq!(commands[0].args, vec!["-d", "test_db", "-U", "tryton"]);
        assert_eq!(
            commands[0].stdout_path.as_deref(),
            Some(Path::new("./psql_test_db.sql"))
        );
    }

    #[tokio::test]
    async fn test_dropdb_without_user() {
        let runner = RecordingRunner::default();

        drop_database(&runner, "test_db", None).await.unwrap();

        let commands = runner.commands();
        assert_eq!(commands[0].to_string(), "dropdb test_db");
        assert!(commands[0].stdout_path.is_none());
    }

    #[tokio::test]
    async fn test_failed_command_is_error() {
        let runner = RecordingRunner::exiting_with(1);

        let err = drop_database(&runner, "missing_db", Some("tryton"))
            .await
            .unwrap_err();

        match err {
            TaskError::CommandError { command, code, .. } => {
                assert_eq!(command, "dropdb missing_db -U tryton");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_passes_password_twice() {
        let admin = RecordingAdmin::default();

        create_database(&admin, "test_db", "en_US", "secret").await.unwrap();

        let created = admin.created.lock().unwrap();
        assert_eq!(
            created[0],
            (
                "test_db".to_string(),
                "secret".to_string(),
                "en_US".to_string(),
                "secret".to_string()
            )
        );
    }
}
