use crate::domain::model::{CommandOutput, ShellCommand};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{Result, TaskError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// 以 tokio 執行外部命令 (pg_dump, dropdb)
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, cmd: &ShellCommand) -> Result<CommandOutput> {
        let start = Instant::now();
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);

        match &cmd.stdout_path {
            Some(path) => {
                let file = std::fs::File::create(path)?;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::inherit());
            }
        }
        command.stderr(Stdio::piped());

        let output = command
            .output()
            .await
            .map_err(|e| TaskError::CommandError {
                command: cmd.to_string(),
                code: None,
                stderr: e.to_string(),
            })?;

        tracing::debug!(
            "🐚 {} finished with {:?} in {:?}",
            cmd.program,
            output.status.code(),
            start.elapsed()
        );

        Ok(CommandOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
