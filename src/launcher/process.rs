//! Child process abstraction.

use std::path::PathBuf;
use std::process::ExitStatus;

use async_trait::async_trait;

use crate::error::{ClauderockError, Result};

/// Program, arguments and environment changes for the child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Inherited variables removed before the child starts.
    pub env_remove: Vec<String>,
}

/// Starts child processes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn spawn(&self, command: &LaunchCommand) -> Result<Box<dyn RunningProcess>>;
}

/// A started child.
#[async_trait]
pub trait RunningProcess: Send {
    /// Wait for exit and return the exit code.
    async fn wait(&mut self) -> Result<i32>;

    /// Forcibly terminate the child. Callers still `wait` afterwards.
    async fn kill(&mut self) -> Result<()>;
}

/// Runs children with `tokio::process`, inheriting stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn spawn(&self, command: &LaunchCommand) -> Result<Box<dyn RunningProcess>> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args).kill_on_drop(true);
        for name in &command.env_remove {
            cmd.env_remove(name);
        }
        cmd.envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let child = cmd.spawn().map_err(|e| {
            ClauderockError::Launch(format!(
                "failed to start {}: {e}",
                command.program.display()
            ))
        })?;
        Ok(Box::new(child))
    }
}

#[async_trait]
impl RunningProcess for tokio::process::Child {
    async fn wait(&mut self) -> Result<i32> {
        let status = tokio::process::Child::wait(self).await?;
        Ok(exit_code(status))
    }

    async fn kill(&mut self) -> Result<()> {
        tokio::process::Child::kill(self).await?;
        Ok(())
    }
}

/// Exit code of `status`, using the shell convention `128 + signal` for signals.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> LaunchCommand {
        LaunchCommand {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), script.into()],
            ..LaunchCommand::default()
        }
    }

    #[tokio::test]
    async fn forwards_exit_code() {
        let mut child = TokioProcessRunner.spawn(&sh("exit 3")).await.unwrap();
        assert_eq!(child.wait().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn applies_environment_changes() {
        let mut command = sh("test \"$CLAUDEROCK_T1\" = yes && test -z \"$HOME_REMOVED_T1\"");
        command.env.push(("CLAUDEROCK_T1".into(), "yes".into()));
        command.env_remove.push("HOME_REMOVED_T1".into());
        let mut child = TokioProcessRunner.spawn(&command).await.unwrap();
        assert_eq!(child.wait().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn kill_reports_signal_exit() {
        let mut child = TokioProcessRunner.spawn(&sh("sleep 30")).await.unwrap();
        child.kill().await.unwrap();
        assert_eq!(child.wait().await.unwrap(), 128 + 9);
    }

    #[tokio::test]
    async fn missing_program_is_launch_error() {
        let command = LaunchCommand {
            program: PathBuf::from("/nonexistent/claude"),
            ..LaunchCommand::default()
        };
        assert!(matches!(
            TokioProcessRunner.spawn(&command).await,
            Err(ClauderockError::Launch(_))
        ));
    }
}
