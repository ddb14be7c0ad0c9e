//! Best-effort launch of the model runtime at startup.

use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::LauncherConfig;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ModelLauncher: Send + Sync {
    async fn launch(&self) -> Result<(), LaunchError>;
}

/// Spawns the engine as a detached background process.
pub struct ProcessLauncher {
    command: String,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

#[async_trait]
impl ModelLauncher for ProcessLauncher {
    async fn launch(&self) -> Result<(), LaunchError> {
        tracing::info!(command = %self.command, args = ?self.args, "launching model runtime");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let command = self.command.clone();
        // Reap the child so it does not linger as a zombie; its exit is only logged.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::warn!(%command, %status, "model runtime exited"),
                Err(err) => tracing::error!(%command, error = %err, "waiting on model runtime failed"),
            }
        });

        Ok(())
    }
}

/// Launches the runtime once and waits `grace` before returning.
///
/// Failures are logged, never returned: requests surface an unavailable engine on their own.
pub async fn ensure_available(launcher: &dyn ModelLauncher, grace: Duration) {
    match launcher.launch().await {
        Ok(()) => {
            tokio::time::sleep(grace).await;
            tracing::info!(grace_secs = grace.as_secs(), "model runtime started");
        }
        Err(err) => tracing::error!(error = %err, "model runtime launch failed"),
    }
}
