//! Host shutdown command execution

use tokio::process::Command;
use tracing::{error, info};

use crate::timer::ShutdownRequester;

/// Runs a configured host command when the idle countdown expires.
#[derive(Debug, Clone)]
pub struct CommandShutdown {
    program: String,
    args: Vec<String>,
}

impl CommandShutdown {
    /// Parse a whitespace-separated command line ("program arg arg...").
    pub fn from_command_line(raw: &str) -> anyhow::Result<Self> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("shutdown command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl ShutdownRequester for CommandShutdown {
    fn request_shutdown(&self) {
        let program = self.program.clone();
        let args = self.args.clone();

        // Fire-and-forget: the timer has made its decision, the command's
        // outcome only matters for the logs.
        tokio::spawn(async move {
            info!("Executing shutdown command: {} {}", program, args.join(" "));
            match Command::new(&program).args(&args).output().await {
                Ok(output) if output.status.success() => {
                    info!("Shutdown command executed");
                }
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    error!("Shutdown command failed: {}", stderr);
                }
                Err(e) => {
                    error!("Failed to execute shutdown command: {}", e);
                }
            }
        });
    }
}
