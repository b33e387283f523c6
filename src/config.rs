//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

use crate::timer::ShutdownPolicy;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "lights-out")]
#[command(about = "A state-managed watchdog that shuts down an empty game server")]
#[command(version = "1.2.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "25580")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Minutes the server may sit empty before shutting down
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=1440))]
    pub delay: u64,

    /// Seconds to wait after session start before the first empty check
    #[arg(long, default_value_t = 5)]
    pub settle_secs: u64,

    /// Treat this host as single-user and never shut it down
    #[arg(long)]
    pub single_user: bool,

    /// Command executed when the idle countdown expires
    #[arg(long, default_value = "systemctl poweroff")]
    pub shutdown_command: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

impl ShutdownPolicy for Config {
    fn shutdown_delay(&self) -> Duration {
        Duration::from_secs(self.delay * 60)
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}
