//! CLI module for ccproxy
//!
//! # Commands
//!
//! - `serve` - Start the routing control server
//! - `capture` - Manage the traffic-capture process (start, stop, status)
//! - `config` - Configuration utilities (init, check)
//!
//! # Example
//!
//! ```bash
//! # Start with the config named by CCPROXY_CONFIG or ./ccproxy.toml
//! ccproxy serve
//!
//! # Start capturing traffic, then stop it
//! ccproxy capture start
//! ccproxy capture stop
//! ```

pub mod capture;
pub mod config;
pub mod output;
pub mod serve;

pub use capture::{handle_capture_start, handle_capture_status, handle_capture_stop};
pub use config::{handle_config_check, handle_config_init};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ccproxy - Context-aware model routing for LLM API traffic
#[derive(Parser, Debug)]
#[command(
    name = "ccproxy",
    version,
    about = "Context-aware model routing for LLM API traffic"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the routing control server
    Serve(ServeArgs),
    /// Manage the traffic-capture process
    #[command(subcommand)]
    Capture(CaptureCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config file selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArg {
    /// Path to configuration file (default: ccproxy.toml)
    #[arg(short, long, env = "CCPROXY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Override server port
    #[arg(short, long, env = "CCPROXY_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "CCPROXY_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CCPROXY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Do not reload the config file when it changes
    #[arg(long)]
    pub no_watch: bool,
}

#[derive(Subcommand, Debug)]
pub enum CaptureCommands {
    /// Start the capture process
    Start(CaptureArgs),
    /// Stop the capture process (SIGTERM, then SIGKILL)
    Stop(CaptureStopArgs),
    /// Show whether the capture process is running
    Status(CaptureArgs),
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CaptureStopArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Milliseconds to wait after SIGTERM before SIGKILL
    #[arg(short, long, default_value = "500")]
    pub timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write an example configuration file
    Init(ConfigInitArgs),
    /// Validate a configuration file and print its rules
    Check(ConfigCheckArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "ccproxy.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigCheckArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
