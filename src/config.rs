//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "countdown-deck")]
#[command(about = "A multi-timer countdown engine with an HTTP control surface")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Tick interval of the scheduler loop in milliseconds
    #[arg(long = "tick-ms", default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Directory holding profile JSON files
    #[arg(long, default_value = "configs/profiles")]
    pub profiles_dir: PathBuf,

    /// Profile to load on startup; defaults to the last active profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Save the active profile on shutdown
    #[arg(long)]
    pub autosave: bool,

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
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
