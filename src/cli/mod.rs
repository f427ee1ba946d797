// CLI module for textbook-backend
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// textbook-backend - Q&A, translation and profile API for the Physical AI textbook
#[derive(Parser, Debug)]
#[command(name = "textbook-backend", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.textbook-backend/config.toml)
    #[arg(long, env = "TEXTBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    pub port: Option<u16>,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Args {
    /// CLI flags take precedence over every other configuration source.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
