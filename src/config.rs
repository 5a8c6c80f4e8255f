//! Configuration management

use crate::error::{WavConvError, Result};
use crate::audio::DEFAULT_OUTPUT_PREFIX;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub prefix: String,
    /// Seconds a web request's output directory is kept; 0 keeps them forever
    pub retention_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("wavconv"),
            prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            retention_secs: 24 * 60 * 60,
        }
    }
}

impl Config {
    pub fn verbose(&self) -> bool {
        self.logging.verbose
    }

    /// `host:port` for the web interface
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "wavconv", about = "WAV converter preserving rate, depth, channels and samples", version, author)]
pub struct Args {
    #[arg(short = 'v', long = "verbose", global = true, help = "Enable verbose output mode")]
    pub verbose: bool,

    #[arg(short = 'c', long = "config", global = true, help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Convert WAV files on disk and print the report
    Convert {
        #[arg(required = true, help = "Input WAV files")]
        files: Vec<PathBuf>,

        #[arg(short = 'o', long = "output-dir", help = "Directory for converted files")]
        output_dir: Option<PathBuf>,
    },
    /// Start the web upload/download interface
    Serve {
        #[arg(long = "host", help = "Address to bind")]
        host: Option<String>,

        #[arg(short = 'p', long = "port", help = "Port to listen on")]
        port: Option<u16>,

        #[arg(short = 'o', long = "output-dir", help = "Directory for converted files")]
        output_dir: Option<PathBuf>,
    },
    /// Write the default config file
    InitConfig {
        #[arg(help = "Where to write the TOML file")]
        path: PathBuf,
    },
}

impl Config {
    /// Create config from command line arguments and config file
    pub fn from_args_and_config(args: &Args) -> Result<Self> {
        // First load config file (if provided)
        let mut config = if let Some(config_path) = &args.config_file {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        // Command line arguments override config file settings
        if args.verbose {
            config.logging.verbose = true;
        }
        match &args.command {
            Command::Convert { output_dir, .. } => {
                if let Some(dir) = output_dir {
                    config.output.dir = dir.clone();
                }
            }
            Command::Serve { host, port, output_dir } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(dir) = output_dir {
                    config.output.dir = dir.clone();
                }
            }
            Command::InitConfig { .. } => {}
        }

        config.validate()?;

        Ok(config)
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WavConvError::config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(WavConvError::config("Server host cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(WavConvError::config("Server port must be greater than 0"));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(WavConvError::config("Max upload size must be greater than 0"));
        }

        if self.output.prefix.is_empty() {
            return Err(WavConvError::config("Output prefix cannot be empty"));
        }
        if self.output.prefix.contains(['/', '\\']) {
            return Err(WavConvError::config("Output prefix cannot contain path separators"));
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(WavConvError::config("Output directory cannot be empty"));
        }

        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WavConvError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| WavConvError::config(format!("Failed to write config file: {}", e)))
    }

    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}
