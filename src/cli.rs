// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::{EngineConfig, Variant};
use crate::error::Result;

#[derive(Parser, Debug, Clone)]
#[command(name = "tile-hero")]
#[command(about = "Procedural tile hero animation", long_about = None)]
pub struct Cli {
    /// Built-in visual variant
    #[arg(long, value_enum, default_value_t = Variant::Canvas)]
    pub variant: Variant,

    /// JSON config file; replaces the variant preset
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective config as JSON and exit
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Run this many frames against an in-memory surface instead of a window
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u32>,

    /// Fixed layout seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable UI elements and console output
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}

impl Cli {
    /// Preset or config file, with command-line overrides applied
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => self.variant.preset(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }

    /// Default `env_logger` filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.no_ui {
            "warn"
        } else {
            "info"
        }
    }
}
