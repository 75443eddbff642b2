use anyhow::Result;
use common::config::{parse_config, Config};

use crate::args::Cli;

pub mod generate;
pub mod show;

/// Config file (if any) with the command line layered on top.
pub fn load_config(cli: &Cli, overrides: Config) -> Result<Config> {
    let file = match &cli.file {
        Some(path) => parse_config(path)?,
        None => Config::default(),
    };
    Ok(file.merge(overrides))
}
