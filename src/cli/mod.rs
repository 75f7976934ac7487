//! CLI command implementations

pub mod definition;
pub mod serve;
pub mod task;

pub use definition::{Cli, Commands};

use anyhow::Result;
use std::path::PathBuf;

use crate::config::{get_app_dir, Config};
use crate::tools::ToolFacade;

/// Build the facade from `config.toml` in `data_dir` (or the app directory).
pub fn open_facade(data_dir: Option<PathBuf>) -> Result<ToolFacade> {
    let dir = match data_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            dir
        }
        None => get_app_dir()?,
    };
    let config = Config::load_from(&dir)?;
    ToolFacade::from_config(&config, &dir)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        s.chars().take(max).collect()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}
