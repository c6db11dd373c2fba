//! Session parameters loaded from a TOML file.
//!
//! ```toml
//! capital = "1000"
//! total_trades = 10
//! accuracy = "50"
//! risk_reward_ratio = "3"
//! ```

use crate::domain::session::SessionParameters;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct SessionFile;

impl SessionFile {
    pub fn load(path: &Path) -> Result<SessionParameters> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid session file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<SessionParameters> {
        let params: SessionParameters =
            toml::from_str(contents).context("Failed to parse session TOML")?;
        params.validate()?;
        Ok(params)
    }
}
