//! # Configuration
//!
//! Managed by [`confique`]: layered loading from a TOML file, environment
//! variables, and compiled defaults.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `temperature` | `0.7` | Sampling temperature passed to the generator |
//! | `max_tokens` | `1000` | Generation budget per request |
//! | `data_dir` | unset | Override for where the JSON store tables live |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MediakitError, Result};
use crate::generator::GenerationOptions;

/// Configuration for mediakit, stored in `mediakit.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MediakitConfig {
    /// Sampling temperature for the text-generation collaborator.
    #[config(default = 0.7)]
    pub temperature: f64,

    /// Token budget per generation request.
    #[config(default = 1000)]
    pub max_tokens: u32,

    /// Where the backend tables (`entries.json`, `postmeta.json`) live.
    /// When absent, the client picks an OS-appropriate data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for MediakitConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            data_dir: None,
        }
    }
}

impl MediakitConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Layered load: environment variables over an optional TOML file over
    /// compiled defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            if path.exists() {
                builder = builder.file(path);
            }
        }
        builder
            .load()
            .map_err(|e| MediakitError::Store(format!("configuration: {}", e)))
    }
}
