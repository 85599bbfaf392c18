// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room settings loaded from `hubbub.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::log::DEFAULT_CAPACITY;
use crate::render::{RenderError, TemplateRenderer};

/// File name of the settings file inside a room directory
pub const SETTINGS_FILE: &str = "hubbub.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    #[error(transparent)]
    Template(#[from] RenderError),
}

/// Per-room settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// How many messages the room keeps
    pub capacity: usize,
    /// minijinja template for the rendered form of a message
    pub message_template: Option<String>,
    /// Deadline for reading a request and writing a response
    #[serde(with = "humantime_serde")]
    pub io_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            message_template: None,
            io_timeout: Duration::from_secs(5),
        }
    }
}

impl Settings {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings for a room directory. A missing file means defaults.
    pub fn for_room(room_root: &Path) -> Result<Self, ConfigError> {
        let path = room_root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Build the renderer these settings describe
    pub fn renderer(&self) -> Result<TemplateRenderer, ConfigError> {
        match &self.message_template {
            Some(template) => Ok(TemplateRenderer::with_template(template.clone())?),
            None => Ok(TemplateRenderer::new()),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
