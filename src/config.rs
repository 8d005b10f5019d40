//! Editing preferences persistence
//!
//! Stores user preferences in `~/.config/sprig/config.yaml`

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::caret::MonospaceLayout;
use crate::locale::Locales;

/// Preferences that shape edits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Preferred languages for names of inserted references
    pub locales: Locales,
    /// Insert the closer when an opening delimiter is typed
    pub auto_close_delimiters: bool,
    /// Add a separating space when an insertion would abut its neighbours
    pub preferred_spacing: bool,
    /// Cell size for the built-in monospace layout
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            locales: Locales::default(),
            auto_close_delimiters: true,
            preferred_spacing: true,
            char_width: 10.0,
            line_height: 20.0,
        }
    }
}

impl EditConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a specific file, or return defaults if it is
    /// missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = crate::config_paths::config_file().context("No config directory available")?;
        self.save_to(&path)
    }

    /// Save config to a specific file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn layout(&self) -> MonospaceLayout {
        MonospaceLayout::new(self.char_width, self.line_height)
    }
}
