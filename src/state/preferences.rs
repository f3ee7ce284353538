//! Display preferences
//!
//! Opaque to the countdown itself; stored here so a presentation layer can
//! read them back after a reload.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStyle {
    #[default]
    Digital,
    Flip,
    Analog,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStyle {
    #[default]
    Centered,
    Logo,
    Floating,
    Pip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColor {
    #[default]
    White,
    Black,
    Red,
    Blue,
}

/// Stored display preferences
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub timer_style: TimerStyle,
    pub layout_style: LayoutStyle,
    pub text_color: TextColor,
    pub dark_theme: bool,
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub timer_style: Option<TimerStyle>,
    pub layout_style: Option<LayoutStyle>,
    pub text_color: Option<TextColor>,
    pub dark_theme: Option<bool>,
}

impl Preferences {
    /// Load preferences from a JSON file, falling back to defaults when the
    /// file does not exist yet
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!("No preferences file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let preferences = serde_json::from_str(&contents)?;
        info!("Loaded preferences from {}", path.display());
        Ok(preferences)
    }

    /// Write preferences to a JSON file
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved preferences to {}", path.display());
        Ok(())
    }

    pub fn apply(&mut self, update: PreferencesUpdate) {
        if let Some(timer_style) = update.timer_style {
            self.timer_style = timer_style;
        }
        if let Some(layout_style) = update.layout_style {
            self.layout_style = layout_style;
        }
        if let Some(text_color) = update.text_color {
            self.text_color = text_color;
        }
        if let Some(dark_theme) = update.dark_theme {
            self.dark_theme = dark_theme;
        }
    }
}
