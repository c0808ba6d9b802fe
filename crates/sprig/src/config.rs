// File: src/config.rs
// Purpose: Configuration parsing from sprig.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sprig_parser::DirectiveNames;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub directives: DirectiveConfig,
}

/// Root element settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Id of the element the app mounts to (default: "app")
    #[serde(default = "default_root_id")]
    pub root_id: String,

    /// Class added to the root element on mount
    #[serde(default = "default_root_class")]
    pub root_class: String,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Route used when nothing else matches (default: "/404")
    #[serde(default = "default_not_found_path")]
    pub not_found_path: String,

    /// Value of the slot attribute that marks a layout's page container
    #[serde(default = "default_slot_name")]
    pub slot_name: String,

    /// Starting location of the in-memory history
    #[serde(default = "default_initial_path")]
    pub initial_path: String,
}

/// Directive attribute names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveConfig {
    #[serde(default = "default_click")]
    pub click: String,

    #[serde(default = "default_reference")]
    pub reference: String,

    #[serde(default = "default_portal")]
    pub portal: String,

    #[serde(default = "default_slot")]
    pub slot: String,

    /// Marker written on relocated portal content
    #[serde(default = "default_portaled")]
    pub portaled: String,
}

// Default values
fn default_root_id() -> String {
    "app".to_string()
}

fn default_root_class() -> String {
    "sprig-root".to_string()
}

fn default_not_found_path() -> String {
    sprig_router::DEFAULT_NOT_FOUND_PATH.to_string()
}

fn default_slot_name() -> String {
    "innerHTML".to_string()
}

fn default_initial_path() -> String {
    "/".to_string()
}

fn default_click() -> String {
    DirectiveNames::default().click
}

fn default_reference() -> String {
    DirectiveNames::default().reference
}

fn default_portal() -> String {
    DirectiveNames::default().portal
}

fn default_slot() -> String {
    DirectiveNames::default().slot
}

fn default_portaled() -> String {
    DirectiveNames::default().portaled
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_id: default_root_id(),
            root_class: default_root_class(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            not_found_path: default_not_found_path(),
            slot_name: default_slot_name(),
            initial_path: default_initial_path(),
        }
    }
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            click: default_click(),
            reference: default_reference(),
            portal: default_portal(),
            slot: default_slot(),
            portaled: default_portaled(),
        }
    }
}

impl From<&DirectiveConfig> for DirectiveNames {
    fn from(config: &DirectiveConfig) -> Self {
        Self {
            click: config.click.clone(),
            reference: config.reference.clone(),
            portal: config.portal.clone(),
            slot: config.slot.clone(),
            portaled: config.portaled.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing or empty file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./sprig.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("sprig.toml")
    }

    pub fn directive_names(&self) -> DirectiveNames {
        DirectiveNames::from(&self.directives)
    }
}
