//! Built-in plugins.
//!
//! Plugins are compiled in and enabled by name through the `plugins` setting:
//!
//! ```toml
//! plugins = ["nomedia", "nonmedia_files", "extended_caching"]
//! ```
//!
//! | Name | Effect |
//! |---|---|
//! | `nomedia` | `.nomedia` marker files hide albums or listed entries |
//! | `nonmedia_files` | unrecognized files become downloadable entries with a synthetic thumbnail |
//! | `extended_caching` | persists Markdown/EXIF/IPTC/size per media between builds |
//!
//! A plugin's [`Plugin::register`] reads its options from the settings and
//! connects handlers on the [`SignalBus`]. Registering the same plugin twice
//! is harmless: handler ids are deduplicated by the bus.

pub mod extended_caching;
pub mod nomedia;
pub mod nonmedia;

use crate::config::{ConfigError, Settings};
use crate::signals::SignalBus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Unknown plugin: {0}")]
    Unknown(String),
    #[error("Plugin {plugin} failed: {message}")]
    Failed { plugin: String, message: String },
    #[error("Plugin configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Plugin {
    fn name(&self) -> &'static str;

    /// Connect this plugin's handlers.
    fn register(&self, settings: &Settings, bus: &mut SignalBus) -> Result<(), PluginError>;
}

/// Look up a built-in plugin by name.
pub fn builtin(name: &str) -> Option<Box<dyn Plugin>> {
    match name {
        nomedia::NAME => Some(Box::new(nomedia::NoMedia)),
        nonmedia::NAME => Some(Box::new(nonmedia::NonMediaFiles)),
        extended_caching::NAME => Some(Box::new(extended_caching::ExtendedCaching)),
        _ => None,
    }
}

/// Register every plugin named in `settings.plugins`, in order.
pub fn register_all(settings: &Settings, bus: &mut SignalBus) -> Result<(), PluginError> {
    for name in settings.plugins.iter() {
        let plugin = builtin(name).ok_or_else(|| PluginError::Unknown(name.clone()))?;
        plugin.register(settings, bus)?;
        log::info!("Registered plugin {}", plugin.name());
    }
    Ok(())
}
