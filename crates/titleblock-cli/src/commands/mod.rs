pub mod config;
pub mod extract;
pub mod grid;

use std::path::{Path, PathBuf};
use titleblock_core::config::schema::EngineConfig;
use titleblock_core::config::{builtin, load_config};
use titleblock_core::error::TitleBlockError;
use titleblock_core::extraction::json::JsonPageSource;
use titleblock_core::extraction::{PageInput, PageSource};
use tracing::debug;

/// Read and decode a JSON page description.
pub fn read_pages(path: &Path) -> Result<Vec<PageInput>, TitleBlockError> {
    let bytes = std::fs::read(path)?;
    JsonPageSource::new().load_pages(&bytes)
}

/// Pick the engine configuration: a config file wins over a preset name,
/// which defaults to "standard".
pub fn resolve_config(
    preset: Option<&str>,
    config_file: Option<&PathBuf>,
) -> Result<EngineConfig, TitleBlockError> {
    let config = match (config_file, preset) {
        (Some(path), _) => load_config(path)?,
        (None, Some(name)) => builtin::load_preset(name)?,
        (None, None) => builtin::standard(),
    };
    debug!(config = %config.name, version = %config.version, "engine configuration");
    Ok(config)
}
