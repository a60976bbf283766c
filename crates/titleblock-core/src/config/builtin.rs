use crate::config::schema::EngineConfig;
use crate::config::validate_config;
use crate::error::TitleBlockError;
use std::sync::LazyLock;

const STANDARD_JSON: &str = include_str!("../../../../config/standard.json");
const EXTENDED_JSON: &str = include_str!("../../../../config/extended.json");

/// Available predefined engine configurations.
pub const PRESETS: &[&str] = &["standard", "extended"];

static STANDARD: LazyLock<EngineConfig> = LazyLock::new(|| {
    parse_embedded(STANDARD_JSON).expect("embedded standard.json is valid")
});

/// Embedded presets go through the same checks as user files.
fn parse_embedded(json: &str) -> Result<EngineConfig, TitleBlockError> {
    let config: EngineConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

/// The configuration used when nothing else is specified.
pub fn standard() -> EngineConfig {
    STANDARD.clone()
}

/// Load a predefined configuration by name.
pub fn load_preset(name: &str) -> Result<EngineConfig, TitleBlockError> {
    match name {
        "standard" => Ok(standard()),
        "extended" => parse_embedded(EXTENDED_JSON),
        _ => Err(TitleBlockError::UnknownPreset {
            name: name.to_string(),
            available: PRESETS.join(", "),
        }),
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        standard()
    }
}
