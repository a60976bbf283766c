pub mod builtin;
pub mod schema;

use crate::error::TitleBlockError;
use schema::EngineConfig;
use std::path::Path;

/// Load an engine configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, TitleBlockError> {
    let content = std::fs::read_to_string(path).map_err(|e| TitleBlockError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an engine configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<EngineConfig, TitleBlockError> {
    let config: EngineConfig =
        serde_json::from_str(json).map_err(|e| TitleBlockError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an engine configuration from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<EngineConfig, TitleBlockError> {
    let config: EngineConfig = serde_json::from_str(json).map_err(TitleBlockError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is usable by the engine.
pub fn validate_config(config: &EngineConfig) -> Result<(), TitleBlockError> {
    let grid = config.region_grid;
    if grid.rows == 0 || grid.cols == 0 {
        return Err(TitleBlockError::ConfigInvalid(format!(
            "region grid must be at least 1x1 (got {}x{})",
            grid.rows, grid.cols
        )));
    }

    if config.keywords.is_empty() {
        return Err(TitleBlockError::ConfigInvalid(
            "keywords must not be empty".into(),
        ));
    }
    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(TitleBlockError::ConfigInvalid(
            "keywords must not contain empty strings".into(),
        ));
    }

    let w = config.weights;
    let weights = [
        ("base", w.base),
        ("large_font", w.large_font),
        ("medium_font", w.medium_font),
        ("color", w.color),
        ("bold", w.bold),
    ];
    for (name, value) in weights {
        if !value.is_finite() || value < 0.0 {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "weight '{}' must be a non-negative number (got {})",
                name, value
            )));
        }
    }
    if w.medium_font_ratio < 1.0 || w.large_font_ratio < w.medium_font_ratio {
        return Err(TitleBlockError::ConfigInvalid(format!(
            "font ratios must satisfy 1.0 <= medium ({}) <= large ({})",
            w.medium_font_ratio, w.large_font_ratio
        )));
    }

    let t = config.tolerances;
    let tolerances = [
        ("line_merge", t.line_merge),
        ("cell_assign", t.cell_assign),
        ("merge_touch", t.merge_touch),
        ("row_cluster", t.row_cluster),
        ("col_cluster", t.col_cluster),
    ];
    for (name, value) in tolerances {
        if !value.is_finite() || value <= 0.0 {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "tolerance '{}' must be positive (got {})",
                name, value
            )));
        }
    }

    if config.label_synonyms.values().all(|s| s.is_empty()) {
        return Err(TitleBlockError::ConfigInvalid(
            "label_synonyms must name at least one label".into(),
        ));
    }
    for (field, synonyms) in &config.label_synonyms {
        if synonyms.iter().any(|s| s.trim().is_empty()) {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "field '{}' has an empty label synonym",
                field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "name": "Test",
        "version": "1.0",
        "keywords": ["scale"],
        "label_synonyms": { "scale": ["scale"] }
    }"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let cfg = parse_config_str(MINIMAL).unwrap();
        assert_eq!(cfg.name, "Test");
        assert_eq!(cfg.region_grid.rows, 4);
        assert_eq!(cfg.tolerances.col_cluster, 10.0);
        assert_eq!(cfg.weights.bold, 1.5);
        assert!(cfg.rectangle_edges);
        assert!(cfg.label_words.contains(&"revision".to_string()));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "keywords": [],
            "label_synonyms": { "scale": ["scale"] }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_zero_grid_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "region_grid": { "rows": 0, "cols": 4 },
            "keywords": ["scale"],
            "label_synonyms": { "scale": ["scale"] }
        }"#;
        let err = parse_config_str(json).unwrap_err();
        assert!(err.to_string().contains("1x1"));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "keywords": ["scale"],
            "tolerances": { "line_merge": -1, "cell_assign": 2, "merge_touch": 5, "row_cluster": 5, "col_cluster": 10 },
            "label_synonyms": { "scale": ["scale"] }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "keywords": ["scale"],
            "label_synonyms": { "weight": ["weight"] }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.keywords, vec!["scale"]);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, TitleBlockError::ConfigLoad { .. }));
    }
}
