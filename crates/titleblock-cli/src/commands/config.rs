use std::path::Path;
use titleblock_core::config::builtin;
use titleblock_core::error::TitleBlockError;
use titleblock_core::model::FieldType;

pub fn list() -> Result<(), TitleBlockError> {
    println!("Available predefined configurations:\n");
    for name in builtin::PRESETS {
        let cfg = builtin::load_preset(name)?;
        println!("  {:<10} {} (v{})", name, cfg.name, cfg.version);
        if let Some(ref desc) = cfg.description {
            println!("             {}", desc);
        }
        println!(
            "             {} keywords, {} field types, {}x{} region grid",
            cfg.keywords.len(),
            cfg.label_synonyms.len(),
            cfg.region_grid.rows,
            cfg.region_grid.cols
        );
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), TitleBlockError> {
    let cfg = builtin::load_preset(preset)?;
    let json = serde_json::to_string_pretty(&cfg)?;
    println!("{json}");
    Ok(())
}

pub fn schema() -> Result<(), TitleBlockError> {
    print!(
        r#"JSON Engine Configuration Schema
================================

An engine configuration controls how `titleblock extract` finds the title
block on a page and which label texts name which fields.

Top-level fields:
  name          (string, required)  Human-readable name of the configuration
  description   (string, optional)  What this configuration is for
  version       (string, required)  Version identifier (e.g., "1.0")
  keywords      (array, required)   Words counted when scoring page regions.
                                    Matched case-insensitively as substrings.
  label_synonyms
                (object, required)  Map of field type -> label texts.
                                    Field types: drawing, title, revision,
                                    scale, date, project, client, sheet,
                                    drawn_by, checked_by, approved_by.
  label_words   (array, optional)   Words that make a cell look like a label.
  region_grid   (object, optional)  {{ "rows": 4, "cols": 4 }} coarse grid
                                    the page is divided into when locating
                                    the title block.
  weights       (object, optional)  Keyword hit weights: base, large_font,
                                    medium_font, color, bold, and the font
                                    size ratios large_font_ratio and
                                    medium_font_ratio that trigger them.
  tolerances    (object, optional)  Distances in points: line_merge,
                                    cell_assign, merge_touch, row_cluster,
                                    col_cluster.
  rectangle_edges
                (boolean, optional) Use drawn rectangles as table rules.
                                    Default: true.

Example:
{{
  "name": "Site drawings",
  "description": "Title blocks used on the Site X package",
  "version": "1.0",
  "keywords": ["drawing no", "scale", "date", "rev"],
  "label_synonyms": {{
    "drawing": ["drawing no", "dwg no"],
    "scale": ["scale"],
    "date": ["date", "issued"],
    "revision": ["rev", "revision"]
  }},
  "tolerances": {{
    "line_merge": 2,
    "cell_assign": 2,
    "merge_touch": 5,
    "row_cluster": 5,
    "col_cluster": 10
  }}
}}

Omitted optional fields take the values of the "standard" preset.
Run `titleblock config show standard` to see them.
"#
    );
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), TitleBlockError> {
    let cfg = titleblock_core::config::load_config(file)?;

    println!("Configuration '{}' (v{}) is valid.", cfg.name, cfg.version);
    println!("  Keywords: {}", cfg.keywords.join(", "));
    println!(
        "  Fields: {}",
        cfg.label_synonyms
            .keys()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Check for potential issues (warnings, not errors)
    let mut warnings = Vec::new();
    for field in [
        FieldType::Drawing,
        FieldType::Revision,
        FieldType::Scale,
        FieldType::Date,
    ] {
        if !cfg.label_synonyms.contains_key(&field) {
            warnings.push(format!("no label synonyms for field '{}'", field));
        }
    }
    if cfg.label_words.is_empty() {
        warnings.push("label_words is empty; cells will rarely classify as labels".to_string());
    }
    let synonyms: Vec<String> = cfg
        .label_synonyms
        .values()
        .flatten()
        .map(|s| s.to_lowercase())
        .collect();
    for keyword in &cfg.keywords {
        let keyword = keyword.to_lowercase();
        if !synonyms.iter().any(|s| s.contains(&keyword) || keyword.contains(s.as_str())) {
            warnings.push(format!("keyword '{}' matches no label synonym", keyword));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
