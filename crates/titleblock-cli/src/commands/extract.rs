use std::path::PathBuf;
use titleblock_core::error::TitleBlockError;
use titleblock_core::{PageAnalysis, TitleBlockEngine};

use crate::commands::{read_pages, resolve_config};
use crate::output;

pub fn run(
    input_file: PathBuf,
    preset: Option<String>,
    config_file: Option<PathBuf>,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), TitleBlockError> {
    let config = resolve_config(preset.as_deref(), config_file.as_ref())?;

    let pages = read_pages(&input_file)?;
    let engine = TitleBlockEngine::new(config);
    let analyses: Vec<PageAnalysis> = pages.iter().map(|page| engine.analyze_page(page)).collect();

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&analyses)?;
            std::fs::write(&path, json)?;
            let found = analyses.iter().filter(|a| a.table_structure.is_some()).count();
            eprintln!(
                "Analyzed {} page(s), title block found on {}, written to {}",
                analyses.len(),
                found,
                path.display()
            );
        }
        None => match output_format {
            "json" => output::json::print(&analyses)?,
            _ => output::table::print_analyses(&analyses),
        },
    }

    Ok(())
}
