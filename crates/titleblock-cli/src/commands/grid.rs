use serde::Serialize;
use std::path::PathBuf;
use titleblock_core::error::TitleBlockError;
use titleblock_core::extraction::lines::VectorLines;
use titleblock_core::grid::CellGrid;
use titleblock_core::TitleBlockEngine;

use crate::commands::{read_pages, resolve_config};
use crate::output;

#[derive(Serialize)]
pub struct PageGrid {
    pub page: usize,
    pub lines: VectorLines,
    pub grid: CellGrid,
}

pub fn run(
    input_file: PathBuf,
    preset: Option<String>,
    config_file: Option<PathBuf>,
    output_format: &str,
) -> Result<(), TitleBlockError> {
    let config = resolve_config(preset.as_deref(), config_file.as_ref())?;
    let pages = read_pages(&input_file)?;
    let engine = TitleBlockEngine::new(config);

    let grids: Vec<PageGrid> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let (lines, grid) = engine.detect_grid(page);
            PageGrid {
                page: i + 1,
                lines,
                grid,
            }
        })
        .collect();

    match output_format {
        "json" => output::json::print(&grids)?,
        _ => output::table::print_grids(&grids),
    }

    Ok(())
}
