use titleblock_core::grid::MergedLine;
use titleblock_core::PageAnalysis;

use crate::commands::grid::PageGrid;

pub fn print_analyses(analyses: &[PageAnalysis]) {
    let multi_page = analyses.len() > 1;

    for (i, analysis) in analyses.iter().enumerate() {
        if multi_page {
            if i > 0 {
                println!();
            }
            println!("--- Page {} ---\n", i + 1);
        }
        print_analysis(analysis);
    }
}

fn print_analysis(analysis: &PageAnalysis) {
    println!(
        "  Sheet: {} {}",
        analysis.sheet.paper_size, analysis.sheet.orientation
    );

    let Some(ref table) = analysis.table_structure else {
        println!("  No title block found\n");
        return;
    };

    let region = &analysis.best_region;
    println!(
        "  Title block: region row {} col {} ({} keyword(s), score {:.1})",
        region.row_index, region.col_index, region.keyword_count, region.weighted_score
    );
    println!(
        "  Table: {:?} cells, {} row(s), {} populated cell(s)\n",
        table.mode,
        table.rows,
        table.cells.len()
    );

    if table.extracted_fields.is_empty() {
        println!("  No labelled fields recognized\n");
        return;
    }

    let max_field = table
        .extracted_fields
        .keys()
        .map(|f| f.as_str().len())
        .max()
        .unwrap_or(8);
    let max_value = table
        .extracted_fields
        .values()
        .map(|f| f.value.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "  {:<fw$}  {:<vw$}  {:>6}  Source",
        "Field",
        "Value",
        "Conf",
        fw = max_field,
        vw = max_value
    );
    println!("  {}", "-".repeat(max_field + max_value + 24));

    for (field, extracted) in &table.extracted_fields {
        let source = match (extracted.distance, &extracted.method) {
            (-1, _) => "(no value)".to_string(),
            (0, Some(method)) => format!("same cell, {:?}", method),
            (_, Some(method)) => format!("adjacent cell, {:?}", method),
            (_, None) => String::new(),
        };
        println!(
            "  {:<fw$}  {:<vw$}  {:>6.2}  {}",
            field.as_str(),
            extracted.value,
            extracted.confidence,
            source,
            fw = max_field,
            vw = max_value
        );
        if let Some(ref raw) = extracted.validation_details.raw_value {
            println!("  {:<fw$}  rejected: \"{}\"", "", raw, fw = max_field);
        }
    }
    println!();
}

pub fn print_grids(grids: &[PageGrid]) {
    for (i, page) in grids.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("--- Page {} ---\n", page.page);
        println!(
            "  Lines: {} horizontal, {} vertical, {} rectangle(s)",
            page.lines.horizontal.len(),
            page.lines.vertical.len(),
            page.lines.rectangles.len()
        );

        println!("  Merged horizontal (top first): {}", positions(&page.grid.horizontal));
        println!("  Merged vertical (left first): {}", positions(&page.grid.vertical));

        if page.grid.is_empty() {
            println!("  No cells reconstructed");
            continue;
        }

        println!(
            "  Cells: {} ({} x {} grid)\n",
            page.grid.cells.len(),
            page.grid.rows,
            page.grid.cols
        );
        for cell in &page.grid.cells {
            let merge_info = match cell.merged_with_cell_id {
                Some(ref lead) => format!("  -> merged into {}", lead),
                None if cell.row_span > 1 || cell.col_span > 1 => {
                    format!("  spans {}x{}", cell.row_span, cell.col_span)
                }
                None => String::new(),
            };
            println!(
                "    [{},{}] {:<28} x={:.1} y={:.1} w={:.1} h={:.1}{}",
                cell.row, cell.col, cell.id, cell.x, cell.y, cell.width, cell.height, merge_info
            );
        }
    }
}

fn positions(lines: &[MergedLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{:.1}", l.position))
        .collect::<Vec<_>>()
        .join(", ")
}
