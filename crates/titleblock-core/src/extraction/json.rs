use crate::error::TitleBlockError;
use crate::extraction::{PageInput, PageSource};
use serde::Deserialize;

/// Page source reading the JSON page description produced by the text
/// extraction layer. Accepts a single page object or an array of pages.
pub struct JsonPageSource;

impl JsonPageSource {
    pub fn new() -> Self {
        JsonPageSource
    }
}

impl Default for JsonPageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageDocument {
    Many(Vec<PageInput>),
    One(PageInput),
}

impl PageSource for JsonPageSource {
    fn load_pages(&self, bytes: &[u8]) -> Result<Vec<PageInput>, TitleBlockError> {
        let doc: PageDocument = serde_json::from_slice(bytes)?;
        let pages = match doc {
            PageDocument::Many(pages) => pages,
            PageDocument::One(page) => vec![page],
        };

        if pages.is_empty() {
            return Err(TitleBlockError::InvalidInput("no pages in input".into()));
        }

        for (i, page) in pages.iter().enumerate() {
            validate_page(i + 1, page)?;
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "json"
    }
}

fn validate_page(page_number: usize, page: &PageInput) -> Result<(), TitleBlockError> {
    if !page.width.is_finite() || !page.height.is_finite() || page.width <= 0.0 || page.height <= 0.0
    {
        return Err(TitleBlockError::InvalidInput(format!(
            "page {} has invalid dimensions {}x{}",
            page_number, page.width, page.height
        )));
    }

    if let Some(pos) = page
        .fragments
        .iter()
        .position(|f| !f.x.is_finite() || !f.y.is_finite())
    {
        return Err(TitleBlockError::InvalidInput(format!(
            "page {} fragment {} has a non-finite position",
            page_number, pos
        )));
    }

    Ok(())
}
