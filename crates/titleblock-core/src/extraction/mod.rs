pub mod json;
pub mod lines;

use crate::error::TitleBlockError;
use crate::model::{PageSize, TextFragment};
use serde::{Deserialize, Serialize};

/// One low-level drawing instruction: an operator name plus numeric arguments.
///
/// Operators are matched by name (`moveTo`, `re`, ...); anything unknown is
/// ignored by the line extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawInstruction {
    pub op: String,
    #[serde(default)]
    pub args: Vec<f64>,
}

impl DrawInstruction {
    pub fn new(op: &str, args: &[f64]) -> Self {
        DrawInstruction {
            op: op.to_string(),
            args: args.to_vec(),
        }
    }
}

/// Everything the engine needs to know about one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    pub width: f64,
    pub height: f64,
    pub fragments: Vec<TextFragment>,
    #[serde(default)]
    pub instructions: Vec<DrawInstruction>,
    /// Maps drawing coordinates into the fragments' page space. Identity if absent.
    #[serde(default)]
    pub initial_transform: Option<[f64; 6]>,
}

impl PageInput {
    pub fn new(width: f64, height: f64, fragments: Vec<TextFragment>) -> Self {
        PageInput {
            width,
            height,
            fragments,
            instructions: Vec::new(),
            initial_transform: None,
        }
    }

    pub fn with_instructions(mut self, instructions: Vec<DrawInstruction>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn size(&self) -> PageSize {
        PageSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Trait for backends that supply page text and drawing instructions.
pub trait PageSource: Send + Sync {
    /// Decode raw bytes into one PageInput per page.
    fn load_pages(&self, bytes: &[u8]) -> Result<Vec<PageInput>, TitleBlockError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
