use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Landscape => write!(f, "landscape"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    A4,
    #[serde(rename = "ANSI A")]
    AnsiA,
    #[serde(rename = "ANSI B")]
    AnsiB,
    #[serde(rename = "ANSI C")]
    AnsiC,
    #[serde(rename = "ANSI D")]
    AnsiD,
    #[serde(rename = "ANSI E")]
    AnsiE,
    Custom,
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaperSize::A0 => "A0",
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::AnsiA => "ANSI A",
            PaperSize::AnsiB => "ANSI B",
            PaperSize::AnsiC => "ANSI C",
            PaperSize::AnsiD => "ANSI D",
            PaperSize::AnsiE => "ANSI E",
            PaperSize::Custom => "Custom",
        };
        f.write_str(name)
    }
}

/// Nominal (short side, long side) in points.
const PAPER_SIZES: &[(PaperSize, f64, f64)] = &[
    (PaperSize::A4, 595.0, 842.0),
    (PaperSize::A3, 842.0, 1191.0),
    (PaperSize::A2, 1191.0, 1684.0),
    (PaperSize::A1, 1684.0, 2384.0),
    (PaperSize::A0, 2384.0, 3370.0),
    (PaperSize::AnsiA, 612.0, 792.0),
    (PaperSize::AnsiB, 792.0, 1224.0),
    (PaperSize::AnsiC, 1224.0, 1584.0),
    (PaperSize::AnsiD, 1584.0, 2448.0),
    (PaperSize::AnsiE, 2448.0, 3168.0),
];

const SIZE_TOLERANCE: f64 = 0.02;

/// Sheet-level facts about a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub orientation: Orientation,
    pub paper_size: PaperSize,
}

impl SheetInfo {
    pub fn from_dimensions(width: f64, height: f64) -> Self {
        SheetInfo {
            orientation: determine_orientation(width, height),
            paper_size: determine_paper_size(width, height),
        }
    }
}

pub fn determine_orientation(width: f64, height: f64) -> Orientation {
    if width > height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Match page dimensions against the known sheet sizes, ignoring rotation.
pub fn determine_paper_size(width: f64, height: f64) -> PaperSize {
    let short = width.abs().min(height.abs());
    let long = width.abs().max(height.abs());

    PAPER_SIZES
        .iter()
        .find(|(_, s, l)| within(short, *s) && within(long, *l))
        .map(|(size, _, _)| *size)
        .unwrap_or(PaperSize::Custom)
}

fn within(actual: f64, nominal: f64) -> bool {
    (actual - nominal).abs() <= nominal * SIZE_TOLERANCE
}
