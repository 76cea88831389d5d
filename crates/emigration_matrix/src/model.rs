use std::collections::HashSet;

use emigration_core::ReportError;
use serde::{Deserialize, Serialize};

/// Fill of the header row in every styled table.
pub const HEADER_FILL: &str = "1F4E79";
/// Fill of the criterion label column in the matrix.
pub const LABEL_FILL: &str = "D9E2F3";
/// Default heading colour (RGB 47, 84, 150).
pub const HEADING_COLOR: &str = "2F5496";
/// Deepest outline level a `styled_heading` block may use.
pub const MAX_HEADING_LEVEL: u8 = 3;

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// Three-step verdict for one country on one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "++")]
    VeryGood,
    #[serde(rename = "o")]
    Medium,
    #[serde(rename = "--")]
    Poor,
}

impl Rating {
    pub const ALL: [Rating; 3] = [Rating::VeryGood, Rating::Medium, Rating::Poor];

    pub fn points(self) -> u8 {
        match self {
            Self::VeryGood => 2,
            Self::Medium => 1,
            Self::Poor => 0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::VeryGood => "++",
            Self::Medium => "o",
            Self::Poor => "--",
        }
    }

    /// Cell background used in the detail matrix.
    pub fn fill(self) -> &'static str {
        match self {
            Self::VeryGood => "C6EFCE",
            Self::Medium => "FFEB9C",
            Self::Poor => "FFC7CE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryGood => "Sehr gut",
            Self::Medium => "Mittel",
            Self::Poor => "Schlecht",
        }
    }
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// One matrix cell: a rating plus a short note. Notes may contain `\n`.
///
/// Definitions write cells as `["++", "Neutral"]`; the points are always
/// derived from the rating.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(Rating, String)")]
pub struct MatrixCell {
    pub rating: Rating,
    pub note: String,
}

impl From<(Rating, String)> for MatrixCell {
    fn from((rating, note): (Rating, String)) -> Self {
        Self { rating, note }
    }
}

impl MatrixCell {
    pub fn new(rating: Rating, note: impl Into<String>) -> Self {
        Self {
            rating,
            note: note.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Criterion {
    pub label: String,
    pub weight: f64,
    /// Overrides the rendered row label (defaults to `"{label} x{weight}"`).
    #[serde(default)]
    pub caption: Option<String>,
    pub cells: Vec<MatrixCell>,
}

impl Criterion {
    pub fn caption(&self) -> String {
        match &self.caption {
            Some(caption) => caption.clone(),
            None => format!("{} x{}", self.label, format_weight(self.weight)),
        }
    }
}

/// Countries (columns) scored against weighted criteria (rows).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Matrix {
    #[serde(default = "default_label_header")]
    pub label_header: String,
    pub countries: Vec<Country>,
    pub criteria: Vec<Criterion>,
}

fn default_label_header() -> String {
    "Kriterium".into()
}

impl Matrix {
    /// `"UY=Uruguay, NZ=Neuseeland, ..."` in column order.
    pub fn abbreviations(&self) -> String {
        self.countries
            .iter()
            .map(|c| format!("{}={}", c.code, c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"++ = Sehr gut (2) | o = Mittel (1) | -- = Schlecht (0)"`
    pub fn legend() -> String {
        Rating::ALL
            .iter()
            .map(|r| format!("{} = {} ({})", r.symbol(), r.label(), r.points()))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn header_row(&self) -> Vec<String> {
        std::iter::once(self.label_header.clone())
            .chain(self.countries.iter().map(|c| c.code.clone()))
            .collect()
    }

    fn validate(&self) -> Result<(), ReportError> {
        if self.countries.is_empty() {
            return Err(invalid("matrix has no countries"));
        }
        if self.criteria.is_empty() {
            return Err(invalid("matrix has no criteria"));
        }

        let mut seen = HashSet::new();
        for country in &self.countries {
            if country.code.trim().is_empty() {
                return Err(invalid("matrix country with empty code"));
            }
            if !seen.insert(country.code.as_str()) {
                return Err(invalid(format!(
                    "duplicate country code '{}'",
                    country.code
                )));
            }
        }

        for criterion in &self.criteria {
            if !criterion.weight.is_finite() || criterion.weight <= 0.0 {
                return Err(invalid(format!(
                    "criterion '{}' has invalid weight {}",
                    criterion.label, criterion.weight
                )));
            }
            if criterion.cells.len() != self.countries.len() {
                return Err(invalid(format!(
                    "criterion '{}' has {} cells, expected {}",
                    criterion.label,
                    criterion.cells.len(),
                    self.countries.len()
                )));
            }
        }
        Ok(())
    }
}

/// Renders `2.0` as `2` and `1.5` as `1.5`.
pub fn format_weight(weight: f64) -> String {
    if weight.fract().abs() < 1e-9 {
        format!("{}", weight as i64)
    } else {
        format!("{weight}")
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// A span of text with uniform formatting. `size` is in points.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub size: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Self::default()
        }
    }
}

/// One piece of document content, rendered top to bottom.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        text: String,
        #[serde(default = "default_heading_size")]
        size: f32,
        #[serde(default = "default_heading_color")]
        color: String,
    },
    /// A heading in Word's built-in outline styles: level 0 is the document
    /// title, 1 to 3 are `Heading 1` to `Heading 3`.
    StyledHeading {
        text: String,
        level: u8,
        #[serde(default)]
        align: Align,
    },
    Paragraph {
        runs: Vec<TextRun>,
        #[serde(default)]
        align: Align,
    },
    Text {
        text: String,
    },
    Lines {
        lines: Vec<String>,
    },
    Spacer,
    PageBreak,
    Rule {
        #[serde(default = "default_rule_width")]
        width: usize,
    },
    Table {
        rows: Vec<Vec<String>>,
        #[serde(default = "default_header_fill")]
        header_color: String,
        /// Point size of every cell.
        #[serde(default = "default_table_size")]
        font_size: f32,
    },
    /// The report's detail matrix, optionally preceded by legend lines.
    Matrix {
        #[serde(default = "default_true")]
        legend: bool,
    },
    /// Ranking table computed from the matrix scores.
    ComputedRanking {
        #[serde(default)]
        title: Option<String>,
    },
}

fn default_heading_size() -> f32 {
    14.0
}

fn default_heading_color() -> String {
    HEADING_COLOR.into()
}

fn default_table_size() -> f32 {
    9.0
}

fn default_rule_width() -> usize {
    70
}

fn default_header_fill() -> String {
    HEADER_FILL.into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportMeta {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Output file name without extension.
    pub file_stem: String,
}

/// A complete report definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    #[serde(default)]
    pub matrix: Option<Matrix>,
    pub blocks: Vec<Block>,
}

impl Report {
    /// Checks every structural invariant the renderers rely on.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.meta.id.trim().is_empty() {
            return Err(invalid("meta.id is empty"));
        }
        if self.meta.file_stem.trim().is_empty() {
            return Err(invalid("meta.file_stem is empty"));
        }
        if self
            .meta
            .file_stem
            .contains(|c: char| matches!(c, '/' | '\\' | ':'))
        {
            return Err(invalid(format!(
                "meta.file_stem '{}' must be a bare file name",
                self.meta.file_stem
            )));
        }

        if let Some(matrix) = &self.matrix {
            matrix.validate()?;
        }

        for (idx, block) in self.blocks.iter().enumerate() {
            self.validate_block(idx, block)?;
        }
        Ok(())
    }

    fn validate_block(&self, idx: usize, block: &Block) -> Result<(), ReportError> {
        match block {
            Block::Heading { color, .. } => check_color(idx, color),
            Block::StyledHeading { level, .. } if *level > MAX_HEADING_LEVEL => {
                Err(invalid(format!(
                    "block {idx}: heading level {level} is deeper than {MAX_HEADING_LEVEL}"
                )))
            }
            Block::Paragraph { runs, .. } => {
                for run in runs {
                    if let Some(color) = &run.color {
                        check_color(idx, color)?;
                    }
                }
                Ok(())
            }
            Block::Table {
                rows,
                header_color,
                font_size,
            } => {
                check_color(idx, header_color)?;
                if !font_size.is_finite() || *font_size <= 0.0 {
                    return Err(invalid(format!(
                        "block {idx}: table font size {font_size} must be positive"
                    )));
                }
                let Some(header) = rows.first() else {
                    return Err(invalid(format!("block {idx}: table has no rows")));
                };
                if header.is_empty() {
                    return Err(invalid(format!("block {idx}: table header is empty")));
                }
                for (row_idx, row) in rows.iter().enumerate() {
                    if row.len() != header.len() {
                        return Err(invalid(format!(
                            "block {idx}: table row {row_idx} has {} cells, header has {}",
                            row.len(),
                            header.len()
                        )));
                    }
                }
                Ok(())
            }
            Block::Matrix { .. } | Block::ComputedRanking { .. } if self.matrix.is_none() => Err(
                invalid(format!("block {idx}: report has no [matrix] section")),
            ),
            _ => Ok(()),
        }
    }
}

fn check_color(idx: usize, color: &str) -> Result<(), ReportError> {
    if color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(invalid(format!(
            "block {idx}: '{color}' is not a six-digit hex colour"
        )))
    }
}

fn invalid(msg: impl Into<String>) -> ReportError {
    ReportError::InvalidDefinition(msg.into())
}
