use anyhow::Result;
use docx_rs::*;
use emigration_matrix::model::{
    Align, Block, HEADER_FILL, HEADING_COLOR, LABEL_FILL, Matrix, MatrixCell, Report, TextRun,
};
use emigration_matrix::scoring::ranking_rows;
use std::io::Cursor;
use tracing::debug;

/// A4 in twentieths of a point.
const A4_WIDTH: u32 = 11906;
const A4_HEIGHT: u32 = 16838;

const WHITE: &str = "FFFFFF";

/// Page and font settings applied to every rendered report.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxOptions {
    pub margin_cm: f32,
    pub font_family: String,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self {
            margin_cm: 1.5,
            font_family: "Calibri".into(),
        }
    }
}

fn cm_to_twips(cm: f32) -> i32 {
    (cm * 1440.0 / 2.54).round() as i32
}

// size is in half-points, so 18 = 9pt
fn half_points(pt: f32) -> usize {
    (pt * 2.0).round() as usize
}

/// Background colour for a table cell.
pub fn cell_shading(fill: &str) -> Shading {
    Shading::new().fill(fill)
}

fn tight(paragraph: Paragraph) -> Paragraph {
    paragraph.line_spacing(LineSpacing::new().before(0).after(0))
}

/// A run in the document font. `\n` becomes a line break inside the run.
fn text_run(text: &str, font: &str) -> Run {
    let mut run = Run::new().fonts(RunFonts::new().ascii(font).hi_ansi(font));
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}

fn styled_run(styled: &TextRun, font: &str) -> Run {
    let mut run = text_run(&styled.text, font);
    if styled.bold {
        run = run.bold();
    }
    if styled.italic {
        run = run.italic();
    }
    if let Some(size) = styled.size {
        run = run.size(half_points(size));
    }
    if let Some(color) = &styled.color {
        run = run.color(color.as_str());
    }
    run
}

/// Build a table from a 2D array; the first row is the header.
///
/// Header cells are shaded `header_color` with bold white text. Every cell
/// uses `size_pt` text with no space after the paragraph.
pub fn styled_table(rows: &[Vec<String>], header_color: &str, size_pt: f32, font: &str) -> Table {
    let size = half_points(size_pt);
    let table_rows: Vec<TableRow> = rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let cells: Vec<TableCell> = row
                .iter()
                .map(|text| {
                    let mut run = text_run(text, font).size(size);
                    if row_idx == 0 {
                        run = run.bold().color(WHITE);
                    }
                    let paragraph =
                        Paragraph::new().add_run(run).line_spacing(LineSpacing::new().after(0));
                    let cell = TableCell::new().add_paragraph(paragraph);
                    if row_idx == 0 {
                        cell.shading(cell_shading(header_color))
                    } else {
                        cell
                    }
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();

    Table::new(table_rows)
}

/// One scored matrix cell: symbol, `(points)` and the note, centred and
/// shaded by rating.
pub fn matrix_cell(cell: &MatrixCell, font: &str) -> TableCell {
    let symbol = tight(
        Paragraph::new()
            .align(AlignmentType::Center)
            .add_run(text_run(cell.rating.symbol(), font).bold().size(22)),
    );
    let points = tight(
        Paragraph::new()
            .align(AlignmentType::Center)
            .add_run(text_run(&format!("({})", cell.rating.points()), font).size(16)),
    );
    let note = tight(
        Paragraph::new()
            .align(AlignmentType::Center)
            .add_run(text_run(&cell.note, font).size(14).italic()),
    );

    TableCell::new()
        .add_paragraph(symbol)
        .add_paragraph(points)
        .add_paragraph(note)
        .shading(cell_shading(cell.rating.fill()))
}

/// The detail matrix: header row of country codes, one row per criterion.
pub fn matrix_table(matrix: &Matrix, font: &str) -> Table {
    let header_cells: Vec<TableCell> = matrix
        .header_row()
        .iter()
        .map(|text| {
            let run = text_run(text, font).bold().size(16).color(WHITE);
            TableCell::new()
                .add_paragraph(tight(Paragraph::new().align(AlignmentType::Center).add_run(run)))
                .shading(cell_shading(HEADER_FILL))
        })
        .collect();

    let mut rows = vec![TableRow::new(header_cells)];
    for criterion in &matrix.criteria {
        let label = TableCell::new()
            .add_paragraph(tight(
                Paragraph::new().add_run(text_run(&criterion.caption(), font).bold().size(16)),
            ))
            .shading(cell_shading(LABEL_FILL));

        let cells = std::iter::once(label)
            .chain(criterion.cells.iter().map(|cell| matrix_cell(cell, font)))
            .collect();
        rows.push(TableRow::new(cells));
    }

    Table::new(rows)
}

/// Style id of a `styled_heading` level: `Title` for 0, `HeadingN` otherwise.
fn outline_style_id(level: u8) -> String {
    match level {
        0 => "Title".to_string(),
        n => format!("Heading{n}"),
    }
}

// Sizes and colours follow Word's default template.
fn outline_styles() -> Vec<Style> {
    vec![
        Style::new("Title", StyleType::Paragraph)
            .name("Title")
            .size(52)
            .color("17365D"),
        Style::new("Heading1", StyleType::Paragraph)
            .name("heading 1")
            .size(28)
            .bold()
            .color("365F91"),
        Style::new("Heading2", StyleType::Paragraph)
            .name("heading 2")
            .size(26)
            .bold()
            .color("4F81BD"),
        Style::new("Heading3", StyleType::Paragraph)
            .name("heading 3")
            .size(22)
            .bold()
            .color("4F81BD"),
    ]
}

fn heading(text: &str, size: f32, color: &str, font: &str) -> Paragraph {
    Paragraph::new().add_run(text_run(text, font).bold().size(half_points(size)).color(color))
}

fn plain(text: &str, font: &str) -> Paragraph {
    Paragraph::new().add_run(text_run(text, font))
}

fn append_block(mut docx: Docx, block: &Block, report: &Report, font: &str) -> Docx {
    match block {
        Block::Heading { text, size, color } => docx.add_paragraph(heading(text, *size, color, font)),
        Block::StyledHeading { text, level, align } => {
            let mut paragraph = Paragraph::new()
                .style(&outline_style_id(*level))
                .add_run(text_run(text, font));
            if *align == Align::Center {
                paragraph = paragraph.align(AlignmentType::Center);
            }
            docx.add_paragraph(paragraph)
        }
        Block::Paragraph { runs, align } => {
            let mut paragraph = Paragraph::new();
            if *align == Align::Center {
                paragraph = paragraph.align(AlignmentType::Center);
            }
            for run in runs {
                paragraph = paragraph.add_run(styled_run(run, font));
            }
            docx.add_paragraph(paragraph)
        }
        Block::Text { text } => docx.add_paragraph(plain(text, font)),
        Block::Lines { lines } => {
            for line in lines {
                docx = docx.add_paragraph(plain(line, font));
            }
            docx
        }
        Block::Spacer => docx.add_paragraph(Paragraph::new()),
        Block::PageBreak => {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        }
        Block::Rule { width } => docx.add_paragraph(plain(&"─".repeat(*width), font)),
        Block::Table {
            rows,
            header_color,
            font_size,
        } => docx.add_table(styled_table(rows, header_color, *font_size, font)),
        Block::Matrix { legend } => {
            // Validation guarantees the matrix exists for this block.
            let Some(matrix) = &report.matrix else {
                return docx;
            };
            if *legend {
                docx = docx
                    .add_paragraph(plain(&Matrix::legend(), font))
                    .add_paragraph(Paragraph::new())
                    .add_paragraph(
                        Paragraph::new().add_run(text_run(&matrix.abbreviations(), font).size(16)),
                    )
                    .add_paragraph(Paragraph::new());
            }
            docx.add_table(matrix_table(matrix, font))
        }
        Block::ComputedRanking { title } => {
            let Some(matrix) = &report.matrix else {
                return docx;
            };
            if let Some(title) = title {
                docx = docx
                    .add_paragraph(heading(title, 12.0, HEADING_COLOR, font))
                    .add_paragraph(Paragraph::new());
            }
            docx.add_table(styled_table(&ranking_rows(matrix), HEADER_FILL, 9.0, font))
        }
    }
}

/// Render a full report as DOCX bytes.
pub fn render_report(report: &Report, options: &DocxOptions) -> Result<Vec<u8>> {
    let margin = cm_to_twips(options.margin_cm);
    let mut docx = Docx::new().page_size(A4_WIDTH, A4_HEIGHT).page_margin(
        PageMargin::new()
            .top(margin)
            .bottom(margin)
            .left(margin)
            .right(margin),
    );
    for style in outline_styles() {
        docx = docx.add_style(style);
    }

    for block in &report.blocks {
        docx = append_block(docx, block, report, &options.font_family);
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to pack DOCX: {}", e))?;

    let bytes = buf.into_inner();
    debug!(
        report = %report.meta.id,
        blocks = report.blocks.len(),
        bytes = bytes.len(),
        "Rendered DOCX"
    );
    Ok(bytes)
}
