use emigration_matrix::model::{Block, Matrix, Report, TextRun};
use emigration_matrix::scoring::ranking_rows;

/// Generate a Markdown table from rows; the first row is the header.
///
/// Pipes in cell content are escaped and line breaks become `<br>` to keep
/// the table structure intact.
pub fn generate_markdown_table(rows: &[Vec<String>]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };
    if header.is_empty() {
        return String::new();
    }

    let mut lines = Vec::new();

    let header_cells: Vec<String> = header.iter().map(|h| escape_cell(h)).collect();
    lines.push(format!("| {} |", header_cells.join(" | ")));

    let separators: Vec<&str> = header.iter().map(|_| "---").collect();
    lines.push(format!("| {} |", separators.join(" | ")));

    for row in body {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}

fn matrix_rows(matrix: &Matrix) -> Vec<Vec<String>> {
    let mut rows = vec![matrix.header_row()];
    for criterion in &matrix.criteria {
        let mut row = vec![criterion.caption()];
        row.extend(criterion.cells.iter().map(|cell| {
            format!(
                "{} ({}) {}",
                cell.rating.symbol(),
                cell.rating.points(),
                cell.note
            )
        }));
        rows.push(row);
    }
    rows
}

/// Emphasis markers must hug the text, so surrounding whitespace stays
/// outside them.
fn inline(run: &TextRun) -> String {
    let text = run.text.trim();
    if text.is_empty() {
        return run.text.clone();
    }
    let leading = &run.text[..run.text.len() - run.text.trim_start().len()];
    let trailing = &run.text[run.text.trim_end().len()..];
    match (run.bold, run.italic) {
        (true, true) => format!("{leading}***{text}***{trailing}"),
        (true, false) => format!("{leading}**{text}**{trailing}"),
        (false, true) => format!("{leading}*{text}*{trailing}"),
        (false, false) => run.text.clone(),
    }
}

/// Render a report as a Markdown preview.
///
/// Spacers collapse into paragraph breaks; page breaks become `---`.
pub fn render_markdown(report: &Report) -> String {
    let mut parts = vec![format!("# {}", report.meta.title)];

    for block in &report.blocks {
        match block {
            Block::Heading { text, .. } => parts.push(format!("## {text}")),
            Block::StyledHeading { text, level, .. } => {
                parts.push(format!("{} {text}", "#".repeat(usize::from(*level) + 1)))
            }
            Block::Paragraph { runs, .. } => {
                parts.push(runs.iter().map(inline).collect::<String>())
            }
            Block::Text { text } => parts.push(text.clone()),
            Block::Lines { lines } => parts.push(lines.join("  \n")),
            Block::Spacer => {}
            Block::PageBreak => parts.push("---".to_string()),
            Block::Rule { .. } => parts.push("***".to_string()),
            Block::Table { rows, .. } => parts.push(generate_markdown_table(rows)),
            Block::Matrix { legend } => {
                if let Some(matrix) = &report.matrix {
                    if *legend {
                        parts.push(Matrix::legend());
                        parts.push(format!("*{}*", matrix.abbreviations()));
                    }
                    parts.push(generate_markdown_table(&matrix_rows(matrix)));
                }
            }
            Block::ComputedRanking { title } => {
                if let Some(matrix) = &report.matrix {
                    if let Some(title) = title {
                        parts.push(format!("### {title}"));
                    }
                    parts.push(generate_markdown_table(&ranking_rows(matrix)));
                }
            }
        }
    }

    parts.retain(|p| !p.is_empty());
    parts.join("\n\n")
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', "<br>")
}
