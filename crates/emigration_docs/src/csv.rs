use anyhow::{Context, Result};
use emigration_matrix::model::Matrix;

/// Export a matrix as CSV: one row per criterion with its weight and the
/// points per country.
///
/// Each field is properly quoted/escaped by the `csv` crate.
pub fn generate_matrix_csv(matrix: &Matrix) -> Result<String> {
    let mut headers = vec![matrix.label_header.clone(), "Gewicht".to_string()];
    headers.extend(matrix.countries.iter().map(|c| c.code.clone()));

    let rows: Vec<Vec<String>> = matrix
        .criteria
        .iter()
        .map(|criterion| {
            let mut row = vec![criterion.label.clone(), criterion.weight.to_string()];
            row.extend(criterion.cells.iter().map(|c| c.rating.points().to_string()));
            row
        })
        .collect();

    generate_delimited(&headers, &rows, b',')
}

fn generate_delimited(headers: &[String], rows: &[Vec<String>], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(headers)
        .context("Failed to write header record")?;

    for row in rows {
        writer
            .write_record(row)
            .context("Failed to write data record")?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;

    String::from_utf8(bytes).context("CSV output contained invalid UTF-8")
}
