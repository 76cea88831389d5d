// Report rendering (DOCX, XLSX, CSV, Markdown)

pub mod csv;
pub mod docx;
pub mod markdown;
pub mod xlsx;

use anyhow::{Context, Result};
use emigration_core::OutputFormat;
use emigration_matrix::model::Report;

pub use docx::DocxOptions;

/// Render a report into the bytes of the requested format.
pub fn render(report: &Report, format: OutputFormat, options: &DocxOptions) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Docx => docx::render_report(report, options),
        OutputFormat::Xlsx => xlsx::generate_matrix_workbook(report),
        OutputFormat::Csv => {
            let matrix = report
                .matrix
                .as_ref()
                .with_context(|| format!("Report '{}' has no matrix to export", report.meta.id))?;
            Ok(crate::csv::generate_matrix_csv(matrix)?.into_bytes())
        }
        OutputFormat::Md => Ok(markdown::render_markdown(report).into_bytes()),
    }
}
