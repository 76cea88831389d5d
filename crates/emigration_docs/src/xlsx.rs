use anyhow::{Context, Result};
use emigration_matrix::model::Report;
use emigration_matrix::scoring::ranking;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E79))
}

fn write_header(worksheet: &mut Worksheet, headers: &[String], format: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, format)
            .with_context(|| format!("Failed to write header at column {col}"))?;
    }
    Ok(())
}

/// Generate an XLSX workbook for a report's matrix.
///
/// Sheet `Matrix` holds the points per criterion and country plus the
/// weight column; sheet `Ranking` holds the weighted totals, best first.
pub fn generate_matrix_workbook(report: &Report) -> Result<Vec<u8>> {
    let matrix = report
        .matrix
        .as_ref()
        .with_context(|| format!("Report '{}' has no matrix to export", report.meta.id))?;

    let mut workbook = Workbook::new();
    let header_format = header_format();

    // Matrix sheet
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Matrix")
        .context("Failed to set sheet name: Matrix")?;

    let mut headers = matrix.header_row();
    headers.insert(1, "Gewicht".to_string());
    write_header(worksheet, &headers, &header_format)?;

    for (row_idx, criterion) in matrix.criteria.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        worksheet
            .write_string(excel_row, 0, &criterion.label)
            .with_context(|| format!("Failed to write label at row {excel_row}"))?;
        worksheet
            .write_number(excel_row, 1, criterion.weight)
            .with_context(|| format!("Failed to write weight at row {excel_row}"))?;
        for (col_idx, cell) in criterion.cells.iter().enumerate() {
            worksheet
                .write_number(excel_row, (col_idx + 2) as u16, f64::from(cell.rating.points()))
                .with_context(|| format!("Failed to write points at ({excel_row}, {col_idx})"))?;
        }
    }
    worksheet.autofit();

    // Ranking sheet
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Ranking")
        .context("Failed to set sheet name: Ranking")?;

    let headers: Vec<String> = ["#", "Land", "Code", "Punkte", "Max", "%"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    write_header(worksheet, &headers, &header_format)?;

    for (idx, score) in ranking(matrix).iter().enumerate() {
        let excel_row = (idx + 1) as u32;
        worksheet.write_number(excel_row, 0, (idx + 1) as f64)?;
        worksheet.write_string(excel_row, 1, &score.name)?;
        worksheet.write_string(excel_row, 2, &score.code)?;
        worksheet.write_number(excel_row, 3, score.points)?;
        worksheet.write_number(excel_row, 4, score.max)?;
        worksheet.write_number(excel_row, 5, f64::from(score.percent()))?;
    }
    worksheet.autofit();

    let bytes = workbook
        .save_to_buffer()
        .context("Failed to save workbook to buffer")?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emigration_matrix::model::{
        Country, Criterion, HEADER_FILL, Matrix, MatrixCell, Rating, ReportMeta,
    };
    use std::io::{Cursor, Read};

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut xml = String::new();
        file.read_to_string(&mut xml).unwrap();
        xml
    }

    fn report(matrix: Option<Matrix>) -> Report {
        Report {
            meta: ReportMeta {
                id: "xlsx".into(),
                title: "XLSX".into(),
                description: String::new(),
                file_stem: "Xlsx".into(),
            },
            matrix,
            blocks: vec![],
        }
    }

    #[test]
    fn test_generate_matrix_workbook() {
        let matrix = Matrix {
            label_header: "Kriterium".into(),
            countries: vec![Country {
                code: "UY".into(),
                name: "Uruguay".into(),
            }],
            criteria: vec![Criterion {
                label: "Klima".into(),
                weight: 1.0,
                caption: None,
                cells: vec![MatrixCell::new(Rating::VeryGood, "2400h")],
            }],
        };
        let bytes = generate_matrix_workbook(&report(Some(matrix))).unwrap();
        // XLSX files start with PK (zip format)
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");

        let workbook = part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Matrix""#));
        assert!(workbook.contains(r#"name="Ranking""#));
        assert!(workbook.find("Matrix") < workbook.find("Ranking"));

        let strings = part(&bytes, "xl/sharedStrings.xml");
        for text in ["Gewicht", "Klima", "Uruguay", "Punkte"] {
            assert!(strings.contains(text), "missing {text}");
        }

        assert!(part(&bytes, "xl/styles.xml").contains(HEADER_FILL));
    }

    #[test]
    fn test_report_without_matrix_errors() {
        let err = generate_matrix_workbook(&report(None)).unwrap_err();
        assert!(err.to_string().contains("has no matrix"));
    }

    #[test]
    fn test_header_colour_matches_docx_header_fill() {
        assert_eq!(u32::from_str_radix(HEADER_FILL, 16).unwrap(), 0x1F4E79);
    }
}
