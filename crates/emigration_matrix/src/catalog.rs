use emigration_core::ReportError;
use rust_embed::RustEmbed;
use tracing::{debug, info};

use crate::model::Report;

/// Report definitions compiled into the binary, one `<id>.toml` per report.
#[derive(RustEmbed)]
#[folder = "reports/"]
struct ReportAssets;

/// Listing entry for `--list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Ids of all embedded reports, sorted.
pub fn ids() -> Vec<String> {
    let mut ids: Vec<String> = ReportAssets::iter()
        .filter_map(|path| path.strip_suffix(".toml").map(str::to_string))
        .collect();
    ids.sort();
    ids
}

/// Summaries of all embedded reports, sorted by id.
pub fn list() -> Result<Vec<ReportSummary>, ReportError> {
    ids()
        .iter()
        .map(|id| {
            let report = load(id)?;
            Ok(ReportSummary {
                id: report.meta.id,
                title: report.meta.title,
                description: report.meta.description,
            })
        })
        .collect()
}

/// Loads and validates an embedded report by id.
pub fn load(id: &str) -> Result<Report, ReportError> {
    let file = ReportAssets::get(&format!("{id}.toml"))
        .ok_or_else(|| ReportError::UnknownReport(id.to_string()))?;
    let source = std::str::from_utf8(&file.data)
        .map_err(|e| ReportError::InvalidDefinition(format!("{id}.toml is not UTF-8: {e}")))?;

    let report = parse(source)?;
    if report.meta.id != id {
        return Err(ReportError::InvalidDefinition(format!(
            "{id}.toml declares id '{}'",
            report.meta.id
        )));
    }
    info!(report = id, blocks = report.blocks.len(), "Loaded report definition");
    Ok(report)
}

/// Parses and validates a report definition from TOML source.
pub fn parse(source: &str) -> Result<Report, ReportError> {
    let report: Report =
        toml::from_str(source).map_err(|e| ReportError::InvalidDefinition(e.to_string()))?;
    report.validate()?;
    debug!(
        report = %report.meta.id,
        criteria = report.matrix.as_ref().map_or(0, |m| m.criteria.len()),
        "Validated report definition"
    );
    Ok(report)
}
