//! Emigration report generator.
//!
//! Renders one of the embedded emigration analyses (countries scored against
//! weighted criteria) into a Word document, or exports its matrix as
//! XLSX/CSV/Markdown.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use emigration_core::config::ReportConfig;
use emigration_core::{OutputFormat, ReportError, logging};
use emigration_docs::DocxOptions;
use emigration_matrix::catalog;
use emigration_matrix::model::Report;
use emigration_matrix::scoring::ranking;

/// Emigration report generator - renders country comparison documents
#[derive(Parser, Debug)]
#[command(name = "emigration-report")]
#[command(about = "Render emigration analysis reports (DOCX, XLSX, CSV, Markdown)", long_about = None)]
#[command(version)]
struct Args {
    /// Report to render (see --list)
    #[arg(short, long, value_name = "ID")]
    report: Option<String>,

    /// Output file (default: <output_dir>/<report file name>)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format: docx, xlsx, csv or md
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Path to configuration file (default: ~/.emigration/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List embedded reports and exit
    #[arg(short, long)]
    list: bool,

    /// Print the ranking computed from the matrix and exit
    #[arg(long)]
    scores: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(report_error) = e.downcast_ref::<ReportError>() {
                eprintln!("{}", report_error.user_message());
            }
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Domain errors exit with their category's code, anything else with 1.
fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<ReportError>()
        .map(|e| e.category().exit_code())
        .unwrap_or(1)
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => ReportConfig::load_from_path(path)?,
        None => ReportConfig::load()?,
    };
    config.validate()?;

    let filter = logging::filter_for(args.verbose, args.quiet, &config.log_level);
    // Keep the guard alive until the end of the run so file logs are flushed.
    let _guard = match logging::init_logging(&filter) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging unavailable: {e:#}");
            None
        }
    };

    info!("Emigration report generator v{}", env!("CARGO_PKG_VERSION"));

    let stdout = io::stdout();
    execute(args, &config, &mut stdout.lock())
}

fn execute(args: &Args, config: &ReportConfig, out: &mut impl Write) -> Result<()> {
    if args.list {
        return print_list(out);
    }

    let report_id = args.report.as_deref().unwrap_or(&config.default_report);
    let report = catalog::load(report_id)?;

    if args.scores {
        return print_scores(&report, out);
    }

    let format = args.format.unwrap_or(config.default_format);
    let path = output_path(args.output.as_deref(), config, &report, format)?;
    let options = DocxOptions {
        margin_cm: config.margin_cm,
        font_family: config.font_family.clone(),
    };

    let started = chrono::Local::now();
    write_report(&report, format, &options, &path)?;
    info!(
        report = %report.meta.id,
        %format,
        at = %started.format("%Y-%m-%d %H:%M:%S"),
        "Wrote {}",
        path.display()
    );

    if !args.quiet {
        writeln!(out, "{}", completion_message(format))?;
        writeln!(out, "Gespeichert unter: {}", path.display())?;
    }
    Ok(())
}

fn completion_message(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Docx => "Word-Dokument erfolgreich erstellt!",
        _ => "Dokument erfolgreich erstellt!",
    }
}

/// Explicit `--output` wins; otherwise `<output_dir>/<file_stem>.<ext>`.
fn output_path(
    explicit: Option<&Path>,
    config: &ReportConfig,
    report: &Report,
    format: OutputFormat,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.extension().and_then(|e| e.to_str()) != Some(format.extension()) {
            warn!(
                "Output {} does not end in .{}; writing {} anyway",
                path.display(),
                format.extension(),
                format
            );
        }
        return Ok(path.to_path_buf());
    }
    let dir = config.resolved_output_dir()?;
    Ok(dir.join(format!("{}.{}", report.meta.file_stem, format.extension())))
}

fn write_report(
    report: &Report,
    format: OutputFormat,
    options: &DocxOptions,
    path: &Path,
) -> Result<()> {
    let bytes = emigration_docs::render(report, format, options)
        .map_err(|e| ReportError::Render(format!("{e:#}")))?;
    debug!(bytes = bytes.len(), "Rendered {} as {}", report.meta.id, format);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(ReportError::from)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, bytes)
        .map_err(ReportError::from)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn print_list(out: &mut impl Write) -> Result<()> {
    let summaries = catalog::list()?;
    writeln!(out, "Available reports:")?;
    for summary in summaries {
        writeln!(out, "  {:<14} {}", summary.id, summary.title)?;
        if !summary.description.is_empty() {
            writeln!(out, "  {:<14} {}", "", summary.description)?;
        }
    }
    Ok(())
}

fn print_scores(report: &Report, out: &mut impl Write) -> Result<()> {
    let matrix = report
        .matrix
        .as_ref()
        .with_context(|| format!("Report '{}' has no matrix", report.meta.id))?;

    writeln!(out, "{} - Punkte x Gewicht", report.meta.title)?;
    writeln!(out, "{:>3}  {:<16} {:>10} {:>5}", "#", "Land", "Punkte", "%")?;
    for (idx, score) in ranking(matrix).iter().enumerate() {
        writeln!(
            out,
            "{:>3}  {:<16} {:>10} {:>4}%",
            idx + 1,
            score.name,
            score.fraction(),
            score.percent()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_flags() {
        let args = Args::try_parse_from([
            "emigration-report",
            "-r",
            "corona",
            "-f",
            "xlsx",
            "-vv",
            "--scores",
        ])
        .unwrap();
        assert_eq!(args.report.as_deref(), Some("corona"));
        assert_eq!(args.format, Some(OutputFormat::Xlsx));
        assert_eq!(args.verbose, 2);
        assert!(args.scores);
        assert!(!args.list);
    }

    #[test]
    fn test_args_reject_unknown_format() {
        assert!(Args::try_parse_from(["emigration-report", "--format", "pdf"]).is_err());
    }

    #[test]
    fn test_output_path_defaults_to_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            output_dir: Some(tmp.path().to_path_buf()),
            ..ReportConfig::default()
        };
        let report = catalog::load("tennis-wind").unwrap();

        let path = output_path(None, &config, &report, OutputFormat::Docx).unwrap();
        assert_eq!(
            path,
            tmp.path()
                .join("Auswanderungsanalyse_2025_FINAL_TENNIS_WIND.docx")
        );

        let path = output_path(None, &config, &report, OutputFormat::Csv).unwrap();
        assert_eq!(path.extension().unwrap(), "csv");
    }

    #[test]
    fn test_explicit_output_path_wins() {
        let config = ReportConfig::default();
        let report = catalog::load("corona").unwrap();
        let explicit = PathBuf::from("out/analyse.docx");
        let path = output_path(Some(&explicit), &config, &report, OutputFormat::Docx).unwrap();
        assert_eq!(path, explicit);
    }

    #[test]
    fn test_write_report_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a").join("b").join("report.docx");
        let report = catalog::load("tennis-wind").unwrap();

        write_report(&report, OutputFormat::Docx, &DocxOptions::default(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_write_report_markdown() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.md");
        let report = catalog::load("corona").unwrap();

        write_report(&report, OutputFormat::Md, &DocxOptions::default(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("CORONA"));
    }

    #[test]
    fn test_write_report_into_file_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("report.docx");
        let report = catalog::load("tennis-wind").unwrap();

        let err = write_report(&report, OutputFormat::Docx, &DocxOptions::default(), &path)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create directory"));
        assert_eq!(exit_code(&err), 4);
    }

    fn args_for(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("emigration-report").chain(extra.iter().copied()))
            .unwrap()
    }

    fn config_in(dir: &Path) -> ReportConfig {
        ReportConfig {
            output_dir: Some(dir.to_path_buf()),
            ..ReportConfig::default()
        }
    }

    #[test]
    fn test_execute_prints_word_completion_message() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        execute(&args_for(&["-r", "zypern"]), &config_in(tmp.path()), &mut out).unwrap();

        let expected = tmp.path().join("Auswanderungsanalyse_2025_MIT_ZYPERN.docx");
        assert!(expected.exists());
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Word-Dokument erfolgreich erstellt!");
        assert_eq!(lines[1], format!("Gespeichert unter: {}", expected.display()));
    }

    #[test]
    fn test_execute_other_formats_use_generic_message() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        execute(
            &args_for(&["-r", "komplett", "-f", "csv"]),
            &config_in(tmp.path()),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Dokument erfolgreich erstellt!\n"));
        assert!(tmp.path().join("Auswanderungsanalyse_2025_KOMPLETT_FINAL.csv").exists());
    }

    #[test]
    fn test_execute_quiet_prints_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        execute(&args_for(&["-q"]), &config_in(tmp.path()), &mut out).unwrap();

        assert!(out.is_empty());
        assert!(tmp.path().join("Auswanderungsanalyse_2025_FINAL_TENNIS_WIND.docx").exists());
    }

    #[test]
    fn test_execute_list_names_every_report() {
        let mut out = Vec::new();
        execute(&args_for(&["--list"]), &ReportConfig::default(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        for id in catalog::ids() {
            assert!(text.contains(&id), "missing {id}");
        }
    }

    #[test]
    fn test_execute_scores_prints_ranking() {
        let mut out = Vec::new();
        execute(
            &args_for(&["-r", "tennis-wind", "--scores"]),
            &ReportConfig::default(),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let first = text.lines().nth(2).unwrap();
        assert!(first.contains("Neuseeland"));
        assert!(first.contains("40/48"));
        assert!(first.ends_with("83%"));
    }

    #[test]
    fn test_execute_scores_without_matrix_fails() {
        let mut out = Vec::new();
        let err = execute(
            &args_for(&["-r", "erweitert", "--scores"]),
            &ReportConfig::default(),
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("has no matrix"));
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_unknown_report_exits_with_user_error_code() {
        let mut out = Vec::new();
        let err = execute(&args_for(&["-r", "atlantis"]), &ReportConfig::default(), &mut out)
            .unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }
}
