//! Emigration matrix: report definitions, the country × criteria model and
//! weighted scoring.

pub mod catalog;
pub mod model;
pub mod scoring;

pub use catalog::{ReportSummary, load, parse};
pub use model::{
    Align, Block, Country, Criterion, Matrix, MatrixCell, Rating, Report, ReportMeta, TextRun,
};
pub use scoring::{CountryScore, ranking, scores};
