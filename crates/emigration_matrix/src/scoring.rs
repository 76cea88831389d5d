use tracing::debug;

use crate::model::{Matrix, format_weight};

/// Weighted total for one country (matrix column).
#[derive(Debug, Clone, PartialEq)]
pub struct CountryScore {
    pub code: String,
    pub name: String,
    pub points: f64,
    pub max: f64,
}

impl CountryScore {
    /// Share of the maximum, rounded to whole percent.
    pub fn percent(&self) -> u32 {
        if self.max <= 0.0 {
            return 0;
        }
        (self.points / self.max * 100.0).round() as u32
    }

    /// `"41/48"` style display of points against the maximum.
    pub fn fraction(&self) -> String {
        format!("{}/{}", format_weight(self.points), format_weight(self.max))
    }
}

/// Sum of `points × weight` per country, in column order.
pub fn scores(matrix: &Matrix) -> Vec<CountryScore> {
    let max: f64 = matrix.criteria.iter().map(|c| 2.0 * c.weight).sum();

    matrix
        .countries
        .iter()
        .enumerate()
        .map(|(col, country)| {
            let points = matrix
                .criteria
                .iter()
                .filter_map(|c| c.cells.get(col).map(|cell| f64::from(cell.rating.points()) * c.weight))
                .sum();
            CountryScore {
                code: country.code.clone(),
                name: country.name.clone(),
                points,
                max,
            }
        })
        .collect()
}

/// Countries ordered by score, best first. Ties keep column order.
pub fn ranking(matrix: &Matrix) -> Vec<CountryScore> {
    let mut ranked = scores(matrix);
    ranked.sort_by(|a, b| b.points.total_cmp(&a.points));
    debug!(
        countries = ranked.len(),
        leader = ranked.first().map(|s| s.code.as_str()).unwrap_or("-"),
        "Computed matrix ranking"
    );
    ranked
}

/// Ranking as table rows including a header: `#`, `Land`, `Punkte`, `%`.
pub fn ranking_rows(matrix: &Matrix) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "#".to_string(),
        "Land".to_string(),
        "Punkte".to_string(),
        "%".to_string(),
    ]];
    for (idx, score) in ranking(matrix).iter().enumerate() {
        rows.push(vec![
            (idx + 1).to_string(),
            score.name.clone(),
            score.fraction(),
            format!("{}%", score.percent()),
        ]);
    }
    rows
}
