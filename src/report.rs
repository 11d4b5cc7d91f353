//! Text rendering of the two reports.
//!
//! Output is plain text so it can be asserted on; colour is only used for the
//! readiness narration in [`crate::visual`].

use std::fmt;

use crate::error::Result;
use crate::models::{BreweryStats, StyleAbv};
use crate::repository::{BeerRepository, TOP_BREWERIES_LIMIT};

const NULL_CELL: &str = "NaN";

/// Which report a binary prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    AvgAbv,
    TopBreweries,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::AvgAbv => "AVERAGE ABV BY BEER STYLE",
            ReportKind::TopBreweries => "TOP 10 BREWERIES BY NUMBER OF BEERS",
        }
    }

    pub fn banner_width(&self) -> usize {
        match self {
            ReportKind::AvgAbv => 60,
            ReportKind::TopBreweries => 80,
        }
    }
}

/// A materialized query result, ready to print
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    AvgAbv(Vec<StyleAbv>),
    TopBreweries(Vec<BreweryStats>),
}

impl Report {
    /// Run the query backing `kind`
    pub async fn collect<R>(kind: ReportKind, repo: &mut R) -> Result<Self>
    where
        R: BeerRepository + ?Sized,
    {
        Ok(match kind {
            ReportKind::AvgAbv => Report::AvgAbv(repo.avg_abv_by_style().await?),
            ReportKind::TopBreweries => {
                Report::TopBreweries(repo.top_breweries(TOP_BREWERIES_LIMIT).await?)
            }
        })
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Report::AvgAbv(_) => ReportKind::AvgAbv,
            Report::TopBreweries(_) => ReportKind::TopBreweries,
        }
    }

    pub fn table(&self) -> Table {
        match self {
            Report::AvgAbv(rows) => {
                let mut table = Table::new(&["beer_style", "avg_abv", "beer_count"]);
                for row in rows {
                    table.push(vec![
                        text_cell(row.beer_style.as_deref()),
                        decimal_cell(row.avg_abv, 2),
                        row.beer_count.to_string(),
                    ]);
                }
                table
            }
            Report::TopBreweries(rows) => {
                let mut table = Table::new(&[
                    "brewery_name",
                    "brewery_location",
                    "beer_count",
                    "avg_abv",
                    "avg_ibu",
                ]);
                for row in rows {
                    table.push(vec![
                        text_cell(row.brewery_name.as_deref()),
                        text_cell(row.brewery_location.as_deref()),
                        row.beer_count.to_string(),
                        decimal_cell(row.avg_abv, 2),
                        decimal_cell(row.avg_ibu, 1),
                    ]);
                }
                table
            }
        }
    }

    /// Summary of the top row, or `None` when the query returned nothing
    pub fn highlight(&self) -> Option<String> {
        match self {
            Report::AvgAbv(rows) => rows.first().map(|top| {
                format!(
                    "🍺 Strongest style: {} at {}% ABV\n   (based on {} beers)",
                    text_cell(top.beer_style.as_deref()),
                    decimal_cell(top.avg_abv, 2),
                    top.beer_count
                )
            }),
            Report::TopBreweries(rows) => rows.first().map(|top| {
                format!(
                    "🏆 Most productive brewery: {}\n   Location: {}\n   Total beers: {}\n   Average ABV: {}%\n   Average IBU: {}",
                    text_cell(top.brewery_name.as_deref()),
                    text_cell(top.brewery_location.as_deref()),
                    top.beer_count,
                    decimal_cell(top.avg_abv, 2),
                    decimal_cell(top.avg_ibu, 1)
                )
            }),
        }
    }

    /// Full console output: banner, title, table, banner, highlight and the
    /// completion marker
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        let banner = "=".repeat(kind.banner_width());

        writeln!(f)?;
        writeln!(f, "{banner}")?;
        writeln!(f, "{}", kind.title())?;
        writeln!(f, "{banner}")?;
        write!(f, "{}", self.table())?;
        writeln!(f, "{banner}")?;
        writeln!(f)?;
        match self.highlight() {
            Some(highlight) => writeln!(f, "{highlight}")?,
            None => writeln!(f, "No beers found.")?,
        }
        writeln!(f)?;
        writeln!(f, "✅ Analysis complete!")
    }
}

/// Column-aligned table without an index column. Cells are right-aligned to
/// the widest entry in their column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        for line in std::iter::once(&self.headers).chain(self.rows.iter()) {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect();
            writeln!(f, "{}", cells.join("  "))?;
        }
        Ok(())
    }
}

fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or(NULL_CELL).to_string()
}

fn decimal_cell(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) => format!("{v:.places$}"),
        None => NULL_CELL.to_string(),
    }
}
