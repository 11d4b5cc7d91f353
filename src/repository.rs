use std::cmp::Ordering;

use async_trait::async_trait;
use sqlx::Connection;
use sqlx::postgres::PgConnection;

use crate::error::{ReportError, Result};
use crate::models::{BreweryStats, StyleAbv};

/// Number of breweries in the top breweries report
pub const TOP_BREWERIES_LIMIT: usize = 10;

const AVG_ABV_BY_STYLE_SQL: &str = r#"
    SELECT
        beer_style,
        ROUND(AVG(abv)::numeric, 2)::float8 AS avg_abv,
        COUNT(*) AS beer_count
    FROM beers
    GROUP BY beer_style
    ORDER BY avg_abv DESC
"#;

const TOP_BREWERIES_SQL: &str = r#"
    SELECT
        brewery_name,
        brewery_location,
        COUNT(*) AS beer_count,
        ROUND(AVG(abv)::numeric, 2)::float8 AS avg_abv,
        ROUND(AVG(ibu)::numeric, 1)::float8 AS avg_ibu
    FROM beers
    GROUP BY brewery_name, brewery_location
    ORDER BY beer_count DESC
    LIMIT $1
"#;

/// Read-only aggregate queries over the `beers` table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BeerRepository: Send {
    /// Average ABV per style, strongest first
    async fn avg_abv_by_style(&mut self) -> Result<Vec<StyleAbv>>;

    /// Breweries with the most beers, at most `limit` of them
    async fn top_breweries(&mut self, limit: usize) -> Result<Vec<BreweryStats>>;

    /// Release the underlying connection. Later queries fail.
    async fn close(&mut self) -> Result<()>;
}

/// PostgreSQL implementation of BeerRepository over one owned connection
pub struct PgBeerRepository {
    conn: Option<PgConnection>,
}

impl PgBeerRepository {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn: Some(conn) }
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn.as_mut().ok_or(ReportError::ConnectionClosed)
    }
}

#[async_trait]
impl BeerRepository for PgBeerRepository {
    async fn avg_abv_by_style(&mut self) -> Result<Vec<StyleAbv>> {
        let rows = sqlx::query_as::<_, StyleAbv>(AVG_ABV_BY_STYLE_SQL)
            .fetch_all(self.conn()?)
            .await?;
        Ok(rank_styles(rows))
    }

    async fn top_breweries(&mut self, limit: usize) -> Result<Vec<BreweryStats>> {
        let rows = sqlx::query_as::<_, BreweryStats>(TOP_BREWERIES_SQL)
            .bind(limit as i64)
            .fetch_all(self.conn()?)
            .await?;
        Ok(rank_breweries(rows, limit))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}

/// Order by descending average ABV. NULL averages sort first, as they do
/// under PostgreSQL's `DESC`. The sort is stable so ties keep arrival order.
pub fn rank_styles(mut rows: Vec<StyleAbv>) -> Vec<StyleAbv> {
    rows.sort_by(|a, b| desc_nulls_first(a.avg_abv, b.avg_abv));
    rows
}

/// Order by descending beer count, keeping at most `limit` rows
pub fn rank_breweries(mut rows: Vec<BreweryStats>, limit: usize) -> Vec<BreweryStats> {
    rows.sort_by(|a, b| b.beer_count.cmp(&a.beer_count));
    rows.truncate(limit);
    rows
}

fn desc_nulls_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.total_cmp(&a),
    }
}
