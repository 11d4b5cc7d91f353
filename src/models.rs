use sqlx::FromRow;

/// A row of the `beers` table. The reports never read these directly; the
/// integration fixtures insert them.
#[derive(Debug, Clone, PartialEq)]
pub struct Beer {
    pub brewery_name: String,
    pub brewery_location: String,
    pub beer_style: String,
    pub abv: f64,
    pub ibu: f64,
}

impl Beer {
    pub fn new(brewery: &str, location: &str, style: &str, abv: f64, ibu: f64) -> Self {
        Self {
            brewery_name: brewery.to_string(),
            brewery_location: location.to_string(),
            beer_style: style.to_string(),
            abv,
            ibu,
        }
    }
}

/// Average ABV for one beer style
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StyleAbv {
    pub beer_style: Option<String>,
    /// Rounded to 2 decimals; NULL when no beer of the style has an ABV
    pub avg_abv: Option<f64>,
    pub beer_count: i64,
}

/// Output stats for one brewery
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BreweryStats {
    pub brewery_name: Option<String>,
    pub brewery_location: Option<String>,
    pub beer_count: i64,
    pub avg_abv: Option<f64>,
    pub avg_ibu: Option<f64>,
}
