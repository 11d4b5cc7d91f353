use std::process::ExitCode;

use anyhow::Result;

use beer_reports::report::ReportKind;
use beer_reports::service;

/// Top 10 breweries by number of beers
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    service::init_tracing();
    Ok(service::run_report(ReportKind::TopBreweries).await?)
}
