use std::future::Future;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::postgres::PostgresManager;
use crate::readiness::{ReadinessProbe, wait_for_ready};
use crate::report::{Report, ReportKind};
use crate::repository::{BeerRepository, PgBeerRepository};
use crate::retry::RetryPolicy;
use crate::visual::ReadinessVisual;

/// Tracing to stderr so stdout only carries the report
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point shared by the report binaries
pub async fn run_report(kind: ReportKind) -> Result<ExitCode> {
    let config = Config::load()?;
    tracing::info!(?config, "configuration loaded");

    let manager = PostgresManager::new_with_config(&config);
    let policy = RetryPolicy::from(&config.readiness);

    let report = run_with(kind, &manager, policy, || async {
        Ok::<_, ReportError>(PgBeerRepository::new(manager.connect().await?))
    })
    .await?;

    match report {
        Some(report) => {
            print!("{}", report.render());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            ReadinessVisual::stdout().never_ready();
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Wait for the database, then open a repository and collect `kind`.
/// Returns `None` without opening anything when the database never became
/// ready.
pub async fn run_with<P, R, F, Fut>(
    kind: ReportKind,
    probe: &P,
    policy: RetryPolicy,
    open: F,
) -> Result<Option<Report>>
where
    P: ReadinessProbe + ?Sized,
    R: BeerRepository,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let readiness = wait_for_ready(probe, policy).await;
    if !readiness.ready {
        return Ok(None);
    }

    let mut repo = open().await?;
    let report = Report::collect(kind, &mut repo).await?;
    if let Err(e) = repo.close().await {
        tracing::warn!("Failed to close database connection: {}", e);
    }
    Ok(Some(report))
}
