use std::cell::{Cell, RefCell};
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use tokio_retry::Retry;

use crate::error::Result;
use crate::postgres::PostgresManager;
use crate::retry::RetryPolicy;
use crate::visual::ReadinessVisual;

#[cfg(test)]
use mockall::automock;

/// A short-lived reachability check against the database
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Human-readable name of the endpoint being probed
    fn endpoint(&self) -> String;

    /// Open a connection and release it again
    async fn probe(&self) -> Result<()>;
}

#[async_trait]
impl ReadinessProbe for PostgresManager {
    fn endpoint(&self) -> String {
        PostgresManager::endpoint(self).to_string()
    }

    async fn probe(&self) -> Result<()> {
        self.ping().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    TransientFailure,
}

/// One probe attempt. Only lives for the duration of a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based
    pub index: u32,
    pub outcome: AttemptOutcome,
    pub wait_before_next: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub ready: bool,
    pub attempts: Vec<AttemptRecord>,
}

impl Readiness {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Number of fixed pauses taken between attempts
    pub fn delays_incurred(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.wait_before_next.is_some())
            .count()
    }
}

/// Poll `probe` until it succeeds or `policy.max_attempts` attempts have
/// failed, narrating progress on stdout. Every probe error counts as
/// transient; nothing is propagated.
pub async fn wait_for_ready<P>(probe: &P, policy: RetryPolicy) -> Readiness
where
    P: ReadinessProbe + ?Sized,
{
    wait_for_ready_with(probe, policy, &mut ReadinessVisual::stdout()).await
}

/// [`wait_for_ready`] with the narration sent to `visual`
pub async fn wait_for_ready_with<P, W>(
    probe: &P,
    policy: RetryPolicy,
    visual: &mut ReadinessVisual<W>,
) -> Readiness
where
    P: ReadinessProbe + ?Sized,
    W: Write,
{
    visual.waiting(&probe.endpoint());

    if policy.max_attempts == 0 {
        visual.exhausted(0);
        return Readiness {
            ready: false,
            attempts: Vec::new(),
        };
    }

    let attempt = Cell::new(0u32);
    let records = RefCell::new(Vec::new());
    let narration = RefCell::new(&mut *visual);

    let result = Retry::start(policy.strategy(), || {
        let index = attempt.get() + 1;
        attempt.set(index);
        let records = &records;
        let narration = &narration;
        async move {
            match probe.probe().await {
                Ok(()) => {
                    records.borrow_mut().push(AttemptRecord {
                        index,
                        outcome: AttemptOutcome::Success,
                        wait_before_next: None,
                    });
                    Ok(())
                }
                Err(e) => {
                    tracing::debug!(attempt = index, error = %e, "readiness probe failed");
                    narration.borrow_mut().not_ready(index, policy.max_attempts);
                    records.borrow_mut().push(AttemptRecord {
                        index,
                        outcome: AttemptOutcome::TransientFailure,
                        wait_before_next: policy.delay_after(index),
                    });
                    Err(e)
                }
            }
        }
    })
    .await;
    drop(narration);

    let ready = result.is_ok();
    if ready {
        visual.ready();
    } else {
        visual.exhausted(policy.max_attempts);
        tracing::warn!(
            attempts = policy.max_attempts,
            "database did not accept a connection"
        );
    }

    Readiness {
        ready,
        attempts: records.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_secs(2);

    fn refused() -> ReportError {
        ReportError::Database(sqlx::Error::PoolTimedOut)
    }

    /// Probe that fails until attempt `succeed_on`
    fn probe_succeeding_on(succeed_on: u32, expected_calls: usize) -> MockReadinessProbe {
        let mut probe = MockReadinessProbe::new();
        probe
            .expect_endpoint()
            .returning(|| "database".to_string());
        let mut calls = 0;
        probe.expect_probe().times(expected_calls).returning(move || {
            calls += 1;
            if calls >= succeed_on {
                Ok(())
            } else {
                Err(refused())
            }
        });
        probe
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_incurs_no_delay() {
        let probe = probe_succeeding_on(1, 1);
        let started = Instant::now();

        let readiness = wait_for_ready(&probe, RetryPolicy::fixed(30, DELAY)).await;

        assert!(readiness.ready);
        assert_eq!(readiness.attempt_count(), 1);
        assert_eq!(readiness.delays_incurred(), 0);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_kth_attempt_takes_k_minus_one_delays() {
        let probe = probe_succeeding_on(4, 4);
        let started = Instant::now();

        let readiness = wait_for_ready(&probe, RetryPolicy::fixed(10, DELAY)).await;

        assert!(readiness.ready);
        assert_eq!(readiness.attempt_count(), 4);
        assert_eq!(readiness.delays_incurred(), 3);
        assert_eq!(started.elapsed(), DELAY * 3);
        assert_eq!(
            readiness.attempts.last().map(|a| a.outcome),
            Some(AttemptOutcome::Success)
        );
        assert!(
            readiness.attempts[..3]
                .iter()
                .all(|a| a.outcome == AttemptOutcome::TransientFailure)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_last_allowed_attempt_is_ready() {
        let probe = probe_succeeding_on(5, 5);
        let readiness = wait_for_ready(&probe, RetryPolicy::fixed(5, DELAY)).await;
        assert!(readiness.ready);
        assert_eq!(readiness.attempt_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_attempts_reports_not_ready() {
        let probe = probe_succeeding_on(u32::MAX, 6);
        let started = Instant::now();

        let readiness = wait_for_ready(&probe, RetryPolicy::fixed(6, DELAY)).await;

        assert!(!readiness.ready);
        assert_eq!(readiness.attempt_count(), 6);
        let indices: Vec<u32> = readiness.attempts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(readiness.attempts[5].wait_before_next, None);
        assert_eq!(started.elapsed(), DELAY * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_never_probes() {
        let probe = probe_succeeding_on(1, 0);
        let mut visual = ReadinessVisual::plain(Vec::new());

        let readiness = wait_for_ready_with(&probe, RetryPolicy::fixed(0, DELAY), &mut visual).await;

        assert!(!readiness.ready);
        assert!(readiness.attempts.is_empty());
        let text = String::from_utf8(visual.into_inner()).unwrap();
        assert!(!text.contains("Attempt"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_attempts_prints_one_progress_line_per_attempt() {
        let probe = probe_succeeding_on(u32::MAX, 4);
        let mut visual = ReadinessVisual::plain(Vec::new());

        let readiness = wait_for_ready_with(&probe, RetryPolicy::fixed(4, DELAY), &mut visual).await;

        assert!(!readiness.ready);
        let text = String::from_utf8(visual.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Waiting for database at database...",
                "Attempt 1/4: Database not ready yet...",
                "Attempt 2/4: Database not ready yet...",
                "Attempt 3/4: Database not ready yet...",
                "Attempt 4/4: Database not ready yet...",
                "Database still unreachable after 4 attempts",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_narrates_failures_then_ready() {
        let probe = probe_succeeding_on(3, 3);
        let mut visual = ReadinessVisual::plain(Vec::new());

        let readiness = wait_for_ready_with(&probe, RetryPolicy::fixed(30, DELAY), &mut visual).await;

        assert!(readiness.ready);
        let text = String::from_utf8(visual.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Waiting for database at database...",
                "Attempt 1/30: Database not ready yet...",
                "Attempt 2/30: Database not ready yet...",
                "Database is ready!",
            ]
        );
    }
}
