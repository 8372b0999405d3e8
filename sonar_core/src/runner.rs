use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sonar_traits::{Clock, EdgeSource, TriggerPin};

use crate::error::Result;
use crate::reading::Report;
use crate::shared::SharedSonar;

/// Cadence of the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Time between the start of consecutive polls.
    pub interval: Duration,
    /// Produce a report after every N polls (0 is treated as 1).
    pub report_every: u32,
    /// Stop after this many polls; `None` runs until shutdown.
    pub max_polls: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub polls: u64,
    pub reports: u64,
    pub last_report: Option<Report>,
}

/// Remaining part of `interval` after `spent_us` of work, at least zero.
#[inline]
fn remaining(interval: Duration, spent_us: u64) -> Duration {
    interval.saturating_sub(Duration::from_micros(spent_us))
}

/// Poll the sonar at a fixed cadence until `max_polls` is reached or
/// `shutdown` is raised, handing every N-th report to `on_report`.
///
/// `pacer` only paces the loop; the engine keeps its own clock for echo
/// timing. An error from a poll or from `on_report` ends the run.
pub fn run<E, T, C, P, F>(
    sonar: &SharedSonar<E, T, C>,
    pacer: &P,
    params: RunParams,
    shutdown: &AtomicBool,
    mut on_report: F,
) -> Result<RunSummary>
where
    E: EdgeSource,
    T: TriggerPin,
    C: Clock,
    P: Clock,
    F: FnMut(u64, &Report) -> Result<()>,
{
    let every = u64::from(params.report_every.max(1));
    let mut summary = RunSummary::default();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::debug!(polls = summary.polls, "runner received shutdown signal");
            break;
        }
        if params.max_polls.is_some_and(|max| summary.polls >= max) {
            break;
        }

        let started_us = pacer.now_us();
        sonar.poll()?;
        summary.polls += 1;

        if summary.polls % every == 0 {
            let report = sonar.report()?;
            tracing::debug!(
                polls = summary.polls,
                distance = %report.distance,
                variance = ?report.variance_mm2,
                velocity_mm_s = report.velocity_mm_s,
                "report"
            );
            on_report(summary.polls, &report)?;
            summary.reports += 1;
            summary.last_report = Some(report);
        }

        // no sleep once shutdown is raised
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        pacer.sleep(remaining(params.interval, pacer.elapsed_us(started_us)));
    }

    tracing::trace!(polls = summary.polls, reports = summary.reports, "runner exiting");
    Ok(summary)
}
