// --- File: crates/schedulify_scheduling/src/busy.rs ---
//! Busy-time aggregation across participants and rooms.

use chrono::{DateTime, Duration, Utc};
use schedulify_common::services::{BusyPeriod, CalendarAccount, ProviderRegistry};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::intervals::merge_periods;

/// One calendar source to check: a participant or room, with its stored
/// connection when it has one.
#[derive(Debug, Clone)]
pub struct BusySource {
    pub owner_ref: String,
    pub account: Option<CalendarAccount>,
}

/// The union of busy time across all requested sources.
#[derive(Debug, Clone, Default)]
pub struct AggregatedBusy {
    pub periods: Vec<BusyPeriod>,
    /// True when at least one source had a connection and every such check
    /// failed. "No availability" then means "we could not check anyone's
    /// calendar", not "really no time works", and operators can tell the
    /// two apart.
    pub checks_degraded: bool,
}

/// Collects busy intervals for every source, fanning the provider calls out
/// concurrently so total latency is bounded by the slowest single call.
///
/// A source without a connection, or whose provider call fails (refresh
/// failure, vendor error, timeout), is logged and skipped: a participant
/// without calendar integration is still schedulable, just without
/// automated conflict checking for that person. One broken connection must
/// never turn the whole link into "no times available".
pub async fn collect_busy(
    registry: &dyn ProviderRegistry,
    sources: &[BusySource],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    merge_tolerance: Duration,
) -> AggregatedBusy {
    let mut tasks = JoinSet::new();
    let mut attempted = 0usize;

    for source in sources {
        let Some(account) = source.account.clone() else {
            info!(
                "no calendar connection for {}; skipping conflict check",
                source.owner_ref
            );
            continue;
        };
        let Some(provider) = registry.provider(account.provider) else {
            warn!(
                "no adapter registered for provider {} ({}); skipping",
                account.provider, source.owner_ref
            );
            continue;
        };
        attempted += 1;
        let owner = source.owner_ref.clone();
        tasks.spawn(async move {
            let result = provider.fetch_busy(&account, window_start, window_end).await;
            (owner, result)
        });
    }

    let mut periods = Vec::new();
    let mut succeeded = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((owner, Ok(busy))) => {
                succeeded += 1;
                debug!("{}: {} busy periods", owner, busy.len());
                periods.extend(busy);
            }
            Ok((owner, Err(err))) => {
                warn!(
                    "busy lookup failed for {}: {}; availability degraded",
                    owner, err
                );
            }
            Err(err) => {
                warn!("busy lookup task failed to join: {}", err);
            }
        }
    }

    AggregatedBusy {
        periods: merge_periods(&periods, merge_tolerance),
        checks_degraded: attempted > 0 && succeeded == 0,
    }
}
