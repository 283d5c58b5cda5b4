//! Background consumer of the click queue.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::application::services::StatsService;
use crate::domain::click_job::PendingClick;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Drains `rx`, recording each click through `stats_service`.
///
/// At most `concurrency` writes are in flight. A failed write is logged and
/// counted, never retried: a lost click is preferred over a duplicate one.
/// Returns once every sender is dropped and in-flight writes have finished.
pub async fn run_click_worker<L>(
    mut rx: mpsc::Receiver<PendingClick>,
    stats_service: Arc<StatsService<L>>,
    concurrency: usize,
) where
    L: LinkRepository + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    while let Some(job) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let service = stats_service.clone();
        in_flight.spawn(async move {
            let _permit = permit;
            process_click(&service, job).await;
        });

        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}

    info!("Click worker stopped");
}

async fn process_click<L>(stats_service: &StatsService<L>, job: PendingClick)
where
    L: LinkRepository + ?Sized,
{
    let record_id = job.record_id;

    match stats_service.record_click(record_id, job.event).await {
        Ok(count) => {
            metrics::counter!("clicks_recorded_total").increment(1);
            debug!(record_id, click_count = count, "Click recorded");
        }
        Err(AppError::NotFound { .. }) => {
            // Link deleted between redirect and write.
            debug!(record_id, "Click dropped, link no longer exists");
        }
        Err(e) => {
            metrics::counter!("clicks_failed_total").increment(1);
            warn!(record_id, error = %e, "Failed to record click");
        }
    }
}
