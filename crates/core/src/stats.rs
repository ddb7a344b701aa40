//! Paginated task listing and aggregate statistics.

use std::collections::HashSet;

use meilisync_domain::constants::TASK_PAGE_LIMIT;
use meilisync_domain::{Result, TaskQuery, TaskRecord, TaskStats};
use tracing::{debug, instrument};

use crate::ports::TaskStatusClient;

/// Fetches every task matching `query`, following `next` across pages.
///
/// Tasks seen on an earlier page are skipped. The walk stops on the last
/// page, on an empty page, or on a page that adds nothing new.
#[instrument(skip(client))]
pub async fn fetch_all_tasks<C>(client: &C, query: &TaskQuery) -> Result<Vec<TaskRecord>>
where
    C: TaskStatusClient + ?Sized,
{
    let mut query = query.clone();
    if query.limit.is_none() {
        query.limit = Some(TASK_PAGE_LIMIT);
    }

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut pages = 0usize;
    loop {
        let page = client.get_tasks(&query).await?;
        pages += 1;

        let before = records.len();
        records.extend(page.results.into_iter().filter(|record| seen.insert(record.uid)));
        let fresh = records.len() - before;

        match page.next {
            Some(next) if fresh > 0 && query.from != Some(next) => query.from = Some(next),
            _ => break,
        }
    }

    debug!(pages, tasks = records.len(), "fetched task pages");
    Ok(records)
}

/// Counts tasks matching `query` by status.
pub async fn collect_task_stats<C>(client: &C, query: &TaskQuery) -> Result<TaskStats>
where
    C: TaskStatusClient + ?Sized,
{
    let records = fetch_all_tasks(client, query).await?;
    let mut stats = TaskStats::default();
    for record in &records {
        stats.record(record.status);
    }
    Ok(stats)
}
