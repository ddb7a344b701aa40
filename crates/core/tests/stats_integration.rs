//! Integration tests for paginated task listing and statistics

mod support;

use meilisync_core::{collect_task_stats, fetch_all_tasks};
use meilisync_domain::{TaskPage, TaskQuery, TaskRecord, TaskStatus};
use support::ScriptedTaskClient;

use TaskStatus::{Enqueued, Failed, Processing, Succeeded};

fn page(uids: &[u64], next: Option<u64>) -> TaskPage {
    TaskPage {
        results: uids.iter().map(|uid| TaskRecord::new(*uid, Succeeded)).collect(),
        next,
        ..TaskPage::default()
    }
}

#[tokio::test]
async fn fetch_all_tasks_follows_next_and_skips_duplicates() {
    let client = ScriptedTaskClient::new()
        .with_page(None, page(&[1, 2, 3], Some(3)))
        .with_page(Some(3), page(&[3, 4], Some(5)))
        .with_page(Some(5), page(&[5], None));

    let records = fetch_all_tasks(&client, &TaskQuery::new()).await.unwrap();

    let uids: Vec<u64> = records.iter().map(|record| record.uid.value()).collect();
    assert_eq!(uids, vec![1, 2, 3, 4, 5]);
    let queries = client.page_queries();
    assert_eq!(queries.len(), 3);
    assert!(queries.iter().all(|query| query.limit == Some(100)));
}

#[tokio::test]
async fn fetch_all_tasks_stops_when_a_page_adds_nothing() {
    let client = ScriptedTaskClient::new()
        .with_page(None, page(&[1], Some(2)))
        .with_page(Some(2), page(&[1], Some(3)))
        .with_page(Some(3), page(&[7], None));

    let records = fetch_all_tasks(&client, &TaskQuery::new()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(client.page_queries().len(), 2);
}

#[tokio::test]
async fn fetch_all_tasks_stops_when_next_does_not_advance() {
    let client = ScriptedTaskClient::new()
        .with_page(None, page(&[10], Some(9)))
        .with_page(Some(9), page(&[9], Some(9)));

    let records = fetch_all_tasks(&client, &TaskQuery::new().with_limit(1)).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(client.page_queries().len(), 2);
}

#[tokio::test]
async fn collect_task_stats_counts_by_status() {
    let mut first = page(&[1, 2], Some(3));
    first.results[1].status = Failed;
    let mut second = page(&[3, 4], None);
    second.results[0].status = Processing;
    second.results[1].status = Enqueued;
    let client = ScriptedTaskClient::new().with_page(None, first).with_page(Some(3), second);

    let stats = collect_task_stats(&client, &TaskQuery::new().with_index_uids(["movies"]))
        .await
        .unwrap();

    assert_eq!(stats.total, 4);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.processing, 1);
    assert_eq!(stats.enqueued, 1);
    assert_eq!(stats.active(), 2);
    assert_eq!(client.page_queries()[0].index_uids, vec!["movies".to_string()]);
}
