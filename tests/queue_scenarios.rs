//! End-to-end queue scenarios over the in-memory store.

use redqueue::{ListStore, MemoryStore, QueueError, ReliableQueue};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Job {
    id: u32,
    name: String,
}

#[tokio::test]
async fn test_jobs_scenario() {
    let store = MemoryStore::new();
    let mut queue = ReliableQueue::with_store(store.clone(), "jobs");

    queue.enqueue(json!({"id": 1, "name": "a"})).await.unwrap();
    queue.enqueue(json!({"id": 2, "name": "b"})).await.unwrap();

    let job: Job = queue.dequeue_into().await.unwrap();
    assert_eq!(
        job,
        Job {
            id: 1,
            name: "a".to_string()
        }
    );

    queue.acknowledge().await.unwrap();

    // Job 1 is gone from both lists; job 2 is the only task left.
    let job2 = serde_json::to_vec(&json!({"id": 2, "name": "b"})).unwrap();
    assert_eq!(store.snapshot("jobs_main").await, vec![job2.clone()]);
    assert!(store.snapshot("jobs_processing").await.is_empty());

    // Once picked up, job 2's bytes are all that processing holds.
    queue.dequeue().await.unwrap();
    assert_eq!(store.snapshot("jobs_processing").await, vec![job2]);
    assert!(store.snapshot("jobs_main").await.is_empty());
}

#[tokio::test]
async fn test_full_lifecycle_leaves_no_trace() {
    let store = MemoryStore::new();
    let mut queue = ReliableQueue::with_store(store.clone(), "lifecycle");

    queue.enqueue("X").await.unwrap();
    assert_eq!(queue.dequeue().await.unwrap(), b"X");
    queue.acknowledge().await.unwrap();

    let stats = queue.stats().await.unwrap();
    assert_eq!(stats.total(), 0);
    assert!(matches!(
        queue.acknowledge().await,
        Err(QueueError::NothingToAcknowledge { .. })
    ));

    queue.close().await.unwrap();
}

#[tokio::test]
async fn test_producer_and_consumer_instances_share_lists() {
    let store = MemoryStore::new();
    let producer = ReliableQueue::with_store(store.clone(), "shared");
    let mut consumer = ReliableQueue::with_store(store.clone(), "shared");

    for i in 0..5 {
        producer.enqueue(format!("task-{}", i)).await.unwrap();
    }

    for i in 0..5 {
        let task = consumer.dequeue().await.unwrap();
        assert_eq!(task, format!("task-{}", i).into_bytes());
        consumer.acknowledge().await.unwrap();
    }

    assert!(consumer.dequeue().await.unwrap_err().is_empty_queue());
    assert!(producer.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_concurrent_consumers_never_share_a_task() {
    let store = MemoryStore::new();
    let producer = ReliableQueue::with_store(store.clone(), "concurrent");
    for i in 0..40 {
        producer.enqueue(format!("{}", i)).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let mut consumer = ReliableQueue::with_store(store.clone(), "concurrent");
        handles.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            loop {
                match consumer.dequeue().await {
                    Ok(task) => {
                        seen.push(String::from_utf8(task).unwrap());
                        consumer.acknowledge().await.unwrap();
                    }
                    Err(err) if err.is_empty_queue() => break,
                    Err(err) => panic!("unexpected error: {}", err),
                }
                tokio::task::yield_now().await;
            }
            seen
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    all.sort_by_key(|task| task.parse::<u32>().unwrap());

    let expected: Vec<String> = (0..40).map(|i| i.to_string()).collect();
    assert_eq!(all, expected);
    assert_eq!(store.len("concurrent_processing").await.unwrap(), 0);
}

#[tokio::test]
async fn test_unacknowledged_task_is_not_redelivered() {
    let store = MemoryStore::new();
    let mut crashed = ReliableQueue::with_store(store.clone(), "stranded");
    crashed.enqueue("work").await.unwrap();
    crashed.dequeue().await.unwrap();
    drop(crashed);

    let mut replacement = ReliableQueue::with_store(store.clone(), "stranded");
    assert!(replacement.dequeue().await.unwrap_err().is_empty_queue());
    assert!(replacement.acknowledge().await.unwrap_err().is_nothing_to_acknowledge());
    assert_eq!(store.snapshot("stranded_processing").await, vec![b"work".to_vec()]);
}

#[tokio::test]
async fn test_queues_with_different_names_are_isolated() {
    let store = MemoryStore::new();
    let emails = ReliableQueue::with_store(store.clone(), "emails");
    let mut reports = ReliableQueue::with_store(store.clone(), "reports");

    emails.enqueue("welcome").await.unwrap();

    assert!(reports.dequeue().await.unwrap_err().is_empty_queue());
    assert_eq!(emails.len().await.unwrap(), 1);
}
