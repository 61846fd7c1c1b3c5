//! Retained messages come back after the visibility window.

use std::time::Duration;

use profile_relay::bus::{InMemoryQueue, QueueTransport};
use profile_relay::service::Disposition;

use crate::support::{
    consumer, envelope_body, registry_with, Outcome, RecordingHandler, REQUESTS,
};

#[tokio::test]
async fn failed_message_is_redelivered_and_then_handled() {
    let queue = InMemoryQueue::new();
    queue.create_queue(REQUESTS);

    let handler = RecordingHandler::new("PING", Outcome::FailFirst(1));
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    let first = consumer.poll_once().await;
    assert_eq!(first.dispositions, vec![Disposition::Retained]);

    // Nothing visible until the window passes.
    let early = queue.receive(REQUESTS, 10, Duration::ZERO).await.unwrap();
    assert!(early.is_empty());

    queue.expire_in_flight(REQUESTS);

    let mut batch = queue.receive(REQUESTS, 10, Duration::ZERO).await.unwrap();
    assert_eq!(batch.len(), 1);
    let message = batch.remove(0);
    assert_eq!(message.receive_count, 2);
    assert!(message.is_redelivery());

    let second = consumer.process_message(message).await;
    assert_eq!(second, Disposition::Handled);

    assert_eq!(handler.calls(), 2);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
    assert_eq!(queue.in_flight(REQUESTS), 0);

    let seen = handler.seen();
    assert_eq!(seen[0], seen[1]);
}

#[tokio::test]
async fn spawned_consumer_retries_after_visibility_window() {
    let queue = InMemoryQueue::new().with_visibility_timeout(Duration::from_millis(50));
    queue.create_queue(REQUESTS);

    let handler = RecordingHandler::new("PING", Outcome::FailFirst(2));
    let handle = consumer(queue.clone(), registry_with(handler.clone())).spawn();
    let mut stats = handle.subscribe_stats();

    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), stats.wait_for(|s| s.handled == 1))
        .await
        .expect("message was never handled")
        .unwrap();

    let final_stats = handle.stop().await;
    assert_eq!(final_stats.retained, 2);
    assert_eq!(final_stats.handled, 1);
    assert_eq!(final_stats.received, 3);
    assert_eq!(handler.calls(), 3);
}

#[tokio::test]
async fn stale_receipt_cannot_delete_redelivered_message() {
    let queue = InMemoryQueue::new();
    queue.create_queue(REQUESTS);
    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    let first = queue.receive(REQUESTS, 1, Duration::ZERO).await.unwrap();
    queue.expire_in_flight(REQUESTS);
    let second = queue.receive(REQUESTS, 1, Duration::ZERO).await.unwrap();

    assert_ne!(first[0].receipt, second[0].receipt);
    assert_eq!(first[0].message_id, second[0].message_id);
    assert!(queue.delete(REQUESTS, &first[0].receipt).await.is_err());
    assert!(queue.delete(REQUESTS, &second[0].receipt).await.is_ok());

}
