//! The profile handler driven by the consumer, as deployed.

use std::sync::Arc;
use std::time::Duration;

use profile_relay::bus::{InMemoryQueue, QueueTransport};
use profile_relay::config::ConsumerConfig;
use profile_relay::profile::{ProfileResolver, USER_PROFILE_REQUESTED};
use profile_relay::service::{
    build_handler_registry, Consumer, Disposition, Envelope, MessageHandler,
};
use serde_json::json;

use crate::support::{
    broker, handler_with, replies, seeded_resolver, FailingResolver, CLIENT_USER, MISSING_USER,
    Q1, Q2, REQUESTS,
};

fn consumer_for<R>(queue: &InMemoryQueue, resolver: R) -> Consumer
where
    R: ProfileResolver + 'static,
{
    let handler: Arc<dyn MessageHandler> = Arc::new(handler_with(queue, resolver));
    let registry = build_handler_registry([handler]).unwrap();

    Consumer::new(
        Arc::new(queue.clone()),
        Arc::new(registry),
        ConsumerConfig::new(REQUESTS).with_wait_time(Duration::from_millis(20)),
    )
}

async fn send_request(queue: &InMemoryQueue, correlation_id: &str, reply: &str, user_id: i64) {
    let envelope = Envelope::request(
        USER_PROFILE_REQUESTED,
        correlation_id,
        reply,
        json!({ "userId": user_id }),
    );
    queue
        .send(REQUESTS, serde_json::to_string(&envelope).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn publish_failure_leaves_request_undeleted() {
    let queue = broker();
    queue.reject_sends_to(Q1);
    let consumer = consumer_for(&queue, seeded_resolver());

    send_request(&queue, "corr-1", Q1, CLIENT_USER).await;

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Retained]);
    assert!(queue.deleted(REQUESTS).is_empty());
    assert_eq!(queue.in_flight(REQUESTS), 1);

    // Once the reply queue accepts again, the redelivered request is
    // answered as a whole.
    queue.accept_sends_to(Q1);
    queue.expire_in_flight(REQUESTS);

    let retry = consumer.poll_once().await;
    assert_eq!(retry.dispositions, vec![Disposition::Handled]);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
    assert_eq!(replies(&queue, Q1)[0].correlation_id(), "corr-1");
}

#[tokio::test]
async fn error_replies_still_delete_the_request() {
    let queue = broker();
    let consumer = consumer_for(&queue, FailingResolver("database offline"));

    send_request(&queue, "corr-1", Q1, CLIENT_USER).await;

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Handled]);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
    assert!(!replies(&queue, Q1)[0].is_success());
}

#[tokio::test]
async fn malformed_request_is_deleted_without_reply() {
    let queue = broker();
    let consumer = consumer_for(&queue, seeded_resolver());

    send_request(&queue, "", Q1, CLIENT_USER).await;

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Handled]);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
    assert!(queue.sent(Q1).is_empty());
}

#[tokio::test]
async fn concurrent_requests_are_not_cross_wired() {
    let queue = broker();
    let consumer = consumer_for(&queue, seeded_resolver());

    send_request(&queue, "corr-a", Q1, CLIENT_USER).await;
    send_request(&queue, "corr-b", Q2, MISSING_USER).await;

    let cycle = consumer.poll_once().await;
    assert_eq!(cycle.dispositions.len(), 2);

    let to_q1 = replies(&queue, Q1);
    let to_q2 = replies(&queue, Q2);
    assert_eq!(to_q1.len(), 1);
    assert_eq!(to_q2.len(), 1);

    assert_eq!(to_q1[0].correlation_id(), "corr-a");
    assert!(to_q1[0].is_success());
    assert_eq!(to_q1[0].payload().unwrap()["user"]["id"], json!(CLIENT_USER));

    assert_eq!(to_q2[0].correlation_id(), "corr-b");
    assert!(!to_q2[0].is_success());
}
