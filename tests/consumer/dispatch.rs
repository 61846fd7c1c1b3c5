//! One poll cycle at a time: what happens to each message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use profile_relay::bus::QueueTransport;
use profile_relay::service::{Disposition, Envelope, HandlerError, HandlerRegistry, MessageHandler};
use tokio::sync::Barrier;

use crate::support::{
    broker, consumer, envelope_body, registry_with, FailingDeletes, Outcome, RecordingHandler,
    REQUESTS,
};

// ============================================================================
// Test 1: Messages that cannot be processed are deleted
// ============================================================================

#[tokio::test]
async fn unparseable_body_is_deleted_without_dispatch() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue.send(REQUESTS, "not json at all".into()).await.unwrap();

    let cycle = consumer.poll_once().await;

    assert!(!cycle.poll_failed);
    assert_eq!(cycle.dispositions, vec![Disposition::Poisoned]);
    assert_eq!(handler.calls(), 0);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
    assert_eq!(queue.in_flight(REQUESTS), 0);
}

#[tokio::test]
async fn body_without_event_type_is_poison() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue
        .send(REQUESTS, r#"{"correlationId":"c-1","payload":{}}"#.into())
        .await
        .unwrap();

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Poisoned]);
    assert_eq!(handler.calls(), 0);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
}

#[tokio::test]
async fn unknown_event_type_is_deleted() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue
        .send(REQUESTS, envelope_body("SOMETHING_ELSE", "c-1"))
        .await
        .unwrap();

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Unroutable]);
    assert_eq!(handler.calls(), 0);
    assert_eq!(queue.deleted(REQUESTS).len(), 1);
}

// ============================================================================
// Test 2: Handler outcome decides deletion
// ============================================================================

#[tokio::test]
async fn successful_handler_deletes_message() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Handled]);
    assert_eq!(handler.calls(), 1);

    let seen = handler.seen();
    assert_eq!(seen[0].event_type, "PING");
    assert_eq!(seen[0].correlation_id.as_deref(), Some("c-1"));
    assert_eq!(seen[0].reply_address.as_deref(), Some("replies"));

    assert_eq!(queue.deleted(REQUESTS).len(), 1);
    assert_eq!(queue.in_flight(REQUESTS), 0);
}

#[tokio::test]
async fn failing_handler_leaves_message_for_redelivery() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Fail);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Retained]);
    assert_eq!(handler.calls(), 1);
    assert!(queue.deleted(REQUESTS).is_empty());
    assert_eq!(queue.in_flight(REQUESTS), 1);
}

#[tokio::test]
async fn failed_delete_is_reported_as_unacknowledged() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(FailingDeletes(queue.clone()), registry_with(handler.clone()));

    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    let cycle = consumer.poll_once().await;

    assert_eq!(cycle.dispositions, vec![Disposition::Unacknowledged]);
    assert_eq!(handler.calls(), 1);
    assert_eq!(queue.in_flight(REQUESTS), 1);
}

#[tokio::test]
async fn mixed_batch_settles_each_message_independently() {
    let queue = broker();
    let ok = RecordingHandler::new("PING", Outcome::Succeed);
    let failing = RecordingHandler::new("PONG", Outcome::Fail);
    let registry = HandlerRegistry::builder()
        .register(ok.clone())
        .unwrap()
        .register(failing.clone())
        .unwrap()
        .build();
    let consumer = consumer(queue.clone(), registry);

    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();
    queue.send(REQUESTS, envelope_body("PONG", "c-2")).await.unwrap();
    queue.send(REQUESTS, "{".into()).await.unwrap();

    let cycle = consumer.poll_once().await;

    assert_eq!(
        cycle.dispositions,
        vec![
            Disposition::Handled,
            Disposition::Retained,
            Disposition::Poisoned
        ]
    );
    assert_eq!(queue.deleted(REQUESTS).len(), 2);
    assert_eq!(queue.in_flight(REQUESTS), 1);
}

#[tokio::test]
async fn empty_poll_dispatches_nothing() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    let cycle = consumer.poll_once().await;

    assert!(!cycle.poll_failed);
    assert!(cycle.dispositions.is_empty());
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn receive_failure_is_reported_not_raised() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = consumer(queue.clone(), registry_with(handler.clone()));

    queue.fail_next_receives(1);
    queue.send(REQUESTS, envelope_body("PING", "c-1")).await.unwrap();

    let failed = consumer.poll_once().await;
    assert!(failed.poll_failed);
    assert!(failed.dispositions.is_empty());

    let recovered = consumer.poll_once().await;
    assert_eq!(recovered.dispositions, vec![Disposition::Handled]);
}

// ============================================================================
// Test 3: A batch is dispatched concurrently
// ============================================================================

/// Waits at a barrier sized to the batch: only completes when every
/// message of the batch is being handled at the same time.
struct Rendezvous(Arc<Barrier>);

#[async_trait]
impl MessageHandler for Rendezvous {
    fn event_type(&self) -> &str {
        "PING"
    }

    async fn handle(&self, _envelope: &Envelope) -> Result<(), HandlerError> {
        self.0.wait().await;
        Ok(())
    }
}

#[tokio::test]
async fn batch_messages_are_handled_concurrently() {
    let queue = broker();
    let consumer = consumer(
        queue.clone(),
        registry_with(Rendezvous(Arc::new(Barrier::new(3)))),
    );

    for i in 0..3 {
        queue
            .send(REQUESTS, envelope_body("PING", &format!("c-{i}")))
            .await
            .unwrap();
    }

    let cycle = tokio::time::timeout(Duration::from_secs(2), consumer.poll_once())
        .await
        .expect("sequential dispatch would never pass the barrier");

    assert_eq!(cycle.dispositions, vec![Disposition::Handled; 3]);
    assert_eq!(queue.deleted(REQUESTS).len(), 3);
}

#[tokio::test]
async fn batch_is_capped_at_max_messages() {
    let queue = broker();
    let handler = RecordingHandler::new("PING", Outcome::Succeed);
    let consumer = profile_relay::service::Consumer::new(
        Arc::new(queue.clone()),
        Arc::new(registry_with(handler.clone())),
        crate::support::test_config().with_max_messages(2),
    );

    for i in 0..5 {
        queue
            .send(REQUESTS, envelope_body("PING", &format!("c-{i}")))
            .await
            .unwrap();
    }

    let first = consumer.poll_once().await;
    assert_eq!(first.dispositions.len(), 2);
    assert_eq!(queue.messages(REQUESTS).len(), 3);
}
