//! Consumer integration tests.
//!
//! Exercises the polling loop against the in-memory broker:
//! - Message outcomes: handled, poisoned, unroutable, retained
//! - Concurrent dispatch of a batch
//! - Redelivery after a failed attempt
//! - Spawned lifecycle: statistics, poll-failure back-off, cooperative stop

mod dispatch;
mod redelivery;
