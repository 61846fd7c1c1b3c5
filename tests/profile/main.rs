//! Profile request integration tests.
//!
//! Covers the `USER_PROFILE_REQUESTED` handler and full-profile resolution:
//! - Success, not-found and internal-error replies
//! - Malformed requests produce no reply
//! - Correlation ids are echoed unchanged
//! - Publish failures leave the request for redelivery
//! - Role-based extension lookup

mod through_consumer;
