//! Request/reply over an in-memory broker.
//!
//! Starts a consumer answering `USER_PROFILE_REQUESTED`, then asks for an
//! existing client, an existing professional and a user that does not
//! exist, printing each reply.
//!
//! ```sh
//! RUST_LOG=profile_relay=debug cargo run --example request_reply
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use profile_relay::bus::{InMemoryQueue, Publisher};
use profile_relay::config::{ConsumerConfig, QueueSettings, RoleIds};
use profile_relay::profile::{
    Client, FullProfileResolver, InMemoryProfileStore, Professional, User,
    UserProfileRequestedHandler, USER_PROFILE_REQUESTED,
};
use profile_relay::service::{build_handler_registry, Consumer, MessageHandler, Requester};
use serde_json::json;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const REQUEST_QUEUE: &str = "user-profile-requests";

fn seed(store: &InMemoryProfileStore, roles: RoleIds) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let user = |id: i64, username: &str, role_id: i64| User {
        id,
        firebase_uid: format!("firebase-{id}"),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: username.to_string(),
        last_name: "Demo".to_string(),
        phone: None,
        address: None,
        role_id,
        is_active: true,
        is_verified: true,
        email_verified_at: Some(now),
        created_at: now,
        updated_at: now,
    };

    store.insert_user(user(5, "carla", roles.client))?;
    store.insert_client(Client {
        id: 1,
        user_id: 5,
        preferred_payment_method: Some("card".to_string()),
        loyalty_points: 40,
        notes: None,
        created_at: now,
        updated_at: now,
    })?;

    store.insert_user(user(7, "pablo", roles.professional))?;
    store.insert_professional(Professional {
        id: 1,
        user_id: 7,
        bio: Some("Colorist".to_string()),
        specialization: Some("Color".to_string()),
        license_number: Some("LIC-0007".to_string()),
        years_experience: Some(8),
        is_available: true,
        created_at: now,
        updated_at: now,
    })?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let roles = RoleIds::from_env()?;
    let config = QueueSettings::from_env()?
        .consumer_config()
        .unwrap_or_else(|| ConsumerConfig::new(REQUEST_QUEUE))
        .with_wait_time(Duration::from_secs(1));

    let queue = InMemoryQueue::new().without_recording();
    queue.create_queue(&config.queue);

    let store = InMemoryProfileStore::new();
    seed(&store, roles)?;

    let handler: Arc<dyn MessageHandler> = Arc::new(UserProfileRequestedHandler::new(
        Arc::new(FullProfileResolver::new(store, roles)),
        Publisher::new(Arc::new(queue.clone())),
    ));
    let registry = Arc::new(build_handler_registry([handler])?);

    let request_queue = config.queue.clone();
    let consumer = Consumer::new(Arc::new(queue.clone()), registry, config).spawn();

    let reply_queue = format!("reply-{}", uuid::Uuid::new_v4());
    queue.create_queue(&reply_queue);
    let requester = Requester::new(Arc::new(queue.clone()), request_queue, reply_queue)
        .with_timeout(Duration::from_secs(10));

    for user_id in [5, 7, 999_999] {
        let response = requester
            .request(USER_PROFILE_REQUESTED, json!({ "userId": user_id }))
            .await?;

        match response.into_result() {
            Ok(profile) => println!(
                "user {} -> {} profile: {}",
                user_id,
                profile["profileType"],
                serde_json::to_string_pretty(&profile)?
            ),
            Err(e) => println!("user {} -> {}", user_id, e),
        }
    }

    let stats = consumer.stop().await;
    println!("Handled {} requests in {} polls", stats.handled, stats.polls);

    Ok(())
}
