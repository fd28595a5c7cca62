//! These tests need a reachable Postgres instance configured in
//! `configuration/`. They run when `TEST_DATABASE` is set and return early
//! otherwise, e.g. `TEST_DATABASE=1 cargo test`.
use claims::{assert_matches, assert_ok};
use podcast_newsletter::configuration::get_configuration;
use podcast_newsletter::domain::SubscriberEmail;
use podcast_newsletter::startup::{Application, get_connection_pool};
use podcast_newsletter::store::{PostgresSubscriberStore, StoreError, SubscriberStore};
use tokio::task::JoinSet;

use crate::helpers::configure_database;

fn database_tests_enabled() -> bool {
    std::env::var("TEST_DATABASE").is_ok()
}

async fn fresh_store() -> Option<PostgresSubscriberStore> {
    if !database_tests_enabled() {
        return None;
    }
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    Some(configure_database(&configuration.database).await)
}

fn email(raw: &str) -> SubscriberEmail {
    SubscriberEmail::parse(raw).unwrap()
}

async fn row_count(store: &PostgresSubscriberStore, email: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM subscribers WHERE email = $1")
        .bind(email)
        .fetch_one(store.pool())
        .await
        .expect("Failed to count subscribers")
}

#[actix_web::test]
async fn create_then_list_active_returns_the_subscriber() {
    let Some(store) = fresh_store().await else {
        return;
    };

    let created = assert_ok!(store.create(&email("Ursula@Gmail.com")).await);

    assert!(created.is_active);
    assert_eq!(created.email, email("ursula@gmail.com"));
    let active = store.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, created.id);
    assert_eq!(active[0].email.as_ref(), "ursula@gmail.com");
}

#[actix_web::test]
async fn create_duplicate_is_rejected_by_the_unique_constraint() {
    let Some(store) = fresh_store().await else {
        return;
    };
    store.create(&email("ursula@gmail.com")).await.unwrap();
    store.deactivate(&email("ursula@gmail.com")).await.unwrap();

    let outcome = store.create(&email("ursula@gmail.com")).await;

    assert_matches!(outcome, Err(StoreError::DuplicateEmail));
    assert_eq!(row_count(&store, "ursula@gmail.com").await, 1);
}

#[actix_web::test]
async fn deactivate_removes_subscriber_from_active_list() {
    let Some(store) = fresh_store().await else {
        return;
    };
    store.create(&email("stays@gmail.com")).await.unwrap();
    store.create(&email("leaves@gmail.com")).await.unwrap();

    assert_ok!(store.deactivate(&email("leaves@gmail.com")).await);
    assert_ok!(store.deactivate(&email("nobody@gmail.com")).await);

    let active = store.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].email.as_ref(), "stays@gmail.com");
    assert_eq!(row_count(&store, "nobody@gmail.com").await, 0);
}

#[actix_web::test]
async fn initialize_is_idempotent() {
    let Some(store) = fresh_store().await else {
        return;
    };
    store.create(&email("ursula@gmail.com")).await.unwrap();

    let reopened = assert_ok!(PostgresSubscriberStore::initialize(store.pool().clone()).await);

    assert_eq!(reopened.list_active().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn concurrent_creates_of_one_email_succeed_once() {
    let Some(store) = fresh_store().await else {
        return;
    };
    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let store = store.clone();
        tasks.spawn(async move { store.create(&email("race@gmail.com")).await });
    }

    let mut successes = 0;
    while let Some(outcome) = tasks.join_next().await {
        match outcome.unwrap() {
            Ok(_) => successes += 1,
            Err(StoreError::DuplicateEmail) => {}
            Err(e) => panic!("Unexpected error: {e:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(row_count(&store, "race@gmail.com").await, 1);
}

#[actix_web::test]
async fn application_serves_requests_after_startup() {
    if !database_tests_enabled() {
        return;
    }
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.database.database_name = uuid::Uuid::new_v4().to_string();
        c.application.port = 0;
        c
    };
    configure_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", application.port());
    _ = tokio::spawn(application.run_until_stopped());

    let response = reqwest::Client::new()
        .post(format!("{address}/api/newsletter/subscribe"))
        .json(&serde_json::json!({ "email": "ursula@gmail.com" }))
        .send()
        .await
        .expect("Failed to execute Request");

    assert_eq!(response.status().as_u16(), 200);
    let store = PostgresSubscriberStore::initialize(get_connection_pool(&configuration.database))
        .await
        .unwrap();
    assert_eq!(store.list_active().await.unwrap().len(), 1);
}
