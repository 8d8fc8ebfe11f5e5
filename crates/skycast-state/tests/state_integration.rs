//! Integration tests for the Skycast state layer.
//!
//! These drive the public command and read API end to end with the mock
//! provider and both storage backends.

use std::sync::Arc;
use std::time::Duration;

use skycast_core::Config;
use skycast_state::{
    App, FetchOutcome, FetchStatus, KeyValueStore, MemoryStore, SettingField, SqliteKvStore, Theme,
};
use skycast_weather::{MockProvider, UnitSystem, WindSpeedUnit};
use tempfile::TempDir;

fn app(provider: Arc<MockProvider>, store: Arc<dyn KeyValueStore>) -> App {
    App::new(Config::default(), provider, store)
}

#[tokio::test]
async fn test_case_variants_resolve_to_one_entry() {
    let provider = Arc::new(MockProvider::new());
    let app = app(provider.clone(), Arc::new(MemoryStore::new()));

    for input in ["london", "LONDON", "London", "lOnDoN"] {
        app.request_fetch(input).await;
    }

    let cities = app.all_cities();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].city, "London");
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_loading_visible_while_in_flight() {
    let provider = Arc::new(MockProvider::new().with_latency(Duration::from_millis(500)));
    let app = app(provider, Arc::new(MemoryStore::new()));

    let handle = tokio::spawn(app.request_fetch("Paris"));
    assert_eq!(*app.city_status("Paris"), FetchStatus::Loading);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*app.city_status("paris"), FetchStatus::Loading);

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { city: "Paris".into() });
    assert_eq!(*app.city_status("Paris"), FetchStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_caller_does_not_strand_loading() {
    let provider = Arc::new(MockProvider::new().with_latency(Duration::from_millis(500)));
    let app = app(provider.clone(), Arc::new(MemoryStore::new()));

    let waited = tokio::time::timeout(Duration::from_millis(100), app.request_fetch("Paris")).await;
    assert!(waited.is_err());
    assert_eq!(*app.city_status("Paris"), FetchStatus::Loading);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*app.city_status("Paris"), FetchStatus::Success);
    assert_eq!(app.all_cities().len(), 1);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_refresh_all_with_one_failure() {
    let provider = Arc::new(MockProvider::new());
    let app = app(provider.clone(), Arc::new(MemoryStore::new()));

    let summary = app
        .fetch_cities(&["Paris".into(), "Tokyo".into(), "Cairo".into()])
        .await;
    assert_eq!(summary.applied(), 3);

    provider.set_failure("tokyo", "No matching location found.");
    let summary = app.refresh_all().await;

    assert_eq!(summary.outcomes.len(), 3);
    assert_eq!(summary.applied(), 2);
    assert!(app.city_status("Paris").is_success());
    assert!(app.city_status("Cairo").is_success());
    assert_eq!(
        app.city_status("Tokyo").error_message(),
        Some("No matching location found.")
    );
    assert_eq!(app.all_cities().len(), 3);
}

#[tokio::test]
async fn test_failed_first_fetch_leaves_no_snapshot() {
    let provider = Arc::new(MockProvider::new());
    provider.set_failure("Atlantis", "No matching location found.");
    let app = app(provider.clone(), Arc::new(MemoryStore::new()));

    let outcome = app.request_fetch("Atlantis").await;
    assert!(matches!(outcome, FetchOutcome::Failed { .. }));
    assert!(app.all_cities().is_empty());
    assert!(app.analytics().is_none());

    provider.clear_failure("Atlantis");
    app.request_fetch("atlantis").await;
    assert!(app.city_status("Atlantis").is_success());
}

#[tokio::test(start_paused = true)]
async fn test_remove_during_fetch_does_not_recreate() {
    let provider = Arc::new(MockProvider::new().with_latency(Duration::from_millis(200)));
    let app = app(provider, Arc::new(MemoryStore::new()));

    let handle = tokio::spawn(app.request_fetch("Paris"));
    assert!(app.remove("Paris"));

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, FetchOutcome::Superseded { city: "Paris".into() });
    assert!(app.all_cities().is_empty());
    assert_eq!(*app.city_status("Paris"), FetchStatus::Idle);
}

#[test]
fn test_corrupt_theme_loads_as_dark() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("skycast.db");

    let store = SqliteKvStore::open(&path).unwrap();
    store.set("theme", "neon").unwrap();
    store.set("wind_speed_unit", "mph").unwrap();
    store.set("favourites", "[\"Paris\",").unwrap();
    drop(store);

    let app = app(
        Arc::new(MockProvider::new()),
        Arc::new(SqliteKvStore::open(&path).unwrap()),
    );
    let settings = app.settings();
    assert_eq!(settings.theme, Theme::Dark);
    assert_eq!(settings.wind_speed_unit, WindSpeedUnit::Mph);
    assert_eq!(settings.temperature_unit, UnitSystem::Metric);
    assert!(app.favourites().is_empty());
}

#[test]
fn test_unreadable_storage_falls_back_to_defaults() {
    let store = Arc::new(MemoryStore::new().with_value("favourites", r#"["Paris"]"#));
    store.set_fail_reads(true);
    store.set_fail_writes(true);

    let app = app(Arc::new(MockProvider::new()), store);
    assert!(app.favourites().is_empty());
    assert_eq!(app.settings().theme, Theme::Dark);

    assert!(app.toggle_favourite("Oslo"));
    assert!(app.set_setting(SettingField::Theme, "auto"));
    assert_eq!(*app.favourites(), vec!["Oslo".to_string()]);
    assert_eq!(app.settings().theme, Theme::Auto);
}

#[test]
fn test_toggle_twice_restores_favourites() {
    let store = Arc::new(MemoryStore::new().with_value("favourites", r#"["Delhi","London"]"#));
    let app = app(Arc::new(MockProvider::new()), store.clone());

    app.toggle_favourite("New York");
    app.toggle_favourite("new york");

    assert_eq!(*app.favourites(), vec!["Delhi".to_string(), "London".to_string()]);
    assert_eq!(store.peek("favourites").as_deref(), Some(r#"["Delhi","London"]"#));
}

#[tokio::test]
async fn test_analytics_follow_selection_and_units() {
    let app = app(Arc::new(MockProvider::new()), Arc::new(MemoryStore::new()));
    app.fetch_cities(&["Paris".into(), "Oslo".into()]).await;
    app.toggle_favourite("Oslo");

    let series = app.analytics().unwrap();
    assert_eq!(series.city, "Oslo");
    assert_eq!(series.points.len(), 12);
    assert!(Arc::ptr_eq(&series, &app.analytics().unwrap()));

    app.toggle_temperature_unit();
    app.request_fetch("Oslo").await;
    let imperial = app.analytics().unwrap();
    assert_eq!(imperial.units, UnitSystem::Imperial);
    assert!(imperial.summary.min_temp > series.summary.min_temp);
}
