mod common;

use chrono_tz::Europe::Stockholm;
use common::{FakeConnector, Pages, price_json, table};
use ecoguard::history::HistoryState;
use ecoguard::normalize::YearMonth;
use ecoguard::persistence::PersistenceManager;
use ecoguard::{Coordinator, Scheduler};
use std::time::Duration;
use tokio::sync::watch;

fn pages() -> Pages {
    Pages {
        yearly: Some(table(&[&["Januari 2026", "300,0", "540,0"]])),
        current: Some(table(&[&["2026-02-01", "12,5"]])),
        prices: Some(price_json(1.88, "2026-01-01")),
        hourly: Some(table(&[&["10:00 - 11:00", "0,5"]])),
        ..Pages::default()
    }
    .with_month(2026, 1, table(&[&["2026-01-31", "11,0"]]))
}

fn scheduler(connector: FakeConnector) -> Scheduler<FakeConnector> {
    Scheduler::new(
        Coordinator::new(connector, Stockholm),
        Duration::from_secs(3600),
    )
}

#[tokio::test]
async fn cycle_publishes_status() {
    let mut scheduler = scheduler(FakeConnector::new(pages()));
    let mut rx = scheduler.subscribe();

    scheduler.run_cycle().await.unwrap();

    assert!(rx.has_changed().unwrap());
    let status = rx.borrow_and_update().clone();
    assert_eq!(status.cycles, 1);
    assert_eq!(status.failures, 0);
    assert!(status.last_error.is_none());
    assert!(status.last_success.is_some());
    let snapshot = status.snapshot.unwrap();
    assert_eq!(snapshot.price_per_kwh, Some(1.88));
}

#[tokio::test]
async fn rejected_cycle_is_flagged() {
    let mut scheduler = scheduler(FakeConnector::rejecting());

    assert!(scheduler.run_cycle().await.is_err());
    let status = scheduler.status();
    assert!(status.auth_failed);
    assert_eq!(status.cycles, 1);
    assert_eq!(status.failures, 1);
    assert!(status.snapshot.is_none());
    assert!(status.last_error.unwrap().contains("check credentials"));
}

#[tokio::test]
async fn rejected_startup_login_stops_the_loop() {
    let mut scheduler = scheduler(FakeConnector::rejecting());
    let (_tx, rx) = watch::channel(false);

    let err = scheduler.run(rx).await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(scheduler.status().auth_failed);
}

#[tokio::test]
async fn shutdown_after_startup_cycle_persists_history() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");
    let connector = FakeConnector::new(pages());
    let counters = connector.counters.clone();
    let mut scheduler =
        scheduler(connector).with_persistence(PersistenceManager::new(&state_file));

    let (_tx, rx) = watch::channel(true);
    scheduler.run(rx).await.unwrap();

    assert_eq!(counters.connects(), 1);
    assert_eq!(counters.closes(), 1);
    assert_eq!(scheduler.status().cycles, 1);

    let saved = PersistenceManager::new(&state_file).load().unwrap().unwrap();
    assert!(saved.months.contains(&YearMonth::new(2026, 1).unwrap()));
}

#[tokio::test]
async fn persisted_history_is_restored_before_first_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");
    let mut state = HistoryState::default();
    state.months.insert(YearMonth::new(2026, 1).unwrap());
    PersistenceManager::new(&state_file).save(&state).unwrap();

    let connector = FakeConnector::new(pages());
    let counters = connector.counters.clone();
    let mut scheduler =
        scheduler(connector).with_persistence(PersistenceManager::new(&state_file));

    let (_tx, rx) = watch::channel(true);
    scheduler.run(rx).await.unwrap();

    // January was already cached
    assert_eq!(counters.month_fetches(), 0);
    assert!(
        scheduler
            .coordinator()
            .history_state()
            .months
            .contains(&YearMonth::new(2026, 1).unwrap())
    );
}
