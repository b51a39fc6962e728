use chrono::NaiveDate;
use ecoguard::history::{CachedDay, HistoryState};
use ecoguard::normalize::YearMonth;
use ecoguard::persistence::PersistenceManager;
use tempfile::tempdir;

fn sample_state() -> HistoryState {
    let mut state = HistoryState::default();
    state.months.insert(YearMonth::new(2026, 1).unwrap());
    state.months.insert(YearMonth::new(2026, 2).unwrap());
    state.rates.record(YearMonth::new(2026, 1).unwrap(), 1.8);
    state.days.push(CachedDay {
        date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        kwh: 12.5,
    });
    state
}

#[test]
fn missing_file_loads_as_none() {
    let dir = tempdir().unwrap();
    let manager = PersistenceManager::new(dir.path().join("state.json"));
    assert!(manager.load().unwrap().is_none());
}

#[test]
fn saved_state_loads_back() {
    let dir = tempdir().unwrap();
    let manager = PersistenceManager::new(dir.path().join("state.json"));
    let state = sample_state();

    manager.save(&state).unwrap();
    let loaded = manager.load().unwrap().unwrap();
    assert_eq!(loaded, state);
    assert!(loaded.months.contains(&YearMonth::new(2026, 2).unwrap()));
    assert_eq!(loaded.rates.get(&YearMonth::new(2026, 1).unwrap()), Some(1.8));
}

#[test]
fn state_file_uses_month_labels() {
    let dir = tempdir().unwrap();
    let manager = PersistenceManager::new(dir.path().join("state.json"));
    manager.save(&sample_state()).unwrap();

    let raw = std::fs::read_to_string(manager.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["months"][0], "2026-01");
    assert_eq!(value["rates"]["2026-01"], 1.8);
}

#[test]
fn save_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("state.json");
    let manager = PersistenceManager::new(&path);

    manager.save(&HistoryState::default()).unwrap();
    assert!(path.exists());
}

#[test]
fn partial_state_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"months":["2025-12"]}"#).unwrap();

    let loaded = PersistenceManager::new(&path).load().unwrap().unwrap();
    assert_eq!(loaded.months.len(), 1);
    assert!(loaded.rates.is_empty());
    assert!(loaded.days.is_empty());
}

#[test]
fn corrupt_state_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = PersistenceManager::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("Serialization error"));
}
