#![no_main]
use chrono::TimeZone;
use chrono_tz::Europe::Stockholm;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // Malformed pages must only ever drop rows
    let _ = ecoguard::consumption::parse_yearly_table(&html);
    let _ = ecoguard::consumption::parse_current_month_table(&html);
    let _ = ecoguard::consumption::parse_month_table(&html);
    let _ = ecoguard::table::extract_input_value(&html, ecoguard::session::TOKEN_FIELD);
    let _ = ecoguard::table::extract_price(&html);

    if let Some(now) = Stockholm.with_ymd_and_hms(2026, 3, 29, 12, 0, 0).single() {
        let _ = ecoguard::consumption::parse_hourly_rolling(&html, &now);
    }
});
