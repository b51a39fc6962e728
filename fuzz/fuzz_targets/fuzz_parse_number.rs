#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    if let Ok(Some(value)) = ecoguard::normalize::parse_number(&text) {
        assert!(value.is_finite());
    }
    let _ = ecoguard::normalize::resolve_month(&text);
    let _ = ecoguard::normalize::domain_path(&text, "1");
});
