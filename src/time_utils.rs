use crate::domain::market_data::{Timestamp, TimeInterval};

/// Seconds until the next bucket boundary; zero when `now_secs` sits on one.
pub fn seconds_to_next_bar(now_secs: u64, interval: TimeInterval) -> u64 {
    let start = Timestamp::new(now_secs).bucket_start(interval).value();
    if start == now_secs { 0 } else { start + interval.seconds() - now_secs }
}

/// Zero-padded `HH:MM:SS`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

pub fn countdown_to_next_bar(now_secs: u64, interval: TimeInterval) -> String {
    format_countdown(seconds_to_next_bar(now_secs, interval))
}

/// Current wall-clock time in whole seconds.
#[cfg(target_arch = "wasm32")]
pub fn now_secs() -> u64 {
    (js_sys::Date::now() / 1000.0) as u64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
